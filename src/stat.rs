use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub cost: f64,
    pub time_us: usize,
    pub expanded_nodes: usize,
    pub pruned_by_bound: usize,
    pub pruned_by_deadline: usize,
    pub accepted_branches: usize,
}

impl Stats {
    pub(crate) fn print(&self) {
        info!(
            "Cost {:?} Time(microseconds) {:?} Expanded nodes {:?} Pruned by bound {:?} Pruned by deadline {:?} Accepted branches {:?}",
            self.cost,
            self.time_us,
            self.expanded_nodes,
            self.pruned_by_bound,
            self.pruned_by_deadline,
            self.accepted_branches
        );
    }
}
