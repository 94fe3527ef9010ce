//! Backward-chaining regression search over the STRIPS catalog.

use std::time::{Duration, Instant};
use tracing::debug;

use super::operator::{OperatorKind, Predicate};
use super::state::{Backlog, Term, WorldState};
use super::Planner;
use crate::common::{euclidean, Action, Plan, Position, Product};
use crate::config::Config;
use crate::scenario::Scenario;
use crate::stat::Stats;

/// Shared across one whole planning call, threaded by `&mut` through every
/// recursive call. Best cost only ever decreases.
struct SearchContext {
    best_cost: f64,
    home: Position,
    deadline: Duration,
    started: Instant,
}

/// A grounded operator candidate under consideration by one search frame.
#[derive(Debug, Clone)]
struct Candidate {
    kind: OperatorKind,
    args: [Term; 2],
}

impl Candidate {
    fn fly(from: Position, to: Position) -> Self {
        Candidate {
            kind: OperatorKind::Fly,
            args: [Term::Cell(from), Term::Cell(to)],
        }
    }

    fn load(product: Product, warehouse: Position) -> Self {
        Candidate {
            kind: OperatorKind::Load,
            args: [Term::Product(product), Term::Cell(warehouse)],
        }
    }

    fn deliver(product: Product, client: Position) -> Self {
        Candidate {
            kind: OperatorKind::Deliver,
            args: [Term::Product(product), Term::Cell(client)],
        }
    }

    fn action(&self) -> Action {
        match (self.kind, &self.args) {
            (OperatorKind::Fly, [Term::Cell(from), Term::Cell(to)]) => Action::Fly {
                from: *from,
                to: *to,
            },
            (OperatorKind::Load, [Term::Product(product), Term::Cell(warehouse)]) => Action::Load {
                product: product.clone(),
                warehouse: *warehouse,
            },
            (OperatorKind::Deliver, [Term::Product(product), Term::Cell(client)]) => {
                Action::Deliver {
                    product: product.clone(),
                    client: *client,
                }
            }
            _ => unreachable!("candidate arguments do not match its operator"),
        }
    }

    fn leg_cost(&self) -> f64 {
        match (self.kind, &self.args) {
            (OperatorKind::Fly, [Term::Cell(from), Term::Cell(to)]) => euclidean(*from, *to),
            _ => 0.0,
        }
    }
}

/// Regresses from `state` toward "nothing left to undo". The accumulated
/// `path` runs goal-first; the orchestrator reverses it on the way out.
/// `None` means this branch has no acceptable completion.
fn regress(
    state: WorldState,
    path: Vec<Action>,
    cost: f64,
    mut backlog: Backlog,
    ctx: &mut SearchContext,
    stats: &mut Stats,
) -> Option<Vec<Action>> {
    if cost >= ctx.best_cost {
        stats.pruned_by_bound += 1;
        return None;
    }
    if ctx.started.elapsed() > ctx.deadline {
        stats.pruned_by_deadline += 1;
        return None;
    }
    stats.expanded_nodes += 1;

    let position = state.position()?;

    // At most one candidate class applies per frame, in this priority order.
    let mut candidates: Vec<Candidate> = Vec::new();
    if state.has_flag(Predicate::Empty) && state.is_warehouse(position) {
        // The drone has just flown back from a delivery.
        for client in backlog.pending_clients() {
            candidates.push(Candidate::fly(client, position));
        }
    } else if state.has_flag(Predicate::NotEmpty) && state.is_client(position) {
        // The drone has just arrived at a client with a product.
        if let Some(product) = state.carries().cloned() {
            for warehouse in state.warehouses() {
                if state.stocks(warehouse, &product) {
                    candidates.push(Candidate::fly(warehouse, position));
                }
            }
        }
    } else if state.is_effect_of(
        OperatorKind::Deliver,
        // Deliver's post-conditions never read the product slot, so a
        // placeholder stands in until the client's queue is popped.
        &[Term::Product(Product::new()), Term::Cell(position)],
    ) {
        candidates.push(Candidate::deliver(Product::new(), position));
    } else if let Some(product) = state.carries().cloned() {
        let args = [Term::Product(product.clone()), Term::Cell(position)];
        if state.is_effect_of(OperatorKind::Load, &args) {
            candidates.push(Candidate::load(product, position));
        }
    }

    if candidates.is_empty() {
        return None;
    }

    // Ground the Deliver placeholder by consuming this client's oldest
    // pending order. An empty queue fails the branch.
    if candidates[0].kind == OperatorKind::Deliver {
        let product = backlog.pop_front(position)?;
        candidates[0] = Candidate::deliver(product, position);
    }

    if backlog.is_empty() {
        let candidate = candidates.swap_remove(0);
        return close_branch(candidate, &state, path, cost, ctx, stats);
    }

    // Cheaper flight legs first. Greedy ordering only; a later sibling can
    // still win under the shared bound.
    if candidates.len() > 1 {
        candidates.sort_by(|a, b| a.leg_cost().total_cmp(&b.leg_cost()));
    }

    let mut best_path = None;
    for candidate in candidates {
        let next_state = state.apply_reverse(candidate.kind, &candidate.args);
        let next_cost = cost + candidate.leg_cost();
        let mut next_path = path.clone();
        next_path.push(candidate.action());
        if let Some(found) = regress(next_state, next_path, next_cost, backlog.clone(), ctx, stats)
        {
            // Keep the last success: a sibling accepted later necessarily
            // improved on the shared bound.
            best_path = Some(found);
        }
    }
    best_path
}

/// Terminal case: the backlog just emptied. Picks the warehouse minimizing
/// `distance(position, w) + distance(home, w)` for the delivered product and
/// closes the branch if that beats the best known cost. The only success exit
/// of the search.
fn close_branch(
    candidate: Candidate,
    state: &WorldState,
    mut path: Vec<Action>,
    cost: f64,
    ctx: &mut SearchContext,
    stats: &mut Stats,
) -> Option<Vec<Action>> {
    let Term::Product(product) = candidate.args[0].clone() else {
        return None;
    };
    let undone = state.apply_reverse(candidate.kind, &candidate.args);
    path.push(candidate.action());
    let position = undone.position()?;

    // First minimal combined distance wins; iteration order breaks ties.
    let mut best: Option<(Position, f64)> = None;
    for warehouse in undone.warehouses() {
        if !undone.stocks(warehouse, &product) {
            continue;
        }
        let combined = euclidean(position, warehouse) + euclidean(ctx.home, warehouse);
        if best.is_none_or(|(_, distance)| combined < distance) {
            best = Some((warehouse, combined));
        }
    }
    let (warehouse, combined) = best?;

    let total = cost + combined;
    if total >= ctx.best_cost {
        return None;
    }
    ctx.best_cost = total;
    stats.accepted_branches += 1;
    debug!("accepted branch with cost {total:.3} via warehouse {warehouse:?}");

    path.push(Action::Fly {
        from: warehouse,
        to: position,
    });
    path.push(Action::Load { product, warehouse });
    path.push(Action::Fly {
        from: ctx.home,
        to: warehouse,
    });
    Some(path)
}

pub struct RegressionPlanner {
    scenario: Scenario,
    stats: Stats,
}

impl RegressionPlanner {
    pub fn new(scenario: Scenario) -> Self {
        RegressionPlanner {
            scenario,
            stats: Stats::default(),
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl Planner for RegressionPlanner {
    /// One trial per scenario order, each rooted at that order's client. The
    /// context (and with it the best-cost bound) is reset once per call, not
    /// per trial, so later trials only succeed by beating earlier ones. The
    /// last successful trial is retained.
    fn plan(&mut self, config: &Config) -> Option<Plan> {
        let solve_start = Instant::now();
        self.stats = Stats::default();

        let base = WorldState::from_scenario(&self.scenario);
        let backlog = Backlog::from_orders(&self.scenario.orders);

        let mut ctx = SearchContext {
            best_cost: f64::INFINITY,
            home: self.scenario.initial_position,
            deadline: Duration::from_secs(config.timeout),
            started: Instant::now(),
        };

        let mut result = None;
        for order in &self.scenario.orders {
            debug!("trial rooted at client {:?}", order.client);
            let mut state = base.clone();
            state.set_position(order.client);
            if let Some(found) =
                regress(state, Vec::new(), 0.0, backlog.clone(), &mut ctx, &mut self.stats)
            {
                result = Some(found);
            }
        }

        let mut actions = result?;
        // The search accumulates actions goal-first.
        actions.reverse();
        let plan = Plan { actions };

        self.stats.cost = plan.cost();
        self.stats.time_us = solve_start.elapsed().as_micros() as usize;
        self.stats.print();
        Some(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{Order, Stock};

    fn single_order_scenario() -> Scenario {
        Scenario {
            initial_position: (0, 0),
            warehouses: vec![(0, 0)],
            clients: vec![(10, 0)],
            available_products: vec![Stock {
                warehouse: (0, 0),
                product: "bolts".to_string(),
            }],
            orders: vec![Order {
                client: (10, 0),
                product: "bolts".to_string(),
            }],
        }
    }

    fn fresh_context(home: Position) -> SearchContext {
        SearchContext {
            best_cost: f64::INFINITY,
            home,
            deadline: Duration::from_secs(30),
            started: Instant::now(),
        }
    }

    #[test]
    fn single_order_plan_loads_before_delivering() {
        let mut planner = RegressionPlanner::new(single_order_scenario());
        let plan = planner.plan(&Config::default()).unwrap();

        assert_eq!(
            plan.render(),
            vec![
                "Fly((0,0),(0,0))",
                "Load(bolts)",
                "Fly((0,0),(10,0))",
                "Deliver(bolts)",
            ]
        );
        assert!((plan.cost() - 10.0).abs() < 1e-9);
        assert!(planner.stats().expanded_nodes > 0);
        assert_eq!(planner.stats().accepted_branches, 1);
    }

    #[test]
    fn combined_distance_picks_the_supply_warehouse() {
        // (10,5) is nearest to the client (5 away) but far from home; (2,0)
        // is 8 from the client yet wins on client+home distance (10 < 16.18).
        let scenario = Scenario {
            initial_position: (0, 0),
            warehouses: vec![(10, 5), (2, 0)],
            clients: vec![(10, 0)],
            available_products: vec![
                Stock {
                    warehouse: (10, 5),
                    product: "bolts".to_string(),
                },
                Stock {
                    warehouse: (2, 0),
                    product: "bolts".to_string(),
                },
            ],
            orders: vec![Order {
                client: (10, 0),
                product: "bolts".to_string(),
            }],
        };
        let mut planner = RegressionPlanner::new(scenario);
        let plan = planner.plan(&Config::default()).unwrap();

        let loaded_at: Vec<Position> = plan
            .actions
            .iter()
            .filter_map(|action| match action {
                Action::Load { warehouse, .. } => Some(*warehouse),
                _ => None,
            })
            .collect();
        assert_eq!(loaded_at, vec![(2, 0)]);
        assert_eq!(
            plan.actions.first(),
            Some(&Action::Fly {
                from: (0, 0),
                to: (2, 0),
            })
        );
        assert!((plan.cost() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn two_clients_are_both_served() {
        let scenario = Scenario {
            initial_position: (0, 0),
            warehouses: vec![(0, 0)],
            clients: vec![(5, 0), (0, 5)],
            available_products: vec![
                Stock {
                    warehouse: (0, 0),
                    product: "bolts".to_string(),
                },
                Stock {
                    warehouse: (0, 0),
                    product: "sensor".to_string(),
                },
            ],
            orders: vec![
                Order {
                    client: (5, 0),
                    product: "bolts".to_string(),
                },
                Order {
                    client: (0, 5),
                    product: "sensor".to_string(),
                },
            ],
        };
        let mut planner = RegressionPlanner::new(scenario);
        let plan = planner.plan(&Config::default()).unwrap();

        assert_eq!(plan.actions.len(), 8);
        assert!((plan.cost() - 15.0).abs() < 1e-9);
        let delivered: Vec<&Product> = plan
            .actions
            .iter()
            .filter_map(|action| match action {
                Action::Deliver { product, .. } => Some(product),
                _ => None,
            })
            .collect();
        assert_eq!(delivered.len(), 2);
        assert!(delivered.contains(&&"bolts".to_string()));
        assert!(delivered.contains(&&"sensor".to_string()));
    }

    #[test]
    fn no_orders_yields_no_plan() {
        let mut scenario = single_order_scenario();
        scenario.orders.clear();
        let mut planner = RegressionPlanner::new(scenario);
        assert!(planner.plan(&Config::default()).is_none());
    }

    #[test]
    fn empty_backlog_fails_outright() {
        // Empty drone parked at the warehouse, nothing pending: no candidate
        // class applies.
        let scenario = single_order_scenario();
        let mut state = WorldState::from_scenario(&scenario);
        state.set_position((0, 0));

        let mut ctx = fresh_context((0, 0));
        let mut stats = Stats::default();
        let result = regress(
            state,
            Vec::new(),
            0.0,
            Backlog::default(),
            &mut ctx,
            &mut stats,
        );
        assert!(result.is_none());
        assert!(ctx.best_cost.is_infinite());
    }

    #[test]
    fn elapsed_deadline_prunes_the_branch() {
        let scenario = single_order_scenario();
        let mut state = WorldState::from_scenario(&scenario);
        state.set_position((10, 0));

        let mut ctx = fresh_context((0, 0));
        ctx.deadline = Duration::ZERO;
        ctx.started = Instant::now() - Duration::from_secs(1);
        let mut stats = Stats::default();
        let result = regress(
            state,
            Vec::new(),
            0.0,
            Backlog::from_orders(&scenario.orders),
            &mut ctx,
            &mut stats,
        );
        assert!(result.is_none());
        assert_eq!(stats.pruned_by_deadline, 1);
        assert_eq!(stats.expanded_nodes, 0);
    }

    #[test]
    fn cost_bound_prunes_the_branch() {
        let scenario = single_order_scenario();
        let mut state = WorldState::from_scenario(&scenario);
        state.set_position((10, 0));

        let mut ctx = fresh_context((0, 0));
        ctx.best_cost = 0.0;
        let mut stats = Stats::default();
        let result = regress(
            state,
            Vec::new(),
            0.0,
            Backlog::from_orders(&scenario.orders),
            &mut ctx,
            &mut stats,
        );
        assert!(result.is_none());
        assert_eq!(stats.pruned_by_bound, 1);
        assert_eq!(stats.expanded_nodes, 0);
    }

    #[test]
    fn accepted_cost_matches_fly_leg_sum() {
        let mut planner = RegressionPlanner::new(single_order_scenario());
        let plan = planner.plan(&Config::default()).unwrap();
        let fly_sum: f64 = plan
            .actions
            .iter()
            .filter(|action| matches!(action, Action::Fly { .. }))
            .map(Action::cost)
            .sum();
        assert!((plan.cost() - fly_sum).abs() < 1e-12);
        assert!((planner.stats().cost - fly_sum).abs() < 1e-12);
    }
}
