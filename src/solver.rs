mod operator;
mod regression;
mod state;

pub use regression::RegressionPlanner;

use crate::common::Plan;
use crate::config::Config;

pub trait Planner {
    fn plan(&mut self, config: &Config) -> Option<Plan>;
}
