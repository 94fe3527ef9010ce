pub mod common;
pub mod config;
pub mod scenario;
pub mod solver;
pub mod stat;
