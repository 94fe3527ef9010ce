use serde::Serialize;
use std::fmt;

/// A grid cell, compared by equality.
pub type Position = (i64, i64);

pub type Product = String;

pub fn euclidean(a: Position, b: Position) -> f64 {
    let dx = (a.0 - b.0) as f64;
    let dy = (a.1 - b.1) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// One grounded step of a delivery plan, in forward execution order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Action {
    Fly { from: Position, to: Position },
    Load { product: Product, warehouse: Position },
    Deliver { product: Product, client: Position },
}

impl Action {
    /// Only flight legs cost anything; loading and delivering are free.
    pub fn cost(&self) -> f64 {
        match self {
            Action::Fly { from, to } => euclidean(*from, *to),
            Action::Load { .. } | Action::Deliver { .. } => 0.0,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Fly { from, to } => {
                write!(f, "Fly(({},{}),({},{}))", from.0, from.1, to.0, to.1)
            }
            Action::Load { product, .. } => write!(f, "Load({product})"),
            Action::Deliver { product, .. } => write!(f, "Deliver({product})"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn cost(&self) -> f64 {
        self.actions.iter().map(Action::cost).sum()
    }

    pub fn render(&self) -> Vec<String> {
        self.actions.iter().map(|action| action.to_string()).collect()
    }
}
