//! Static STRIPS catalog for the three drone actions.

/// Predicate names of the symbolic world state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(super) enum Predicate {
    /// Singleton: the drone's current cell.
    Position,
    Warehouse,
    Client,
    /// Relation: warehouse cell x product.
    HasProduct,
    /// Singleton: the product currently held.
    Carries,
    /// Relation: client cell x product.
    Order,
    Empty,
    NotEmpty,
}

/// A formula template. Indices address the operator's 2-slot grounding tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Formula {
    Flag(Predicate),
    Unary(Predicate, usize),
    Binary(Predicate, usize, usize),
}

impl Formula {
    pub(super) const fn predicate(&self) -> Predicate {
        match *self {
            Formula::Flag(p) | Formula::Unary(p, _) | Formula::Binary(p, _, _) => p,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum OperatorKind {
    /// Fly(from, to)
    Fly,
    /// Load(product, warehouseCell)
    Load,
    /// Deliver(product, clientCell)
    Deliver,
}

pub(super) struct OperatorDef {
    pub(super) preconditions: &'static [Formula],
    pub(super) add_effects: &'static [Formula],
    pub(super) delete_effects: &'static [Formula],
}

static FLY: OperatorDef = OperatorDef {
    preconditions: &[Formula::Unary(Predicate::Position, 0)],
    add_effects: &[Formula::Unary(Predicate::Position, 1)],
    delete_effects: &[Formula::Unary(Predicate::Position, 0)],
};

static LOAD: OperatorDef = OperatorDef {
    preconditions: &[
        Formula::Unary(Predicate::Warehouse, 1),
        Formula::Flag(Predicate::Empty),
        Formula::Binary(Predicate::HasProduct, 1, 0),
    ],
    add_effects: &[
        Formula::Unary(Predicate::Carries, 0),
        Formula::Flag(Predicate::NotEmpty),
    ],
    delete_effects: &[Formula::Flag(Predicate::Empty)],
};

static DELIVER: OperatorDef = OperatorDef {
    preconditions: &[
        Formula::Unary(Predicate::Carries, 0),
        Formula::Unary(Predicate::Client, 1),
        Formula::Binary(Predicate::Order, 1, 0),
        Formula::Flag(Predicate::NotEmpty),
    ],
    add_effects: &[Formula::Flag(Predicate::Empty)],
    delete_effects: &[
        Formula::Unary(Predicate::Carries, 0),
        Formula::Binary(Predicate::Order, 1, 0),
        Formula::Flag(Predicate::NotEmpty),
    ],
};

pub(super) fn definition(kind: OperatorKind) -> &'static OperatorDef {
    match kind {
        OperatorKind::Fly => &FLY,
        OperatorKind::Load => &LOAD,
        OperatorKind::Deliver => &DELIVER,
    }
}

/// The operator's net post-condition set:
/// `(preconditions - delete_effects) + add_effects`, over templates.
pub(super) fn post_conditions(kind: OperatorKind) -> Vec<Formula> {
    let def = definition(kind);
    def.preconditions
        .iter()
        .filter(|formula| !def.delete_effects.contains(formula))
        .chain(def.add_effects.iter())
        .copied()
        .collect()
}
