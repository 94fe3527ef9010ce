//! Symbolic world state and the per-client order backlog.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::operator::{definition, post_conditions, Formula, OperatorKind, Predicate};
use crate::common::{Position, Product};
use crate::scenario::{Order, Scenario};

/// A grounding argument: either a grid cell or a product identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(super) enum Term {
    Cell(Position),
    Product(Product),
}

/// The value stored under one predicate key. Ordered sets keep iteration
/// deterministic, which the tie-break rules rely on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum PredicateValue {
    Flag,
    Unary(BTreeSet<Term>),
    Binary(BTreeSet<(Term, Term)>),
}

/// An absent key means the predicate is false for every argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct WorldState {
    facts: BTreeMap<Predicate, PredicateValue>,
}

impl WorldState {
    pub(super) fn from_scenario(scenario: &Scenario) -> Self {
        let mut state = WorldState::default();
        for &warehouse in &scenario.warehouses {
            state.add_unary(Predicate::Warehouse, Term::Cell(warehouse));
        }
        for &client in &scenario.clients {
            state.add_unary(Predicate::Client, Term::Cell(client));
        }
        for stock in &scenario.available_products {
            state.add_binary(
                Predicate::HasProduct,
                Term::Cell(stock.warehouse),
                Term::Product(stock.product.clone()),
            );
        }
        state.set_flag(Predicate::Empty);
        state
    }

    pub(super) fn set_flag(&mut self, predicate: Predicate) {
        self.facts.insert(predicate, PredicateValue::Flag);
    }

    pub(super) fn add_unary(&mut self, predicate: Predicate, term: Term) {
        match self
            .facts
            .entry(predicate)
            .or_insert_with(|| PredicateValue::Unary(BTreeSet::new()))
        {
            PredicateValue::Unary(set) => {
                set.insert(term);
            }
            _ => debug_assert!(false, "{predicate:?} is already bound to another arity"),
        }
    }

    pub(super) fn add_binary(&mut self, predicate: Predicate, first: Term, second: Term) {
        match self
            .facts
            .entry(predicate)
            .or_insert_with(|| PredicateValue::Binary(BTreeSet::new()))
        {
            PredicateValue::Binary(relation) => {
                relation.insert((first, second));
            }
            _ => debug_assert!(false, "{predicate:?} is already bound to another arity"),
        }
    }

    /// Overwrites the drone's position singleton.
    pub(super) fn set_position(&mut self, position: Position) {
        self.facts.insert(
            Predicate::Position,
            PredicateValue::Unary(BTreeSet::from([Term::Cell(position)])),
        );
    }

    fn unary(&self, predicate: Predicate) -> Option<&BTreeSet<Term>> {
        match self.facts.get(&predicate) {
            Some(PredicateValue::Unary(set)) => Some(set),
            _ => None,
        }
    }

    fn binary(&self, predicate: Predicate) -> Option<&BTreeSet<(Term, Term)>> {
        match self.facts.get(&predicate) {
            Some(PredicateValue::Binary(relation)) => Some(relation),
            _ => None,
        }
    }

    pub(super) fn has_flag(&self, predicate: Predicate) -> bool {
        self.facts.contains_key(&predicate)
    }

    pub(super) fn position(&self) -> Option<Position> {
        self.unary(Predicate::Position)?.iter().find_map(|term| match term {
            Term::Cell(cell) => Some(*cell),
            Term::Product(_) => None,
        })
    }

    pub(super) fn carries(&self) -> Option<&Product> {
        self.unary(Predicate::Carries)?.iter().find_map(|term| match term {
            Term::Product(product) => Some(product),
            Term::Cell(_) => None,
        })
    }

    pub(super) fn is_warehouse(&self, cell: Position) -> bool {
        self.unary(Predicate::Warehouse)
            .is_some_and(|set| set.contains(&Term::Cell(cell)))
    }

    pub(super) fn is_client(&self, cell: Position) -> bool {
        self.unary(Predicate::Client)
            .is_some_and(|set| set.contains(&Term::Cell(cell)))
    }

    pub(super) fn warehouses(&self) -> Vec<Position> {
        self.unary(Predicate::Warehouse)
            .map(|set| {
                set.iter()
                    .filter_map(|term| match term {
                        Term::Cell(cell) => Some(*cell),
                        Term::Product(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(super) fn stocks(&self, warehouse: Position, product: &Product) -> bool {
        self.binary(Predicate::HasProduct).is_some_and(|relation| {
            relation.contains(&(Term::Cell(warehouse), Term::Product(product.clone())))
        })
    }

    /// True iff every formula holds under the given grounding. Short-circuits
    /// on the first unmet one.
    pub(super) fn satisfies(&self, arguments: &[Term], formulas: &[Formula]) -> bool {
        for formula in formulas {
            let met = match *formula {
                Formula::Flag(p) => self.has_flag(p),
                Formula::Unary(p, i) => {
                    self.unary(p).is_some_and(|set| set.contains(&arguments[i]))
                }
                Formula::Binary(p, i, j) => self.binary(p).is_some_and(|relation| {
                    relation.contains(&(arguments[i].clone(), arguments[j].clone()))
                }),
            };
            if !met {
                return false;
            }
        }
        true
    }

    /// Does the current state look like this operator's aftermath?
    pub(super) fn is_effect_of(&self, kind: OperatorKind, arguments: &[Term]) -> bool {
        self.satisfies(arguments, &post_conditions(kind))
    }

    /// Undoes the operator on a fresh copy: add-effect keys are removed, then
    /// every delete-effect is reinstated as a destructive overwrite of its
    /// key (never a union; singletons like `position` depend on this).
    pub(super) fn apply_reverse(&self, kind: OperatorKind, arguments: &[Term]) -> WorldState {
        let mut next = self.clone();
        let def = definition(kind);
        for formula in def.add_effects {
            next.facts.remove(&formula.predicate());
        }
        for formula in def.delete_effects {
            let value = match *formula {
                Formula::Flag(_) => PredicateValue::Flag,
                Formula::Unary(_, i) => {
                    PredicateValue::Unary(BTreeSet::from([arguments[i].clone()]))
                }
                Formula::Binary(_, i, j) => PredicateValue::Binary(BTreeSet::from([(
                    arguments[i].clone(),
                    arguments[j].clone(),
                )])),
            };
            next.facts.insert(formula.predicate(), value);
        }
        next
    }
}

/// FIFO queues of pending products, one per client cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct Backlog {
    queues: BTreeMap<Position, VecDeque<Product>>,
}

impl Backlog {
    pub(super) fn from_orders(orders: &[Order]) -> Self {
        let mut backlog = Backlog::default();
        for order in orders {
            backlog
                .queues
                .entry(order.client)
                .or_default()
                .push_back(order.product.clone());
        }
        backlog
    }

    pub(super) fn pop_front(&mut self, client: Position) -> Option<Product> {
        self.queues.get_mut(&client)?.pop_front()
    }

    pub(super) fn pending_clients(&self) -> Vec<Position> {
        self.queues
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(&client, _)| client)
            .collect()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.queues.values().all(|queue| queue.is_empty())
    }
}
