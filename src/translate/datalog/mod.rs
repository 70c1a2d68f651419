//! Relaxed reachability via a Datalog program evaluated bottom-up.

mod greedy_join;
mod model;
mod program;
mod split_rules;

pub use model::compute_model;
pub use program::{Program, Rule, RuleKind};

use crate::parsed_types::Name;
use crate::translate::task::Atom;
use std::fmt::{Display, Formatter};

/// Prefix of the predicates introduced when splitting rules. PDDL names
/// cannot contain `$`, so these never clash with the task's own.
pub const AUXILIARY_PREFIX: &str = "p$";

/// Predicate of an atom in the Datalog program. Besides ordinary names,
/// atoms can stand for the applicability of an action or axiom (keyed by its
/// index in the normalized task) and for goal reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelPredicate {
    Name(Name),
    Action(usize),
    Axiom(usize),
    GoalReachable,
}

impl ModelPredicate {
    /// Whether the predicate was introduced when splitting rules.
    pub fn is_auxiliary(&self) -> bool {
        match self {
            ModelPredicate::Name(name) => name.strip_prefix(AUXILIARY_PREFIX).is_some_and(|counter| {
                !counter.is_empty() && counter.bytes().all(|byte| byte.is_ascii_digit())
            }),
            _ => false,
        }
    }
}

impl Display for ModelPredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelPredicate::Name(name) => write!(f, "{}", name),
            ModelPredicate::Action(index) => write!(f, "@action{}", index),
            ModelPredicate::Axiom(index) => write!(f, "@axiom{}", index),
            ModelPredicate::GoalReachable => write!(f, "@goal-reachable"),
        }
    }
}

/// An atom of the Datalog program. In rules, arguments may be `?variables`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatalogAtom {
    pub predicate: ModelPredicate,
    pub args: Vec<Name>,
}

impl DatalogAtom {
    pub fn new<A: Into<Vec<Name>>>(predicate: ModelPredicate, args: A) -> Self {
        Self {
            predicate,
            args: args.into(),
        }
    }

    pub fn variables(&self) -> impl Iterator<Item = Name> + '_ {
        self.args.iter().copied().filter(|arg| arg.is_variable())
    }

    /// The plain atom for atoms over ordinary predicates.
    pub fn as_atom(&self) -> Option<Atom> {
        match self.predicate {
            ModelPredicate::Name(name) => Some(Atom::new(name, self.args.clone())),
            _ => None,
        }
    }
}

impl From<Atom> for DatalogAtom {
    fn from(value: Atom) -> Self {
        Self::new(ModelPredicate::Name(value.predicate), value.args)
    }
}

impl Display for DatalogAtom {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.predicate)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}
