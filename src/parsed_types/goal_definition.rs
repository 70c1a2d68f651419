//! Contains goal descriptions via the [`GoalDefinition`] type.

use crate::parsed_types::{Atom, Name, Term, TypedList};

/// A PDDL goal description, used for preconditions, goals, effect conditions
/// and derived predicate bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GoalDefinition {
    Atom(Atom<Term>),
    Equality(Term, Term),
    And(Vec<GoalDefinition>),
    Or(Vec<GoalDefinition>),
    Not(Box<GoalDefinition>),
    Imply(Box<GoalDefinition>, Box<GoalDefinition>),
    Exists(TypedList<Name>, Box<GoalDefinition>),
    Forall(TypedList<Name>, Box<GoalDefinition>),
}

impl GoalDefinition {
    #[inline(always)]
    pub const fn new_atom(value: Atom<Term>) -> Self {
        Self::Atom(value)
    }

    #[inline(always)]
    pub fn new_and<T: IntoIterator<Item = GoalDefinition>>(values: T) -> Self {
        Self::And(values.into_iter().collect())
    }

    #[inline(always)]
    pub fn new_or<T: IntoIterator<Item = GoalDefinition>>(values: T) -> Self {
        Self::Or(values.into_iter().collect())
    }

    #[inline(always)]
    pub fn new_not(value: GoalDefinition) -> Self {
        Self::Not(Box::new(value))
    }

    #[inline(always)]
    pub fn new_imply_tuple(tuple: (GoalDefinition, GoalDefinition)) -> Self {
        Self::Imply(Box::new(tuple.0), Box::new(tuple.1))
    }

    #[inline(always)]
    pub const fn new_equality(a: Term, b: Term) -> Self {
        Self::Equality(a, b)
    }

    #[inline(always)]
    pub fn new_exists_tuple(tuple: (TypedList<Name>, GoalDefinition)) -> Self {
        Self::Exists(tuple.0, Box::new(tuple.1))
    }

    #[inline(always)]
    pub fn new_forall_tuple(tuple: (TypedList<Name>, GoalDefinition)) -> Self {
        Self::Forall(tuple.0, Box::new(tuple.1))
    }

    /// Visits every sub-formula, outermost first.
    pub fn visit<F: FnMut(&GoalDefinition)>(&self, f: &mut F) {
        f(self);
        match self {
            GoalDefinition::Atom(_) | GoalDefinition::Equality(_, _) => {}
            GoalDefinition::And(parts) | GoalDefinition::Or(parts) => {
                parts.iter().for_each(|part| part.visit(f))
            }
            GoalDefinition::Not(part)
            | GoalDefinition::Exists(_, part)
            | GoalDefinition::Forall(_, part) => part.visit(f),
            GoalDefinition::Imply(a, b) => {
                a.visit(f);
                b.visit(f);
            }
        }
    }
}

impl Default for GoalDefinition {
    fn default() -> Self {
        Self::And(vec![])
    }
}
