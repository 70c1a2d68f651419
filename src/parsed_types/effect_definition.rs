//! Contains effect descriptions via the [`EffectDefinition`] type.

use crate::parsed_types::{Atom, GoalDefinition, Name, Term, TypedList};

/// A numeric expression usable as an action cost.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NumericExpression {
    Number(i64),
    Function(Atom<Term>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EffectDefinition {
    Add(Atom<Term>),
    Delete(Atom<Term>),
    And(Vec<EffectDefinition>),
    Forall(TypedList<Name>, Box<EffectDefinition>),
    When(GoalDefinition, Box<EffectDefinition>),
    /// `(increase (<function> t*) <expression>)`.
    Increase(Atom<Term>, NumericExpression),
}

impl EffectDefinition {
    #[inline(always)]
    pub const fn new_add(atom: Atom<Term>) -> Self {
        Self::Add(atom)
    }

    #[inline(always)]
    pub const fn new_delete(atom: Atom<Term>) -> Self {
        Self::Delete(atom)
    }

    #[inline(always)]
    pub fn new_and<T: IntoIterator<Item = EffectDefinition>>(values: T) -> Self {
        Self::And(values.into_iter().collect())
    }

    #[inline(always)]
    pub fn new_forall_tuple(tuple: (TypedList<Name>, EffectDefinition)) -> Self {
        Self::Forall(tuple.0, Box::new(tuple.1))
    }

    #[inline(always)]
    pub fn new_when_tuple(tuple: (GoalDefinition, EffectDefinition)) -> Self {
        Self::When(tuple.0, Box::new(tuple.1))
    }

    #[inline(always)]
    pub fn new_increase_tuple(tuple: (Atom<Term>, NumericExpression)) -> Self {
        Self::Increase(tuple.0, tuple.1)
    }
}

impl Default for EffectDefinition {
    fn default() -> Self {
        Self::And(vec![])
    }
}
