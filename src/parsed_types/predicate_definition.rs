//! Contains predicate and function definitions.

use crate::parsed_types::{Name, TypedList};

/// `(<predicate> <typed list (variable)>)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateDefinition {
    name: Name,
    variables: TypedList<Name>,
}

impl PredicateDefinition {
    pub const fn new(name: Name, variables: TypedList<Name>) -> Self {
        Self { name, variables }
    }

    pub const fn name(&self) -> &Name {
        &self.name
    }

    pub const fn variables(&self) -> &TypedList<Name> {
        &self.variables
    }
}

/// A numeric function skeleton, e.g. `(road-length ?l1 ?l2 - location)`.
pub type FunctionDefinition = PredicateDefinition;
