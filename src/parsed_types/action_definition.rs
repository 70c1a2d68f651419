//! Contains action and derived predicate definitions.

use crate::parsed_types::{EffectDefinition, GoalDefinition, Name, PredicateDefinition, TypedList};

#[derive(Debug, Clone, PartialEq)]
pub struct ActionDefinition {
    name: Name,
    parameters: TypedList<Name>,
    precondition: Option<GoalDefinition>,
    effect: Option<EffectDefinition>,
}

impl ActionDefinition {
    pub const fn new(
        name: Name,
        parameters: TypedList<Name>,
        precondition: Option<GoalDefinition>,
        effect: Option<EffectDefinition>,
    ) -> Self {
        Self {
            name,
            parameters,
            precondition,
            effect,
        }
    }

    pub const fn name(&self) -> &Name {
        &self.name
    }

    pub const fn parameters(&self) -> &TypedList<Name> {
        &self.parameters
    }

    pub const fn precondition(&self) -> Option<&GoalDefinition> {
        self.precondition.as_ref()
    }

    pub const fn effect(&self) -> Option<&EffectDefinition> {
        self.effect.as_ref()
    }
}

/// `(:derived (<predicate> <typed list (variable)>) <GD>)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedPredicate {
    predicate: PredicateDefinition,
    condition: GoalDefinition,
}

impl DerivedPredicate {
    pub const fn new(predicate: PredicateDefinition, condition: GoalDefinition) -> Self {
        Self {
            predicate,
            condition,
        }
    }

    pub const fn predicate(&self) -> &PredicateDefinition {
        &self.predicate
    }

    pub const fn condition(&self) -> &GoalDefinition {
        &self.condition
    }
}
