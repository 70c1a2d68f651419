//! Contains the [`Domain`] type.

use crate::parsed_types::{
    ActionDefinition, DerivedPredicate, FunctionDefinition, Name, PredicateDefinition,
    Requirements, TypedList,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    name: Name,
    requirements: Requirements,
    types: TypedList<Name>,
    constants: TypedList<Name>,
    predicates: Vec<PredicateDefinition>,
    functions: Vec<FunctionDefinition>,
    derived: Vec<DerivedPredicate>,
    actions: Vec<ActionDefinition>,
}

impl Domain {
    /// Creates a new domain with only a name and a set of actions. The other
    /// sections are filled in with the `with_*` methods.
    pub fn builder<T: Into<Vec<ActionDefinition>>>(name: Name, actions: T) -> Self {
        Self {
            name,
            requirements: Requirements::default(),
            types: TypedList::default(),
            constants: TypedList::default(),
            predicates: Vec::default(),
            functions: Vec::default(),
            derived: Vec::default(),
            actions: actions.into(),
        }
    }

    pub fn with_requirements(mut self, requirements: Requirements) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_types<T: Into<TypedList<Name>>>(mut self, types: T) -> Self {
        self.types = types.into();
        self
    }

    pub fn with_constants<C: Into<TypedList<Name>>>(mut self, constants: C) -> Self {
        self.constants = constants.into();
        self
    }

    pub fn with_predicates<P: Into<Vec<PredicateDefinition>>>(mut self, predicates: P) -> Self {
        self.predicates = predicates.into();
        self
    }

    pub fn with_functions<F: Into<Vec<FunctionDefinition>>>(mut self, functions: F) -> Self {
        self.functions = functions.into();
        self
    }

    pub fn with_derived<D: Into<Vec<DerivedPredicate>>>(mut self, derived: D) -> Self {
        self.derived = derived.into();
        self
    }

    pub const fn name(&self) -> &Name {
        &self.name
    }

    pub const fn requirements(&self) -> &Requirements {
        &self.requirements
    }

    pub const fn types(&self) -> &TypedList<Name> {
        &self.types
    }

    pub const fn constants(&self) -> &TypedList<Name> {
        &self.constants
    }

    pub const fn predicates(&self) -> &Vec<PredicateDefinition> {
        &self.predicates
    }

    pub const fn functions(&self) -> &Vec<FunctionDefinition> {
        &self.functions
    }

    pub const fn derived(&self) -> &Vec<DerivedPredicate> {
        &self.derived
    }

    pub const fn actions(&self) -> &Vec<ActionDefinition> {
        &self.actions
    }
}
