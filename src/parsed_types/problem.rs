//! Contains the [`Problem`] type.

use crate::parsed_types::{Atom, GoalDefinition, Name, Requirements, TypedList};

/// An element of the `:init` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitElement {
    Atom(Atom<Name>),
    /// `(= (<function> o*) <number>)`.
    Assign(Atom<Name>, i64),
}

/// The `:metric` section. Only `(total-cost)`-style function terms are
/// supported as the metric expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metric {
    pub minimize: bool,
    pub function: Atom<Name>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    name: Name,
    domain: Name,
    requires: Requirements,
    objects: TypedList<Name>,
    init: Vec<InitElement>,
    goal: GoalDefinition,
    metric: Option<Metric>,
}

impl Problem {
    pub fn builder<P: Into<Name>, D: Into<Name>>(
        problem_name: P,
        domain_name: D,
        init: Vec<InitElement>,
        goal: GoalDefinition,
    ) -> Self {
        Self {
            name: problem_name.into(),
            domain: domain_name.into(),
            requires: Requirements::default(),
            objects: TypedList::default(),
            init,
            goal,
            metric: None,
        }
    }

    pub fn with_requirements<R: Into<Requirements>>(mut self, requirements: R) -> Self {
        self.requires = requirements.into();
        self
    }

    pub fn with_objects<O: Into<TypedList<Name>>>(mut self, objects: O) -> Self {
        self.objects = objects.into();
        self
    }

    pub fn with_metric(mut self, metric: Option<Metric>) -> Self {
        self.metric = metric;
        self
    }

    pub const fn name(&self) -> &Name {
        &self.name
    }

    pub const fn domain(&self) -> &Name {
        &self.domain
    }

    pub const fn requirements(&self) -> &Requirements {
        &self.requires
    }

    pub const fn objects(&self) -> &TypedList<Name> {
        &self.objects
    }

    pub const fn init(&self) -> &Vec<InitElement> {
        &self.init
    }

    pub const fn goal(&self) -> &GoalDefinition {
        &self.goal
    }

    pub const fn metric(&self) -> Option<&Metric> {
        self.metric.as_ref()
    }
}
