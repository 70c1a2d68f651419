//! Syntax tree of PDDL domain and problem files, as produced by
//! [`crate::parsers`].

mod action_definition;
mod atom;
mod domain;
mod effect_definition;
mod goal_definition;
mod name;
mod predicate_definition;
mod problem;
mod requirements;
mod term;
mod typed_list;

pub use action_definition::{ActionDefinition, DerivedPredicate};
pub use atom::Atom;
pub use domain::Domain;
pub use effect_definition::{EffectDefinition, NumericExpression};
pub use goal_definition::GoalDefinition;
pub use name::Name;
pub use predicate_definition::{FunctionDefinition, PredicateDefinition};
pub use problem::{InitElement, Metric, Problem};
pub use requirements::{Requirement, Requirements};
pub use term::Term;
pub use typed_list::{Typed, TypedList, TYPE_OBJECT};
