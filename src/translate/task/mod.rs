//! The lifted planning task consumed by the translator.

mod action;
mod builder;
mod condition;

pub use action::{
    Action, Axiom, CostExpression, Effect, PropositionalAction, PropositionalAxiom,
};
pub use condition::{Atom, Condition, Impossible, Literal, TypedObject};

use crate::parsed_types::{Domain, Name, Problem, Requirements};
use crate::parsers::{describe_parse_error, Parser};
use crate::translate::{Result, TranslateError};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Hands out `prefix0`, `prefix1`, ... for one translation run.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    prefix: &'static str,
    counter: usize,
}

impl NameGenerator {
    pub const fn new(prefix: &'static str) -> Self {
        Self { prefix, counter: 0 }
    }

    pub fn next_name(&mut self) -> Name {
        let name = Name::new(format!("{}{}", self.prefix, self.counter));
        self.counter += 1;
        name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PddlType {
    pub name: Name,
    /// All strict ancestors in the type hierarchy.
    pub supertype_names: Vec<Name>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub name: Name,
    pub arguments: Vec<TypedObject>,
}

#[derive(Debug, Clone)]
pub struct Task {
    pub domain_name: Name,
    pub task_name: Name,
    pub requirements: Requirements,
    pub types: Vec<PddlType>,
    pub objects: Vec<TypedObject>,
    pub predicates: Vec<Predicate>,
    pub functions: Vec<Predicate>,
    /// Initial facts, including `=(o, o)` for every object.
    pub init: Vec<Atom>,
    /// Numeric initial values, used to look up action costs.
    pub init_assignments: BTreeMap<Atom, i64>,
    pub goal: Condition,
    pub actions: Vec<Action>,
    pub axioms: Vec<Axiom>,
    pub use_min_cost_metric: bool,
}

impl Task {
    pub fn from_path<P: AsRef<Path>, Q: AsRef<Path>>(domain_path: P, problem_path: Q) -> Result<Self> {
        let read = |path: &Path| {
            fs::read_to_string(path).map_err(|source| TranslateError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        let domain_text = read(domain_path.as_ref())?;
        let problem_text = read(problem_path.as_ref())?;
        Self::from_text(&domain_text, &problem_text)
    }

    /// Parses and lowers a domain and problem. PDDL is case-insensitive, so
    /// both texts are lowercased first.
    pub fn from_text(domain_text: &str, problem_text: &str) -> Result<Self> {
        let domain_text = domain_text.to_lowercase();
        let problem_text = problem_text.to_lowercase();
        let domain = Domain::from_str(&domain_text).map_err(|e| TranslateError::Parse {
            what: "domain",
            message: describe_parse_error(&e),
        })?;
        let problem = Problem::from_str(&problem_text).map_err(|e| TranslateError::Parse {
            what: "problem",
            message: describe_parse_error(&e),
        })?;
        Self::from_parsed(&domain, &problem)
    }

    pub fn from_parsed(domain: &Domain, problem: &Problem) -> Result<Self> {
        builder::TaskBuilder::new(domain, problem)?.build()
    }

    /// Adds a fresh axiom `new-axiom@N(parameters) :- condition` together
    /// with its predicate, returning the axiom's name.
    pub fn add_axiom(
        &mut self,
        names: &mut NameGenerator,
        parameters: Vec<TypedObject>,
        condition: Condition,
    ) -> Name {
        let name = names.next_name();
        self.predicates.push(Predicate {
            name,
            arguments: parameters.clone(),
        });
        self.axioms.push(Axiom::new(name, parameters, condition));
        name
    }

    /// Objects grouped by every type they belong to, including supertypes.
    pub fn objects_by_type(&self) -> HashMap<Name, Vec<Name>> {
        let supertypes: HashMap<Name, &Vec<Name>> = self
            .types
            .iter()
            .map(|t| (t.name, &t.supertype_names))
            .collect();
        let mut result: HashMap<Name, Vec<Name>> = HashMap::new();
        for object in &self.objects {
            result.entry(object.type_name).or_default().push(object.name);
            if let Some(ancestors) = supertypes.get(&object.type_name) {
                for ancestor in ancestors.iter() {
                    result.entry(*ancestor).or_default().push(object.name);
                }
            }
        }
        result
    }

    pub fn supertypes_of(&self, type_name: Name) -> &[Name] {
        self.types
            .iter()
            .find(|t| t.name == type_name)
            .map(|t| t.supertype_names.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn gripper_task() {
        let task = Task::from_text(GRIPPER_DOMAIN_TEXT, GRIPPER_PROBLEM_TEXT).unwrap();
        assert_eq!(task.domain_name, Name::new("gripper-strips"));
        assert_eq!(task.actions.len(), 3);
        assert_eq!(task.objects.len(), 8);
        // every object is equal to itself
        assert!(task
            .init
            .contains(&Atom::new(Name::new("="), vec![Name::new("rooma"), Name::new("rooma")])));
        assert!(!task.use_min_cost_metric);
    }

    #[test]
    fn objects_by_type_includes_supertypes() {
        let task = Task::from_text(GRIPPER_DOMAIN_TEXT, GRIPPER_PROBLEM_TEXT).unwrap();
        let objects_by_type = task.objects_by_type();
        assert_eq!(objects_by_type[&Name::new("room")].len(), 2);
        assert_eq!(objects_by_type[&Name::new("object")].len(), 8);
    }

    #[test]
    fn mismatched_domain_name_is_an_error() {
        let problem = GRIPPER_PROBLEM_TEXT.replace("gripper-strips", "other");
        assert!(matches!(
            Task::from_text(GRIPPER_DOMAIN_TEXT, &problem),
            Err(TranslateError::DomainMismatch { .. })
        ));
    }

    #[test]
    fn syntax_errors_are_reported() {
        let result = Task::from_text("(define (domain", GRIPPER_PROBLEM_TEXT);
        assert!(matches!(result, Err(TranslateError::Parse { what: "domain", .. })));
    }

    #[test]
    fn name_generator_counts_up() {
        let mut names = NameGenerator::new("p$");
        assert_eq!(names.next_name(), Name::new("p$0"));
        assert_eq!(names.next_name(), Name::new("p$1"));
    }
}
