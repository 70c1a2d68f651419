//! Grounds the actions and axioms that the relaxed exploration found
//! reachable.

use crate::parsed_types::Name;
use crate::translate::datalog::{compute_model, DatalogAtom, ModelPredicate, Program};
use crate::translate::task::{Atom, PropositionalAction, PropositionalAxiom, Task, TypedObject};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::info;

/// The result of grounding a normalized task.
#[derive(Debug, Clone)]
pub struct Instantiation {
    /// Whether the goal is reachable when delete effects are ignored.
    pub relaxed_reachable: bool,
    /// Reachable atoms of predicates that some effect or axiom can change.
    pub fluent_facts: BTreeSet<Atom>,
    pub actions: Vec<PropositionalAction>,
    /// Sorted.
    pub axioms: Vec<PropositionalAxiom>,
    /// For each lifted action, by index, the parameter bindings of its
    /// reachable instantiations.
    pub reachable_action_parameters: HashMap<usize, Vec<Vec<Name>>>,
}

/// Builds and evaluates the Datalog program of `task`, then grounds it.
pub fn explore(task: &Task) -> Instantiation {
    let program = Program::from_task(task);
    let model = compute_model(&program);
    instantiate(task, &model)
}

fn fluent_predicates(task: &Task) -> HashSet<Name> {
    task.actions
        .iter()
        .flat_map(|action| action.effects.iter().map(|e| e.literal.atom.predicate))
        .chain(task.axioms.iter().map(|axiom| axiom.name))
        .collect()
}

/// Initial facts including the type membership atoms of every object.
fn static_init_facts(task: &Task) -> HashSet<Atom> {
    let mut facts = task.init.iter().cloned().collect::<HashSet<_>>();
    for object in &task.objects {
        facts.insert(object.type_atom());
        for supertype in task.supertypes_of(object.type_name) {
            facts.insert(TypedObject::new(object.name, *supertype).type_atom());
        }
    }
    facts
}

pub fn instantiate(task: &Task, model: &[DatalogAtom]) -> Instantiation {
    let fluent_predicates = fluent_predicates(task);
    let fluent_facts = model
        .iter()
        .filter_map(DatalogAtom::as_atom)
        .filter(|atom| fluent_predicates.contains(&atom.predicate))
        .collect::<HashSet<_>>();
    let init_facts = static_init_facts(task);
    let objects_by_type = task.objects_by_type();

    let mut relaxed_reachable = false;
    let mut actions = vec![];
    let mut axioms = vec![];
    let mut reachable_action_parameters: HashMap<usize, Vec<Vec<Name>>> = HashMap::new();
    for atom in model {
        match atom.predicate {
            ModelPredicate::Action(index) => {
                let action = &task.actions[index];
                reachable_action_parameters
                    .entry(index)
                    .or_default()
                    .push(atom.args.clone());
                let var_mapping = action
                    .parameters
                    .iter()
                    .map(|p| p.name)
                    .zip(atom.args.iter().copied())
                    .collect::<HashMap<_, _>>();
                if let Some(action) = action.instantiate(
                    &var_mapping,
                    &init_facts,
                    &task.init_assignments,
                    &fluent_facts,
                    &objects_by_type,
                ) {
                    actions.push(action);
                }
            }
            ModelPredicate::Axiom(index) => {
                let axiom = &task.axioms[index];
                let var_mapping = axiom
                    .parameters
                    .iter()
                    .map(|p| p.name)
                    .zip(atom.args.iter().copied())
                    .collect::<HashMap<_, _>>();
                if let Some(axiom) = axiom.instantiate(&var_mapping, &init_facts, &fluent_facts) {
                    axioms.push(axiom);
                }
            }
            ModelPredicate::GoalReachable => relaxed_reachable = true,
            ModelPredicate::Name(_) => {}
        }
    }
    if !relaxed_reachable {
        actions.clear();
        axioms.clear();
    }
    axioms.sort();
    info!(
        relaxed_reachable,
        fluent_facts = fluent_facts.len(),
        actions = actions.len(),
        axioms = axioms.len(),
        "instantiated task"
    );
    Instantiation {
        relaxed_reachable,
        fluent_facts: fluent_facts.into_iter().collect(),
        actions,
        axioms,
        reachable_action_parameters,
    }
}
