//! Rewrites every condition of a task into the flat form the Datalog
//! compiler expects: preconditions, effect conditions and axiom bodies end up
//! as conjunctions of literals, possibly under one existential quantifier
//! that is then turned into extra parameters.

use crate::parsed_types::Name;
use crate::translate::task::{Atom, Condition, NameGenerator, Task, TypedObject};
use crate::translate::{Result, TranslateError};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Prefix of the axioms introduced for universal conditions and complicated
/// goals.
pub const NEW_AXIOM_PREFIX: &str = "new-axiom@";

pub fn normalize(task: &mut Task, names: &mut NameGenerator) -> Result<()> {
    remove_universal_quantifiers(task, names);
    substitute_complicated_goal(task, names);
    build_dnf(task);
    split_disjunctions(task);
    move_existential_quantifiers(task);
    eliminate_existential_quantifiers(task);
    verify_axiom_predicates(task)?;
    debug!(
        actions = task.actions.len(),
        axioms = task.axioms.len(),
        "normalized task"
    );
    Ok(())
}

/// Applies `f` to every precondition, effect condition, axiom body and the
/// goal.
fn for_each_condition_mut<F: FnMut(&mut Condition)>(task: &mut Task, mut f: F) {
    for action in &mut task.actions {
        f(&mut action.precondition);
        for effect in &mut action.effects {
            f(&mut effect.condition);
        }
    }
    for axiom in &mut task.axioms {
        f(&mut axiom.condition);
    }
    f(&mut task.goal);
}

type AxiomCache = HashMap<(Condition, Vec<TypedObject>), Name>;

/// Replaces, top-down, `forall(vars, phi)` by `not new-axiom@N(free vars)`
/// where the new axiom is defined by `exists(vars, not phi)`.
fn remove_universal_quantifiers(task: &mut Task, names: &mut NameGenerator) {
    fn recurse(
        condition: Condition,
        type_map: &HashMap<Name, Name>,
        task: &mut Task,
        names: &mut NameGenerator,
        cache: &mut AxiomCache,
    ) -> Condition {
        if let Condition::Universal(_, _) = condition {
            let axiom_condition = condition.negate();
            let parameters = axiom_condition.free_variables();
            let typed_parameters = parameters
                .iter()
                .map(|v| TypedObject::new(*v, type_map[v]))
                .collect::<Vec<_>>();
            let key = (axiom_condition, typed_parameters);
            let name = match cache.get(&key) {
                Some(name) => *name,
                None => {
                    let body = recurse(key.0.clone(), type_map, task, names, cache);
                    let name = task.add_axiom(names, key.1.clone(), body);
                    cache.insert(key, name);
                    name
                }
            };
            Condition::negated_atom(Atom::new(name, parameters.into_iter().collect::<Vec<_>>()))
        } else {
            let parts = condition
                .parts()
                .iter()
                .map(|part| recurse(part.clone(), type_map, task, names, cache))
                .collect();
            condition.change_parts(parts)
        }
    }

    let mut cache = AxiomCache::new();
    for i in 0..task.actions.len() {
        if task.actions[i].precondition.has_universal_part() {
            let type_map = task.actions[i].type_map();
            let condition = std::mem::replace(&mut task.actions[i].precondition, Condition::Truth);
            task.actions[i].precondition = recurse(condition, &type_map, task, names, &mut cache);
        }
        for j in 0..task.actions[i].effects.len() {
            if task.actions[i].effects[j].condition.has_universal_part() {
                let type_map = task.actions[i].type_map();
                let condition =
                    std::mem::replace(&mut task.actions[i].effects[j].condition, Condition::Truth);
                task.actions[i].effects[j].condition =
                    recurse(condition, &type_map, task, names, &mut cache);
            }
        }
    }
    // Axioms added on the way are already free of universal conditions.
    for i in 0..task.axioms.len() {
        if task.axioms[i].condition.has_universal_part() {
            let type_map = task.axioms[i].type_map();
            let condition = std::mem::replace(&mut task.axioms[i].condition, Condition::Truth);
            task.axioms[i].condition = recurse(condition, &type_map, task, names, &mut cache);
        }
    }
    if task.goal.has_universal_part() {
        let mut type_map = HashMap::new();
        task.goal.quantified_variable_types(&mut type_map);
        let goal = std::mem::replace(&mut task.goal, Condition::Truth);
        task.goal = recurse(goal, &type_map, task, names, &mut cache);
    }
}

/// Replaces a goal that is not a conjunction of literals by a nullary axiom.
fn substitute_complicated_goal(task: &mut Task, names: &mut NameGenerator) {
    match &task.goal {
        Condition::Truth | Condition::Literal(_) => return,
        Condition::Conjunction(parts) if parts.iter().all(|p| matches!(p, Condition::Literal(_))) => {
            return
        }
        _ => {}
    }
    let goal = std::mem::replace(&mut task.goal, Condition::Truth);
    let name = task.add_axiom(names, vec![], goal);
    task.goal = Condition::atom(Atom::new(name, vec![]));
}

/// Pulls disjunctions to the root of a condition free of universal parts.
fn to_dnf(condition: &Condition) -> Condition {
    let mut disjunctive_parts = vec![];
    let mut other_parts = vec![];
    for part in condition.parts() {
        match to_dnf(part) {
            Condition::Disjunction(parts) => disjunctive_parts.push(parts),
            part => other_parts.push(part),
        }
    }
    if disjunctive_parts.is_empty() {
        return condition.change_parts(other_parts);
    }
    match condition {
        Condition::Disjunction(_) => {
            let mut result = other_parts;
            for parts in disjunctive_parts {
                result.extend(parts);
            }
            Condition::Disjunction(result)
        }
        Condition::Existential(parameters, _) => Condition::Disjunction(
            disjunctive_parts
                .swap_remove(0)
                .into_iter()
                .map(|part| Condition::Existential(parameters.clone(), Box::new(part)))
                .collect(),
        ),
        Condition::Conjunction(_) => {
            let mut result = vec![Condition::Conjunction(other_parts)];
            while let Some(parts) = disjunctive_parts.pop() {
                let previous = std::mem::take(&mut result);
                for left in &previous {
                    for right in &parts {
                        result.push(Condition::Conjunction(vec![left.clone(), right.clone()]));
                    }
                }
            }
            Condition::Disjunction(result)
        }
        other => panic!("Unexpected condition in DNF conversion: {:?}", other),
    }
}

fn build_dnf(task: &mut Task) {
    for_each_condition_mut(task, |condition| {
        if condition.has_disjunction() {
            *condition = to_dnf(condition).simplified();
        }
    });
}

/// Splits actions, effects and axioms at a top-level disjunction into one
/// copy per disjunct. Copies take the place of the original.
fn split_disjunctions(task: &mut Task) {
    for action in &mut task.actions {
        action.effects = std::mem::take(&mut action.effects)
            .into_iter()
            .flat_map(|effect| match &effect.condition {
                Condition::Disjunction(parts) => parts
                    .iter()
                    .map(|part| {
                        let mut clone = effect.clone();
                        clone.condition = part.clone();
                        clone
                    })
                    .collect(),
                _ => vec![effect],
            })
            .collect();
    }
    task.actions = std::mem::take(&mut task.actions)
        .into_iter()
        .flat_map(|action| match &action.precondition {
            Condition::Disjunction(parts) => parts
                .iter()
                .map(|part| {
                    let mut clone = action.clone();
                    clone.precondition = part.clone();
                    clone
                })
                .collect(),
            _ => vec![action],
        })
        .collect();
    task.axioms = std::mem::take(&mut task.axioms)
        .into_iter()
        .flat_map(|axiom| match &axiom.condition {
            Condition::Disjunction(parts) => parts
                .iter()
                .map(|part| {
                    let mut clone = axiom.clone();
                    clone.condition = part.clone();
                    clone
                })
                .collect(),
            _ => vec![axiom],
        })
        .collect();
    assert!(
        !matches!(task.goal, Condition::Disjunction(_)),
        "Disjunctive goals must have been replaced by axioms"
    );
}

/// Groups existential quantifiers and pulls them out of conjunctions.
fn pull_existentials(condition: &Condition) -> Condition {
    let mut existential_parts = vec![];
    let mut other_parts = vec![];
    for part in condition.parts() {
        match pull_existentials(part) {
            Condition::Existential(parameters, part) => existential_parts.push((parameters, *part)),
            part => other_parts.push(part),
        }
    }
    if existential_parts.is_empty() {
        return condition.change_parts(other_parts);
    }
    match condition {
        Condition::Existential(parameters, _) => {
            let (inner_parameters, part) = existential_parts.swap_remove(0);
            let mut parameters = parameters.clone();
            parameters.extend(inner_parameters);
            Condition::Existential(parameters, Box::new(part))
        }
        Condition::Conjunction(_) => {
            let mut parameters = vec![];
            let mut parts = other_parts;
            for (inner_parameters, part) in existential_parts {
                parameters.extend(inner_parameters);
                parts.push(part);
            }
            Condition::Existential(parameters, Box::new(Condition::Conjunction(parts)))
        }
        other => panic!("Unexpected condition when moving quantifiers: {:?}", other),
    }
}

fn move_existential_quantifiers(task: &mut Task) {
    for_each_condition_mut(task, |condition| {
        if condition.has_existential_part() {
            *condition = pull_existentials(condition).simplified();
        }
    });
}

/// Existential variables of axiom bodies and preconditions become extra
/// parameters, those of effect conditions become effect parameters.
fn eliminate_existential_quantifiers(task: &mut Task) {
    fn take_existential(condition: &mut Condition) -> Vec<TypedObject> {
        match std::mem::replace(condition, Condition::Truth) {
            Condition::Existential(parameters, part) => {
                *condition = *part;
                parameters
            }
            other => {
                *condition = other;
                vec![]
            }
        }
    }

    for axiom in &mut task.axioms {
        let parameters = take_existential(&mut axiom.condition);
        axiom.parameters.extend(parameters);
    }
    for action in &mut task.actions {
        let parameters = take_existential(&mut action.precondition);
        action.parameters.extend(parameters);
        for effect in &mut action.effects {
            let parameters = take_existential(&mut effect.condition);
            effect.parameters.extend(parameters);
        }
    }
}

/// Derived predicates must not be initialised or changed by actions.
fn verify_axiom_predicates(task: &Task) -> Result<()> {
    let axiom_names = task.axioms.iter().map(|a| a.name).collect::<HashSet<_>>();
    if let Some(fact) = task.init.iter().find(|f| axiom_names.contains(&f.predicate)) {
        return Err(TranslateError::DerivedPredicateMisuse {
            predicate: fact.predicate,
            location: format!(":init fact {}", fact),
        });
    }
    for action in &task.actions {
        if let Some(effect) = action
            .effects
            .iter()
            .find(|e| axiom_names.contains(&e.literal.atom.predicate))
        {
            return Err(TranslateError::DerivedPredicateMisuse {
                predicate: effect.literal.atom.predicate,
                location: format!("an effect of action {}", action.name),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::translate::task::Literal;

    fn normalized(domain: &str, problem: &str) -> Task {
        let mut task = Task::from_text(domain, problem).unwrap();
        let mut names = NameGenerator::new(NEW_AXIOM_PREFIX);
        normalize(&mut task, &mut names).unwrap();
        task
    }

    fn is_flat(condition: &Condition) -> bool {
        match condition {
            Condition::Truth | Condition::Falsity | Condition::Literal(_) => true,
            Condition::Conjunction(parts) => parts
                .iter()
                .all(|p| matches!(p, Condition::Literal(_) | Condition::Falsity)),
            _ => false,
        }
    }

    #[test]
    fn adl_conditions_become_flat() {
        let task = normalized(ADL_DOMAIN_TEXT, ADL_PROBLEM_TEXT);
        for action in &task.actions {
            assert!(is_flat(&action.precondition), "{:?}", action.precondition);
            for effect in &action.effects {
                assert!(is_flat(&effect.condition), "{:?}", effect.condition);
            }
        }
        for axiom in &task.axioms {
            assert!(is_flat(&axiom.condition), "{:?}", axiom.condition);
        }
        assert!(is_flat(&task.goal));
    }

    #[test]
    fn universal_precondition_becomes_negated_axiom() {
        let mut task = Task::from_text(ADL_DOMAIN_TEXT, ADL_PROBLEM_TEXT).unwrap();
        let axioms_before = task.axioms.len();
        let mut names = NameGenerator::new(NEW_AXIOM_PREFIX);
        remove_universal_quantifiers(&mut task, &mut names);
        assert!(task.axioms.len() > axioms_before);
        assert!(task
            .axioms
            .iter()
            .any(|a| a.name.starts_with(NEW_AXIOM_PREFIX)));
        for action in &task.actions {
            assert!(!action.precondition.has_universal_part());
        }
    }

    #[test]
    fn disjunctive_preconditions_split_actions() {
        let mut task = Task::from_text(ADL_DOMAIN_TEXT, ADL_PROBLEM_TEXT).unwrap();
        let p = Condition::atom(Atom::new(Name::new("p"), vec![]));
        let q = Condition::atom(Atom::new(Name::new("q"), vec![]));
        let mut action = task.actions[0].clone();
        action.precondition = Condition::Disjunction(vec![p.clone(), q.clone()]);
        task.actions = vec![action];
        split_disjunctions(&mut task);
        assert_eq!(task.actions.len(), 2);
        assert_eq!(task.actions[0].precondition, p);
        assert_eq!(task.actions[1].precondition, q);
    }

    #[test]
    fn dnf_distributes_conjunctions() {
        let lit = |n: &str| Condition::atom(Atom::new(Name::new(n), vec![]));
        let condition = Condition::Conjunction(vec![
            lit("a"),
            Condition::Disjunction(vec![lit("b"), lit("c")]),
        ]);
        let dnf = to_dnf(&condition).simplified();
        assert_eq!(
            dnf,
            Condition::Disjunction(vec![
                Condition::Conjunction(vec![lit("a"), lit("b")]),
                Condition::Conjunction(vec![lit("a"), lit("c")]),
            ])
        );
    }

    #[test]
    fn existential_preconditions_become_parameters() {
        let x = TypedObject::new(Name::new("?x"), Name::new("object"));
        let y = TypedObject::new(Name::new("?y"), Name::new("object"));
        let atom = |n: &str, v: &str| Condition::atom(Atom::new(Name::new(n), vec![Name::new(v)]));
        let condition = Condition::Conjunction(vec![
            Condition::Existential(vec![x.clone()], Box::new(atom("p", "?x"))),
            Condition::Existential(vec![y.clone()], Box::new(atom("q", "?y"))),
        ]);
        let pulled = pull_existentials(&condition).simplified();
        assert_eq!(
            pulled,
            Condition::Existential(
                vec![x, y],
                Box::new(Condition::Conjunction(vec![atom("p", "?x"), atom("q", "?y")]))
            )
        );
    }

    #[test]
    fn complicated_goal_becomes_axiom() {
        let mut task = Task::from_text(GRIPPER_DOMAIN_TEXT, GRIPPER_PROBLEM_TEXT).unwrap();
        let lit = |n: &str| Condition::atom(Atom::new(Name::new(n), vec![]));
        task.goal = Condition::Disjunction(vec![lit("a"), lit("b")]);
        let mut names = NameGenerator::new(NEW_AXIOM_PREFIX);
        substitute_complicated_goal(&mut task, &mut names);
        assert_eq!(
            task.goal,
            Condition::Literal(Literal::positive(Atom::new(
                Name::new("new-axiom@0"),
                vec![]
            )))
        );
        assert_eq!(task.axioms.len(), 1);
    }

    #[test]
    fn strips_goal_is_kept() {
        let task = normalized(GRIPPER_DOMAIN_TEXT, GRIPPER_PROBLEM_TEXT);
        assert!(task.axioms.is_empty());
        assert!(matches!(task.goal, Condition::Conjunction(_)));
    }
}
