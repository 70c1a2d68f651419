//! Partitions the reachable facts into the value sets of SAS variables.

use crate::parsed_types::Name;
use crate::translate::invariants::{get_groups, COUNTED_ARGUMENT};
use crate::translate::options::TranslateOptions;
use crate::translate::task::{Atom, Task};
use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use tracing::info;

/// Value name of the extra value of each variable.
pub const NONE_OF_THOSE: &str = "<none of those>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactGroups {
    /// The facts of every SAS variable, in value order.
    pub groups: Vec<Vec<Atom>>,
    /// Every mutex group, possibly overlapping, plus singletons for the
    /// facts no group covers.
    pub mutex_groups: Vec<Vec<Atom>>,
    /// The value names of every variable.
    pub translation_key: Vec<Vec<String>>,
}

/// Replaces the counted argument of each fact by every object, keeping only
/// reachable atoms.
fn expand_group(group: &[Atom], objects: &[Name], reachable_facts: &BTreeSet<Atom>) -> Vec<Atom> {
    let mut result = vec![];
    for fact in group {
        match fact.args.iter().position(|arg| *arg == COUNTED_ARGUMENT) {
            Some(position) => result.extend(
                objects
                    .iter()
                    .map(|object| fact.replace_argument(position, *object))
                    .filter(|atom| reachable_facts.contains(atom)),
            ),
            None if reachable_facts.contains(fact) => result.push(fact.clone()),
            None => {}
        }
    }
    result
}

pub fn instantiate_groups(groups: &[Vec<Atom>], task: &Task, reachable_facts: &BTreeSet<Atom>) -> Vec<Vec<Atom>> {
    let objects = task.objects.iter().map(|object| object.name).collect::<Vec<_>>();
    groups
        .iter()
        .map(|group| expand_group(group, &objects, reachable_facts))
        .collect()
}

/// Greedy set cover over fact groups: always takes the largest group that
/// is left. With a partial encoding, taking a group removes its facts from
/// all other groups.
#[derive(Debug)]
struct GroupCoverQueue<'a> {
    partial_encoding: bool,
    groups: &'a [Vec<Atom>],
    /// Whether each fact of each group is still uncovered.
    live: Vec<Vec<bool>>,
    /// `(group, position)` of every occurrence of a fact.
    occurrences: HashMap<&'a Atom, Vec<(usize, usize)>>,
    /// Groups by live size; ties go to the earlier group.
    queue: PriorityQueue<usize, (usize, Reverse<usize>)>,
}

impl<'a> GroupCoverQueue<'a> {
    fn new(groups: &'a [Vec<Atom>], partial_encoding: bool) -> Self {
        let mut occurrences: HashMap<&Atom, Vec<(usize, usize)>> = HashMap::new();
        let mut queue = PriorityQueue::with_capacity(groups.len());
        for (index, group) in groups.iter().enumerate() {
            for (position, fact) in group.iter().enumerate() {
                occurrences.entry(fact).or_default().push((index, position));
            }
            queue.push(index, (group.len(), Reverse(index)));
        }
        Self {
            partial_encoding,
            groups,
            live: groups.iter().map(|group| vec![true; group.len()]).collect(),
            occurrences,
            queue,
        }
    }

    fn live_facts(&self, group: usize) -> Vec<Atom> {
        self.groups[group]
            .iter()
            .zip(&self.live[group])
            .filter(|(_, live)| **live)
            .map(|(fact, _)| fact.clone())
            .collect()
    }

    /// The largest remaining group, if it has more than one fact.
    fn pop(&mut self) -> Option<Vec<Atom>> {
        let (_, (size, _)) = self.queue.peek()?;
        if *size <= 1 {
            return None;
        }
        let (group, _) = self.queue.pop()?;
        let result = self.live_facts(group);
        if self.partial_encoding {
            for fact in &result {
                for (other, position) in &self.occurrences[fact] {
                    if !std::mem::replace(&mut self.live[*other][*position], false) {
                        continue;
                    }
                    self.queue
                        .change_priority_by(other, |(size, _)| *size -= 1);
                }
            }
        }
        Some(result)
    }
}

pub fn choose_groups(groups: &[Vec<Atom>], reachable_facts: &BTreeSet<Atom>, partial_encoding: bool) -> Vec<Vec<Atom>> {
    let mut queue = GroupCoverQueue::new(groups, partial_encoding);
    let mut uncovered_facts = reachable_facts.clone();
    let mut result = vec![];
    while let Some(group) = queue.pop() {
        for fact in &group {
            uncovered_facts.remove(fact);
        }
        result.push(group);
    }
    info!(uncovered = uncovered_facts.len(), "chose fact groups");
    result.extend(uncovered_facts.into_iter().map(|fact| vec![fact]));
    result
}

pub fn collect_all_mutex_groups(groups: &[Vec<Atom>], atoms: &BTreeSet<Atom>) -> Vec<Vec<Atom>> {
    let mut uncovered_facts = atoms.clone();
    for fact in groups.iter().flatten() {
        uncovered_facts.remove(fact);
    }
    let mut result = groups.to_vec();
    result.extend(uncovered_facts.into_iter().map(|fact| vec![fact]));
    result
}

pub fn build_translation_key(groups: &[Vec<Atom>]) -> Vec<Vec<String>> {
    groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|fact| format!("Atom {}", fact))
                .chain(std::iter::once(NONE_OF_THOSE.to_string()))
                .collect()
        })
        .collect()
}

pub fn compute_groups(
    task: &Task,
    atoms: &BTreeSet<Atom>,
    reachable_action_parameters: &HashMap<usize, Vec<Vec<Name>>>,
    options: &TranslateOptions,
) -> FactGroups {
    let reachable_action_parameters = options
        .use_reachable_action_params
        .then_some(reachable_action_parameters);
    let groups = get_groups(task, reachable_action_parameters, options);
    let groups = instantiate_groups(&groups, task, atoms);
    let mutex_groups = collect_all_mutex_groups(&groups, atoms);
    let groups = choose_groups(&groups, atoms, options.partial_encoding);
    let translation_key = build_translation_key(&groups);
    FactGroups {
        groups,
        mutex_groups,
        translation_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::translate::instantiate::explore;
    use crate::translate::normalize::{normalize, NEW_AXIOM_PREFIX};
    use crate::translate::task::NameGenerator;

    fn atom(predicate: &str, args: &[&str]) -> Atom {
        Atom::new(
            Name::new(predicate),
            args.iter().map(|a| Name::new(a)).collect::<Vec<_>>(),
        )
    }

    fn facts(atoms: &[Atom]) -> BTreeSet<Atom> {
        atoms.iter().cloned().collect()
    }

    #[test]
    fn counted_argument_expands_to_reachable_atoms() {
        let reachable = facts(&[atom("at", &["b", "r1"]), atom("at", &["b", "r2"])]);
        let objects = [Name::new("b"), Name::new("r1"), Name::new("r2"), Name::new("r3")];
        let expanded = expand_group(&[atom("at", &["b", "?X"])], &objects, &reachable);
        assert_eq!(expanded, vec![atom("at", &["b", "r1"]), atom("at", &["b", "r2"])]);
    }

    #[test]
    fn partial_encoding_partitions_the_facts() {
        let (a, b, c, d) = (atom("a", &[]), atom("b", &[]), atom("c", &[]), atom("d", &[]));
        let groups = vec![vec![a.clone(), b.clone()], vec![b.clone(), c.clone(), d.clone()]];
        let reachable = facts(&[a.clone(), b.clone(), c.clone(), d.clone(), atom("e", &[])]);
        let chosen = choose_groups(&groups, &reachable, true);
        assert_eq!(
            chosen,
            vec![
                vec![b.clone(), c.clone(), d.clone()],
                vec![a.clone()],
                vec![atom("e", &[])],
            ]
        );

        // without a partial encoding the second group keeps its overlap
        let chosen = choose_groups(&groups, &reachable, false);
        assert_eq!(chosen[0], vec![b.clone(), c, d]);
        assert_eq!(chosen[1], vec![a, b]);
    }

    #[test]
    fn mutex_groups_keep_overlaps() {
        let (a, b, c) = (atom("a", &[]), atom("b", &[]), atom("c", &[]));
        let groups = vec![vec![a.clone(), b.clone()], vec![b.clone(), c.clone()]];
        let all = collect_all_mutex_groups(&groups, &facts(&[a.clone(), b.clone(), c.clone(), atom("d", &[])]));
        assert_eq!(all.len(), 3);
        assert_eq!(all[2], vec![atom("d", &[])]);
    }

    #[test]
    fn translation_key_ends_with_none_of_those() {
        let key = build_translation_key(&[vec![atom("at", &["b", "r1"])]]);
        assert_eq!(key, vec![vec!["Atom at(b, r1)".to_string(), NONE_OF_THOSE.to_string()]]);
    }

    #[test]
    fn one_group_per_object() {
        let mut task = Task::from_text(AT_DOMAIN_TEXT, AT_PROBLEM_TEXT).unwrap();
        normalize(&mut task, &mut NameGenerator::new(NEW_AXIOM_PREFIX)).unwrap();
        let result = explore(&task);
        let groups = compute_groups(
            &task,
            &result.fluent_facts,
            &result.reachable_action_parameters,
            &TranslateOptions::default(),
        );
        let at_groups = groups
            .groups
            .iter()
            .filter(|group| group.len() > 1)
            .collect::<Vec<_>>();
        assert_eq!(at_groups.len(), 2);
        for group in at_groups {
            let object = group[0].args[0];
            assert!(group.iter().all(|fact| fact.args[0] == object));
        }
    }

    #[test]
    fn gripper_groups_partition_the_reachable_facts() {
        let mut task = Task::from_text(GRIPPER_DOMAIN_TEXT, GRIPPER_PROBLEM_TEXT).unwrap();
        normalize(&mut task, &mut NameGenerator::new(NEW_AXIOM_PREFIX)).unwrap();
        let result = explore(&task);
        let groups = compute_groups(
            &task,
            &result.fluent_facts,
            &result.reachable_action_parameters,
            &TranslateOptions::default(),
        );
        let covered = groups.groups.iter().flatten().cloned().collect::<Vec<_>>();
        let unique = covered.iter().cloned().collect::<BTreeSet<_>>();
        assert_eq!(covered.len(), unique.len());
        assert_eq!(unique, result.fluent_facts);
        assert!(groups
            .groups
            .iter()
            .any(|group| group.contains(&atom("at-robby", &["rooma"])) && group.len() == 2));
        assert_eq!(groups.translation_key.len(), groups.groups.len());
    }
}
