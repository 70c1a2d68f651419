use crate::parsed_types::Name;
use crate::translate::invariants::{Invariant, InvariantPart};
use crate::translate::options::TranslateOptions;
use crate::translate::task::{Action, Atom, Condition, Effect, Literal, Task};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::time::Instant;
use tracing::{debug, info, warn};

const EQUALITY: &str = "=";

/// The actions of a normalized task, prepared for balance checks.
#[derive(Debug)]
pub struct BalanceChecker {
    actions: Vec<Action>,
    /// The actions with every universal effect duplicated, so that two
    /// instances of one effect can be checked against each other.
    heavy_actions: Vec<Action>,
    add_actions_by_predicate: HashMap<Name, BTreeSet<usize>>,
}

impl BalanceChecker {
    /// Without `reachable_action_parameters`, no inequality preconditions
    /// are added.
    pub fn new(task: &Task, reachable_action_parameters: Option<&HashMap<usize, Vec<Vec<Name>>>>) -> Self {
        let mut add_actions_by_predicate: HashMap<Name, BTreeSet<usize>> = HashMap::new();
        let mut actions = vec![];
        let mut heavy_actions = vec![];
        for (index, action) in task.actions.iter().enumerate() {
            let action = match reachable_action_parameters {
                Some(parameters) => add_inequality_preconditions(
                    action,
                    parameters.get(&index).map_or(&[][..], Vec::as_slice),
                ),
                None => action.clone(),
            };
            for effect in action.effects.iter().filter(|e| !e.literal.negated) {
                add_actions_by_predicate
                    .entry(effect.literal.atom.predicate)
                    .or_default()
                    .insert(index);
            }
            heavy_actions.push(heavy_action(&action));
            actions.push(action);
        }
        Self {
            actions,
            heavy_actions,
            add_actions_by_predicate,
        }
    }

    /// Indices of the actions that add atoms of `predicate`.
    pub fn threats(&self, predicate: Name) -> impl Iterator<Item = usize> + '_ {
        self.add_actions_by_predicate
            .get(&predicate)
            .into_iter()
            .flatten()
            .copied()
    }

    pub fn action(&self, index: usize) -> &Action {
        &self.actions[index]
    }

    pub fn heavy_action(&self, index: usize) -> &Action {
        &self.heavy_actions[index]
    }
}

fn heavy_action(action: &Action) -> Action {
    if action.effects.iter().all(|effect| effect.parameters.is_empty()) {
        return action.clone();
    }
    let effects = action
        .effects
        .iter()
        .flat_map(|effect| {
            let copies = if effect.parameters.is_empty() { 1 } else { 2 };
            std::iter::repeat(effect).take(copies).cloned()
        })
        .collect::<Vec<Effect>>();
    // Construction gives the copies fresh variable names.
    let mut heavy = Action::new(
        action.name,
        action.parameters.clone(),
        action.precondition.clone(),
        effects,
        action.cost.clone(),
    );
    heavy.num_external_parameters = action.num_external_parameters;
    heavy
}

/// Adds `?a != ?b` to the precondition for every pair of parameters that no
/// reachable instantiation binds to the same object.
fn add_inequality_preconditions(action: &Action, reachable_parameters: &[Vec<Name>]) -> Action {
    if action.parameters.len() < 2 {
        return action.clone();
    }
    let inequalities = (0..action.parameters.len())
        .tuple_combinations()
        .filter(|(first, second)| {
            reachable_parameters
                .iter()
                .all(|parameters| parameters[*first] != parameters[*second])
        })
        .map(|(first, second)| {
            Condition::Literal(Literal::negative(Atom::new(
                Name::new(EQUALITY),
                vec![action.parameters[first].name, action.parameters[second].name],
            )))
        })
        .collect_vec();
    if inequalities.is_empty() {
        return action.clone();
    }
    let mut parts = vec![action.precondition.clone()];
    parts.extend(inequalities);
    Action {
        precondition: Condition::Conjunction(parts).simplified(),
        ..action.clone()
    }
}

/// Fluent predicates are those some action effect mentions.
fn fluent_predicates(task: &Task) -> HashSet<Name> {
    task.actions
        .iter()
        .flat_map(|action| &action.effects)
        .map(|effect| effect.literal.atom.predicate)
        .collect()
}

/// For every fluent predicate and every choice of counted argument
/// (including none), the invariant with a single part for it.
fn initial_invariants(task: &Task) -> Vec<Invariant> {
    let fluents = fluent_predicates(task);
    let mut result = vec![];
    for predicate in task.predicates.iter().filter(|p| fluents.contains(&p.name)) {
        let positions = 0..predicate.arguments.len();
        for omitted in std::iter::once(None).chain(positions.clone().map(Some)) {
            let order = positions.clone().filter(|p| Some(*p) != omitted).collect();
            result.push(Invariant::new(BTreeSet::from([InvariantPart::new(
                predicate.name,
                order,
                omitted,
            )])));
        }
    }
    result
}

/// Breadth-first search for balanced invariants. Stops early, keeping what
/// it found so far, once the candidate or time limit is hit. The result is
/// sorted.
pub fn find_invariants(task: &Task, balance_checker: &BalanceChecker, options: &TranslateOptions) -> Vec<Invariant> {
    let mut candidates = VecDeque::from(initial_invariants(task));
    info!(candidates = candidates.len(), "initial invariant candidates");
    let mut seen = candidates.iter().cloned().collect::<HashSet<_>>();
    let mut candidate_limit_reached = false;

    let start_time = Instant::now();
    let mut invariants = vec![];
    while let Some(candidate) = candidates.pop_front() {
        if start_time.elapsed() > options.invariant_max_time {
            warn!(
                time_limit = options.invariant_max_time.as_secs_f64(),
                invariants = invariants.len(),
                "time limit reached, aborting invariant generation"
            );
            break;
        }
        let mut enqueue = |invariant: Invariant| {
            if seen.contains(&invariant) {
                return;
            }
            if seen.len() >= options.invariant_max_candidates {
                if !candidate_limit_reached {
                    candidate_limit_reached = true;
                    warn!(
                        max_candidates = options.invariant_max_candidates,
                        "candidate limit reached, no further invariant candidates are queued"
                    );
                }
                return;
            }
            seen.insert(invariant.clone());
            candidates.push_back(invariant);
        };
        if candidate.check_balance(balance_checker, &mut enqueue) {
            debug!(%candidate, "found invariant");
            invariants.push(candidate);
        }
    }
    invariants.sort();
    info!(
        invariants = invariants.len(),
        candidates = seen.len(),
        time = start_time.elapsed().as_secs_f64(),
        "finished invariant search"
    );
    invariants
}

/// Instantiates the invariants for every parameter binding that has exactly
/// one true fact in `initial_facts`. Bindings with several initial facts
/// cannot become state variables.
pub fn useful_groups(invariants: &[Invariant], initial_facts: &[Atom]) -> Vec<Vec<Atom>> {
    let mut invariants_by_predicate: HashMap<Name, Vec<usize>> = HashMap::new();
    for (index, invariant) in invariants.iter().enumerate() {
        for predicate in invariant.predicates() {
            invariants_by_predicate.entry(predicate).or_default().push(index);
        }
    }

    // (invariant, parameters) -> overcrowded
    let mut groups: BTreeMap<(usize, Vec<Name>), bool> = BTreeMap::new();
    for atom in initial_facts {
        for index in invariants_by_predicate.get(&atom.predicate).into_iter().flatten() {
            let Some(parameters) = invariants[*index].get_parameters(atom) else {
                continue;
            };
            groups
                .entry((*index, parameters))
                .and_modify(|overcrowded| *overcrowded = true)
                .or_insert(false);
        }
    }
    groups
        .into_iter()
        .filter(|(_, overcrowded)| !overcrowded)
        .map(|((index, parameters), _)| invariants[index].instantiate(&parameters))
        .collect()
}

/// The mutex groups of `task`, with the counted argument left as a
/// placeholder.
pub fn get_groups(
    task: &Task,
    reachable_action_parameters: Option<&HashMap<usize, Vec<Vec<Name>>>>,
    options: &TranslateOptions,
) -> Vec<Vec<Atom>> {
    let balance_checker = BalanceChecker::new(task, reachable_action_parameters);
    let invariants = find_invariants(task, &balance_checker, options);
    let groups = useful_groups(&invariants, &task.init);
    info!(groups = groups.len(), "instantiated useful invariant groups");
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::translate::instantiate::explore;
    use crate::translate::normalize::{normalize, NEW_AXIOM_PREFIX};
    use crate::translate::task::NameGenerator;
    use std::time::Duration;

    fn normalized(domain: &str, problem: &str) -> Task {
        let mut task = Task::from_text(domain, problem).unwrap();
        normalize(&mut task, &mut NameGenerator::new(NEW_AXIOM_PREFIX)).unwrap();
        task
    }

    fn part(predicate: &str, order: Vec<usize>, omitted: Option<usize>) -> InvariantPart {
        InvariantPart::new(Name::new(predicate), order, omitted)
    }

    #[test]
    fn seeds_cover_every_counted_position() {
        let task = normalized(GRIPPER_DOMAIN_TEXT, GRIPPER_PROBLEM_TEXT);
        let seeds = initial_invariants(&task);
        // at-robby/1, at/2, free/1, carry/2: (1 + 1) + (1 + 2) + (1 + 1) + (1 + 2)
        assert_eq!(seeds.len(), 10);
        assert!(seeds.contains(&Invariant::new(BTreeSet::from([part(
            "at",
            vec![0],
            Some(1)
        )]))));
    }

    #[test]
    fn single_object_location_invariant() {
        let task = normalized(AT_DOMAIN_TEXT, AT_PROBLEM_TEXT);
        let checker = BalanceChecker::new(&task, None);
        let invariants = find_invariants(&task, &checker, &TranslateOptions::default());
        let expected = Invariant::new(BTreeSet::from([part("at", vec![0], Some(1))]));
        assert!(invariants.contains(&expected), "{:?}", invariants);
        // counting objects at a location is not invariant
        let location = Invariant::new(BTreeSet::from([part("at", vec![1], Some(0))]));
        assert!(!invariants.contains(&location));
    }

    #[test]
    fn gripper_finds_ball_and_robot_invariants() {
        let task = normalized(GRIPPER_DOMAIN_TEXT, GRIPPER_PROBLEM_TEXT);
        let result = explore(&task);
        let checker = BalanceChecker::new(&task, Some(&result.reachable_action_parameters));
        let invariants = find_invariants(&task, &checker, &TranslateOptions::default());
        let robot = Invariant::new(BTreeSet::from([part("at-robby", vec![], Some(0))]));
        let ball = Invariant::new(BTreeSet::from([
            part("at", vec![0], Some(1)),
            part("carry", vec![0], Some(1)),
        ]));
        assert!(invariants.contains(&robot), "{:?}", invariants);
        assert!(invariants.contains(&ball), "{:?}", invariants);
        let mut sorted = invariants.clone();
        sorted.sort();
        assert_eq!(sorted, invariants);
    }

    #[test]
    fn inequality_preconditions_follow_reachable_parameters() {
        let task = normalized(GRIPPER_DOMAIN_TEXT, GRIPPER_PROBLEM_TEXT);
        let move_index = task
            .actions
            .iter()
            .position(|a| a.name == Name::new("move"))
            .unwrap();
        let reachable = vec![
            vec![Name::new("rooma"), Name::new("roomb")],
            vec![Name::new("roomb"), Name::new("rooma")],
        ];
        let action = add_inequality_preconditions(&task.actions[move_index], &reachable);
        let literals = action.precondition.literals().unwrap();
        assert!(literals
            .iter()
            .any(|l| l.negated && l.atom.predicate == Name::new(EQUALITY)));

        let reachable = vec![vec![Name::new("rooma"), Name::new("rooma")]];
        let action = add_inequality_preconditions(&task.actions[move_index], &reachable);
        assert_eq!(action.precondition, task.actions[move_index].precondition);
    }

    #[test]
    fn universal_effects_are_duplicated_in_heavy_actions() {
        let task = normalized(ADL_DOMAIN_TEXT, ADL_PROBLEM_TEXT);
        for action in &task.actions {
            let heavy = heavy_action(action);
            let universal = action.effects.iter().filter(|e| !e.parameters.is_empty()).count();
            assert_eq!(heavy.effects.len(), action.effects.len() + universal);
            assert_eq!(heavy.num_external_parameters, action.num_external_parameters);
        }
    }

    #[test]
    fn overcrowded_groups_are_useless() {
        let invariant = Invariant::new(BTreeSet::from([part("at", vec![0], Some(1))]));
        let atom = |args: [&str; 2]| Atom::new(Name::new("at"), args.map(Name::new).to_vec());
        let init = vec![atom(["b1", "r1"]), atom(["b2", "r1"]), atom(["b2", "r2"])];
        let groups = useful_groups(&[invariant], &init);
        assert_eq!(groups, vec![vec![atom(["b1", "?X"])]]);
    }

    #[test]
    fn candidate_limit_stops_the_search() {
        let task = normalized(CANDIDATE_CAP_DOMAIN_TEXT, CANDIDATE_CAP_PROBLEM_TEXT);
        let options = TranslateOptions {
            invariant_max_candidates: 50,
            invariant_max_time: Duration::from_secs(60),
            ..TranslateOptions::default()
        };
        let checker = BalanceChecker::new(&task, None);
        let invariants = find_invariants(&task, &checker, &options);
        assert!(!invariants.is_empty());
    }
}
