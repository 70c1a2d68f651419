//! Encodes the grounded task in terms of the chosen fact groups.

use crate::translate::axiom_rules::handle_axioms;
use crate::translate::fact_groups::FactGroups;
use crate::translate::sas::{
    PrePost, SasAxiom, SasFact, SasGoal, SasInit, SasMutexGroup, SasOperator, SasTask,
    SasVariables,
};
use crate::translate::task::{Atom, Literal, PropositionalAction, PropositionalAxiom};
use crate::translate::{Result, TranslateError};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Condition on variables, each allowed to take one of a set of values.
type ValueSets = BTreeMap<usize, BTreeSet<usize>>;
/// Condition assigning one value to each variable.
type Assignment = BTreeMap<usize, usize>;

/// Maps every fact to the `(variable, value)` pairs of the groups that
/// contain it.
#[derive(Debug, Clone)]
struct FactEncoding {
    ranges: Vec<usize>,
    dictionary: HashMap<Atom, Vec<SasFact>>,
}

impl FactEncoding {
    /// Each group becomes a variable with one value per fact plus one for
    /// none of them. With `assert_partial`, no fact may be in two groups.
    fn new(groups: &[Vec<Atom>], assert_partial: bool) -> Self {
        let mut dictionary: HashMap<Atom, Vec<SasFact>> = HashMap::new();
        for (var, group) in groups.iter().enumerate() {
            for (value, atom) in group.iter().enumerate() {
                dictionary.entry(atom.clone()).or_default().push((var, value));
            }
        }
        if assert_partial {
            assert!(
                dictionary.values().all(|pairs| pairs.len() == 1),
                "fact groups overlap in a partial encoding"
            );
        }
        Self {
            ranges: groups.iter().map(|group| group.len() + 1).collect(),
            dictionary,
        }
    }

    /// Pairs of `atom`, empty for static facts.
    fn pairs(&self, atom: &Atom) -> &[SasFact] {
        self.dictionary.get(atom).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The single variable of a fact that must be encoded.
    fn single_pair(&self, atom: &Atom) -> SasFact {
        match self.pairs(atom) {
            [pair] => *pair,
            pairs => panic!("{} is encoded by {:?} instead of one variable", atom, pairs),
        }
    }

    /// Translates a conjunction of literals into a disjunction of value
    /// assignments, or `None` if the literals contradict each other.
    ///
    /// A negative literal becomes a choice among the other values of one of
    /// its variables. If a positive literal already constrains such a
    /// variable, the choice is folded into that constraint instead.
    fn translate_conditions(&self, conditions: &[Literal]) -> Option<Vec<Assignment>> {
        let mut condition = ValueSets::new();
        for fact in conditions.iter().filter(|fact| !fact.negated) {
            for &(var, value) in self.pairs(&fact.atom) {
                if condition.get(&var).is_some_and(|values| !values.contains(&value)) {
                    return None;
                }
                condition.insert(var, BTreeSet::from([value]));
            }
        }

        for fact in conditions.iter().filter(|fact| fact.negated) {
            let mut done = false;
            let mut new_condition = ValueSets::new();
            for &(var, value) in self.pairs(&fact.atom) {
                let mut possible_values = (0..self.ranges[var]).collect::<BTreeSet<_>>();
                possible_values.remove(&value);
                match condition.get_mut(&var) {
                    None => {
                        new_condition.insert(var, possible_values);
                    }
                    Some(previous_values) => {
                        done = true;
                        previous_values.retain(|value| possible_values.contains(value));
                        if previous_values.is_empty() {
                            return None;
                        }
                    }
                }
            }
            if !done {
                if let Some((var, values)) = new_condition
                    .into_iter()
                    .min_by_key(|(_, values)| values.len())
                {
                    condition.insert(var, values);
                }
            }
        }
        Some(multiply_out(condition))
    }
}

/// Expands a condition with value sets into all its assignments.
fn multiply_out(condition: ValueSets) -> Vec<Assignment> {
    let mut sorted_conditions = condition.into_iter().collect::<Vec<_>>();
    sorted_conditions.sort_by_key(|(var, values)| (values.len(), *var));
    let mut flat_conditions = vec![Assignment::new()];
    for (var, values) in sorted_conditions {
        flat_conditions = flat_conditions
            .into_iter()
            .flat_map(|assignment| {
                values.iter().map(move |value| {
                    let mut assignment = assignment.clone();
                    assignment.insert(var, *value);
                    assignment
                })
            })
            .collect();
    }
    flat_conditions
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    removed_implied_effects: usize,
    simplified_effect_conditions: usize,
}

/// The encoding of the chosen variables together with the one of all
/// mutex groups, against which conditions are checked first.
#[derive(Debug)]
struct SasEncoder {
    variables: FactEncoding,
    mutexes: FactEncoding,
    counters: Counters,
}

impl SasEncoder {
    fn translate_conditions(&self, conditions: &[Literal]) -> Option<Vec<Assignment>> {
        if conditions.is_empty() {
            return Some(vec![Assignment::new()]);
        }
        self.mutexes.translate_conditions(conditions)?;
        self.variables.translate_conditions(conditions)
    }

    fn translate_operator(&mut self, action: &PropositionalAction) -> Vec<SasOperator> {
        let Some(conditions) = self.translate_conditions(&action.precondition) else {
            return vec![];
        };
        conditions
            .into_iter()
            .filter_map(|condition| self.translate_operator_with(action, condition))
            .collect()
    }

    fn translate_operator_with(
        &mut self,
        action: &PropositionalAction,
        mut condition: Assignment,
    ) -> Option<SasOperator> {
        let mut possible_add_conflict = false;
        let mut effect: BTreeMap<usize, (usize, Vec<Vec<SasFact>>)> = BTreeMap::new();

        for (conditions, fact) in &action.add_effects {
            let Some(effect_conditions) = self.translate_conditions(conditions) else {
                continue;
            };
            let effect_condition = effect_conditions
                .into_iter()
                .map(|assignment| assignment.into_iter().collect::<Vec<_>>())
                .collect::<Vec<_>>();
            for &(var, value) in self.variables.pairs(fact) {
                if condition.get(&var) == Some(&value) {
                    self.counters.removed_implied_effects += 1;
                    continue;
                }
                match effect.get_mut(&var) {
                    None => {
                        effect.insert(var, (value, effect_condition.clone()));
                    }
                    Some((other_value, other_conditions)) => {
                        // deletes may still turn this into a rejected operator
                        possible_add_conflict |= *other_value != value;
                        other_conditions.extend(effect_condition.iter().cloned());
                    }
                }
            }
        }

        for (conditions, fact) in &action.del_effects {
            let Some(effect_conditions) = self.translate_conditions(conditions) else {
                continue;
            };
            let mut effect_condition = effect_conditions
                .iter()
                .map(|assignment| assignment.iter().map(|(var, value)| (*var, *value)).collect::<Vec<_>>())
                .collect::<Vec<_>>();
            for &(var, value) in self.variables.pairs(fact) {
                let none_of_those = self.variables.ranges[var] - 1;
                let (other_value, other_conditions) =
                    effect.entry(var).or_insert((none_of_those, vec![]));

                if *other_value != none_of_those {
                    for guard in &effect_condition {
                        assert!(
                            other_conditions.contains(guard) || other_conditions.contains(&vec![]),
                            "Add effect with uncertain del effect partner? {}",
                            action
                        );
                    }
                    if *other_value == value {
                        // the add wins, but only if it changes nothing
                        if condition.get(&var) != Some(&value) {
                            warn!(operator = %action.name, "rejecting operator with conflicting add and delete effects");
                            return None;
                        }
                        assert_eq!(*other_conditions, vec![vec![]]);
                        effect.remove(&var);
                    }
                } else if condition.get(&var) != Some(&value) {
                    if condition.contains_key(&var) {
                        // a precondition on another value makes the delete redundant
                        effect.remove(&var);
                        continue;
                    }
                    for (index, assignment) in effect_conditions.iter().enumerate() {
                        if assignment.get(&var) != Some(&value) {
                            // the delete only fires if the fact actually holds
                            effect_condition[index].push((var, value));
                        }
                    }
                    other_conditions.extend(effect_condition.iter().cloned());
                } else {
                    other_conditions.extend(effect_condition.iter().cloned());
                }
            }
        }

        assert!(!possible_add_conflict, "Conflicting add effects? {}", action);

        let mut pre_post = vec![];
        for (var, (post, mut effect_conditions)) in effect {
            let pre = condition.remove(&var);
            if self.variables.ranges[var] == 2 && prune_stupid_effect_conditions(var, post, &mut effect_conditions) {
                self.counters.simplified_effect_conditions += 1;
            }
            for mut effect_condition in effect_conditions {
                effect_condition.sort_unstable();
                pre_post.push(PrePost {
                    var,
                    pre,
                    post,
                    condition: effect_condition,
                });
            }
        }
        let prevail = condition.into_iter().collect();
        Some(SasOperator::new(operator_name(&action.name), prevail, pre_post, action.cost))
    }

    fn translate_axiom(&self, axiom: &PropositionalAxiom) -> Vec<SasAxiom> {
        let Some(conditions) = self.translate_conditions(&axiom.condition) else {
            return vec![];
        };
        let effect = if axiom.effect.negated {
            let (var, _) = self.variables.single_pair(&axiom.effect.atom);
            (var, self.variables.ranges[var] - 1)
        } else {
            self.variables.single_pair(&axiom.effect.atom)
        };
        conditions
            .into_iter()
            .map(|condition| SasAxiom::new(condition.into_iter().collect(), effect))
            .collect()
    }
}

/// Operator names are written without the surrounding parentheses.
fn operator_name(name: &str) -> String {
    name.strip_prefix('(')
        .and_then(|name| name.strip_suffix(')'))
        .unwrap_or(name)
        .to_string()
}

/// Simplifies the condition DNF of an effect `var := value` on a binary
/// variable: a condition `var = 1 - value` is dropped, because without it
/// the effect is a no-op, and an empty disjunct makes the others redundant.
/// Returns whether anything changed.
fn prune_stupid_effect_conditions(var: usize, value: usize, conditions: &mut Vec<Vec<SasFact>>) -> bool {
    if conditions.len() == 1 && conditions[0].is_empty() {
        return false;
    }
    assert!(value <= 1);
    let dual_fact = (var, 1 - value);
    let mut simplified = false;
    for condition in conditions.iter_mut() {
        let before = condition.len();
        condition.retain(|fact| *fact != dual_fact);
        simplified |= condition.len() != before;
        if condition.is_empty() {
            *conditions = vec![vec![]];
            return true;
        }
    }
    simplified
}

/// The trivially unsolvable task emitted when the goal cannot be reached.
pub fn unsolvable_sas_task() -> SasTask {
    SasTask {
        variables: SasVariables::new(
            vec![2],
            vec![-1],
            vec![vec![
                "Atom dummy(val1)".to_string(),
                "Atom dummy(val2)".to_string(),
            ]],
        ),
        // the only mutex would be the trivial one within the dummy variable
        mutexes: vec![],
        init: SasInit { values: vec![0] },
        goal: SasGoal::new(vec![(0, 1)]),
        operators: vec![],
        axioms: vec![],
        metric: true,
    }
}

/// Every mutex group in terms of the encoded facts. Facts without a
/// variable are left out, and groups are kept however small they get.
fn mutex_key(encoding: &FactEncoding, mutex_groups: &[Vec<Atom>]) -> Vec<SasMutexGroup> {
    mutex_groups
        .iter()
        .map(|group| {
            let mut facts = vec![];
            for fact in group {
                match encoding.dictionary.get(fact) {
                    Some(pairs) => facts.extend(pairs.iter().copied()),
                    None => debug!(%fact, "fact of mutex group is not encoded"),
                }
            }
            SasMutexGroup::new(facts)
        })
        .collect()
}

/// Grounded parts of the task that the encoder consumes.
#[derive(Debug, Clone)]
pub struct GroundTask<'a> {
    pub init: &'a [Atom],
    pub goals: &'a [Literal],
    pub actions: &'a [PropositionalAction],
    pub axioms: Vec<PropositionalAxiom>,
    pub metric: bool,
}

/// Assembles the SAS task. Returns `Ok(None)` if the goal contradicts the
/// mutex groups.
pub fn translate_task(ground: GroundTask<'_>, groups: &FactGroups, partial_encoding: bool) -> Result<Option<SasTask>> {
    let mut encoder = SasEncoder {
        variables: FactEncoding::new(&groups.groups, partial_encoding),
        mutexes: FactEncoding::new(&groups.mutex_groups, false),
        counters: Counters::default(),
    };
    let axiom_rules = handle_axioms(ground.actions, ground.axioms, ground.goals);
    let ranges = &encoder.variables.ranges;

    let mut init_values = ranges.iter().map(|range| range - 1).collect::<Vec<_>>();
    for fact in ground.init.iter().chain(&axiom_rules.axiom_init) {
        for &(var, value) in encoder.variables.pairs(fact) {
            let current = init_values[var];
            assert!(
                current == ranges[var] - 1 || current == value,
                "Inconsistent init facts! [fact = {}]",
                fact
            );
            init_values[var] = value;
        }
    }

    let Some(goal_conditions) = encoder.translate_conditions(ground.goals) else {
        return Ok(None);
    };
    let goal = match goal_conditions.as_slice() {
        [goal] => SasGoal::new(goal.iter().map(|(var, value)| (*var, *value)).collect()),
        _ => return Err(TranslateError::Unsupported("negative goal".to_string())),
    };

    let mut operators = ground
        .actions
        .iter()
        .flat_map(|action| encoder.translate_operator(action))
        .collect::<Vec<_>>();
    operators.sort();
    let mut axioms = axiom_rules
        .axioms
        .iter()
        .flat_map(|axiom| encoder.translate_axiom(axiom))
        .collect::<Vec<_>>();
    axioms.sort();
    info!(
        removed_implied_effects = encoder.counters.removed_implied_effects,
        simplified_effect_conditions = encoder.counters.simplified_effect_conditions,
        "translated operators"
    );

    let mut axiom_layers = vec![-1; encoder.variables.ranges.len()];
    for (atom, layer) in &axiom_rules.layers {
        assert!(*layer >= 0);
        let (var, _) = encoder.variables.single_pair(atom);
        axiom_layers[var] = *layer;
    }
    let variables = SasVariables::new(
        encoder.variables.ranges.clone(),
        axiom_layers,
        groups.translation_key.clone(),
    );

    Ok(Some(SasTask {
        variables,
        mutexes: mutex_key(&encoder.variables, &groups.mutex_groups),
        init: SasInit {
            values: init_values,
        },
        goal,
        operators,
        axioms,
        metric: ground.metric,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsed_types::Name;

    fn atom(predicate: &str) -> Atom {
        Atom::new(Name::new(predicate), vec![])
    }

    fn pos(predicate: &str) -> Literal {
        Literal::positive(atom(predicate))
    }

    fn neg(predicate: &str) -> Literal {
        Literal::negative(atom(predicate))
    }

    /// Variables {a, b, c, none}, {d, none}.
    fn encoder() -> SasEncoder {
        let groups = vec![vec![atom("a"), atom("b"), atom("c")], vec![atom("d")]];
        SasEncoder {
            variables: FactEncoding::new(&groups, true),
            mutexes: FactEncoding::new(&groups, false),
            counters: Counters::default(),
        }
    }

    #[test]
    fn negative_conditions_are_multiplied_out() {
        let encoder = encoder();
        let conditions = encoder.translate_conditions(&[neg("a"), pos("d")]).unwrap();
        assert_eq!(
            conditions,
            vec![
                Assignment::from([(0, 1), (1, 0)]),
                Assignment::from([(0, 2), (1, 0)]),
                Assignment::from([(0, 3), (1, 0)]),
            ]
        );
        // a positive fact on the same variable absorbs the negative one
        let conditions = encoder.translate_conditions(&[neg("a"), pos("b")]).unwrap();
        assert_eq!(conditions, vec![Assignment::from([(0, 1)])]);
    }

    #[test]
    fn contradictions_are_detected() {
        let encoder = encoder();
        assert_eq!(encoder.translate_conditions(&[pos("a"), pos("b")]), None);
        assert_eq!(encoder.translate_conditions(&[pos("a"), neg("a")]), None);
        assert_eq!(encoder.translate_conditions(&[]), Some(vec![Assignment::new()]));
    }

    #[test]
    fn add_and_delete_on_one_variable_is_one_effect() {
        let mut encoder = encoder();
        let action = PropositionalAction::new(
            "(move a b)".to_string(),
            vec![pos("a")],
            vec![(vec![], pos("b")), (vec![], neg("a"))],
            2,
        );
        let operators = encoder.translate_operator(&action);
        assert_eq!(
            operators,
            vec![SasOperator::new(
                "move a b".to_string(),
                vec![],
                vec![PrePost {
                    var: 0,
                    pre: Some(0),
                    post: 1,
                    condition: vec![],
                }],
                2,
            )]
        );
    }

    #[test]
    fn implied_effects_become_prevail_conditions() {
        let mut encoder = encoder();
        let action = PropositionalAction::new(
            "(noop)".to_string(),
            vec![pos("a")],
            vec![(vec![], pos("a"))],
            0,
        );
        let operators = encoder.translate_operator(&action);
        assert_eq!(operators[0].prevail, vec![(0, 0)]);
        assert!(operators[0].pre_post.is_empty());
        assert_eq!(encoder.counters.removed_implied_effects, 1);
    }

    #[test]
    fn unguarded_deletes_get_an_effect_condition() {
        let mut encoder = encoder();
        let action = PropositionalAction::new(
            "(drop)".to_string(),
            vec![],
            vec![(vec![], neg("b"))],
            0,
        );
        let operators = encoder.translate_operator(&action);
        assert_eq!(
            operators[0].pre_post,
            vec![PrePost {
                var: 0,
                pre: None,
                post: 3,
                condition: vec![(0, 1)],
            }]
        );
    }

    #[test]
    fn conflicting_add_and_delete_rejects_the_operator() {
        let mut encoder = encoder();
        let action = PropositionalAction {
            name: "(flip)".to_string(),
            precondition: vec![],
            add_effects: vec![(vec![], atom("d"))],
            del_effects: vec![(vec![], atom("d"))],
            cost: 0,
        };
        assert!(encoder.translate_operator(&action).is_empty());
    }

    #[test]
    fn binary_effect_conditions_drop_the_dual_value() {
        let mut conditions = vec![vec![(1, 1), (0, 0)], vec![(0, 2)]];
        assert!(prune_stupid_effect_conditions(1, 0, &mut conditions));
        assert_eq!(conditions, vec![vec![(0, 0)], vec![(0, 2)]]);

        let mut conditions = vec![vec![(1, 1)], vec![(0, 2)]];
        assert!(prune_stupid_effect_conditions(1, 0, &mut conditions));
        assert_eq!(conditions, vec![Vec::<SasFact>::new()]);
    }

    #[test]
    fn negated_axiom_effects_use_the_last_value() {
        let encoder = encoder();
        let axiom = PropositionalAxiom::new("(d)".to_string(), vec![pos("a")], neg("d"));
        assert_eq!(
            encoder.translate_axiom(&axiom),
            vec![SasAxiom::new(vec![(0, 0)], (1, 1))]
        );
    }

    #[test]
    fn mutex_groups_are_kept_whatever_their_size() {
        let encoder = encoder();
        let mutex_groups = vec![
            vec![atom("a"), atom("b")],
            vec![atom("d")],
            vec![atom("c"), atom("static")],
        ];
        assert_eq!(
            mutex_key(&encoder.variables, &mutex_groups),
            vec![
                SasMutexGroup::new(vec![(0, 0), (0, 1)]),
                SasMutexGroup::new(vec![(1, 0)]),
                SasMutexGroup::new(vec![(0, 2)]),
            ]
        );
    }

    #[test]
    fn unsolvable_task_has_one_dummy_variable() {
        let task = unsolvable_sas_task();
        assert_eq!(task.variables.ranges, vec![2]);
        assert_eq!(task.variables.axiom_layers, vec![-1]);
        assert_eq!(task.init.values, vec![0]);
        assert_eq!(task.goal.pairs, vec![(0, 1)]);
        assert!(task.operators.is_empty() && task.axioms.is_empty());
        assert!(task.metric);
    }
}
