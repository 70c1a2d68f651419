//! Removes values that cannot be reached in the domain transition graph
//! (DTG) of their variable, along with the operators and axioms needing
//! them, then removes variables left with a single value.
//!
//! Relaxed reachability ignores mutexes while the SAS encoding drops
//! operators whose conditions violate one, so a value can become
//! unreachable only after encoding. Typical cases are a `<none of those>`
//! value that nothing ever sets, facts that are constant for some objects
//! only, and values whose only achievers have contradictory preconditions.

use crate::translate::sas::{
    PrePost, SasAxiom, SasFact, SasGoal, SasMutexGroup, SasOperator, SasTask, SasVariables,
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info};

/// The goal needs a value that can never be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("simplified to trivially false goal")]
pub struct Impossible;

/// Unlabelled value transitions of one variable.
///
/// Axioms are treated as operators without preconditions, so for a
/// derived variable `init` is its default value and always reachable.
#[derive(Debug, Clone)]
struct DomainTransitionGraph {
    init: usize,
    size: usize,
    arcs: Vec<BTreeSet<usize>>,
}

impl DomainTransitionGraph {
    fn new(init: usize, size: usize) -> Self {
        Self {
            init,
            size,
            arcs: vec![BTreeSet::new(); size],
        }
    }

    /// Adds the transition into `post`, from `pre` or from every other
    /// value if `pre` is `None`.
    fn add_arc(&mut self, pre: Option<usize>, post: usize) {
        match pre {
            Some(pre) => {
                self.arcs[pre].insert(post);
            }
            None => {
                for pre in (0..self.size).filter(|pre| *pre != post) {
                    self.arcs[pre].insert(post);
                }
            }
        }
    }

    fn reachable(&self) -> BTreeSet<usize> {
        let mut reachable = BTreeSet::from([self.init]);
        let mut queue = vec![self.init];
        while let Some(node) = queue.pop() {
            for &next in &self.arcs[node] {
                if reachable.insert(next) {
                    queue.push(next);
                }
            }
        }
        reachable
    }
}

/// Prevail conditions and preconditions of `op` by variable, or `None` if
/// two of them contradict each other.
fn combined_preconditions(op: &SasOperator) -> Option<BTreeMap<usize, usize>> {
    let preconditions = op
        .pre_post
        .iter()
        .filter_map(|effect| effect.pre.map(|pre| (effect.var, pre)));
    let mut conditions = BTreeMap::new();
    for (var, value) in op.prevail.iter().copied().chain(preconditions) {
        if *conditions.entry(var).or_insert(value) != value {
            return None;
        }
    }
    Some(conditions)
}

/// The value `effect.var` has when the effect fires: `Some(None)` if
/// nothing constrains it, `None` if the constraints contradict each other.
fn effective_pre(effect: &PrePost, conditions: &BTreeMap<usize, usize>) -> Option<Option<usize>> {
    let mut result = conditions.get(&effect.var).copied();
    for &(var, value) in &effect.condition {
        if var != effect.var {
            continue;
        }
        match result {
            None => result = Some(value),
            Some(previous) if previous != value => return None,
            Some(_) => {}
        }
    }
    Some(result)
}

fn build_dtgs(task: &SasTask) -> Vec<DomainTransitionGraph> {
    let mut dtgs = task
        .init
        .values
        .iter()
        .zip(&task.variables.ranges)
        .map(|(&init, &size)| DomainTransitionGraph::new(init, size))
        .collect::<Vec<_>>();
    for op in &task.operators {
        let Some(conditions) = combined_preconditions(op) else {
            continue;
        };
        for effect in &op.pre_post {
            if let Some(pre) = effective_pre(effect, &conditions) {
                dtgs[effect.var].add_arc(pre, effect.post);
            }
        }
    }
    for axiom in &task.axioms {
        let (var, value) = axiom.effect;
        dtgs[var].add_arc(None, value);
    }
    dtgs
}

/// What an old fact becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Renamed {
    AlwaysFalse,
    AlwaysTrue,
    Fact(SasFact),
}

/// Why an operator, axiom or effect is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pruned {
    Impossible,
    DoesNothing,
}

impl From<Impossible> for Pruned {
    fn from(_: Impossible) -> Self {
        Pruned::Impossible
    }
}

#[derive(Debug, Default)]
struct VarValueRenaming {
    /// By old variable.
    new_var_nos: Vec<Option<usize>>,
    /// By old variable and old value.
    new_values: Vec<Vec<Renamed>>,
    /// By new variable.
    new_sizes: Vec<usize>,
    num_removed_values: usize,
}

impl VarValueRenaming {
    fn register_variable(&mut self, old_domain_size: usize, init: usize, new_domain: &BTreeSet<usize>) {
        assert!(!new_domain.is_empty() && new_domain.len() <= old_domain_size);
        assert!(new_domain.contains(&init), "initial value {} is unreachable", init);
        if new_domain.len() == 1 {
            let mut values = vec![Renamed::AlwaysFalse; old_domain_size];
            values[init] = Renamed::AlwaysTrue;
            self.new_var_nos.push(None);
            self.new_values.push(values);
            self.num_removed_values += old_domain_size;
            return;
        }
        let new_var = self.new_sizes.len();
        let mut next_value = 0;
        let values = (0..old_domain_size)
            .map(|value| {
                if new_domain.contains(&value) {
                    next_value += 1;
                    Renamed::Fact((new_var, next_value - 1))
                } else {
                    Renamed::AlwaysFalse
                }
            })
            .collect();
        self.num_removed_values += old_domain_size - new_domain.len();
        self.new_var_nos.push(Some(new_var));
        self.new_values.push(values);
        self.new_sizes.push(new_domain.len());
    }

    fn rename(&self, (var, value): SasFact) -> Renamed {
        self.new_values[var][value]
    }

    /// Renames `pairs`, leaving out those that always hold.
    fn translate_pairs(&self, pairs: &[SasFact]) -> Result<Vec<SasFact>, Impossible> {
        let mut new_pairs = Vec::with_capacity(pairs.len());
        for &pair in pairs {
            match self.rename(pair) {
                Renamed::AlwaysFalse => return Err(Impossible),
                Renamed::AlwaysTrue => {}
                Renamed::Fact(fact) => new_pairs.push(fact),
            }
        }
        Ok(new_pairs)
    }

    /// Renames everything in `task`. Leaves `task` untouched if the goal
    /// becomes impossible.
    fn apply_to_task(&self, task: &mut SasTask) -> Result<(), Impossible> {
        task.goal = SasGoal::new(self.translate_pairs(&task.goal.pairs)?);
        task.variables = self.translate_variables(&task.variables);
        task.mutexes = self.translate_mutexes(&task.mutexes);
        task.init.values = self.translate_init(&task.init.values);

        let operator_count = task.operators.len();
        task.operators = task
            .operators
            .iter()
            .filter_map(|op| match self.translate_operator(op) {
                Ok(op) => Some(op),
                Err(reason) => {
                    debug!(operator = %op.name, ?reason, "removed operator");
                    None
                }
            })
            .collect();
        let axiom_count = task.axioms.len();
        task.axioms = task
            .axioms
            .iter()
            .filter_map(|axiom| self.translate_axiom(axiom).ok())
            .collect();
        info!(
            removed_operators = operator_count - task.operators.len(),
            removed_axioms = axiom_count - task.axioms.len(),
            "renamed task"
        );
        Ok(())
    }

    fn translate_variables(&self, variables: &SasVariables) -> SasVariables {
        let mut axiom_layers = vec![-1; self.new_sizes.len()];
        for (old_var, new_var) in self.new_var_nos.iter().enumerate() {
            if let Some(new_var) = new_var {
                axiom_layers[*new_var] = variables.axiom_layers[old_var];
            }
        }
        let mut value_names = self
            .new_sizes
            .iter()
            .map(|size| vec![String::new(); *size])
            .collect::<Vec<_>>();
        for (var, names) in variables.value_names.iter().enumerate() {
            for (value, name) in names.iter().enumerate() {
                match self.rename((var, value)) {
                    Renamed::Fact((new_var, new_value)) => value_names[new_var][new_value] = name.clone(),
                    Renamed::AlwaysTrue => debug!(proposition = %name, "removed true proposition"),
                    Renamed::AlwaysFalse => debug!(proposition = %name, "removed false proposition"),
                }
            }
        }
        SasVariables::new(self.new_sizes.clone(), axiom_layers, value_names)
    }

    /// Groups left with fewer than two facts say nothing and are dropped.
    fn translate_mutexes(&self, mutexes: &[SasMutexGroup]) -> Vec<SasMutexGroup> {
        mutexes
            .iter()
            .filter_map(|group| {
                let facts = group
                    .facts
                    .iter()
                    .filter_map(|fact| match self.rename(*fact) {
                        Renamed::Fact(fact) => Some(fact),
                        Renamed::AlwaysFalse | Renamed::AlwaysTrue => None,
                    })
                    .collect::<Vec<_>>();
                (facts.len() >= 2).then(|| SasMutexGroup::new(facts))
            })
            .collect()
    }

    fn translate_init(&self, values: &[usize]) -> Vec<usize> {
        values
            .iter()
            .enumerate()
            .filter_map(|(var, value)| match self.rename((var, *value)) {
                Renamed::Fact((_, value)) => Some(value),
                Renamed::AlwaysTrue => None,
                Renamed::AlwaysFalse => panic!("initial value of variable {} is unreachable", var),
            })
            .collect()
    }

    fn translate_operator(&self, op: &SasOperator) -> Result<SasOperator, Pruned> {
        let prevail = self.translate_pairs(&op.prevail)?;
        let mut pre_post = vec![];
        for effect in &op.pre_post {
            match self.translate_pre_post(effect) {
                Ok(effect) => pre_post.push(effect),
                Err(Pruned::DoesNothing) => {}
                Err(Pruned::Impossible) => return Err(Pruned::Impossible),
            }
        }
        if pre_post.is_empty() {
            return Err(Pruned::DoesNothing);
        }
        Ok(SasOperator {
            name: op.name.clone(),
            prevail,
            pre_post,
            cost: op.cost,
        })
    }

    /// An effect whose condition can never hold, or whose value is fixed,
    /// does nothing. Dropping it must not lose a precondition, since the
    /// encoding has no way to turn it into a prevail condition.
    fn translate_pre_post(&self, effect: &PrePost) -> Result<PrePost, Pruned> {
        let pre = effect.pre.map(|pre| self.rename((effect.var, pre)));
        let post = self.rename((effect.var, effect.post));
        let unconstrained = matches!(pre, None | Some(Renamed::AlwaysTrue));
        match (pre, post, self.translate_pairs(&effect.condition)) {
            (Some(Renamed::AlwaysFalse), _, _) => Err(Pruned::Impossible),
            (_, _, Err(Impossible)) | (_, Renamed::AlwaysFalse, _) => {
                assert!(unconstrained, "dropped effect on {} has a precondition", effect.var);
                Err(Pruned::DoesNothing)
            }
            (Some(Renamed::AlwaysTrue), _, _) => {
                assert_eq!(post, Renamed::AlwaysTrue);
                Err(Pruned::DoesNothing)
            }
            (_, Renamed::AlwaysTrue, _) => {
                assert!(pre.is_none(), "effect on removed variable {} has a precondition", effect.var);
                Err(Pruned::DoesNothing)
            }
            (None, Renamed::Fact((var, post)), Ok(condition)) => Ok(PrePost {
                var,
                pre: None,
                post,
                condition,
            }),
            (Some(Renamed::Fact((_, pre))), Renamed::Fact((var, post)), Ok(condition)) => Ok(PrePost {
                var,
                pre: Some(pre),
                post,
                condition,
            }),
        }
    }

    fn translate_axiom(&self, axiom: &SasAxiom) -> Result<SasAxiom, Pruned> {
        let condition = self.translate_pairs(&axiom.condition)?;
        match self.rename(axiom.effect) {
            Renamed::AlwaysFalse => panic!("axiom with reachable body sets unreachable {:?}", axiom.effect),
            Renamed::AlwaysTrue => Err(Pruned::DoesNothing),
            Renamed::Fact(effect) => Ok(SasAxiom { condition, effect }),
        }
    }
}

/// Removes the facts of `task` that are unreachable from the initial state
/// in their DTG, then every variable with a single remaining value.
/// Operators and axioms conditioned on a removed fact go with it, as do
/// operators that no longer change anything.
pub fn filter_unreachable_propositions(task: &mut SasTask) -> Result<(), Impossible> {
    let mut renaming = VarValueRenaming::default();
    for dtg in build_dtgs(task) {
        renaming.register_variable(dtg.size, dtg.init, &dtg.reachable());
    }
    renaming.apply_to_task(task)?;
    info!(
        removed_propositions = renaming.num_removed_values,
        variables = task.variables.len(),
        "removed unreachable propositions"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::sas::SasInit;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn effect(var: usize, pre: Option<usize>, post: usize) -> PrePost {
        PrePost {
            var,
            pre,
            post,
            condition: vec![],
        }
    }

    /// Variable 0 moves from `a` to `b` but never reaches `c`. Variable 1
    /// is only set by `fetch`, which needs `c`. Variable 2 never changes.
    fn task() -> SasTask {
        SasTask {
            variables: SasVariables::new(
                vec![3, 2, 2],
                vec![-1, -1, -1],
                vec![
                    names(&["Atom at(a)", "Atom at(b)", "Atom at(c)"]),
                    names(&["Atom holding()", "<none of those>"]),
                    names(&["Atom road(a, b)", "<none of those>"]),
                ],
            ),
            mutexes: vec![
                SasMutexGroup::new(vec![(0, 0), (0, 1), (0, 2)]),
                SasMutexGroup::new(vec![(0, 2), (1, 0), (2, 0)]),
            ],
            init: SasInit {
                values: vec![0, 1, 0],
            },
            goal: SasGoal::new(vec![(0, 1)]),
            operators: vec![
                SasOperator::new("drive a b".to_string(), vec![(2, 0)], vec![effect(0, Some(0), 1)], 1),
                SasOperator::new("fetch".to_string(), vec![(0, 2)], vec![effect(1, Some(1), 0)], 1),
            ],
            axioms: vec![],
            metric: false,
        }
    }

    #[test]
    fn reachability_follows_arcs() {
        let mut dtg = DomainTransitionGraph::new(0, 4);
        dtg.add_arc(Some(0), 1);
        dtg.add_arc(Some(2), 3);
        assert_eq!(dtg.reachable(), BTreeSet::from([0, 1]));
        dtg.add_arc(None, 2);
        assert_eq!(dtg.reachable(), BTreeSet::from([0, 1, 2, 3]));
    }

    #[test]
    fn contradictory_conditions_add_no_arcs() {
        let mut task = task();
        task.operators = vec![SasOperator::new(
            "warp".to_string(),
            vec![],
            vec![PrePost {
                var: 0,
                pre: Some(0),
                post: 2,
                condition: vec![(0, 1)],
            }],
            1,
        )];
        let dtgs = build_dtgs(&task);
        assert_eq!(dtgs[0].reachable(), BTreeSet::from([0]));
    }

    #[test]
    fn unreachable_values_and_their_operators_are_removed() {
        let mut task = task();
        filter_unreachable_propositions(&mut task).unwrap();

        assert_eq!(task.variables.ranges, vec![2, 2]);
        assert_eq!(
            task.variables.value_names,
            vec![
                names(&["Atom at(a)", "Atom at(b)"]),
                names(&["Atom holding()", "<none of those>"]),
            ]
        );
        assert_eq!(task.init.values, vec![0, 1]);
        assert_eq!(task.goal.pairs, vec![(0, 1)]);
        // the constant road fact disappears from the prevail condition
        assert_eq!(
            task.operators,
            vec![SasOperator::new("drive a b".to_string(), vec![], vec![effect(0, Some(0), 1)], 1)]
        );
        // the second group is left with a single fact
        assert_eq!(task.mutexes, vec![SasMutexGroup::new(vec![(0, 0), (0, 1)])]);
    }

    #[test]
    fn unreachable_goal_is_impossible() {
        let mut task = task();
        task.goal = SasGoal::new(vec![(0, 2)]);
        let before = task.clone();
        assert_eq!(filter_unreachable_propositions(&mut task), Err(Impossible));
        assert_eq!(task, before);
    }

    #[test]
    fn operators_that_change_nothing_are_removed() {
        let mut task = task();
        task.operators.push(SasOperator::new("wait".to_string(), vec![(0, 0)], vec![], 1));
        task.operators.push(SasOperator::new(
            "build".to_string(),
            vec![],
            vec![effect(2, None, 0)],
            1,
        ));
        filter_unreachable_propositions(&mut task).unwrap();
        assert_eq!(
            task.operators.iter().map(|op| op.name.as_str()).collect::<Vec<_>>(),
            vec!["drive a b"]
        );
    }

    #[test]
    fn axioms_on_unreachable_values_are_removed() {
        let mut task = task();
        task.variables = SasVariables::new(
            vec![3, 2, 2, 2],
            vec![-1, -1, -1, 0],
            vec![
                names(&["Atom at(a)", "Atom at(b)", "Atom at(c)"]),
                names(&["Atom holding()", "<none of those>"]),
                names(&["Atom road(a, b)", "<none of those>"]),
                names(&["Atom visited()", "NegatedAtom visited()"]),
            ],
        );
        task.init.values.push(1);
        task.axioms = vec![
            SasAxiom::new(vec![(0, 2)], (3, 0)),
            SasAxiom::new(vec![(0, 1)], (3, 0)),
        ];
        filter_unreachable_propositions(&mut task).unwrap();
        assert_eq!(task.variables.axiom_layers, vec![-1, -1, 0]);
        assert_eq!(task.axioms, vec![SasAxiom::new(vec![(0, 1)], (2, 0))]);
    }
}
