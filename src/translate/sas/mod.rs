//! The finite-domain (SAS+) task produced by the translator, together with
//! its text format.
//!
//! A fact of the task is a `(variable, value)` pair.

mod output;
mod reader;

use serde::{Deserialize, Serialize};

pub const SAS_FILE_VERSION: u32 = 3;

/// A `(variable, value)` pair.
pub type SasFact = (usize, usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SasTask {
    pub variables: SasVariables,
    pub mutexes: Vec<SasMutexGroup>,
    pub init: SasInit,
    pub goal: SasGoal,
    pub operators: Vec<SasOperator>,
    pub axioms: Vec<SasAxiom>,
    /// Whether operator costs are to be minimised.
    pub metric: bool,
}

impl SasTask {
    /// Size of the task, counting each variable, fact, condition and
    /// effect once.
    pub fn encoding_size(&self) -> usize {
        self.variables.encoding_size()
            + self
                .mutexes
                .iter()
                .map(SasMutexGroup::encoding_size)
                .sum::<usize>()
            + self.goal.encoding_size()
            + self
                .operators
                .iter()
                .map(SasOperator::encoding_size)
                .sum::<usize>()
            + self
                .axioms
                .iter()
                .map(SasAxiom::encoding_size)
                .sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SasVariables {
    pub ranges: Vec<usize>,
    /// `-1` for variables that operators change, the evaluation layer for
    /// derived variables.
    pub axiom_layers: Vec<i32>,
    pub value_names: Vec<Vec<String>>,
}

impl SasVariables {
    pub fn new(ranges: Vec<usize>, axiom_layers: Vec<i32>, value_names: Vec<Vec<String>>) -> Self {
        assert_eq!(ranges.len(), axiom_layers.len());
        assert_eq!(ranges.len(), value_names.len());
        for (range, names) in ranges.iter().zip(&value_names) {
            assert_eq!(*range, names.len(), "range does not match value names {:?}", names);
        }
        Self {
            ranges,
            axiom_layers,
            value_names,
        }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// A variable with range `k` weighs `k + 1`.
    pub fn encoding_size(&self) -> usize {
        self.ranges.len() + self.ranges.iter().sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SasMutexGroup {
    pub facts: Vec<SasFact>,
}

impl SasMutexGroup {
    pub fn new(facts: Vec<SasFact>) -> Self {
        Self { facts }
    }

    pub fn encoding_size(&self) -> usize {
        self.facts.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SasInit {
    pub values: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SasGoal {
    /// Sorted.
    pub pairs: Vec<SasFact>,
}

impl SasGoal {
    pub fn new(mut pairs: Vec<SasFact>) -> Self {
        pairs.sort_unstable();
        Self { pairs }
    }

    pub fn encoding_size(&self) -> usize {
        self.pairs.len()
    }
}

/// One effect of an operator: `var` changes from `pre` (any value if
/// `None`) to `post` whenever `condition` holds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrePost {
    pub var: usize,
    pub pre: Option<usize>,
    pub post: usize,
    pub condition: Vec<SasFact>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SasOperator {
    pub name: String,
    /// Conditions on variables the operator does not change. Sorted.
    pub prevail: Vec<SasFact>,
    /// Sorted.
    pub pre_post: Vec<PrePost>,
    pub cost: i64,
}

impl SasOperator {
    pub fn new(name: String, mut prevail: Vec<SasFact>, mut pre_post: Vec<PrePost>, cost: i64) -> Self {
        prevail.sort_unstable();
        pre_post.sort();
        Self {
            name,
            prevail,
            pre_post,
            cost,
        }
    }

    pub fn encoding_size(&self) -> usize {
        1 + self.prevail.len()
            + self
                .pre_post
                .iter()
                .map(|effect| 1 + effect.condition.len() + usize::from(effect.pre.is_some()))
                .sum::<usize>()
    }
}

/// `effect` holds whenever `condition` does. The effect value is 0 or 1,
/// and the rule changes the variable from the other of the two.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SasAxiom {
    pub condition: Vec<SasFact>,
    pub effect: SasFact,
}

impl SasAxiom {
    pub fn new(mut condition: Vec<SasFact>, effect: SasFact) -> Self {
        assert!(
            effect.1 <= 1,
            "axiom effect value {} is not binary",
            effect.1
        );
        condition.sort_unstable();
        Self { condition, effect }
    }

    pub fn encoding_size(&self) -> usize {
        1 + self.condition.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_size_counts_every_part() {
        let task = SasTask {
            variables: SasVariables::new(
                vec![3, 2],
                vec![-1, 0],
                vec![
                    vec!["a".to_string(), "b".to_string(), "c".to_string()],
                    vec!["d".to_string(), "e".to_string()],
                ],
            ),
            mutexes: vec![SasMutexGroup::new(vec![(0, 0), (0, 1)])],
            init: SasInit { values: vec![0, 1] },
            goal: SasGoal::new(vec![(0, 2)]),
            operators: vec![SasOperator::new(
                "op".to_string(),
                vec![(1, 0)],
                vec![PrePost {
                    var: 0,
                    pre: Some(0),
                    post: 2,
                    condition: vec![],
                }],
                1,
            )],
            axioms: vec![SasAxiom::new(vec![(0, 2)], (1, 0))],
            metric: false,
        };
        // variables 7, mutex 2, goal 1, operator 4, axiom 2
        assert_eq!(task.encoding_size(), 16);
    }

    #[test]
    fn operators_sort_their_conditions() {
        let operator = SasOperator::new(
            "op".to_string(),
            vec![(2, 0), (1, 1)],
            vec![
                PrePost {
                    var: 3,
                    pre: None,
                    post: 0,
                    condition: vec![],
                },
                PrePost {
                    var: 0,
                    pre: Some(1),
                    post: 0,
                    condition: vec![],
                },
            ],
            0,
        );
        assert_eq!(operator.prevail, vec![(1, 1), (2, 0)]);
        assert_eq!(operator.pre_post[0].var, 0);
    }

    #[test]
    #[should_panic(expected = "not binary")]
    fn axiom_effects_are_binary() {
        SasAxiom::new(vec![], (0, 2));
    }
}
