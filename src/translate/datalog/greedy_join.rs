use crate::parsed_types::Name;
use crate::translate::datalog::{DatalogAtom, ModelPredicate, Rule, RuleKind};
use crate::translate::task::NameGenerator;
use std::collections::{BTreeSet, HashMap};

/// Counts how often each variable occurs in the atoms not joined yet,
/// including the rule's effect.
struct OccurrencesTracker {
    occurrences: HashMap<Name, usize>,
}

impl OccurrencesTracker {
    fn new(rule: &Rule) -> Self {
        let mut tracker = Self {
            occurrences: HashMap::new(),
        };
        tracker.add(&rule.effect);
        for condition in &rule.conditions {
            tracker.add(condition);
        }
        tracker
    }

    fn add(&mut self, atom: &DatalogAtom) {
        for variable in atom.variables() {
            *self.occurrences.entry(variable).or_default() += 1;
        }
    }

    fn remove(&mut self, atom: &DatalogAtom) {
        for variable in atom.variables() {
            let count = self
                .occurrences
                .get_mut(&variable)
                .unwrap_or_else(|| panic!("Variable {} is not tracked", variable));
            *count -= 1;
            if *count == 0 {
                self.occurrences.remove(&variable);
            }
        }
    }

    fn contains(&self, variable: &Name) -> bool {
        self.occurrences.contains_key(variable)
    }
}

/// `(variables only in the smaller atom, variables only in the larger atom,
/// -shared variables)`; smaller is cheaper.
type JoinCost = (usize, usize, isize);

fn join_cost(left: &DatalogAtom, right: &DatalogAtom) -> JoinCost {
    let mut left_vars = left.variables().collect::<BTreeSet<_>>();
    let mut right_vars = right.variables().collect::<BTreeSet<_>>();
    if left_vars.len() > right_vars.len() {
        std::mem::swap(&mut left_vars, &mut right_vars);
    }
    let common = left_vars.intersection(&right_vars).count();
    (
        left_vars.len() - common,
        right_vars.len() - common,
        -(common as isize),
    )
}

/// Lower-triangular matrix of join costs between the atoms still to join.
struct CostMatrix {
    joinees: Vec<DatalogAtom>,
    costs: Vec<Vec<JoinCost>>,
}

impl CostMatrix {
    fn new(joinees: Vec<DatalogAtom>) -> Self {
        let mut matrix = Self {
            joinees: vec![],
            costs: vec![],
        };
        for joinee in joinees {
            matrix.add_entry(joinee);
        }
        matrix
    }

    fn add_entry(&mut self, joinee: DatalogAtom) {
        let row = self
            .joinees
            .iter()
            .map(|other| join_cost(&joinee, other))
            .collect();
        self.costs.push(row);
        self.joinees.push(joinee);
    }

    fn delete_entry(&mut self, index: usize) -> DatalogAtom {
        for row in &mut self.costs[index + 1..] {
            row.remove(index);
        }
        self.costs.remove(index);
        self.joinees.remove(index)
    }

    /// Removes the cheapest pair; ties go to the first pair found.
    fn remove_min_pair(&mut self) -> (DatalogAtom, DatalogAtom) {
        assert!(self.can_join(), "Need two atoms to join");
        let mut best: Option<(JoinCost, usize, usize)> = None;
        for (i, row) in self.costs.iter().enumerate() {
            for (j, cost) in row.iter().enumerate() {
                if best.map_or(true, |(min, _, _)| *cost < min) {
                    best = Some((*cost, i, j));
                }
            }
        }
        let (_, left, right) = best.unwrap_or_else(|| unreachable!());
        let left_atom = self.delete_entry(left);
        let right_atom = self.delete_entry(right);
        (left_atom, right_atom)
    }

    fn can_join(&self) -> bool {
        self.joinees.len() >= 2
    }
}

/// Collects the rules created while joining. The last rule produced gets
/// the original effect.
struct ResultList<'a> {
    final_effect: DatalogAtom,
    rules: Vec<Rule>,
    names: &'a mut NameGenerator,
}

impl ResultList<'_> {
    fn add_rule(
        &mut self,
        kind: RuleKind,
        conditions: Vec<DatalogAtom>,
        effect_variables: Vec<Name>,
    ) -> DatalogAtom {
        let effect = DatalogAtom::new(ModelPredicate::Name(self.names.next_name()), effect_variables);
        self.rules
            .push(Rule::new(conditions, effect.clone()).with_kind(kind));
        effect
    }

    fn into_rules(mut self) -> Vec<Rule> {
        if let Some(last) = self.rules.last_mut() {
            last.effect = self.final_effect;
        }
        self.rules
    }
}

/// Reduces a rule with at least two connected conditions to a sequence of
/// binary joins, always joining the cheapest pair next and projecting away
/// variables that are not needed later.
pub(super) fn greedy_join(rule: Rule, names: &mut NameGenerator) -> Vec<Rule> {
    assert!(rule.conditions.len() >= 2, "Nothing to join in {}", rule);
    let mut occurrences = OccurrencesTracker::new(&rule);
    let mut costs = CostMatrix::new(rule.conditions);
    let mut result = ResultList {
        final_effect: rule.effect,
        rules: vec![],
        names,
    };

    while costs.can_join() {
        let (left, right) = costs.remove_min_pair();
        occurrences.remove(&left);
        occurrences.remove(&right);

        let left_vars = left.variables().collect::<BTreeSet<_>>();
        let right_vars = right.variables().collect::<BTreeSet<_>>();
        let common_vars = left_vars
            .intersection(&right_vars)
            .copied()
            .collect::<BTreeSet<_>>();
        let effect_vars = left_vars
            .union(&right_vars)
            .copied()
            .filter(|v| occurrences.contains(v))
            .collect::<BTreeSet<_>>();

        let mut joinees = vec![];
        for (joinee, joinee_vars) in [(left, left_vars), (right, right_vars)] {
            let retained = joinee_vars
                .iter()
                .copied()
                .filter(|v| effect_vars.contains(v) || common_vars.contains(v))
                .collect::<Vec<_>>();
            if retained.len() != joinee_vars.len() {
                joinees.push(result.add_rule(RuleKind::Project, vec![joinee], retained));
            } else {
                joinees.push(joinee);
            }
        }
        let joint = result.add_rule(
            RuleKind::Join,
            joinees,
            effect_vars.into_iter().collect(),
        );
        occurrences.add(&joint);
        costs.add_entry(joint);
    }
    result.into_rules()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::datalog::AUXILIARY_PREFIX;

    fn atom(predicate: &str, args: &[&str]) -> DatalogAtom {
        DatalogAtom::new(
            ModelPredicate::Name(Name::new(predicate)),
            args.iter().map(|a| Name::new(a)).collect::<Vec<_>>(),
        )
    }

    #[test]
    fn cost_prefers_shared_variables() {
        let a = atom("a", &["?x"]);
        let b = atom("b", &["?x", "?y"]);
        let c = atom("c", &["?z"]);
        assert!(join_cost(&a, &b) < join_cost(&a, &c));
        assert_eq!(join_cost(&a, &b), (0, 1, -1));
    }

    #[test]
    fn chain_is_joined_pairwise() {
        let rule = Rule::new(
            vec![atom("a", &["?x", "?y"]), atom("b", &["?y", "?z"])],
            atom("h", &["?x", "?z"]),
        );
        let rules = greedy_join(rule, &mut NameGenerator::new(AUXILIARY_PREFIX));
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].kind, Some(RuleKind::Join));
        assert_eq!(rules[0].effect, atom("h", &["?x", "?z"]));
    }

    #[test]
    fn unneeded_variables_are_projected_before_joining() {
        let rule = Rule::new(
            vec![atom("a", &["?x", "?u"]), atom("b", &["?x"])],
            atom("h", &["?x"]),
        );
        let rules = greedy_join(rule, &mut NameGenerator::new(AUXILIARY_PREFIX));
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].kind, Some(RuleKind::Project));
        assert_eq!(rules[0].conditions, vec![atom("a", &["?x", "?u"])]);
        assert_eq!(rules[0].effect.args, vec![Name::new("?x")]);
        assert_eq!(rules[1].kind, Some(RuleKind::Join));
        assert_eq!(rules[1].effect, atom("h", &["?x"]));
    }
}
