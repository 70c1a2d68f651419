//! Splits rules into joins, projections and products with at most two
//! conditions each, except for products of independent parts.

use crate::parsed_types::Name;
use crate::translate::datalog::greedy_join::greedy_join;
use crate::translate::datalog::{DatalogAtom, ModelPredicate, Rule, RuleKind};
use crate::translate::task::NameGenerator;
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Groups conditions that are connected through shared variables. Each
/// component and the list of components are sorted.
fn connected_conditions(conditions: Vec<DatalogAtom>) -> Vec<Vec<DatalogAtom>> {
    let mut components = UnionFind::<usize>::new(conditions.len());
    let mut first_occurrence: HashMap<Name, usize> = HashMap::new();
    for (index, condition) in conditions.iter().enumerate() {
        for variable in condition.variables() {
            match first_occurrence.get(&variable) {
                Some(&first) => {
                    components.union(first, index);
                }
                None => {
                    first_occurrence.insert(variable, index);
                }
            }
        }
    }
    let mut grouped: BTreeMap<usize, Vec<DatalogAtom>> = BTreeMap::new();
    for (index, condition) in conditions.into_iter().enumerate() {
        grouped
            .entry(components.find(index))
            .or_default()
            .push(condition);
    }
    let mut result = grouped
        .into_values()
        .map(|mut component| {
            component.sort();
            component
        })
        .collect::<Vec<_>>();
    result.sort();
    result
}

fn project_rule(
    effect: &DatalogAtom,
    conditions: Vec<DatalogAtom>,
    names: &mut NameGenerator,
) -> Rule {
    let condition_variables = conditions
        .iter()
        .flat_map(|c| c.variables())
        .collect::<BTreeSet<_>>();
    let effect_variables = effect
        .variables()
        .filter(|v| condition_variables.contains(v))
        .collect::<BTreeSet<_>>();
    Rule::new(
        conditions,
        DatalogAtom::new(
            ModelPredicate::Name(names.next_name()),
            effect_variables.into_iter().collect::<Vec<_>>(),
        ),
    )
}

fn split_into_binary_rules(rule: Rule, names: &mut NameGenerator) -> Vec<Rule> {
    if rule.conditions.len() <= 1 {
        vec![rule.with_kind(RuleKind::Project)]
    } else {
        greedy_join(rule, names)
    }
}

/// Splits a normalized rule. Independent parts of the body are projected
/// separately and combined by a product rule; each part is then reduced to
/// binary joins.
pub(super) fn split_rule(rule: Rule, names: &mut NameGenerator) -> Vec<Rule> {
    let (important, trivial): (Vec<_>, Vec<_>) = rule
        .conditions
        .iter()
        .cloned()
        .partition(|condition| condition.variables().next().is_some());

    let components = connected_conditions(important);
    if components.len() == 1 && trivial.is_empty() {
        return split_into_binary_rules(rule, names);
    }

    let projected = components
        .into_iter()
        .map(|component| project_rule(&rule.effect, component, names))
        .collect::<Vec<_>>();
    let mut conditions = projected
        .iter()
        .map(|projected| projected.effect.clone())
        .collect::<Vec<_>>();
    conditions.extend(trivial);

    let mut result = vec![];
    for projected_rule in projected {
        result.extend(split_into_binary_rules(projected_rule, names));
    }
    let kind = if conditions.len() >= 2 {
        RuleKind::Product
    } else {
        RuleKind::Project
    };
    result.push(Rule::new(conditions, rule.effect).with_kind(kind));
    result
}
