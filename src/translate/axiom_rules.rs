//! Prunes, simplifies and stratifies the ground axioms.

use crate::translate::task::{Atom, Literal, PropositionalAction, PropositionalAxiom};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

const NO_AXIOM: i32 = -1;
const UNKNOWN_LAYER: i32 = -2;
const FIRST_MARKER: i32 = -3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxiomRules {
    /// Positive and negated axioms for every axiom literal that is needed,
    /// sorted.
    pub axioms: Vec<PropositionalAxiom>,
    /// Derived atoms that are only needed negatively. Their default value is
    /// true instead of false.
    pub axiom_init: BTreeSet<Atom>,
    /// Evaluation layer of every derived atom that some axiom changes.
    pub layers: BTreeMap<Atom, i32>,
}

pub fn handle_axioms(
    actions: &[PropositionalAction],
    axioms: Vec<PropositionalAxiom>,
    goals: &[Literal],
) -> AxiomRules {
    let mut axioms_by_atom: BTreeMap<Atom, Vec<PropositionalAxiom>> = BTreeMap::new();
    for axiom in axioms {
        axioms_by_atom
            .entry(axiom.effect.atom.clone())
            .or_default()
            .push(axiom);
    }
    let necessary_literals = compute_necessary_axiom_literals(&axioms_by_atom, actions, goals);
    let axiom_init = get_axiom_init(&axioms_by_atom, &necessary_literals);
    simplify_axioms(&mut axioms_by_atom, &necessary_literals);
    let mut axioms = compute_negative_axioms(&axioms_by_atom, &necessary_literals);
    axioms.sort();
    let layers = compute_axiom_layers(&axioms, &axiom_init);
    info!(
        axioms = axioms.len(),
        axiom_init = axiom_init.len(),
        layers = layers.values().max().map_or(0, |layer| layer + 1),
        "stratified axioms"
    );
    AxiomRules {
        axioms,
        axiom_init,
        layers,
    }
}

/// Axiom literals whose value some goal, precondition or effect condition
/// reads, closed under the axioms that derive them. Literals needed
/// negatively require the negated axioms of their atom.
fn compute_necessary_axiom_literals(
    axioms_by_atom: &BTreeMap<Atom, Vec<PropositionalAxiom>>,
    actions: &[PropositionalAction],
    goals: &[Literal],
) -> BTreeSet<Literal> {
    let mut necessary_literals = BTreeSet::new();
    let mut queue = vec![];
    let mut register = |literals: &[Literal], negated: bool, queue: &mut Vec<Literal>| {
        for literal in literals {
            if !axioms_by_atom.contains_key(&literal.atom) {
                continue;
            }
            let literal = if negated { literal.negate() } else { literal.clone() };
            if necessary_literals.insert(literal.clone()) {
                queue.push(literal);
            }
        }
    };

    register(goals, false, &mut queue);
    for action in actions {
        register(&action.precondition, false, &mut queue);
        for (condition, _) in &action.add_effects {
            register(condition, false, &mut queue);
        }
        for (condition, _) in &action.del_effects {
            register(condition, true, &mut queue);
        }
    }
    while let Some(literal) = queue.pop() {
        for axiom in &axioms_by_atom[&literal.atom] {
            register(&axiom.condition, literal.negated, &mut queue);
        }
    }
    necessary_literals
}

fn get_axiom_init(
    axioms_by_atom: &BTreeMap<Atom, Vec<PropositionalAxiom>>,
    necessary_literals: &BTreeSet<Literal>,
) -> BTreeSet<Atom> {
    axioms_by_atom
        .keys()
        .filter(|atom| {
            !necessary_literals.contains(&Literal::positive((*atom).clone()))
                && necessary_literals.contains(&Literal::negative((*atom).clone()))
        })
        .cloned()
        .collect()
}

/// Drops the axioms of atoms nobody needs and simplifies the rest.
fn simplify_axioms(
    axioms_by_atom: &mut BTreeMap<Atom, Vec<PropositionalAxiom>>,
    necessary_literals: &BTreeSet<Literal>,
) {
    let necessary_atoms = necessary_literals
        .iter()
        .map(|literal| &literal.atom)
        .collect::<HashSet<_>>();
    let before = axioms_by_atom.values().map(Vec::len).sum::<usize>();
    axioms_by_atom.retain(|atom, _| necessary_atoms.contains(atom));
    for axioms in axioms_by_atom.values_mut() {
        *axioms = simplify(std::mem::take(axioms));
    }
    let after = axioms_by_atom.values().map(Vec::len).sum::<usize>();
    debug!(removed = before - after, "simplified axioms");
}

/// Removes duplicate literals within conditions, then drops every axiom
/// whose condition is a superset of another one's, or that contains its
/// own effect. All axioms share one effect.
fn simplify(mut axioms: Vec<PropositionalAxiom>) -> Vec<PropositionalAxiom> {
    for axiom in &mut axioms {
        axiom.condition.sort();
        axiom.condition.dedup();
    }

    let mut skipped = HashSet::new();
    let mut axioms_by_literal: HashMap<&Literal, HashSet<usize>> = HashMap::new();
    for (index, axiom) in axioms.iter().enumerate() {
        if axiom.condition.contains(&axiom.effect) {
            skipped.insert(index);
        } else {
            for literal in &axiom.condition {
                axioms_by_literal.entry(literal).or_default().insert(index);
            }
        }
    }
    for (index, axiom) in axioms.iter().enumerate() {
        // a skipped axiom must not knock out an identical one
        if skipped.contains(&index) {
            continue;
        }
        let Some((first, rest)) = axiom.condition.split_first() else {
            return vec![axiom.clone()];
        };
        let mut dominated = axioms_by_literal[first].clone();
        for literal in rest {
            dominated.retain(|other| axioms_by_literal[literal].contains(other));
        }
        skipped.extend(dominated.into_iter().filter(|other| *other != index));
    }
    axioms
        .into_iter()
        .enumerate()
        .filter(|(index, _)| !skipped.contains(index))
        .map(|(_, axiom)| axiom)
        .collect()
}

fn compute_negative_axioms(
    axioms_by_atom: &BTreeMap<Atom, Vec<PropositionalAxiom>>,
    necessary_literals: &BTreeSet<Literal>,
) -> Vec<PropositionalAxiom> {
    let mut result = vec![];
    for literal in necessary_literals {
        let axioms = &axioms_by_atom[&literal.atom];
        if literal.negated {
            result.extend(negate(&literal.atom, axioms));
        } else {
            result.extend(axioms.iter().cloned());
        }
    }
    result
}

/// Axioms deriving `not atom` from the negation of the DNF formed by the
/// conditions of the axioms deriving `atom`.
fn negate(atom: &Atom, axioms: &[PropositionalAxiom]) -> Vec<PropositionalAxiom> {
    let name = axioms
        .first()
        .map_or_else(|| atom.to_string(), |axiom| axiom.name.clone());
    let mut result = vec![PropositionalAxiom::new(
        name,
        vec![],
        Literal::negative(atom.clone()),
    )];
    for axiom in axioms {
        match axiom.condition.as_slice() {
            // the atom is always true, so its negation never holds
            [] => return vec![],
            [literal] => {
                for negated_axiom in &mut result {
                    negated_axiom.condition.push(literal.negate());
                }
            }
            condition => {
                result = condition
                    .iter()
                    .flat_map(|literal| {
                        result.iter().map(move |negated_axiom| {
                            let mut negated_axiom = negated_axiom.clone();
                            negated_axiom.condition.push(literal.negate());
                            negated_axiom
                        })
                    })
                    .collect();
            }
        }
    }
    simplify(result)
}

#[derive(Debug)]
struct LayerFrame {
    atom: Atom,
    marker: i32,
    children: Vec<(Atom, i32)>,
    next: usize,
    layer: i32,
}

impl LayerFrame {
    fn new(atom: Atom, marker: i32, depends_on: &BTreeMap<Atom, BTreeSet<(Atom, i32)>>) -> Self {
        let children = depends_on
            .get(&atom)
            .map(|children| children.iter().cloned().collect())
            .unwrap_or_default();
        Self {
            atom,
            marker,
            children,
            next: 0,
            layer: 0,
        }
    }
}

/// Assigns every derived atom the lowest layer such that an axiom that
/// moves its atom away from the default value comes no earlier than its
/// conditions, and strictly later than conditions that hold by default.
///
/// Atoms currently on the depth-first stack carry a marker instead of a
/// layer. Reaching an atom again with the same marker closes a cycle
/// without strict edges, which is harmless. Reaching it with another
/// marker closes a cycle through a strict edge, which cannot be
/// stratified.
///
/// # Panics
///
/// Panics if the axioms contain a cycle through a strict dependency.
pub fn compute_axiom_layers(axioms: &[PropositionalAxiom], axiom_init: &BTreeSet<Atom>) -> BTreeMap<Atom, i32> {
    let mut depends_on: BTreeMap<Atom, BTreeSet<(Atom, i32)>> = BTreeMap::new();
    for axiom in axioms {
        let effect_init_sign = axiom_init.contains(&axiom.effect.atom);
        if axiom.effect.negated != effect_init_sign {
            continue;
        }
        let dependencies = depends_on.entry(axiom.effect.atom.clone()).or_default();
        for condition in &axiom.condition {
            let condition_init_sign = axiom_init.contains(&condition.atom);
            let bonus = i32::from(condition.negated != condition_init_sign);
            dependencies.insert((condition.atom.clone(), bonus));
        }
    }

    let mut layers = depends_on
        .keys()
        .map(|atom| (atom.clone(), UNKNOWN_LAYER))
        .collect::<BTreeMap<_, _>>();
    for atom in depends_on.keys() {
        if layers[atom] != UNKNOWN_LAYER {
            continue;
        }
        layers.insert(atom.clone(), FIRST_MARKER);
        let mut stack = vec![LayerFrame::new(atom.clone(), FIRST_MARKER, &depends_on)];
        let mut returned = None;
        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            if let Some(child_layer) = returned.take() {
                let bonus = frame.children[frame.next - 1].1;
                frame.layer = frame.layer.max(bonus + child_layer);
            }
            let Some((child, bonus)) = frame.children.get(frame.next).cloned() else {
                returned = Some(frame.layer);
                layers.insert(frame.atom.clone(), frame.layer);
                stack.pop();
                continue;
            };
            frame.next += 1;
            let marker = frame.marker - bonus;
            match layers.get(&child).copied().unwrap_or(NO_AXIOM) {
                NO_AXIOM => returned = Some(0),
                UNKNOWN_LAYER => {
                    layers.insert(child.clone(), marker);
                    stack.push(LayerFrame::new(child, marker, &depends_on));
                }
                layer if layer == marker => returned = Some(0),
                layer if layer <= FIRST_MARKER => {
                    panic!("Cyclic dependencies in axioms; cannot stratify.")
                }
                layer => returned = Some(layer),
            }
        }
    }
    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsed_types::Name;
    use crate::test_utils::*;
    use crate::translate::instantiate::explore;
    use crate::translate::normalize::{normalize, NEW_AXIOM_PREFIX};
    use crate::translate::task::{NameGenerator, Task};

    fn atom(predicate: &str) -> Atom {
        Atom::new(Name::new(predicate), vec![])
    }

    fn pos(predicate: &str) -> Literal {
        Literal::positive(atom(predicate))
    }

    fn neg(predicate: &str) -> Literal {
        Literal::negative(atom(predicate))
    }

    fn axiom(effect: &str, condition: Vec<Literal>) -> PropositionalAxiom {
        PropositionalAxiom::new(format!("({})", effect), condition, pos(effect))
    }

    fn action(precondition: Vec<Literal>) -> PropositionalAction {
        PropositionalAction::new("(a)".to_string(), precondition, vec![], 0)
    }

    /// Every axiom that moves its atom away from the default value comes
    /// no earlier than its derived conditions, and strictly later than
    /// those that hold by default.
    fn assert_stratified(rules: &AxiomRules) {
        for axiom in &rules.axioms {
            let head = &axiom.effect.atom;
            if axiom.effect.negated != rules.axiom_init.contains(head) {
                continue;
            }
            let head_layer = rules.layers[head];
            for condition in &axiom.condition {
                let Some(&layer) = rules.layers.get(&condition.atom) else {
                    continue;
                };
                if condition.negated != rules.axiom_init.contains(&condition.atom) {
                    assert!(layer < head_layer, "{} not below {}", condition, head);
                } else {
                    assert!(layer <= head_layer, "{} above {}", condition, head);
                }
            }
        }
    }

    #[test]
    fn simplification_drops_dominated_axioms() {
        let axioms = vec![
            axiom("p", vec![pos("a"), pos("b"), pos("a")]),
            axiom("p", vec![pos("a")]),
            axiom("p", vec![pos("a")]),
            axiom("p", vec![pos("p"), pos("c")]),
        ];
        assert_eq!(simplify(axioms), vec![axiom("p", vec![pos("a")])]);

        let axioms = vec![axiom("p", vec![pos("a")]), axiom("p", vec![])];
        assert_eq!(simplify(axioms), vec![axiom("p", vec![])]);
    }

    #[test]
    fn negation_multiplies_out_the_dnf() {
        let axioms = vec![axiom("p", vec![pos("a"), pos("b")]), axiom("p", vec![neg("c")])];
        let negated = negate(&atom("p"), &axioms);
        let conditions = negated
            .iter()
            .map(|axiom| axiom.condition.clone())
            .collect::<BTreeSet<_>>();
        assert_eq!(
            conditions,
            BTreeSet::from([vec![neg("a"), pos("c")], vec![neg("b"), pos("c")]])
        );
        assert!(negated.iter().all(|axiom| axiom.effect == neg("p")));

        assert!(negate(&atom("p"), &[axiom("p", vec![])]).is_empty());
    }

    #[test]
    fn unneeded_axioms_are_dropped() {
        let axioms = vec![axiom("p", vec![pos("a")]), axiom("q", vec![pos("b")])];
        let rules = handle_axioms(&[], axioms, &[pos("p")]);
        assert_eq!(rules.axioms, vec![axiom("p", vec![pos("a")])]);
        assert_eq!(rules.layers, BTreeMap::from([(atom("p"), 0)]));
        assert!(rules.axiom_init.is_empty());
    }

    #[test]
    fn negatively_needed_atoms_default_to_true() {
        let axioms = vec![axiom("p", vec![pos("a")]), axiom("p", vec![pos("b")])];
        let rules = handle_axioms(&[action(vec![neg("p")])], axioms, &[]);
        assert_eq!(rules.axiom_init, BTreeSet::from([atom("p")]));
        assert_eq!(
            rules.axioms,
            vec![PropositionalAxiom::new(
                "(p)".to_string(),
                vec![neg("a"), neg("b")],
                neg("p"),
            )]
        );
        assert_eq!(rules.layers[&atom("p")], 0);
    }

    #[test]
    fn delete_conditions_are_needed_negatively() {
        let mut delete = action(vec![]);
        delete.del_effects.push((vec![pos("p")], atom("x")));
        let rules = handle_axioms(&[delete], vec![axiom("p", vec![pos("a")])], &[]);
        assert_eq!(rules.axiom_init, BTreeSet::from([atom("p")]));
    }

    #[test]
    fn negation_raises_the_layer() {
        let axioms = vec![
            axiom("a", vec![pos("base")]),
            axiom("b", vec![pos("a")]),
            axiom("c", vec![neg("b")]),
            axiom("d", vec![pos("c"), pos("a")]),
        ];
        let rules = handle_axioms(&[], axioms, &[pos("d")]);
        // b is only needed negatively, so it defaults to true and its
        // negated axiom waits for a
        assert_eq!(rules.axiom_init, BTreeSet::from([atom("b")]));
        assert_eq!(rules.layers[&atom("a")], 0);
        assert_eq!(rules.layers[&atom("b")], 1);
        assert_eq!(rules.layers[&atom("c")], 1);
        assert_eq!(rules.layers[&atom("d")], 1);
        assert_stratified(&rules);
    }

    #[test]
    fn positive_cycles_share_a_layer() {
        let axioms = vec![
            axiom("p", vec![pos("q")]),
            axiom("q", vec![pos("p")]),
            axiom("q", vec![pos("base")]),
        ];
        let rules = handle_axioms(&[], axioms, &[pos("p")]);
        assert_eq!(rules.layers[&atom("p")], 0);
        assert_eq!(rules.layers[&atom("q")], 0);
        assert_stratified(&rules);
    }

    #[test]
    #[should_panic(expected = "Cyclic dependencies in axioms; cannot stratify.")]
    fn negative_cycles_cannot_be_stratified() {
        let axioms = vec![axiom("p", vec![neg("q")]), axiom("q", vec![neg("p")])];
        handle_axioms(&[action(vec![neg("p")])], axioms, &[pos("p")]);
    }

    #[test]
    #[should_panic(expected = "Cyclic dependencies in axioms; cannot stratify.")]
    fn negative_cycle_domain_cannot_be_stratified() {
        let mut task =
            Task::from_text(NEGATIVE_AXIOM_CYCLE_DOMAIN_TEXT, NEGATIVE_AXIOM_CYCLE_PROBLEM_TEXT)
                .unwrap();
        normalize(&mut task, &mut NameGenerator::new(NEW_AXIOM_PREFIX)).unwrap();
        let result = explore(&task);
        assert!(result.relaxed_reachable);
        let goals = task
            .goal
            .literals()
            .unwrap()
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        handle_axioms(&result.actions, result.axioms, &goals);
    }

    #[test]
    fn adl_axioms_are_stratified() {
        let mut task = Task::from_text(ADL_DOMAIN_TEXT, ADL_PROBLEM_TEXT).unwrap();
        normalize(&mut task, &mut NameGenerator::new(NEW_AXIOM_PREFIX)).unwrap();
        let result = explore(&task);
        let goals = task
            .goal
            .literals()
            .unwrap()
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        let rules = handle_axioms(&result.actions, result.axioms, &goals);
        assert!(!rules.axioms.is_empty());
        assert!(rules.layers.values().all(|layer| *layer >= 0));
        assert_stratified(&rules);
    }
}
