//! Candidate invariants and the balance check that proves them.
//!
//! An invariant with parts `P1, ..., Pn` and parameters `V1, ..., Vk` states
//! that for every binding of `V1, ..., Vk`, at most one fact matching some
//! instantiated part is true. Each part may leave one argument position
//! unbound; that position is the one being counted.

use crate::parsed_types::Name;
use crate::translate::invariants::constraints::{
    ConstraintSystem, EqualityConjunction, InequalityDisjunction,
};
use crate::translate::invariants::BalanceChecker;
use crate::translate::task::{Action, Atom, Condition, Effect, Literal};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::{Display, Formatter};

/// Placeholder for the counted argument of an instantiated part.
pub const COUNTED_ARGUMENT: &str = "?X";

const EQUALITY: &str = "=";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvariantPart {
    pub predicate: Name,
    /// `order[i]` is the argument position bound to the `i`-th invariant
    /// parameter.
    pub order: Vec<usize>,
    /// The counted argument position, if the predicate has one.
    pub omitted_pos: Option<usize>,
}

impl InvariantPart {
    pub fn new(predicate: Name, order: Vec<usize>, omitted_pos: Option<usize>) -> Self {
        Self {
            predicate,
            order,
            omitted_pos,
        }
    }

    pub fn arity(&self) -> usize {
        self.order.len()
    }

    /// The invariant parameters an atom of this part is counted under.
    pub fn get_parameters(&self, atom: &Atom) -> Vec<Name> {
        self.order.iter().map(|position| atom.args[*position]).collect()
    }

    /// Equates the invariant parameters with the matching arguments of
    /// `atom`.
    pub fn get_assignment(&self, parameters: &[Name], atom: &Atom) -> EqualityConjunction {
        EqualityConjunction::new(
            parameters
                .iter()
                .zip(&self.order)
                .map(|(parameter, position)| (*parameter, atom.args[*position]))
                .collect(),
        )
    }

    /// The atom this part denotes for the given parameters, with
    /// [`COUNTED_ARGUMENT`] at the counted position.
    pub fn instantiate(&self, parameters: &[Name]) -> Atom {
        let length = self.order.len() + usize::from(self.omitted_pos.is_some());
        let mut args = vec![Name::new(COUNTED_ARGUMENT); length];
        for (parameter, position) in parameters.iter().zip(&self.order) {
            args[*position] = *parameter;
        }
        Atom::new(self.predicate, args)
    }

    /// Ways to map the arguments of `other` onto the parameters this part
    /// binds in `own`, as `(position in other, parameter index)` pairs.
    /// `None` marks the position of `other` that becomes its counted
    /// argument.
    fn possible_mappings(&self, own: &Atom, other: &Atom) -> Vec<Vec<(usize, Option<usize>)>> {
        let mut allowed_omissions = match other.args.len().checked_sub(self.arity()) {
            Some(n @ (0 | 1)) => n,
            _ => return vec![],
        };
        let own_positions_by_arg = invert_list(&self.get_parameters(own));
        let other_positions_by_arg = invert_list(&other.args);

        let mut factored_mapping = vec![];
        for (arg, other_positions) in other_positions_by_arg {
            let mut own_positions = own_positions_by_arg
                .get(&arg)
                .map(|positions| positions.iter().copied().map(Some).collect_vec())
                .unwrap_or_default();
            if own_positions.len() + 1 == other_positions.len() && allowed_omissions == 1 {
                own_positions.push(None);
                allowed_omissions = 0;
            } else if own_positions.len() != other_positions.len() {
                return vec![];
            }
            factored_mapping.push((other_positions, own_positions));
        }
        instantiate_factored_mapping(factored_mapping)
    }

    /// Parts for the predicate of `other` that would count `other` exactly
    /// when this part counts `own`.
    pub fn possible_matches(&self, own: &Atom, other: &Atom) -> Vec<InvariantPart> {
        assert_eq!(self.predicate, own.predicate);
        self.possible_mappings(own, other)
            .into_iter()
            .map(|mapping| {
                let mut order = vec![0; self.arity()];
                let mut omitted_pos = None;
                for (other_position, parameter) in mapping {
                    match parameter {
                        Some(parameter) => order[parameter] = other_position,
                        None => omitted_pos = Some(other_position),
                    }
                }
                InvariantPart::new(other.predicate, order, omitted_pos)
            })
            .collect()
    }
}

impl Display for InvariantPart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.predicate, self.order.iter().join(" "))?;
        if let Some(omitted) = self.omitted_pos {
            write!(f, " [{}]", omitted)?;
        }
        Ok(())
    }
}

fn invert_list(list: &[Name]) -> BTreeMap<Name, Vec<usize>> {
    let mut result: BTreeMap<Name, Vec<usize>> = BTreeMap::new();
    for (position, arg) in list.iter().enumerate() {
        result.entry(*arg).or_default().push(position);
    }
    result
}

/// Every combination of one permutation per `(preimage, image)` pair.
fn instantiate_factored_mapping<A: Copy, B: Copy>(pairs: Vec<(Vec<A>, Vec<B>)>) -> Vec<Vec<(A, B)>> {
    if pairs.is_empty() {
        return vec![vec![]];
    }
    pairs
        .iter()
        .map(|(preimage, image)| {
            image
                .iter()
                .copied()
                .permutations(image.len())
                .map(|permutation| preimage.iter().copied().zip(permutation).collect_vec())
                .collect_vec()
        })
        .multi_cartesian_product()
        .map(|parts| parts.concat())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Invariant {
    parts: BTreeSet<InvariantPart>,
}

impl Invariant {
    pub fn new(parts: BTreeSet<InvariantPart>) -> Self {
        assert!(!parts.is_empty(), "Invariant without parts");
        let predicates = parts.iter().map(|part| part.predicate).collect::<HashSet<_>>();
        assert_eq!(
            predicates.len(),
            parts.len(),
            "Invariant with two parts for one predicate: {:?}",
            parts
        );
        Self { parts }
    }

    pub fn parts(&self) -> impl Iterator<Item = &InvariantPart> {
        self.parts.iter()
    }

    pub fn predicates(&self) -> impl Iterator<Item = Name> + '_ {
        self.parts.iter().map(|part| part.predicate)
    }

    pub fn part(&self, predicate: Name) -> Option<&InvariantPart> {
        self.parts.iter().find(|part| part.predicate == predicate)
    }

    pub fn arity(&self) -> usize {
        self.parts.first().map_or(0, InvariantPart::arity)
    }

    pub fn get_parameters(&self, atom: &Atom) -> Option<Vec<Name>> {
        self.part(atom.predicate).map(|part| part.get_parameters(atom))
    }

    /// One atom per part, in part order.
    pub fn instantiate(&self, parameters: &[Name]) -> Vec<Atom> {
        self.parts
            .iter()
            .map(|part| part.instantiate(parameters))
            .collect()
    }

    fn covering_assignment(&self, parameters: &[Name], atom: &Atom) -> EqualityConjunction {
        self.part(atom.predicate)
            .unwrap_or_else(|| panic!("{} is not covered by {}", atom, self))
            .get_assignment(parameters, atom)
    }

    fn with_part(&self, part: InvariantPart) -> Invariant {
        let mut parts = self.parts.clone();
        parts.insert(part);
        Invariant::new(parts)
    }

    /// Whether no action can make two facts of one group true or add a fact
    /// without deleting another. Actions that add an uncompensated fact
    /// propose extended candidates through `enqueue`.
    pub fn check_balance(
        &self,
        balance_checker: &BalanceChecker,
        enqueue: &mut impl FnMut(Invariant),
    ) -> bool {
        let actions_to_check = self
            .predicates()
            .flat_map(|predicate| balance_checker.threats(predicate))
            .collect::<BTreeSet<_>>();
        for action in actions_to_check {
            if self.operator_too_heavy(balance_checker.heavy_action(action)) {
                return false;
            }
            if self.operator_unbalanced(balance_checker.action(action), enqueue) {
                return false;
            }
        }
        true
    }

    fn relevant_add_effects<'a>(&self, action: &'a Action) -> Vec<&'a Effect> {
        action
            .effects
            .iter()
            .filter(|effect| !effect.literal.negated && self.part(effect.literal.atom.predicate).is_some())
            .collect()
    }

    /// Whether two add effects of `action` can hit the same group at once.
    /// `action` has its universal effects duplicated, so one such effect can
    /// be paired with itself.
    fn operator_too_heavy(&self, action: &Action) -> bool {
        let add_effects = self.relevant_add_effects(action);
        if add_effects.len() <= 1 {
            return false;
        }
        let invariant_variables = find_unique_variables(action, self.arity());
        for (first, second) in add_effects.iter().tuple_combinations() {
            let mut system = ConstraintSystem::new();
            ensure_inequality(&mut system, &first.literal, &second.literal);
            ensure_cover(&mut system, &first.literal.atom, self, &invariant_variables);
            ensure_cover(&mut system, &second.literal.atom, self, &invariant_variables);
            let negated = [first.literal.negate(), second.literal.negate()];
            ensure_conjunction_sat(
                &mut system,
                literals(&action.precondition)
                    .into_iter()
                    .chain(literals(&first.condition))
                    .chain(literals(&second.condition))
                    .chain(negated.iter()),
            );
            if system.is_solvable() {
                return true;
            }
        }
        false
    }

    fn operator_unbalanced(&self, action: &Action, enqueue: &mut impl FnMut(Invariant)) -> bool {
        let invariant_variables = find_unique_variables(action, self.arity());
        let del_effects = action
            .effects
            .iter()
            .filter(|effect| effect.literal.negated && self.part(effect.literal.atom.predicate).is_some())
            .collect_vec();
        self.relevant_add_effects(action).into_iter().any(|add_effect| {
            self.add_effect_unbalanced(action, add_effect, &del_effects, &invariant_variables, enqueue)
        })
    }

    /// Renamings of the action parameters under which `add_effect` is
    /// covered, each forbidding any identification it does not need.
    fn minimal_covering_renamings(
        &self,
        action: &Action,
        add_effect: &Effect,
        invariant_variables: &[Name],
    ) -> Vec<ConstraintSystem> {
        let assignment = self.covering_assignment(invariant_variables, &add_effect.literal.atom);
        let mapping = assignment.mapping().unwrap_or_default();
        let mut system = ConstraintSystem::new();
        for (first, second) in action.parameters.iter().map(|p| p.name).tuple_combinations() {
            let representative = |name: Name| *mapping.get(&name).unwrap_or(&name);
            if representative(first) != representative(second) {
                system.add_inequality_disjunction(InequalityDisjunction::new(vec![(first, second)]));
            }
        }
        system.add_equality_conjunction(assignment);
        vec![system]
    }

    fn add_effect_unbalanced(
        &self,
        action: &Action,
        add_effect: &Effect,
        del_effects: &[&Effect],
        invariant_variables: &[Name],
        enqueue: &mut impl FnMut(Invariant),
    ) -> bool {
        let mut renamings = self.minimal_covering_renamings(action, add_effect, invariant_variables);

        let negated_add = add_effect.literal.negate();
        let mut lhs_by_predicate: HashMap<Name, Vec<&Literal>> = HashMap::new();
        for literal in literals(&action.precondition)
            .into_iter()
            .chain(literals(&add_effect.condition))
            .chain(std::iter::once(&negated_add))
        {
            lhs_by_predicate
                .entry(literal.atom.predicate)
                .or_default()
                .push(literal);
        }

        for del_effect in del_effects {
            renamings = self.unbalanced_renamings(
                del_effect,
                add_effect,
                invariant_variables,
                &lhs_by_predicate,
                renamings,
            );
            if renamings.is_empty() {
                return false;
            }
        }

        self.refine_candidate(add_effect, action, enqueue);
        true
    }

    /// Proposes this invariant extended by a part that would let a delete
    /// effect of `action` balance `add_effect`.
    fn refine_candidate(&self, add_effect: &Effect, action: &Action, enqueue: &mut impl FnMut(Invariant)) {
        let Some(part) = self.part(add_effect.literal.atom.predicate) else {
            return;
        };
        for del_effect in action.effects.iter().filter(|e| e.literal.negated) {
            if self.part(del_effect.literal.atom.predicate).is_some() {
                continue;
            }
            for new_part in part.possible_matches(&add_effect.literal.atom, &del_effect.literal.atom) {
                enqueue(self.with_part(new_part));
            }
        }
    }

    /// The renamings among `renamings` for which `del_effect` does not
    /// balance `add_effect`.
    fn unbalanced_renamings(
        &self,
        del_effect: &Effect,
        add_effect: &Effect,
        invariant_variables: &[Name],
        lhs_by_predicate: &HashMap<Name, Vec<&Literal>>,
        renamings: Vec<ConstraintSystem>,
    ) -> Vec<ConstraintSystem> {
        let cover = self.covering_assignment(invariant_variables, &del_effect.literal.atom);

        // Only quantified variables of the delete effect may be renamed, so
        // objects it needs must already be forced by the renaming.
        let mut constant_test = ConstraintSystem::new();
        let mut check_constants = false;
        for (variable, term) in cover.equalities() {
            if !term.is_variable() {
                check_constants = true;
                constant_test.add_inequality_disjunction(InequalityDisjunction::new(vec![(*variable, *term)]));
            }
        }

        let mut system = ConstraintSystem::new();
        system.add_equality_conjunction(cover);
        ensure_inequality(&mut system, &add_effect.literal, &del_effect.literal);
        let implies = imply_del_effect(del_effect, lhs_by_predicate);

        let mut still_unbalanced = vec![];
        for renaming in renamings {
            if check_constants && constant_test.combined(&renaming).is_solvable() {
                still_unbalanced.push(renaming);
                continue;
            }
            let mut new_system = system.combined(&renaming);
            if lhs_satisfiable(&renaming, lhs_by_predicate) {
                match &implies {
                    Some(implies) => new_system.extend(implies),
                    None => {
                        still_unbalanced.push(renaming);
                        continue;
                    }
                }
            }
            if !new_system.is_solvable() {
                still_unbalanced.push(renaming);
            }
        }
        still_unbalanced
    }
}

impl Display for Invariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.parts.iter().join(", "))
    }
}

/// Literals of a normalized condition. Impossible conditions contribute
/// nothing.
fn literals(condition: &Condition) -> Vec<&Literal> {
    condition.literals().unwrap_or_default()
}

/// Fresh variable names for the invariant parameters, distinct from every
/// variable of `action`.
fn find_unique_variables(action: &Action, arity: usize) -> Vec<Name> {
    let used = action
        .parameters
        .iter()
        .chain(action.effects.iter().flat_map(|effect| &effect.parameters))
        .map(|parameter| parameter.name)
        .collect::<HashSet<_>>();
    (1..)
        .map(|counter| Name::new(format!("?v{}", counter)))
        .filter(|name| !used.contains(name))
        .take(arity)
        .collect()
}

/// Solvable only if the conjunction of `literals` is satisfiable. Equality
/// literals become constraints; otherwise only complementary literals of one
/// predicate are taken into account.
fn ensure_conjunction_sat<'a>(system: &mut ConstraintSystem, literals: impl IntoIterator<Item = &'a Literal>) {
    let mut positive: BTreeMap<Name, Vec<&Atom>> = BTreeMap::new();
    let mut negative: BTreeMap<Name, Vec<&Atom>> = BTreeMap::new();
    for literal in literals {
        let atom = &literal.atom;
        if atom.predicate == EQUALITY {
            let pair = (atom.args[0], atom.args[1]);
            if literal.negated {
                system.add_inequality_disjunction(InequalityDisjunction::new(vec![pair]));
            } else {
                system.add_equality_conjunction(EqualityConjunction::new(vec![pair]));
            }
        } else if literal.negated {
            negative.entry(atom.predicate).or_default().push(atom);
        } else {
            positive.entry(atom.predicate).or_default().push(atom);
        }
    }
    for (predicate, positive_atoms) in &positive {
        let Some(negative_atoms) = negative.get(predicate) else {
            continue;
        };
        for (positive_atom, negative_atom) in positive_atoms.iter().cartesian_product(negative_atoms) {
            let parts = negative_atom
                .args
                .iter()
                .copied()
                .zip(positive_atom.args.iter().copied())
                .collect_vec();
            if !parts.is_empty() {
                system.add_inequality_disjunction(InequalityDisjunction::new(parts));
            }
        }
    }
}

/// Solvable only if `atom` is covered by `invariant` under `variables`.
fn ensure_cover(system: &mut ConstraintSystem, atom: &Atom, invariant: &Invariant, variables: &[Name]) {
    system.add_equality_conjunction(invariant.covering_assignment(variables, atom));
}

/// Solvable only if the two literals have different atoms.
fn ensure_inequality(system: &mut ConstraintSystem, first: &Literal, second: &Literal) {
    if first.atom.predicate == second.atom.predicate && !first.atom.args.is_empty() {
        system.add_inequality_disjunction(InequalityDisjunction::new(
            first
                .atom
                .args
                .iter()
                .copied()
                .zip(second.atom.args.iter().copied())
                .collect(),
        ));
    }
}

fn lhs_satisfiable(renaming: &ConstraintSystem, lhs_by_predicate: &HashMap<Name, Vec<&Literal>>) -> bool {
    let mut system = renaming.clone();
    ensure_conjunction_sat(&mut system, lhs_by_predicate.values().flatten().copied());
    system.is_solvable()
}

/// A system that is solvable if the left-hand side implies the condition
/// and the deleted atom of `del_effect`, or `None` if it never does.
///
/// Implication is only recognised through literals of the left-hand side
/// that match syntactically. This rejects some balanced actions, for
/// example ones whose delete effect is implied only through a quantified
/// condition, but never accepts an unbalanced one.
fn imply_del_effect(del_effect: &Effect, lhs_by_predicate: &HashMap<Name, Vec<&Literal>>) -> Option<ConstraintSystem> {
    let mut implies = ConstraintSystem::new();
    let deleted = del_effect.literal.negate();
    for literal in literals(&del_effect.condition).into_iter().chain(std::iter::once(&deleted)) {
        let possible_assignments = lhs_by_predicate
            .get(&literal.atom.predicate)
            .into_iter()
            .flatten()
            .filter(|candidate| candidate.negated == literal.negated)
            .map(|candidate| {
                EqualityConjunction::new(
                    literal
                        .atom
                        .args
                        .iter()
                        .copied()
                        .zip(candidate.atom.args.iter().copied())
                        .collect(),
                )
            })
            .collect_vec();
        if possible_assignments.is_empty() {
            return None;
        }
        implies.add_equality_dnf(possible_assignments);
    }
    Some(implies)
}
