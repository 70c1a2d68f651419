//! Equality and inequality constraints over variables and objects, used to
//! decide whether two effects of an action can touch the same invariant
//! group.

use crate::parsed_types::Name;
use itertools::Itertools;
use petgraph::unionfind::UnionFind;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// `(x1 != y1) or ... or (xn != yn)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InequalityDisjunction {
    parts: Vec<(Name, Name)>,
}

impl InequalityDisjunction {
    pub fn new(parts: Vec<(Name, Name)>) -> Self {
        assert!(!parts.is_empty(), "Empty inequality disjunction");
        Self { parts }
    }

    fn holds(&self, representatives: &HashMap<Name, Name>) -> bool {
        let representative = |term: &Name| *representatives.get(term).unwrap_or(term);
        self.parts
            .iter()
            .any(|(left, right)| representative(left) != representative(right))
    }
}

impl Display for InequalityDisjunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({})",
            self.parts
                .iter()
                .map(|(left, right)| format!("({} != {})", left, right))
                .join(" or ")
        )
    }
}

/// `(x1 = y1) and ... and (xn = yn)`, where each term is a variable or an
/// object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EqualityConjunction {
    equalities: Vec<(Name, Name)>,
}

impl EqualityConjunction {
    pub fn new(equalities: Vec<(Name, Name)>) -> Self {
        Self { equalities }
    }

    pub fn equalities(&self) -> &[(Name, Name)] {
        &self.equalities
    }

    /// Maps every term to the representative of its equivalence class: the
    /// object in the class if there is one, the smallest variable otherwise.
    /// Returns `None` if two different objects end up in one class.
    pub fn mapping(&self) -> Option<HashMap<Name, Name>> {
        let mut indices: HashMap<Name, usize> = HashMap::new();
        for (left, right) in &self.equalities {
            for term in [left, right] {
                let next = indices.len();
                indices.entry(*term).or_insert(next);
            }
        }
        let mut classes = UnionFind::<usize>::new(indices.len());
        for (left, right) in &self.equalities {
            classes.union(indices[left], indices[right]);
        }
        let mut members: HashMap<usize, Vec<Name>> = HashMap::new();
        for (term, index) in &indices {
            members.entry(classes.find(*index)).or_default().push(*term);
        }

        let mut mapping = HashMap::with_capacity(indices.len());
        for terms in members.values() {
            let mut objects = terms.iter().filter(|term| !term.is_variable());
            let representative = match (objects.next(), objects.next()) {
                (Some(_), Some(_)) => return None,
                (Some(object), None) => *object,
                (None, _) => *terms.iter().min()?,
            };
            for term in terms {
                mapping.insert(*term, representative);
            }
        }
        Some(mapping)
    }
}

impl Display for EqualityConjunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({})",
            self.equalities
                .iter()
                .map(|(left, right)| format!("({} = {})", left, right))
                .join(" and ")
        )
    }
}

/// A conjunction of equality DNFs and inequality disjunctions.
///
/// The system is solvable if one [`EqualityConjunction`] can be picked from
/// every DNF such that the equivalence relation induced by all picked
/// equalities never equates two different objects, and every
/// [`InequalityDisjunction`] has a part whose terms lie in different
/// classes.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSystem {
    equality_dnfs: Vec<Vec<EqualityConjunction>>,
    inequality_disjunctions: Vec<InequalityDisjunction>,
}

impl ConstraintSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_equality_conjunction(&mut self, conjunction: EqualityConjunction) {
        self.add_equality_dnf(vec![conjunction]);
    }

    pub fn add_equality_dnf(&mut self, dnf: Vec<EqualityConjunction>) {
        self.equality_dnfs.push(dnf);
    }

    pub fn add_inequality_disjunction(&mut self, disjunction: InequalityDisjunction) {
        self.inequality_disjunctions.push(disjunction);
    }

    pub fn extend(&mut self, other: &ConstraintSystem) {
        self.equality_dnfs.extend(other.equality_dnfs.iter().cloned());
        self.inequality_disjunctions
            .extend(other.inequality_disjunctions.iter().cloned());
    }

    pub fn combined(&self, other: &ConstraintSystem) -> ConstraintSystem {
        let mut result = self.clone();
        result.extend(other);
        result
    }

    fn inequalities_hold(&self, representatives: &HashMap<Name, Name>) -> bool {
        self.inequality_disjunctions
            .iter()
            .all(|disjunction| disjunction.holds(representatives))
    }

    pub fn is_solvable(&self) -> bool {
        if self.equality_dnfs.is_empty() {
            return self.inequalities_hold(&HashMap::new());
        }
        self.equality_dnfs
            .iter()
            .map(|dnf| dnf.iter())
            .multi_cartesian_product()
            .any(|choice| {
                let combined = EqualityConjunction::new(
                    choice
                        .into_iter()
                        .flat_map(|conjunction| conjunction.equalities.iter().copied())
                        .collect(),
                );
                combined
                    .mapping()
                    .is_some_and(|mapping| self.inequalities_hold(&mapping))
            })
    }
}

impl Display for ConstraintSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let equalities = self
            .equality_dnfs
            .iter()
            .map(|dnf| format!("({})", dnf.iter().join(" or ")))
            .join(" and ");
        let inequalities = self.inequality_disjunctions.iter().join(" and ");
        write!(f, "{} ({})", equalities, inequalities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(left: &str, right: &str) -> (Name, Name) {
        (Name::new(left), Name::new(right))
    }

    #[test]
    fn objects_represent_their_class() {
        let conjunction = EqualityConjunction::new(vec![pair("?x", "?y"), pair("?y", "a")]);
        let mapping = conjunction.mapping().unwrap();
        assert_eq!(mapping[&Name::new("?x")], Name::new("a"));
        assert_eq!(mapping[&Name::new("?y")], Name::new("a"));

        let conjunction = EqualityConjunction::new(vec![pair("?y", "?x")]);
        let mapping = conjunction.mapping().unwrap();
        assert_eq!(mapping[&Name::new("?y")], Name::new("?x"));
    }

    #[test]
    fn two_objects_in_one_class_are_inconsistent() {
        let conjunction =
            EqualityConjunction::new(vec![pair("?x", "a"), pair("?y", "b"), pair("?x", "?y")]);
        assert_eq!(conjunction.mapping(), None);
    }

    #[test]
    fn empty_system_is_solvable() {
        assert!(ConstraintSystem::new().is_solvable());
    }

    #[test]
    fn inequalities_must_survive_the_equalities() {
        let mut system = ConstraintSystem::new();
        system.add_equality_conjunction(EqualityConjunction::new(vec![pair("?x", "?y")]));
        system.add_inequality_disjunction(InequalityDisjunction::new(vec![pair("?x", "?y")]));
        assert!(!system.is_solvable());

        let mut system = ConstraintSystem::new();
        system.add_equality_conjunction(EqualityConjunction::new(vec![pair("?x", "?y")]));
        system.add_inequality_disjunction(InequalityDisjunction::new(vec![
            pair("?x", "?y"),
            pair("?x", "?z"),
        ]));
        assert!(system.is_solvable());
    }

    #[test]
    fn one_disjunct_per_dnf_is_enough() {
        let mut system = ConstraintSystem::new();
        system.add_equality_dnf(vec![
            EqualityConjunction::new(vec![pair("?x", "a")]),
            EqualityConjunction::new(vec![pair("?x", "b")]),
        ]);
        system.add_equality_conjunction(EqualityConjunction::new(vec![pair("?x", "?y")]));
        system.add_inequality_disjunction(InequalityDisjunction::new(vec![pair("?y", "a")]));
        assert!(system.is_solvable());

        system.add_inequality_disjunction(InequalityDisjunction::new(vec![pair("?y", "b")]));
        assert!(!system.is_solvable());

        let mut empty_choice = ConstraintSystem::new();
        empty_choice.add_equality_dnf(vec![]);
        assert!(!empty_choice.is_solvable());
    }
}
