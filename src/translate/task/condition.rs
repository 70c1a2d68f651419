//! Lifted conditions in negation normal form.

use crate::parsed_types::Name;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::{Display, Formatter};

/// A predicate applied to objects and/or `?variables`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom {
    pub predicate: Name,
    pub args: Vec<Name>,
}

impl Atom {
    pub fn new<A: Into<Vec<Name>>>(predicate: Name, args: A) -> Self {
        Self {
            predicate,
            args: args.into(),
        }
    }

    pub fn variables(&self) -> impl Iterator<Item = &Name> + '_ {
        self.args.iter().filter(|arg| arg.is_variable())
    }

    pub fn rename_variables(&self, renamings: &HashMap<Name, Name>) -> Atom {
        Atom::new(
            self.predicate,
            self.args
                .iter()
                .map(|arg| *renamings.get(arg).unwrap_or(arg))
                .collect::<Vec<_>>(),
        )
    }

    pub fn replace_argument(&self, position: usize, new_arg: Name) -> Atom {
        let mut args = self.args.clone();
        args[position] = new_arg;
        Atom::new(self.predicate, args)
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.predicate)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

/// An atom or its negation. Sorts by atom first, then polarity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub atom: Atom,
    pub negated: bool,
}

impl Literal {
    pub const fn positive(atom: Atom) -> Self {
        Self {
            atom,
            negated: false,
        }
    }

    pub const fn negative(atom: Atom) -> Self {
        Self {
            atom,
            negated: true,
        }
    }

    pub fn negate(&self) -> Literal {
        Literal {
            atom: self.atom.clone(),
            negated: !self.negated,
        }
    }

    pub fn rename_variables(&self, renamings: &HashMap<Name, Name>) -> Literal {
        Literal {
            atom: self.atom.rename_variables(renamings),
            negated: self.negated,
        }
    }

    /// Grounds the literal under `var_mapping`. Arguments without a mapping
    /// are kept as they are.
    pub fn ground(&self, var_mapping: &HashMap<Name, Name>) -> Literal {
        self.rename_variables(var_mapping)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            write!(f, "NegatedAtom {}", self.atom)
        } else {
            write!(f, "Atom {}", self.atom)
        }
    }
}

/// A variable or object together with its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypedObject {
    pub name: Name,
    pub type_name: Name,
}

impl TypedObject {
    pub const fn new(name: Name, type_name: Name) -> Self {
        Self { name, type_name }
    }

    /// The type membership atom `type(name)`.
    pub fn type_atom(&self) -> Atom {
        Atom::new(self.type_name, vec![self.name])
    }

    /// Renames `self` if its name is already taken in `type_map`, recording
    /// the renaming. Registers the (possibly new) name in `type_map`.
    pub fn uniquify_name(
        &self,
        type_map: &mut HashMap<Name, Name>,
        renamings: &mut HashMap<Name, Name>,
    ) -> TypedObject {
        if !type_map.contains_key(&self.name) {
            type_map.insert(self.name, self.type_name);
            return self.clone();
        }
        let mut counter = 1;
        loop {
            let candidate = Name::new(format!("{}{}", self.name, counter));
            if !type_map.contains_key(&candidate) {
                renamings.insert(self.name, candidate);
                type_map.insert(candidate, self.type_name);
                return TypedObject::new(candidate, self.type_name);
            }
            counter += 1;
        }
    }
}

impl Display for TypedObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.type_name)
    }
}

/// Raised while instantiating a condition that can never hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Impossible;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    Truth,
    Falsity,
    Literal(Literal),
    Conjunction(Vec<Condition>),
    Disjunction(Vec<Condition>),
    Universal(Vec<TypedObject>, Box<Condition>),
    Existential(Vec<TypedObject>, Box<Condition>),
}

impl Condition {
    pub fn atom(atom: Atom) -> Self {
        Condition::Literal(Literal::positive(atom))
    }

    pub fn negated_atom(atom: Atom) -> Self {
        Condition::Literal(Literal::negative(atom))
    }

    pub fn negate(&self) -> Condition {
        match self {
            Condition::Truth => Condition::Falsity,
            Condition::Falsity => Condition::Truth,
            Condition::Literal(literal) => Condition::Literal(literal.negate()),
            Condition::Conjunction(parts) => {
                Condition::Disjunction(parts.iter().map(Condition::negate).collect())
            }
            Condition::Disjunction(parts) => {
                Condition::Conjunction(parts.iter().map(Condition::negate).collect())
            }
            Condition::Universal(parameters, part) => {
                Condition::Existential(parameters.clone(), Box::new(part.negate()))
            }
            Condition::Existential(parameters, part) => {
                Condition::Universal(parameters.clone(), Box::new(part.negate()))
            }
        }
    }

    /// Flattens nested junctors and removes constant parts, bottom-up.
    pub fn simplified(self) -> Condition {
        match self {
            Condition::Conjunction(parts) => {
                let mut result = vec![];
                for part in parts.into_iter().map(Condition::simplified) {
                    match part {
                        Condition::Conjunction(inner) => result.extend(inner),
                        Condition::Falsity => return Condition::Falsity,
                        Condition::Truth => {}
                        other => result.push(other),
                    }
                }
                match result.len() {
                    0 => Condition::Truth,
                    1 => result.pop().unwrap_or(Condition::Truth),
                    _ => Condition::Conjunction(result),
                }
            }
            Condition::Disjunction(parts) => {
                let mut result = vec![];
                for part in parts.into_iter().map(Condition::simplified) {
                    match part {
                        Condition::Disjunction(inner) => result.extend(inner),
                        Condition::Truth => return Condition::Truth,
                        Condition::Falsity => {}
                        other => result.push(other),
                    }
                }
                match result.len() {
                    0 => Condition::Falsity,
                    1 => result.pop().unwrap_or(Condition::Falsity),
                    _ => Condition::Disjunction(result),
                }
            }
            Condition::Universal(parameters, part) => match part.simplified() {
                constant @ (Condition::Truth | Condition::Falsity) => constant,
                part => Condition::Universal(parameters, Box::new(part)),
            },
            Condition::Existential(parameters, part) => match part.simplified() {
                constant @ (Condition::Truth | Condition::Falsity) => constant,
                part => Condition::Existential(parameters, Box::new(part)),
            },
            other => other,
        }
    }

    /// Direct sub-conditions.
    pub fn parts(&self) -> &[Condition] {
        match self {
            Condition::Conjunction(parts) | Condition::Disjunction(parts) => parts,
            Condition::Universal(_, part) | Condition::Existential(_, part) => {
                std::slice::from_ref(part.as_ref())
            }
            _ => &[],
        }
    }

    /// Rebuilds the same kind of condition around new parts.
    pub fn change_parts(&self, mut parts: Vec<Condition>) -> Condition {
        match self {
            Condition::Conjunction(_) => Condition::Conjunction(parts),
            Condition::Disjunction(_) => Condition::Disjunction(parts),
            Condition::Universal(parameters, _) => {
                Condition::Universal(parameters.clone(), Box::new(parts.remove(0)))
            }
            Condition::Existential(parameters, _) => {
                Condition::Existential(parameters.clone(), Box::new(parts.remove(0)))
            }
            other => other.clone(),
        }
    }

    pub fn free_variables(&self) -> BTreeSet<Name> {
        match self {
            Condition::Truth | Condition::Falsity => BTreeSet::new(),
            Condition::Literal(literal) => literal.atom.variables().copied().collect(),
            Condition::Conjunction(parts) | Condition::Disjunction(parts) => parts
                .iter()
                .flat_map(|part| part.free_variables())
                .collect(),
            Condition::Universal(parameters, part) | Condition::Existential(parameters, part) => {
                let mut result = part.free_variables();
                for parameter in parameters {
                    result.remove(&parameter.name);
                }
                result
            }
        }
    }

    pub fn has_disjunction(&self) -> bool {
        matches!(self, Condition::Disjunction(_))
            || self.parts().iter().any(Condition::has_disjunction)
    }

    pub fn has_existential_part(&self) -> bool {
        matches!(self, Condition::Existential(_, _))
            || self.parts().iter().any(Condition::has_existential_part)
    }

    pub fn has_universal_part(&self) -> bool {
        matches!(self, Condition::Universal(_, _))
            || self.parts().iter().any(Condition::has_universal_part)
    }

    /// Types of all quantified variables, keyed by variable name.
    pub fn quantified_variable_types(&self, type_map: &mut HashMap<Name, Name>) {
        if let Condition::Universal(parameters, _) | Condition::Existential(parameters, _) = self {
            for parameter in parameters {
                type_map.insert(parameter.name, parameter.type_name);
            }
        }
        for part in self.parts() {
            part.quantified_variable_types(type_map);
        }
    }

    /// Renames quantified variables that clash with names already in
    /// `type_map`, so that every variable of one action or axiom is bound
    /// exactly once.
    pub fn uniquify_variables(
        &self,
        type_map: &mut HashMap<Name, Name>,
        renamings: &HashMap<Name, Name>,
    ) -> Condition {
        match self {
            Condition::Literal(literal) => Condition::Literal(literal.rename_variables(renamings)),
            Condition::Universal(parameters, part) | Condition::Existential(parameters, part) => {
                let mut renamings = renamings.clone();
                let new_parameters = parameters
                    .iter()
                    .map(|parameter| parameter.uniquify_name(type_map, &mut renamings))
                    .collect();
                let new_part = part.uniquify_variables(type_map, &renamings);
                self.change_parts(vec![new_part]).with_parameters(new_parameters)
            }
            _ => self.change_parts(
                self.parts()
                    .iter()
                    .map(|part| part.uniquify_variables(type_map, renamings))
                    .collect(),
            ),
        }
    }

    fn with_parameters(self, parameters: Vec<TypedObject>) -> Condition {
        match self {
            Condition::Universal(_, part) => Condition::Universal(parameters, part),
            Condition::Existential(_, part) => Condition::Existential(parameters, part),
            other => other,
        }
    }

    /// The literals of a normalized condition (a conjunction of literals, a
    /// single literal or a constant). Returns `None` for [`Condition::Falsity`].
    pub fn literals(&self) -> Option<Vec<&Literal>> {
        match self {
            Condition::Truth => Some(vec![]),
            Condition::Falsity => None,
            Condition::Literal(literal) => Some(vec![literal]),
            Condition::Conjunction(parts) => {
                let mut result = vec![];
                for part in parts {
                    match part {
                        Condition::Literal(literal) => result.push(literal),
                        Condition::Truth => {}
                        Condition::Falsity => return None,
                        other => panic!("Condition not normalized: {:?}", other),
                    }
                }
                Some(result)
            }
            Condition::Existential(_, part) => part.literals(),
            other => panic!("Condition not normalized: {:?}", other),
        }
    }

    /// Instantiates a normalized condition. Static parts are checked against
    /// `init_facts` and dropped; fluent parts are appended to `result`.
    pub fn instantiate(
        &self,
        var_mapping: &HashMap<Name, Name>,
        init_facts: &HashSet<Atom>,
        fluent_facts: &HashSet<Atom>,
        result: &mut Vec<Literal>,
    ) -> Result<(), Impossible> {
        let literals = self.literals().ok_or(Impossible)?;
        for literal in literals {
            let ground = literal.ground(var_mapping);
            if fluent_facts.contains(&ground.atom) {
                result.push(ground);
            } else if init_facts.contains(&ground.atom) == ground.negated {
                return Err(Impossible);
            }
        }
        Ok(())
    }
}

impl From<Literal> for Condition {
    fn from(value: Literal) -> Self {
        Condition::Literal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(predicate: &str, args: &[&str]) -> Condition {
        Condition::atom(Atom::new(
            Name::new(predicate),
            args.iter().map(|a| Name::new(a)).collect::<Vec<_>>(),
        ))
    }

    #[test]
    fn simplification_flattens_and_drops_constants() {
        let condition = Condition::Conjunction(vec![
            Condition::Truth,
            Condition::Conjunction(vec![lit("a", &[]), lit("b", &[])]),
        ]);
        assert_eq!(
            condition.simplified(),
            Condition::Conjunction(vec![lit("a", &[]), lit("b", &[])])
        );
        let condition = Condition::Disjunction(vec![Condition::Falsity, lit("a", &[])]);
        assert_eq!(condition.simplified(), lit("a", &[]));
        let condition = Condition::Conjunction(vec![lit("a", &[]), Condition::Falsity]);
        assert_eq!(condition.simplified(), Condition::Falsity);
    }

    #[test]
    fn negation_flips_quantifiers() {
        let x = TypedObject::new(Name::new("?x"), Name::new("object"));
        let condition = Condition::Universal(vec![x.clone()], Box::new(lit("p", &["?x"])));
        assert_eq!(
            condition.negate(),
            Condition::Existential(
                vec![x],
                Box::new(Condition::negated_atom(Atom::new(
                    Name::new("p"),
                    vec![Name::new("?x")]
                )))
            )
        );
    }

    #[test]
    fn free_variables_exclude_bound_ones() {
        let x = TypedObject::new(Name::new("?x"), Name::new("object"));
        let condition = Condition::Existential(vec![x], Box::new(lit("p", &["?x", "?y", "c"])));
        assert_eq!(
            condition.free_variables().into_iter().collect::<Vec<_>>(),
            vec![Name::new("?y")]
        );
    }

    #[test]
    fn uniquify_renames_clashing_quantifiers() {
        let mut type_map = HashMap::from([(Name::new("?x"), Name::new("object"))]);
        let x = TypedObject::new(Name::new("?x"), Name::new("ball"));
        let condition = Condition::Existential(vec![x], Box::new(lit("p", &["?x"])));
        let renamed = condition.uniquify_variables(&mut type_map, &HashMap::new());
        assert_eq!(
            renamed,
            Condition::Existential(
                vec![TypedObject::new(Name::new("?x1"), Name::new("ball"))],
                Box::new(lit("p", &["?x1"]))
            )
        );
        assert_eq!(type_map[&Name::new("?x1")], Name::new("ball"));
    }

    #[test]
    fn instantiation_splits_static_and_fluent_parts() {
        let condition = Condition::Conjunction(vec![
            lit("road", &["?a", "?b"]),
            lit("at", &["?a"]),
            Condition::negated_atom(Atom::new(Name::new("blocked"), vec![Name::new("?b")])),
        ]);
        let mapping = HashMap::from([
            (Name::new("?a"), Name::new("l1")),
            (Name::new("?b"), Name::new("l2")),
        ]);
        let init = HashSet::from([Atom::new(
            Name::new("road"),
            vec![Name::new("l1"), Name::new("l2")],
        )]);
        let fluents = HashSet::from([Atom::new(Name::new("at"), vec![Name::new("l1")])]);
        let mut result = vec![];
        assert!(condition
            .instantiate(&mapping, &init, &fluents, &mut result)
            .is_ok());
        assert_eq!(result.len(), 1);

        let blocked = HashSet::from([
            Atom::new(Name::new("road"), vec![Name::new("l1"), Name::new("l2")]),
            Atom::new(Name::new("blocked"), vec![Name::new("l2")]),
        ]);
        assert_eq!(
            condition.instantiate(&mapping, &blocked, &fluents, &mut vec![]),
            Err(Impossible)
        );
    }
}
