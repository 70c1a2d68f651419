//! Contains atoms via the [`Atom`] type.

use crate::parsed_types::Name;
use std::fmt::{Display, Formatter};

/// An atomic formula `(<predicate> t*)`, generic over the kind of argument:
/// object names in `:init`, terms in conditions and effects.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Atom<T> {
    predicate: Name,
    args: Vec<T>,
}

impl<T> Atom<T> {
    pub const fn new(predicate: Name, args: Vec<T>) -> Self {
        Self { predicate, args }
    }

    /// The predicate, or function for numeric atoms.
    pub const fn predicate(&self) -> Name {
        self.predicate
    }

    pub fn args(&self) -> &[T] {
        &self.args
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

impl<T: Display> Display for Atom<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}", self.predicate)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsed_types::Term;

    #[test]
    fn atoms_print_as_pddl() {
        let atom = Atom::new(Name::new("at"), vec![Term::from("?b"), Term::from("rooma")]);
        assert_eq!(atom.arity(), 2);
        assert_eq!(atom.to_string(), "(at ?b rooma)");
        assert_eq!(Atom::<Name>::new(Name::new("total-cost"), vec![]).to_string(), "(total-cost)");
    }
}
