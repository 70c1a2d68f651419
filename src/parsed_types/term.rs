//! Contains terms via the [`Term`] type.

use crate::parsed_types::Name;
use std::fmt::{Display, Formatter};
use strum_macros::EnumIs;

/// A term is either an object name or a `?variable`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, EnumIs)]
pub enum Term {
    Name(Name),
    Variable(Name),
}

impl Term {
    /// The underlying identifier. Variables keep their `?` prefix.
    pub const fn name(&self) -> Name {
        match self {
            Term::Name(name) | Term::Variable(name) => *name,
        }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<Name> for Term {
    fn from(value: Name) -> Self {
        if value.is_variable() {
            Term::Variable(value)
        } else {
            Term::Name(value)
        }
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Name::new(value).into()
    }
}
