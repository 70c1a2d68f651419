//! Contains names via the [`Name`] type.

use internment::Intern;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

/// An interned, lowercase PDDL identifier. Variables keep their leading `?`.
///
/// ## Example
/// ```
/// # use sastranslate::Name;
/// let name = Name::new("at-robby");
/// assert_eq!(name.as_str(), "at-robby");
/// assert!(!name.is_variable());
/// assert!(Name::new("?x").is_variable());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name(Intern<String>);

impl Name {
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        Self(Intern::new(name.as_ref().to_string()))
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[inline(always)]
    pub fn is_variable(&self) -> bool {
        self.as_str().starts_with('?')
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::new("")
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        self.as_str().cmp(other.as_str())
    }
}

impl Deref for Name {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Self(Intern::new(value))
    }
}

impl From<&String> for Name {
    fn from(value: &String) -> Self {
        Self::new(value)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interned_names_compare_by_text() {
        let a = Name::new("ball1");
        let b = Name::from(String::from("ball1"));
        assert_eq!(a, b);
        assert!(Name::new("a") < Name::new("b"));
        assert!(Name::new("ball10") > Name::new("ball1"));
    }
}
