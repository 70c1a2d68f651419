//! Contains typed lists via the [`TypedList`] and [`Typed`] types.

use crate::parsed_types::Name;
use std::ops::Deref;

/// The root of every type hierarchy.
pub const TYPE_OBJECT: &str = "object";

/// A value annotated with its declared type, e.g. `?b - ball`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Typed<T> {
    value: T,
    type_name: Name,
}

impl<T> Typed<T> {
    pub const fn new(value: T, type_name: Name) -> Self {
        Self { value, type_name }
    }

    pub fn new_object(value: T) -> Self {
        Self::new(value, Name::new(TYPE_OBJECT))
    }

    pub const fn value(&self) -> &T {
        &self.value
    }

    pub const fn type_name(&self) -> &Name {
        &self.type_name
    }
}

/// A list of typed values, e.g. `?a ?b - ball ?r - room`.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash)]
pub struct TypedList<T>(Vec<Typed<T>>);

impl<T> TypedList<T> {
    pub const fn new(list: Vec<Typed<T>>) -> Self {
        Self(list)
    }

    pub fn value(&self) -> &[Typed<T>] {
        self.0.as_slice()
    }
}

impl<T> From<Vec<Typed<T>>> for TypedList<T> {
    fn from(list: Vec<Typed<T>>) -> Self {
        TypedList::new(list)
    }
}

impl<T> FromIterator<Typed<T>> for TypedList<T> {
    fn from_iter<I: IntoIterator<Item = Typed<T>>>(iter: I) -> Self {
        TypedList::new(iter.into_iter().collect())
    }
}

impl<T> Deref for TypedList<T> {
    type Target = [Typed<T>];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl<T> IntoIterator for TypedList<T> {
    type Item = Typed<T>;
    type IntoIter = std::vec::IntoIter<Typed<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
