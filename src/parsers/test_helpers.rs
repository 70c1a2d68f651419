use crate::parsers::ParseResult;

/// Checks the value produced by a parser, ignoring any unparsed remainder.
pub trait UnwrapValue<T> {
    fn is_value(&self, value: T) -> bool;
}

impl<'a, T: PartialEq> UnwrapValue<T> for ParseResult<'a, T> {
    fn is_value(&self, value: T) -> bool {
        match self {
            Ok((_, parsed)) => *parsed == value,
            Err(_) => false,
        }
    }
}

/// Checks the value produced by a parser and that all input was consumed.
#[cfg(test)]
pub(crate) trait Match<T> {
    fn is_exactly<V>(&self, value: V) -> bool
    where
        T: PartialEq<V>;
}

#[cfg(test)]
impl<'a, T> Match<T> for ParseResult<'a, T> {
    fn is_exactly<V>(&self, value: V) -> bool
    where
        T: PartialEq<V>,
    {
        match self {
            Ok((remainder, parsed)) => remainder.fragment().is_empty() && *parsed == value,
            Err(_) => false,
        }
    }
}
