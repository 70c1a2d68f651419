//! Provides parsers for atoms.

use crate::parsed_types::Atom;
use crate::parsers::{parens, parse_name, space_separated_list0, ParseResult, Span};
use nom::combinator::map;
use nom::sequence::tuple;

/// Parses an atom, i.e. `(<predicate> t*)`.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{atom, parse_name, Span, UnwrapValue};
/// # use sastranslate::parsed_types::Atom;
/// # use sastranslate::Name;
/// assert!(atom(parse_name)(Span::new("(move a b)")).is_value(
///     Atom::new(Name::new("move"), vec![Name::new("a"), Name::new("b")])
/// ));
/// ```
pub fn atom<'a, F, O>(inner: F) -> impl FnMut(Span<'a>) -> ParseResult<'a, Atom<O>>
where
    F: FnMut(Span<'a>) -> ParseResult<'a, O>,
{
    map(
        parens(tuple((parse_name, space_separated_list0(inner)))),
        |(predicate, args)| Atom::new(predicate, args),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsed_types::Term;
    use crate::parsers::{parse_term, Match};
    use crate::Name;

    #[test]
    fn nullary_atom() {
        assert!(atom(parse_term)(Span::new("(handempty)"))
            .is_exactly(Atom::<Term>::new(Name::new("handempty"), vec![])));
    }

    #[test]
    fn mixed_terms() {
        let (_, parsed) = atom(parse_term)(Span::new("(at ?b rooma)")).unwrap();
        assert_eq!(
            parsed.args(),
            &[Term::Variable(Name::new("?b")), Term::Name(Name::new("rooma"))]
        );
    }
}
