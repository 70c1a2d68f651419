//! Provides the [`typed_list`] combinator.

use crate::parsed_types::{Name, Typed, TypedList};
use crate::parsers::{leading_whitespace, parse_name, space_separated_list0, space_separated_list1};
use crate::parsers::{ParseResult, Span};
use nom::character::complete::char;
use nom::combinator::map;
use nom::multi::many0;
use nom::sequence::{preceded, tuple};

/// Parses a typed list, i.e. `x* | x⁺ - <type> <typed list (x)>`. Items
/// without a type annotation are of type `object`.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{typed_list, parse_variable, Span};
/// # use sastranslate::parsed_types::Typed;
/// # use sastranslate::Name;
/// let (_, list) = typed_list(parse_variable)(Span::new("?a ?b - ball ?r - room ?o")).unwrap();
/// assert_eq!(list.len(), 4);
/// assert_eq!(list[1], Typed::new(Name::new("?b"), Name::new("ball")));
/// assert_eq!(list[3], Typed::new_object(Name::new("?o")));
/// ```
pub fn typed_list<'a, F, O>(inner: F) -> impl FnMut(Span<'a>) -> ParseResult<'a, TypedList<O>>
where
    F: Clone + FnMut(Span<'a>) -> ParseResult<'a, O>,
{
    let typed_group = tuple((
        space_separated_list1(inner.clone()),
        preceded(leading_whitespace(char('-')), leading_whitespace(parse_name)),
    ));

    map(
        tuple((many0(typed_group), space_separated_list0(inner))),
        |(groups, untyped): (Vec<(Vec<O>, Name)>, Vec<O>)| {
            let mut list = Vec::new();
            for (values, type_name) in groups {
                list.extend(values.into_iter().map(|v| Typed::new(v, type_name)));
            }
            list.extend(untyped.into_iter().map(Typed::new_object));
            TypedList::new(list)
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::parse_name;

    #[test]
    fn empty_list() {
        let (_, list) = typed_list(parse_name)(Span::new("")).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn type_hierarchy_declaration() {
        let (_, list) =
            typed_list(parse_name)(Span::new("truck airplane - vehicle\n vehicle - object")).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].type_name(), &Name::new("vehicle"));
        assert_eq!(list[2].type_name(), &Name::new("object"));
    }
}
