mod action_definition;
mod atom;
mod domain;
mod effect_definition;
mod goal_definition;
mod name;
mod predicate_definition;
mod problem;
mod requirements;
mod test_helpers;
mod typed_list;
mod utilities;

#[cfg(test)]
pub(crate) use test_helpers::Match;
pub use test_helpers::UnwrapValue;

pub trait Parser {
    type Item;

    fn parse<'a, S: Into<Span<'a>>>(input: S) -> ParseResult<'a, Self::Item>;

    fn parse_span(input: Span) -> ParseResult<Self::Item> {
        Self::parse(input)
    }

    /// Parse a string slice into the desired type. Discards any remaining
    /// input.
    fn from_str(input: &str) -> Result<Self::Item, nom::Err<ParseError>> {
        let (_, value) = Self::parse(input)?;
        Ok(value)
    }
}

pub type Span<'a> = nom_locate::LocatedSpan<&'a str>;

pub type ParseError<'a> = nom_greedyerror::GreedyError<Span<'a>, nom::error::ErrorKind>;

pub type ParseResult<'a, T, E = ParseError<'a>> = nom::IResult<Span<'a>, T, E>;

/// Renders a parse failure as `line L, column C: near "..."`, using the
/// furthest position any branch of the parser reached.
pub fn describe_parse_error(error: &nom::Err<ParseError>) -> String {
    let errors = match error {
        nom::Err::Incomplete(_) => return "unexpected end of input".to_string(),
        nom::Err::Error(e) | nom::Err::Failure(e) => &e.errors,
    };
    match errors.iter().max_by_key(|(span, _)| span.location_offset()) {
        Some((span, kind)) => {
            let snippet: String = span.fragment().chars().take(30).collect();
            format!(
                "line {}, column {}: {:?} near {:?}",
                span.location_line(),
                span.get_utf8_column(),
                kind,
                snippet
            )
        }
        None => "unknown parse error".to_string(),
    }
}

/// Re-exports commonly used types.
pub mod preamble {
    pub use crate::parsers::test_helpers::UnwrapValue;
    pub use crate::parsers::Parser;
    pub use crate::parsers::{ParseError, ParseResult, Span};
}

// Parsers
pub use action_definition::{parse_action_definition, parse_derived_predicate};
pub use domain::parse_domain;
pub use effect_definition::{parse_effect_definition, parse_numeric_expression};
pub use goal_definition::parse_goal_definition;
pub use name::{parse_name, parse_term, parse_variable};
pub use predicate_definition::{parse_function_definitions, parse_predicate_definition};
pub use problem::{parse_init_element, parse_problem};
pub use requirements::{parse_requirement_key, parse_requirements};

// Parser combinators
pub use atom::atom;
pub use typed_list::typed_list;

#[allow(unused_imports)]
pub(crate) use utilities::{
    empty_parens, ignore_whitespace_and_comments, leading_whitespace, parens, prefix_expr,
    space_separated_list0, space_separated_list1, surrounding_whitespace,
};
