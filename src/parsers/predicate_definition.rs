//! Provides parsers for predicate and function definitions.

use crate::parsed_types::{FunctionDefinition, PredicateDefinition};
use crate::parsers::{leading_whitespace, parens, parse_name, parse_variable, prefix_expr};
use crate::parsers::{space_separated_list0, typed_list, ParseResult, Span};
use nom::character::complete::char;
use nom::combinator::{map, opt};
use nom::sequence::{preceded, terminated, tuple};

/// Parses a predicate definition, i.e. `(<predicate> <typed list (variable)>)`.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{parse_predicate_definition, preamble::*};
/// let (_, predicate) = parse_predicate_definition("(at ?b - ball ?r - room)").unwrap();
/// assert_eq!(predicate.name().as_str(), "at");
/// assert_eq!(predicate.variables().len(), 2);
/// ```
pub fn parse_predicate_definition<'a, T: Into<Span<'a>>>(
    input: T,
) -> ParseResult<'a, PredicateDefinition> {
    map(
        parens(tuple((parse_name, leading_whitespace(typed_list(parse_variable))))),
        |(name, variables)| PredicateDefinition::new(name, variables),
    )(input.into())
}

/// Parses a function section, i.e. `(:functions <function skeleton> [- number])*`.
pub fn parse_function_definitions<'a, T: Into<Span<'a>>>(
    input: T,
) -> ParseResult<'a, Vec<FunctionDefinition>> {
    prefix_expr(
        ":functions",
        space_separated_list0(terminated(
            parse_predicate_definition,
            opt(preceded(
                leading_whitespace(char('-')),
                leading_whitespace(parse_name),
            )),
        )),
    )(input.into())
}

impl crate::parsers::Parser for PredicateDefinition {
    type Item = PredicateDefinition;

    /// See [`parse_predicate_definition`].
    fn parse<'a, S: Into<Span<'a>>>(input: S) -> ParseResult<'a, Self::Item> {
        parse_predicate_definition(input)
    }
}
