//! Provides parsers for requirements.

use crate::parsed_types::{Requirement, Requirements};
use crate::parsers::{parse_name, prefix_expr, space_separated_list1, ParseResult, Span};
use nom::character::complete::char;
use nom::combinator::{map, map_opt, recognize};
use nom::sequence::preceded;
use std::str::FromStr;

/// Parses a requirement definition, i.e. `(:requirements <require-key>)⁺`.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{parse_requirements, preamble::*};
/// # use sastranslate::parsed_types::{Requirement, Requirements};
/// assert!(parse_requirements("(:requirements :adl)").is_value(Requirements::new([Requirement::Adl])));
/// assert!(parse_requirements("(:requirements\n:strips   :typing  )").is_value(Requirements::new([Requirement::Strips, Requirement::Typing])));
/// ```
pub fn parse_requirements<'a, T: Into<Span<'a>>>(input: T) -> ParseResult<'a, Requirements> {
    map(
        prefix_expr(
            ":requirements",
            space_separated_list1(parse_requirement_key),
        ),
        Requirements::new,
    )(input.into())
}

/// Parses a requirement key, i.e. `:strips`.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{parse_requirement_key, preamble::*};
/// # use sastranslate::parsed_types::Requirement;
/// assert!(parse_requirement_key(":strips").is_value(Requirement::Strips));
/// assert!(parse_requirement_key(":derived-predicates").is_value(Requirement::DerivedPredicates));
/// assert!(parse_requirement_key(":ACTION-COSTS").is_value(Requirement::ActionCosts));
/// assert!(parse_requirement_key(":durative-actions").is_err());
/// assert!(parse_requirement_key("invalid").is_err());
/// ```
pub fn parse_requirement_key<'a, T: Into<Span<'a>>>(input: T) -> ParseResult<'a, Requirement> {
    map_opt(
        recognize(preceded(char(':'), parse_name)),
        |key: Span| Requirement::from_str(&key.fragment().to_lowercase()).ok(),
    )(input.into())
}

impl crate::parsers::Parser for Requirements {
    type Item = Requirements;

    /// See [`parse_requirements`].
    fn parse<'a, S: Into<Span<'a>>>(input: S) -> ParseResult<'a, Self::Item> {
        parse_requirements(input)
    }
}
