//! Provides parsers for names, variables and terms.

use crate::parsed_types::{Name, Term};
use crate::parsers::{ParseResult, Span};
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{alpha1, alphanumeric1, char};
use nom::combinator::{map, recognize};
use nom::multi::many0;
use nom::sequence::{pair, preceded};

/// Parses a name, i.e. a letter followed by letters, digits, `-` and `_`.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{parse_name, preamble::*};
/// # use sastranslate::Name;
/// assert!(parse_name("abcde").is_value(Name::new("abcde")));
/// assert!(parse_name("a-1_b").is_value(Name::new("a-1_b")));
/// assert!(parse_name("-1").is_err());
/// ```
pub fn parse_name<'a, T: Into<Span<'a>>>(input: T) -> ParseResult<'a, Name> {
    map(
        recognize(pair(
            alpha1,
            many0(alt((alphanumeric1, tag("-"), tag("_")))),
        )),
        |span: Span| Name::new(span.fragment().to_lowercase()),
    )(input.into())
}

/// Parses a variable, i.e. `?<name>`. The `?` is kept as part of the name.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{parse_variable, preamble::*};
/// # use sastranslate::Name;
/// assert!(parse_variable("?abcde").is_value(Name::new("?abcde")));
/// assert!(parse_variable("abcde").is_err());
/// ```
pub fn parse_variable<'a, T: Into<Span<'a>>>(input: T) -> ParseResult<'a, Name> {
    map(
        recognize(preceded(char('?'), parse_name)),
        |span: Span| Name::new(span.fragment().to_lowercase()),
    )(input.into())
}

/// Parses a term, i.e. `<name> | <variable>`.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{parse_term, preamble::*};
/// # use sastranslate::parsed_types::Term;
/// # use sastranslate::Name;
/// assert!(parse_term("abcde").is_value(Term::Name(Name::new("abcde"))));
/// assert!(parse_term("?abcde").is_value(Term::Variable(Name::new("?abcde"))));
/// ```
pub fn parse_term<'a, T: Into<Span<'a>>>(input: T) -> ParseResult<'a, Term> {
    alt((
        map(parse_variable, Term::Variable),
        map(parse_name, Term::Name),
    ))(input.into())
}

impl crate::parsers::Parser for Term {
    type Item = Term;

    /// See [`parse_term`].
    fn parse<'a, S: Into<Span<'a>>>(input: S) -> ParseResult<'a, Self::Item> {
        parse_term(input)
    }
}
