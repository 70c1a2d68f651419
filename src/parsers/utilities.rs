//! Utility parsers.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case},
    character::complete::{char, multispace1, satisfy},
    combinator::{not, peek, recognize, value},
    multi::{many0, many1},
    sequence::{delimited, pair, preceded, terminated},
};

use crate::parsers::{ParseResult, Span};

/// Consumes any amount of whitespace and `;` line comments.
pub fn ignore_whitespace_and_comments<'a, S: Into<Span<'a>>>(input: S) -> ParseResult<'a, ()> {
    value(
        (),
        many0(alt((
            multispace1,
            recognize(pair(char(';'), nom::combinator::opt(is_not("\r\n")))),
        ))),
    )(input.into())
}

/// Matches a keyword, making sure it is not merely the prefix of a longer
/// name (`not` must not match the start of `nothing`).
fn keyword<'a>(name: &'a str) -> impl FnMut(Span<'a>) -> ParseResult<'a, Span<'a>> {
    terminated(
        tag_no_case(name),
        not(peek(satisfy(|c| c.is_alphanumeric() || c == '-' || c == '_'))),
    )
}

/// A combinator that takes a parser `inner` and produces a parser that also
/// consumes a leading `(name` and trailing `)`, returning the output of `inner`.
pub fn prefix_expr<'a, F, O>(name: &'a str, inner: F) -> impl FnMut(Span<'a>) -> ParseResult<'a, O>
where
    F: FnMut(Span<'a>) -> ParseResult<'a, O>,
{
    delimited(
        preceded(leading_whitespace(tag("(")), leading_whitespace(keyword(name))),
        leading_whitespace(inner),
        leading_whitespace(tag(")")),
    )
}

/// A combinator that takes a parser `inner` and produces a parser that also
/// consumes leading whitespace and comments, returning the output of `inner`.
pub fn leading_whitespace<'a, F, O>(inner: F) -> impl FnMut(Span<'a>) -> ParseResult<'a, O>
where
    F: FnMut(Span<'a>) -> ParseResult<'a, O>,
{
    preceded(ignore_whitespace_and_comments, inner)
}

/// Like [`leading_whitespace`], but also consumes trailing whitespace.
pub fn surrounding_whitespace<'a, F, O>(inner: F) -> impl FnMut(Span<'a>) -> ParseResult<'a, O>
where
    F: FnMut(Span<'a>) -> ParseResult<'a, O>,
{
    delimited(
        ignore_whitespace_and_comments,
        inner,
        ignore_whitespace_and_comments,
    )
}

/// Zero or more `inner`, separated by optional whitespace. Every item parser
/// in this crate is greedy, so no separator is needed between `)(`.
pub fn space_separated_list0<'a, F, O>(inner: F) -> impl FnMut(Span<'a>) -> ParseResult<'a, Vec<O>>
where
    F: FnMut(Span<'a>) -> ParseResult<'a, O>,
{
    many0(leading_whitespace(inner))
}

/// One or more `inner`, separated by optional whitespace.
pub fn space_separated_list1<'a, F, O>(inner: F) -> impl FnMut(Span<'a>) -> ParseResult<'a, Vec<O>>
where
    F: FnMut(Span<'a>) -> ParseResult<'a, O>,
{
    many1(leading_whitespace(inner))
}

/// A combinator that takes a parser `inner` and produces a parser that consumes
/// surrounding parentheses, returning the outputs of `inner`.
pub fn parens<'a, F, O>(inner: F) -> impl FnMut(Span<'a>) -> ParseResult<'a, O>
where
    F: FnMut(Span<'a>) -> ParseResult<'a, O>,
{
    delimited(
        char('('),
        leading_whitespace(inner),
        leading_whitespace(char(')')),
    )
}

/// Parses `()`.
pub fn empty_parens<'a, S: Into<Span<'a>>>(input: S) -> ParseResult<'a, ()> {
    value((), pair(char('('), leading_whitespace(char(')'))))(input.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{parse_name, Match};
    use crate::Name;

    #[test]
    fn parens_works() {
        let mut parser = parens(parse_name);
        assert!(parser(Span::new("(content)")).is_exactly("content"));
        assert!(parser(Span::new("( content )")).is_exactly("content"));
    }

    #[test]
    fn prefix_expr_rejects_longer_names() {
        let mut parser = prefix_expr("not", parse_name);
        assert!(parser(Span::new("(not x)")).is_exactly("x"));
        assert!(parser(Span::new("(nothing x)")).is_err());
    }

    #[test]
    fn lists_skip_comments() {
        let mut parser = space_separated_list0(parse_name);
        assert!(parser(Span::new("x ; comment\n y")).is_exactly(vec![Name::from("x"), Name::from("y")]));
        assert!(parser(Span::new("")).is_exactly(Vec::<Name>::new()));
        let mut parser = space_separated_list1(parse_name);
        assert!(parser(Span::new("")).is_err());
    }

    #[test]
    fn comment_only_is_ignored() {
        let (remainder, _) = ignore_whitespace_and_comments("; comment\nnext line").unwrap();
        assert_eq!(remainder.fragment(), &"next line");
        let (remainder, _) = ignore_whitespace_and_comments(";\n").unwrap();
        assert!(remainder.is_empty());
    }
}
