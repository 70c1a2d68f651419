//! Provides parsers for problem definitions.

use crate::parsed_types::{InitElement, Metric, Problem};
use crate::parsers::{
    atom, leading_whitespace, parse_goal_definition, parse_name, parse_requirements,
    prefix_expr, space_separated_list0, surrounding_whitespace, typed_list, ParseResult, Span,
};
use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::i64 as parse_i64;
use nom::combinator::{map, opt, value};
use nom::sequence::tuple;

/// Parses an element of `:init`, i.e. `<atom> | (= <function term> <number>)`.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{parse_init_element, preamble::*};
/// # use sastranslate::parsed_types::InitElement;
/// assert!(matches!(parse_init_element("(at ball1 rooma)"), Ok((_, InitElement::Atom(_)))));
/// assert!(matches!(parse_init_element("(= (total-cost) 0)"), Ok((_, InitElement::Assign(_, 0)))));
/// ```
pub fn parse_init_element<'a, T: Into<Span<'a>>>(input: T) -> ParseResult<'a, InitElement> {
    alt((
        map(
            prefix_expr("=", tuple((atom(parse_name), leading_whitespace(parse_i64)))),
            |(function, number)| InitElement::Assign(function, number),
        ),
        map(atom(parse_name), InitElement::Atom),
    ))(input.into())
}

/// Parses a problem definition.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{parse_problem, preamble::*};
/// let input = r#"
/// (define (problem strips-gripper-x-1)
///    (:domain gripper-strips)
///    (:objects rooma roomb - room ball1 - ball)
///    (:init (at-robby rooma) (at ball1 rooma))
///    (:goal (and (at ball1 roomb))))"#;
///
/// let (_, problem) = parse_problem(input).unwrap();
/// assert_eq!(problem.name().as_str(), "strips-gripper-x-1");
/// assert_eq!(problem.domain().as_str(), "gripper-strips");
/// assert_eq!(problem.objects().len(), 3);
/// assert_eq!(problem.init().len(), 2);
/// assert!(problem.metric().is_none());
/// ```
pub fn parse_problem<'a, T: Into<Span<'a>>>(input: T) -> ParseResult<'a, Problem> {
    let metric = map(
        prefix_expr(
            ":metric",
            tuple((
                alt((value(true, tag_no_case("minimize")), value(false, tag_no_case("maximize")))),
                leading_whitespace(atom(parse_name)),
            )),
        ),
        |(minimize, function)| Metric { minimize, function },
    );

    map(
        surrounding_whitespace(prefix_expr(
            "define",
            tuple((
                prefix_expr("problem", parse_name),
                prefix_expr(":domain", parse_name),
                opt(leading_whitespace(parse_requirements)),
                opt(prefix_expr(":objects", typed_list(parse_name))),
                prefix_expr(":init", space_separated_list0(parse_init_element)),
                prefix_expr(":goal", parse_goal_definition),
                opt(metric),
            )),
        )),
        |(name, domain, requirements, objects, init, goal, metric)| {
            Problem::builder(name, domain, init, goal)
                .with_requirements(requirements.unwrap_or_default())
                .with_objects(objects.unwrap_or_default())
                .with_metric(metric)
        },
    )(input.into())
}

impl crate::parsers::Parser for Problem {
    type Item = Problem;

    /// See [`parse_problem`].
    fn parse<'a, S: Into<Span<'a>>>(input: S) -> ParseResult<'a, Self::Item> {
        parse_problem(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::Parser;
    use crate::test_utils::*;

    #[test]
    fn gripper_problem() {
        let problem = Problem::from_str(GRIPPER_PROBLEM_TEXT).unwrap();
        assert_eq!(problem.objects().len(), 8);
        assert!(problem.metric().is_none());
    }

    #[test]
    fn metric_section() {
        let problem = Problem::from_str(ACTION_COST_PROBLEM_TEXT).unwrap();
        let metric = problem.metric().unwrap();
        assert!(metric.minimize);
        assert_eq!(metric.function.to_string(), "(total-cost)");
    }
}
