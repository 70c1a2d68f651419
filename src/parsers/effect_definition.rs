//! Provides parsers for effects.

use crate::parsed_types::{EffectDefinition, NumericExpression};
use crate::parsers::{atom, leading_whitespace, parens, parse_goal_definition, parse_term};
use crate::parsers::{parse_variable, prefix_expr, space_separated_list0, typed_list};
use crate::parsers::{ParseResult, Span};
use nom::branch::alt;
use nom::character::complete::i64 as parse_i64;
use nom::combinator::map;
use nom::sequence::tuple;

/// Parses an effect.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{parse_effect_definition, preamble::*};
/// # use sastranslate::parsed_types::*;
/// let (_, effect) = parse_effect_definition(
///     "(and (at ?b ?to) (not (at ?b ?from)) (increase (total-cost) 1))",
/// ).unwrap();
/// match effect {
///     EffectDefinition::And(parts) => {
///         assert!(matches!(parts[0], EffectDefinition::Add(_)));
///         assert!(matches!(parts[1], EffectDefinition::Delete(_)));
///         assert!(matches!(parts[2], EffectDefinition::Increase(_, NumericExpression::Number(1))));
///     }
///     _ => panic!("expected a conjunction"),
/// }
/// ```
pub fn parse_effect_definition<'a, T: Into<Span<'a>>>(
    input: T,
) -> ParseResult<'a, EffectDefinition> {
    let and = map(
        prefix_expr("and", space_separated_list0(parse_effect_definition)),
        EffectDefinition::new_and,
    );

    // :conditional-effects
    let forall = map(
        prefix_expr(
            "forall",
            tuple((
                parens(typed_list(parse_variable)),
                leading_whitespace(parse_effect_definition),
            )),
        ),
        EffectDefinition::new_forall_tuple,
    );

    // :conditional-effects
    let when = map(
        prefix_expr(
            "when",
            tuple((
                parse_goal_definition,
                leading_whitespace(parse_effect_definition),
            )),
        ),
        EffectDefinition::new_when_tuple,
    );

    // :action-costs
    let increase = map(
        prefix_expr(
            "increase",
            tuple((
                atom(parse_term),
                leading_whitespace(parse_numeric_expression),
            )),
        ),
        EffectDefinition::new_increase_tuple,
    );

    let delete = map(
        prefix_expr("not", atom(parse_term)),
        EffectDefinition::new_delete,
    );
    let add = map(atom(parse_term), EffectDefinition::new_add);

    alt((and, forall, when, increase, delete, add))(input.into())
}

/// Parses a numeric expression, either an integer or a function term.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{parse_numeric_expression, preamble::*};
/// # use sastranslate::parsed_types::NumericExpression;
/// assert!(parse_numeric_expression("5").is_value(NumericExpression::Number(5)));
/// assert!(parse_numeric_expression("(road-length ?a ?b)").is_ok());
/// ```
pub fn parse_numeric_expression<'a, T: Into<Span<'a>>>(
    input: T,
) -> ParseResult<'a, NumericExpression> {
    alt((
        map(parse_i64, NumericExpression::Number),
        map(atom(parse_term), NumericExpression::Function),
    ))(input.into())
}

impl crate::parsers::Parser for EffectDefinition {
    type Item = EffectDefinition;

    /// See [`parse_effect_definition`].
    fn parse<'a, S: Into<Span<'a>>>(input: S) -> ParseResult<'a, Self::Item> {
        parse_effect_definition(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditional_universal_effect() {
        let input = "(forall (?b - ball) (when (at ?b ?r) (not (at ?b ?r))))";
        let (_, effect) = parse_effect_definition(input).unwrap();
        match effect {
            EffectDefinition::Forall(params, inner) => {
                assert_eq!(params.len(), 1);
                match *inner {
                    EffectDefinition::When(_, ref eff) => {
                        assert!(matches!(**eff, EffectDefinition::Delete(_)))
                    }
                    ref other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
