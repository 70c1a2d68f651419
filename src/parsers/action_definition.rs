//! Provides parsers for action definitions and derived predicates.

use crate::parsed_types::{ActionDefinition, DerivedPredicate, EffectDefinition, GoalDefinition};
use crate::parsers::{
    empty_parens, leading_whitespace, parens, parse_effect_definition, parse_goal_definition,
    parse_name, parse_predicate_definition, parse_variable, prefix_expr, typed_list, ParseResult,
    Span,
};
use crate::parsed_types::TypedList;
use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::combinator::{map, opt};
use nom::sequence::{preceded, tuple};

/// Parses an action definition.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{parse_action_definition, preamble::*};
/// let input = r#"(:action move
///     :parameters (?from ?to - room)
///     :precondition (at-robby ?from)
///     :effect (and (at-robby ?to) (not (at-robby ?from))))"#;
/// let (_, action) = parse_action_definition(input).unwrap();
/// assert_eq!(action.name().as_str(), "move");
/// assert_eq!(action.parameters().len(), 2);
/// assert!(action.precondition().is_some());
/// ```
pub fn parse_action_definition<'a, T: Into<Span<'a>>>(
    input: T,
) -> ParseResult<'a, ActionDefinition> {
    let parameters = preceded(
        tag_no_case(":parameters"),
        leading_whitespace(parens(typed_list(parse_variable))),
    );
    let precondition = preceded(
        tag_no_case(":precondition"),
        leading_whitespace(alt((
            map(empty_parens, |_| GoalDefinition::default()),
            parse_goal_definition,
        ))),
    );
    let effect = preceded(
        tag_no_case(":effect"),
        leading_whitespace(alt((
            map(empty_parens, |_| EffectDefinition::default()),
            parse_effect_definition,
        ))),
    );
    let action_def = prefix_expr(
        ":action",
        tuple((
            parse_name,
            opt(leading_whitespace(parameters)),
            opt(leading_whitespace(precondition)),
            opt(leading_whitespace(effect)),
        )),
    );

    map(action_def, |(name, params, precondition, effect)| {
        ActionDefinition::new(
            name,
            params.unwrap_or_else(TypedList::default),
            precondition,
            effect,
        )
    })(input.into())
}

/// Parses a derived predicate, i.e. `(:derived <atomic formula skeleton> <GD>)`.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{parse_derived_predicate, preamble::*};
/// let (_, derived) = parse_derived_predicate(
///     "(:derived (above ?x ?y) (or (on ?x ?y) (exists (?z) (and (on ?x ?z) (above ?z ?y)))))",
/// ).unwrap();
/// assert_eq!(derived.predicate().name().as_str(), "above");
/// ```
pub fn parse_derived_predicate<'a, T: Into<Span<'a>>>(
    input: T,
) -> ParseResult<'a, DerivedPredicate> {
    map(
        prefix_expr(
            ":derived",
            tuple((
                parse_predicate_definition,
                leading_whitespace(parse_goal_definition),
            )),
        ),
        |(predicate, condition)| DerivedPredicate::new(predicate, condition),
    )(input.into())
}

impl crate::parsers::Parser for ActionDefinition {
    type Item = ActionDefinition;

    /// See [`parse_action_definition`].
    fn parse<'a, S: Into<Span<'a>>>(input: S) -> ParseResult<'a, Self::Item> {
        parse_action_definition(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_precondition() {
        let input = "(:action noop :parameters () :precondition () :effect (and))";
        let (_, action) = parse_action_definition(input).unwrap();
        assert!(action.parameters().is_empty());
        assert_eq!(action.precondition(), Some(&GoalDefinition::default()));
        assert_eq!(action.effect(), Some(&EffectDefinition::default()));
    }
}
