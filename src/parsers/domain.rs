//! Provides parsers for domain definitions.

use crate::parsed_types::{ActionDefinition, DerivedPredicate, Domain};
use crate::parsers::{
    parse_action_definition, parse_derived_predicate, parse_function_definitions, parse_name,
    parse_predicate_definition, parse_requirements, prefix_expr, space_separated_list0,
    surrounding_whitespace, typed_list, ParseResult, Span,
};
use crate::parsers::leading_whitespace;
use nom::branch::alt;
use nom::combinator::{map, opt};
use nom::sequence::tuple;

enum StructureDefinition {
    Action(ActionDefinition),
    Derived(DerivedPredicate),
}

/// Parses a domain definition.
///
/// ## Example
/// ```
/// # use sastranslate::parsers::{parse_domain, preamble::*};
/// let input = r#"
/// (define
///     (domain gripper-strips)
///     (:requirements :typing)
///     (:types room ball gripper)
///     (:predicates (at-robby ?r - room) (at ?b - ball ?r - room))
///     (:action move
///         :parameters (?from ?to - room)
///         :precondition (at-robby ?from)
///         :effect (and (at-robby ?to) (not (at-robby ?from)))))"#;
///
/// let (_, domain) = parse_domain(input).unwrap();
/// assert_eq!(domain.name().as_str(), "gripper-strips");
/// assert_eq!(domain.requirements().len(), 1);
/// assert_eq!(domain.types().len(), 3);
/// assert_eq!(domain.predicates().len(), 2);
/// assert_eq!(domain.actions().len(), 1);
/// ```
pub fn parse_domain<'a, T: Into<Span<'a>>>(input: T) -> ParseResult<'a, Domain> {
    let structure = alt((
        map(parse_action_definition, StructureDefinition::Action),
        map(parse_derived_predicate, StructureDefinition::Derived),
    ));

    map(
        surrounding_whitespace(prefix_expr(
            "define",
            tuple((
                prefix_expr("domain", parse_name),
                opt(leading_whitespace(parse_requirements)),
                opt(prefix_expr(":types", typed_list(parse_name))),
                opt(prefix_expr(":constants", typed_list(parse_name))),
                opt(prefix_expr(
                    ":predicates",
                    space_separated_list0(parse_predicate_definition),
                )),
                opt(leading_whitespace(parse_function_definitions)),
                space_separated_list0(structure),
            )),
        )),
        |(name, requirements, types, constants, predicates, functions, structures)| {
            let mut actions = vec![];
            let mut derived = vec![];
            for structure in structures {
                match structure {
                    StructureDefinition::Action(action) => actions.push(action),
                    StructureDefinition::Derived(axiom) => derived.push(axiom),
                }
            }
            Domain::builder(name, actions)
                .with_requirements(requirements.unwrap_or_default())
                .with_types(types.unwrap_or_default())
                .with_constants(constants.unwrap_or_default())
                .with_predicates(predicates.unwrap_or_default())
                .with_functions(functions.unwrap_or_default())
                .with_derived(derived)
        },
    )(input.into())
}

impl crate::parsers::Parser for Domain {
    type Item = Domain;

    /// See [`parse_domain`].
    fn parse<'a, S: Into<Span<'a>>>(input: S) -> ParseResult<'a, Self::Item> {
        parse_domain(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::Parser;
    use crate::test_utils::*;

    #[test]
    fn gripper_domain() {
        let domain = Domain::from_str(GRIPPER_DOMAIN_TEXT).unwrap();
        assert_eq!(domain.actions().len(), 3);
        assert_eq!(domain.predicates().len(), 4);
    }

    #[test]
    fn derived_predicates_interleave_with_actions() {
        let domain = Domain::from_str(NEGATIVE_AXIOM_CYCLE_DOMAIN_TEXT).unwrap();
        assert_eq!(domain.derived().len(), 2);
        assert_eq!(domain.actions().len(), 1);
    }

    #[test]
    fn keywords_ignore_case() {
        let text = "(DEFINE (DOMAIN Shout) (:Requirements :STRIPS)
            (:Predicates (Loud ?X))
            (:ACTION Yell :Parameters (?X) :Precondition (NOT (Loud ?X)) :Effect (Loud ?X)))";
        let domain = Domain::from_str(text).unwrap();
        assert_eq!(domain.name().as_str(), "shout");
        assert_eq!(domain.actions()[0].name().as_str(), "yell");
    }
}
