//! Provides parsers for goal descriptions.

use crate::parsed_types::GoalDefinition;
use crate::parsers::{atom, leading_whitespace, parens, parse_term, parse_variable, typed_list};
use crate::parsers::{prefix_expr, space_separated_list0, ParseResult, Span};
use nom::branch::alt;
use nom::combinator::map;
use nom::sequence::tuple;

/// Parser for goal descriptions, as used in preconditions, goals, effect
/// conditions and derived predicates.
///
/// ## Examples
/// ```
/// # use sastranslate::parsers::{parse_goal_definition, preamble::*};
/// # use sastranslate::parsed_types::*;
/// # use sastranslate::Name;
/// let on = Atom::new(
///     Name::new("on"),
///     vec![Term::Variable(Name::new("?x")), Term::Name(Name::new("b1"))],
/// );
///
/// assert!(parse_goal_definition("(on ?x b1)").is_value(GoalDefinition::new_atom(on.clone())));
/// assert!(parse_goal_definition("(not (on ?x b1))").is_value(
///     GoalDefinition::new_not(GoalDefinition::new_atom(on.clone()))
/// ));
/// assert!(parse_goal_definition("(not (= ?x b1))").is_value(
///     GoalDefinition::new_not(GoalDefinition::new_equality(
///         Term::Variable(Name::new("?x")),
///         Term::Name(Name::new("b1")),
///     ))
/// ));
/// ```
pub fn parse_goal_definition<'a, T: Into<Span<'a>>>(input: T) -> ParseResult<'a, GoalDefinition> {
    let and = map(
        prefix_expr("and", space_separated_list0(parse_goal_definition)),
        GoalDefinition::new_and,
    );

    // :disjunctive-preconditions
    let or = map(
        prefix_expr("or", space_separated_list0(parse_goal_definition)),
        GoalDefinition::new_or,
    );

    let not = map(
        prefix_expr("not", parse_goal_definition),
        GoalDefinition::new_not,
    );

    // :disjunctive-preconditions
    let imply = map(
        prefix_expr(
            "imply",
            tuple((
                parse_goal_definition,
                leading_whitespace(parse_goal_definition),
            )),
        ),
        GoalDefinition::new_imply_tuple,
    );

    // :existential-preconditions
    let exists = map(
        prefix_expr(
            "exists",
            tuple((
                parens(typed_list(parse_variable)),
                leading_whitespace(parse_goal_definition),
            )),
        ),
        GoalDefinition::new_exists_tuple,
    );

    // :universal-preconditions
    let forall = map(
        prefix_expr(
            "forall",
            tuple((
                parens(typed_list(parse_variable)),
                leading_whitespace(parse_goal_definition),
            )),
        ),
        GoalDefinition::new_forall_tuple,
    );

    let equality = map(
        prefix_expr("=", tuple((parse_term, leading_whitespace(parse_term)))),
        |(a, b)| GoalDefinition::new_equality(a, b),
    );

    let atom = map(atom(parse_term), GoalDefinition::new_atom);

    alt((and, or, not, imply, exists, forall, equality, atom))(input.into())
}

impl crate::parsers::Parser for GoalDefinition {
    type Item = GoalDefinition;

    /// See [`parse_goal_definition`].
    fn parse<'a, S: Into<Span<'a>>>(input: S) -> ParseResult<'a, Self::Item> {
        parse_goal_definition(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsed_types::Term;
    use crate::parsers::Match;
    use crate::Name;

    #[test]
    fn quantifiers() {
        let (_, parsed) =
            parse_goal_definition("(forall (?b - ball) (exists (?r) (at ?b ?r)))").unwrap();
        match parsed {
            GoalDefinition::Forall(params, body) => {
                assert_eq!(params.len(), 1);
                assert_eq!(params[0].type_name(), &Name::new("ball"));
                assert!(matches!(*body, GoalDefinition::Exists(_, _)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn keyword_prefixed_predicates_are_atoms() {
        let (_, parsed) = parse_goal_definition("(nothing-left)").unwrap();
        assert!(matches!(parsed, GoalDefinition::Atom(_)));
    }

    #[test]
    fn adjacent_parentheses() {
        assert!(parse_goal_definition(Span::new("(and (a)(b ?x))")).is_exactly(
            GoalDefinition::new_and([
                GoalDefinition::new_atom(crate::parsed_types::Atom::new(Name::new("a"), vec![])),
                GoalDefinition::new_atom(crate::parsed_types::Atom::new(
                    Name::new("b"),
                    vec![Term::Variable(Name::new("?x"))]
                )),
            ])
        ));
    }
}
