//! Lowers the parsed syntax tree into a checked [`Task`].

use crate::parsed_types::{
    ActionDefinition, Atom as ParsedAtom, DerivedPredicate, Domain, EffectDefinition,
    GoalDefinition, InitElement, Name, NumericExpression, Problem, Requirement, Requirements,
    Term, TypedList, TYPE_OBJECT,
};
use crate::translate::task::{
    Action, Atom, Axiom, Condition, CostExpression, Effect, Literal, PddlType, Predicate, Task,
    TypedObject,
};
use crate::translate::{Result, TranslateError};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

const TOTAL_COST: &str = "total-cost";
const EQUALITY: &str = "=";

pub(super) struct TaskBuilder<'a> {
    domain: &'a Domain,
    problem: &'a Problem,
    requirements: Requirements,
    types: Vec<PddlType>,
    type_names: HashSet<Name>,
    /// Arity of every predicate usable in conditions, including `=` and
    /// derived predicates.
    arities: HashMap<Name, usize>,
    derived: HashSet<Name>,
    functions: HashMap<Name, usize>,
    object_names: HashSet<Name>,
}

impl<'a> TaskBuilder<'a> {
    pub fn new(domain: &'a Domain, problem: &'a Problem) -> Result<Self> {
        if domain.name() != problem.domain() {
            return Err(TranslateError::DomainMismatch {
                domain: *domain.name(),
                problem: *problem.domain(),
            });
        }
        let types = build_type_hierarchy(domain.types())?;
        let type_names = types.iter().map(|t| t.name).collect();
        Ok(Self {
            domain,
            problem,
            requirements: domain.requirements().merged(problem.requirements()),
            types,
            type_names,
            arities: HashMap::new(),
            derived: HashSet::new(),
            functions: HashMap::new(),
            object_names: HashSet::new(),
        })
    }

    pub fn build(mut self) -> Result<Task> {
        let objects = self.build_objects()?;
        let predicates = self.build_predicates()?;
        let functions = self.build_functions()?;

        let (init, init_assignments) = self.build_init(&objects)?;
        let goal = self
            .lower_condition(self.problem.goal(), false, &mut vec![], "the goal")?
            .simplified();

        let mut actions = Vec::with_capacity(self.domain.actions().len());
        for definition in self.domain.actions() {
            if let Some(action) = self.build_action(definition)? {
                actions.push(action);
            } else {
                debug!(action = %definition.name(), "dropping action without effects");
            }
        }
        let axioms = self
            .domain
            .derived()
            .iter()
            .map(|derived| self.build_axiom(derived))
            .collect::<Result<Vec<_>>>()?;

        Ok(Task {
            domain_name: *self.domain.name(),
            task_name: *self.problem.name(),
            use_min_cost_metric: self.uses_min_cost_metric()?,
            requirements: self.requirements,
            types: self.types,
            objects,
            predicates,
            functions,
            init,
            init_assignments,
            goal,
            actions,
            axioms,
        })
    }

    fn require(&self, requirement: Requirement, construct: &'static str) -> Result<()> {
        if self.requirements.supports(requirement) {
            Ok(())
        } else {
            Err(TranslateError::MissingRequirement {
                requirement,
                construct,
            })
        }
    }

    fn check_type(&self, type_name: Name) -> Result<()> {
        if self.type_names.contains(&type_name) {
            Ok(())
        } else {
            Err(TranslateError::UndefinedType(type_name))
        }
    }

    fn lower_typed_list(&self, list: &TypedList<Name>) -> Result<Vec<TypedObject>> {
        list.iter()
            .map(|typed| {
                self.check_type(*typed.type_name())?;
                Ok(TypedObject::new(*typed.value(), *typed.type_name()))
            })
            .collect()
    }

    fn build_objects(&mut self) -> Result<Vec<TypedObject>> {
        let mut objects = self.lower_typed_list(self.domain.constants())?;
        objects.extend(self.lower_typed_list(self.problem.objects())?);
        for object in &objects {
            if !self.object_names.insert(object.name) {
                return Err(TranslateError::Duplicate {
                    kind: "object",
                    name: object.name,
                });
            }
        }
        Ok(objects)
    }

    fn build_predicates(&mut self) -> Result<Vec<Predicate>> {
        let mut predicates = vec![];
        for definition in self.domain.predicates() {
            let name = *definition.name();
            if self.arities.contains_key(&name) {
                return Err(TranslateError::Duplicate {
                    kind: "predicate",
                    name,
                });
            }
            let arguments = self.lower_typed_list(definition.variables())?;
            self.arities.insert(name, arguments.len());
            predicates.push(Predicate { name, arguments });
        }
        let equality = Name::new(EQUALITY);
        if !self.arities.contains_key(&equality) {
            self.arities.insert(equality, 2);
            predicates.push(Predicate {
                name: equality,
                arguments: vec![
                    TypedObject::new(Name::new("?x"), Name::new(TYPE_OBJECT)),
                    TypedObject::new(Name::new("?y"), Name::new(TYPE_OBJECT)),
                ],
            });
        }

        if !self.domain.derived().is_empty() {
            self.require(Requirement::DerivedPredicates, "derived predicate")?;
        }
        for derived in self.domain.derived() {
            let skeleton = derived.predicate();
            let name = *skeleton.name();
            let arguments = self.lower_typed_list(skeleton.variables())?;
            match self.arities.get(&name) {
                Some(&expected) if expected != arguments.len() => {
                    return Err(TranslateError::ArityMismatch {
                        predicate: name,
                        expected,
                        found: arguments.len(),
                    });
                }
                Some(_) => {}
                None => {
                    self.arities.insert(name, arguments.len());
                    predicates.push(Predicate { name, arguments });
                }
            }
            self.derived.insert(name);
        }
        Ok(predicates)
    }

    fn build_functions(&mut self) -> Result<Vec<Predicate>> {
        let mut functions = vec![];
        for definition in self.domain.functions() {
            let name = *definition.name();
            if self.functions.contains_key(&name) {
                return Err(TranslateError::Duplicate {
                    kind: "function",
                    name,
                });
            }
            let arguments = self.lower_typed_list(definition.variables())?;
            self.functions.insert(name, arguments.len());
            functions.push(Predicate { name, arguments });
        }
        Ok(functions)
    }

    fn build_init(&self, objects: &[TypedObject]) -> Result<(Vec<Atom>, BTreeMap<Atom, i64>)> {
        let mut init = vec![];
        let mut seen = HashSet::new();
        let mut assignments = BTreeMap::new();
        for element in self.problem.init() {
            match element {
                InitElement::Atom(atom) => {
                    let atom = self.lower_ground_atom(atom)?;
                    if self.derived.contains(&atom.predicate) {
                        return Err(TranslateError::DerivedPredicateMisuse {
                            predicate: atom.predicate,
                            location: format!(":init fact {}", atom),
                        });
                    }
                    if seen.insert(atom.clone()) {
                        init.push(atom);
                    } else {
                        warn!(fact = %atom, "fact is specified twice in the initial state");
                    }
                }
                InitElement::Assign(function, value) => {
                    let function = self.lower_function_value(function)?;
                    match assignments.get(&function) {
                        Some(previous) if previous != value => {
                            return Err(TranslateError::Duplicate {
                                kind: "initial assignment to",
                                name: function.predicate,
                            });
                        }
                        Some(_) => {
                            warn!(function = %function, "assignment is specified twice in the initial state");
                        }
                        None => {
                            assignments.insert(function, *value);
                        }
                    }
                }
            }
        }
        let equality = Name::new(EQUALITY);
        init.extend(
            objects
                .iter()
                .map(|object| Atom::new(equality, vec![object.name, object.name])),
        );
        Ok((init, assignments))
    }

    fn lower_ground_atom(&self, atom: &ParsedAtom<Name>) -> Result<Atom> {
        let predicate = atom.predicate();
        let expected = self
            .arities
            .get(&predicate)
            .copied()
            .or_else(|| self.type_names.contains(&predicate).then_some(1))
            .ok_or(TranslateError::UndefinedPredicate(predicate))?;
        check_arity(predicate, expected, atom.arity())?;
        for object in atom.args() {
            self.check_object(*object)?;
        }
        Ok(Atom::new(predicate, atom.args().to_vec()))
    }

    fn lower_function_value(&self, function: &ParsedAtom<Name>) -> Result<Atom> {
        let name = function.predicate();
        let expected = self
            .functions
            .get(&name)
            .copied()
            .ok_or(TranslateError::UndefinedPredicate(name))?;
        check_arity(name, expected, function.arity())?;
        for object in function.args() {
            self.check_object(*object)?;
        }
        Ok(Atom::new(name, function.args().to_vec()))
    }

    fn check_object(&self, object: Name) -> Result<()> {
        if self.object_names.contains(&object) {
            Ok(())
        } else {
            Err(TranslateError::UndefinedObject(object))
        }
    }

    fn lower_term(&self, term: &Term, scope: &[Name], context: &str) -> Result<Name> {
        match term {
            Term::Variable(variable) => {
                if scope.contains(variable) {
                    Ok(*variable)
                } else {
                    Err(TranslateError::UnboundVariable {
                        variable: *variable,
                        context: context.to_string(),
                    })
                }
            }
            Term::Name(object) => {
                self.check_object(*object)?;
                Ok(*object)
            }
        }
    }

    /// Lowers an atom of a condition or effect. Type names act as unary
    /// predicates in conditions only.
    fn lower_atom(
        &self,
        atom: &ParsedAtom<Term>,
        scope: &[Name],
        context: &str,
        allow_types: bool,
    ) -> Result<Atom> {
        let predicate = atom.predicate();
        let expected = match self.arities.get(&predicate) {
            Some(arity) => *arity,
            None if allow_types && self.type_names.contains(&predicate) => 1,
            None => return Err(TranslateError::UndefinedPredicate(predicate)),
        };
        check_arity(predicate, expected, atom.arity())?;
        let args = atom
            .args()
            .iter()
            .map(|term| self.lower_term(term, scope, context))
            .collect::<Result<Vec<_>>>()?;
        Ok(Atom::new(predicate, args))
    }

    /// Lowers a goal description into negation normal form. `negated` tells
    /// whether an odd number of negations encloses `goal`.
    fn lower_condition(
        &self,
        goal: &GoalDefinition,
        negated: bool,
        scope: &mut Vec<Name>,
        context: &str,
    ) -> Result<Condition> {
        let junction = |parts: Vec<Condition>, conjunctive: bool| {
            if conjunctive != negated {
                Condition::Conjunction(parts)
            } else {
                Condition::Disjunction(parts)
            }
        };
        Ok(match goal {
            GoalDefinition::Atom(atom) => {
                let atom = self.lower_atom(atom, scope, context, true)?;
                Condition::Literal(Literal { atom, negated })
            }
            GoalDefinition::Equality(left, right) => {
                let args = vec![
                    self.lower_term(left, scope, context)?,
                    self.lower_term(right, scope, context)?,
                ];
                Condition::Literal(Literal {
                    atom: Atom::new(Name::new(EQUALITY), args),
                    negated,
                })
            }
            GoalDefinition::And(parts) => junction(
                self.lower_conditions(parts, negated, scope, context)?,
                true,
            ),
            GoalDefinition::Or(parts) => {
                self.require(Requirement::DisjunctivePreconditions, "or")?;
                junction(
                    self.lower_conditions(parts, negated, scope, context)?,
                    false,
                )
            }
            GoalDefinition::Not(inner) => self.lower_condition(inner, !negated, scope, context)?,
            GoalDefinition::Imply(antecedent, consequent) => {
                self.require(Requirement::DisjunctivePreconditions, "imply")?;
                let parts = vec![
                    self.lower_condition(antecedent, !negated, scope, context)?,
                    self.lower_condition(consequent, negated, scope, context)?,
                ];
                junction(parts, false)
            }
            GoalDefinition::Exists(parameters, inner) => {
                self.require(Requirement::ExistentialPreconditions, "exists")?;
                let (parameters, part) =
                    self.lower_quantified(parameters, inner, negated, scope, context)?;
                if negated {
                    Condition::Universal(parameters, Box::new(part))
                } else {
                    Condition::Existential(parameters, Box::new(part))
                }
            }
            GoalDefinition::Forall(parameters, inner) => {
                self.require(Requirement::UniversalPreconditions, "forall")?;
                let (parameters, part) =
                    self.lower_quantified(parameters, inner, negated, scope, context)?;
                if negated {
                    Condition::Existential(parameters, Box::new(part))
                } else {
                    Condition::Universal(parameters, Box::new(part))
                }
            }
        })
    }

    fn lower_conditions(
        &self,
        parts: &[GoalDefinition],
        negated: bool,
        scope: &mut Vec<Name>,
        context: &str,
    ) -> Result<Vec<Condition>> {
        parts
            .iter()
            .map(|part| self.lower_condition(part, negated, scope, context))
            .collect()
    }

    fn lower_quantified(
        &self,
        parameters: &TypedList<Name>,
        inner: &GoalDefinition,
        negated: bool,
        scope: &mut Vec<Name>,
        context: &str,
    ) -> Result<(Vec<TypedObject>, Condition)> {
        let parameters = self.lower_typed_list(parameters)?;
        let depth = scope.len();
        scope.extend(parameters.iter().map(|p| p.name));
        let part = self.lower_condition(inner, negated, scope, context);
        scope.truncate(depth);
        Ok((parameters, part?))
    }

    fn build_action(&self, definition: &ActionDefinition) -> Result<Option<Action>> {
        let context = format!("action {}", definition.name());
        let parameters = self.lower_typed_list(definition.parameters())?;
        let mut scope = parameters.iter().map(|p| p.name).collect::<Vec<_>>();
        let precondition = match definition.precondition() {
            Some(goal) => self
                .lower_condition(goal, false, &mut scope, &context)?
                .simplified(),
            None => Condition::Truth,
        };

        let mut lowering = EffectLowering {
            builder: self,
            context: &context,
            effects: vec![],
            cost: None,
        };
        if let Some(effect) = definition.effect() {
            lowering.lower(effect, &[], &[], &mut scope, true)?;
        }
        let EffectLowering { effects, cost, .. } = lowering;
        if effects.is_empty() {
            return Ok(None);
        }
        Ok(Some(Action::new(
            *definition.name(),
            parameters,
            precondition,
            effects,
            cost,
        )))
    }

    fn build_axiom(&self, derived: &DerivedPredicate) -> Result<Axiom> {
        let name = *derived.predicate().name();
        let context = format!("derived predicate {}", name);
        let parameters = self.lower_typed_list(derived.predicate().variables())?;
        let mut scope = parameters.iter().map(|p| p.name).collect::<Vec<_>>();
        let condition = self
            .lower_condition(derived.condition(), false, &mut scope, &context)?
            .simplified();
        Ok(Axiom::new(name, parameters, condition))
    }

    fn uses_min_cost_metric(&self) -> Result<bool> {
        match self.problem.metric() {
            None => Ok(false),
            Some(metric)
                if metric.minimize
                    && metric.function.predicate() == TOTAL_COST
                    && metric.function.arity() == 0 =>
            {
                Ok(true)
            }
            Some(metric) => Err(TranslateError::Unsupported(format!(
                "metric {} {}",
                if metric.minimize { "minimize" } else { "maximize" },
                metric.function
            ))),
        }
    }
}

/// Flattens one action's effect tree into single-literal [`Effect`]s and
/// extracts its cost.
struct EffectLowering<'b, 'a> {
    builder: &'b TaskBuilder<'a>,
    context: &'b str,
    effects: Vec<Effect>,
    cost: Option<CostExpression>,
}

impl EffectLowering<'_, '_> {
    fn lower(
        &mut self,
        effect: &EffectDefinition,
        parameters: &[TypedObject],
        conditions: &[Condition],
        scope: &mut Vec<Name>,
        top_level: bool,
    ) -> Result<()> {
        match effect {
            EffectDefinition::And(parts) => {
                for part in parts {
                    self.lower(part, parameters, conditions, scope, top_level)?;
                }
            }
            EffectDefinition::Forall(new_parameters, inner) => {
                self.builder
                    .require(Requirement::ConditionalEffects, "forall effect")?;
                let new_parameters = self.builder.lower_typed_list(new_parameters)?;
                let depth = scope.len();
                scope.extend(new_parameters.iter().map(|p| p.name));
                let mut parameters = parameters.to_vec();
                parameters.extend(new_parameters);
                let result = self.lower(inner, &parameters, conditions, scope, false);
                scope.truncate(depth);
                result?;
            }
            EffectDefinition::When(condition, inner) => {
                self.builder
                    .require(Requirement::ConditionalEffects, "when")?;
                let condition = self
                    .builder
                    .lower_condition(condition, false, scope, self.context)?;
                let mut conditions = conditions.to_vec();
                conditions.push(condition);
                self.lower(inner, parameters, &conditions, scope, false)?;
            }
            EffectDefinition::Add(atom) | EffectDefinition::Delete(atom) => {
                let atom = self.builder.lower_atom(atom, scope, self.context, false)?;
                if self.builder.derived.contains(&atom.predicate) {
                    return Err(TranslateError::DerivedPredicateMisuse {
                        predicate: atom.predicate,
                        location: format!("an effect of {}", self.context),
                    });
                }
                let literal = Literal {
                    atom,
                    negated: matches!(effect, EffectDefinition::Delete(_)),
                };
                let condition = Condition::Conjunction(conditions.to_vec()).simplified();
                self.add(Effect::new(parameters.to_vec(), condition, literal));
            }
            EffectDefinition::Increase(function, expression) => {
                if !top_level
                    || function.predicate() != TOTAL_COST
                    || function.arity() != 0
                {
                    return Err(TranslateError::Unsupported(format!(
                        "numeric effect on {} in {}",
                        function,
                        self.context
                    )));
                }
                self.cost = Some(self.lower_cost(expression, scope)?);
            }
        }
        Ok(())
    }

    fn lower_cost(&self, expression: &NumericExpression, scope: &[Name]) -> Result<CostExpression> {
        match expression {
            NumericExpression::Number(value) => Ok(CostExpression::Constant(*value)),
            NumericExpression::Function(function) => {
                let name = function.predicate();
                let expected = self
                    .builder
                    .functions
                    .get(&name)
                    .copied()
                    .ok_or(TranslateError::UndefinedPredicate(name))?;
                check_arity(name, expected, function.arity())?;
                let args = function
                    .args()
                    .iter()
                    .map(|term| self.builder.lower_term(term, scope, self.context))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CostExpression::Function(Atom::new(name, args)))
            }
        }
    }

    /// Adds an effect with add-after-delete semantics: an add effect replaces
    /// an identical delete effect, and a delete effect is dropped if the
    /// identical add effect is already present.
    fn add(&mut self, effect: Effect) {
        let contradiction = Effect::new(
            effect.parameters.clone(),
            effect.condition.clone(),
            effect.literal.negate(),
        );
        match self.effects.iter().position(|e| *e == contradiction) {
            Some(position) if contradiction.literal.negated => {
                self.effects.remove(position);
                self.effects.push(effect);
            }
            Some(_) => {}
            None if self.effects.contains(&effect) => {}
            None => self.effects.push(effect),
        }
    }
}

fn check_arity(predicate: Name, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(TranslateError::ArityMismatch {
            predicate,
            expected,
            found,
        })
    }
}

/// Builds the type hierarchy rooted at `object`. Parent types that are used
/// but never declared become direct subtypes of `object`.
fn build_type_hierarchy(declared: &TypedList<Name>) -> Result<Vec<PddlType>> {
    let object = Name::new(TYPE_OBJECT);
    let mut order = vec![object];
    let mut parents: HashMap<Name, Option<Name>> = HashMap::from([(object, None)]);
    for typed in declared.iter() {
        let name = *typed.value();
        if name == object {
            continue;
        }
        if parents
            .insert(name, Some(*typed.type_name()))
            .is_some()
        {
            return Err(TranslateError::Duplicate { kind: "type", name });
        }
        order.push(name);
    }
    for typed in declared.iter() {
        let parent = *typed.type_name();
        if !parents.contains_key(&parent) {
            order.push(parent);
            parents.insert(parent, Some(object));
        }
    }

    let mut types = Vec::with_capacity(order.len());
    for name in order {
        let mut supertype_names = vec![];
        let mut current = parents.get(&name).copied().flatten();
        while let Some(parent) = current {
            if parent == name || supertype_names.contains(&parent) {
                break;
            }
            supertype_names.push(parent);
            current = parents.get(&parent).copied().flatten();
        }
        types.push(PddlType {
            name,
            supertype_names,
        });
    }
    Ok(types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn task(domain: &str, problem: &str) -> Result<Task> {
        Task::from_text(domain, problem)
    }

    const TINY_PROBLEM: &str = "(define (problem p) (:domain d)
        (:objects a b - thing) (:init (on a)) (:goal (on b)))";

    fn tiny_domain(requirements: &str, action: &str) -> String {
        format!(
            "(define (domain d) (:requirements {}) (:types thing)
             (:predicates (on ?x - thing) (off ?x - thing)) {})",
            requirements, action
        )
    }

    #[test]
    fn type_hierarchy_closure() {
        let task = task(ADL_DOMAIN_TEXT, ADL_PROBLEM_TEXT).unwrap();
        for t in &task.types {
            if t.name != Name::new(TYPE_OBJECT) {
                assert_eq!(t.supertype_names.last(), Some(&Name::new(TYPE_OBJECT)));
            }
        }
    }

    #[test]
    fn undeclared_parent_types_are_added() {
        let types = TypedList::new(vec![crate::parsed_types::Typed::new(
            Name::new("ball"),
            Name::new("item"),
        )]);
        let hierarchy = build_type_hierarchy(&types).unwrap();
        let item = hierarchy.iter().find(|t| t.name == Name::new("item")).unwrap();
        assert_eq!(item.supertype_names, vec![Name::new(TYPE_OBJECT)]);
        let ball = hierarchy.iter().find(|t| t.name == Name::new("ball")).unwrap();
        assert_eq!(
            ball.supertype_names,
            vec![Name::new("item"), Name::new(TYPE_OBJECT)]
        );
    }

    #[test]
    fn disjunction_requires_declaration() {
        let action = "(:action flip :parameters (?x - thing)
            :precondition (or (on ?x) (off ?x)) :effect (not (on ?x)))";
        let result = task(&tiny_domain(":strips :typing", action), TINY_PROBLEM);
        assert!(matches!(
            result,
            Err(TranslateError::MissingRequirement {
                requirement: Requirement::DisjunctivePreconditions,
                ..
            })
        ));
        let result = task(&tiny_domain(":adl", action), TINY_PROBLEM);
        assert!(result.is_ok());
    }

    #[test]
    fn unbound_variables_are_rejected() {
        let action = "(:action flip :parameters (?x - thing)
            :precondition (on ?y) :effect (not (on ?x)))";
        let result = task(&tiny_domain(":strips :typing", action), TINY_PROBLEM);
        assert!(matches!(result, Err(TranslateError::UnboundVariable { .. })));
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let action = "(:action flip :parameters (?x - thing)
            :precondition (on ?x ?x) :effect (not (on ?x)))";
        let result = task(&tiny_domain(":strips :typing", action), TINY_PROBLEM);
        assert!(matches!(
            result,
            Err(TranslateError::ArityMismatch {
                expected: 1,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn undefined_predicate_is_rejected() {
        let action = "(:action flip :parameters (?x - thing)
            :precondition (under ?x) :effect (not (on ?x)))";
        let result = task(&tiny_domain(":strips :typing", action), TINY_PROBLEM);
        assert!(matches!(result, Err(TranslateError::UndefinedPredicate(_))));
    }

    #[test]
    fn add_wins_over_identical_delete() {
        let action = "(:action flip :parameters (?x - thing)
            :precondition (on ?x) :effect (and (not (off ?x)) (off ?x) (not (on ?x))))";
        let task = task(&tiny_domain(":strips :typing", action), TINY_PROBLEM).unwrap();
        let effects = &task.actions[0].effects;
        assert_eq!(effects.len(), 2);
        assert!(effects
            .iter()
            .any(|e| e.literal.atom.predicate == Name::new("off") && !e.literal.negated));
    }

    #[test]
    fn actions_without_effects_are_dropped() {
        let action = "(:action noop :parameters (?x - thing) :precondition (on ?x) :effect (and))";
        let task = task(&tiny_domain(":strips :typing", action), TINY_PROBLEM).unwrap();
        assert!(task.actions.is_empty());
    }

    #[test]
    fn negation_is_pushed_to_literals() {
        let action = "(:action flip :parameters (?x - thing)
            :precondition (not (and (on ?x) (off ?x))) :effect (on ?x))";
        let task = task(&tiny_domain(":strips :typing", action), TINY_PROBLEM).unwrap();
        match &task.actions[0].precondition {
            Condition::Disjunction(parts) => {
                assert!(parts
                    .iter()
                    .all(|p| matches!(p, Condition::Literal(l) if l.negated)));
            }
            other => panic!("unexpected precondition {:?}", other),
        }
    }

    #[test]
    fn action_costs_are_extracted() {
        let task = task(ACTION_COST_DOMAIN_TEXT, ACTION_COST_PROBLEM_TEXT).unwrap();
        assert!(task.use_min_cost_metric);
        assert!(task.actions.iter().all(|a| a.cost.is_some()));
        assert!(!task.init_assignments.is_empty());
    }

    #[test]
    fn derived_predicates_cannot_be_initialised() {
        let problem = NEGATIVE_AXIOM_CYCLE_PROBLEM_TEXT.replace("(:init", "(:init (p)");
        let result = task(NEGATIVE_AXIOM_CYCLE_DOMAIN_TEXT, &problem);
        assert!(matches!(
            result,
            Err(TranslateError::DerivedPredicateMisuse { .. })
        ));
    }

    #[test]
    fn duplicate_objects_are_rejected() {
        let problem = "(define (problem p) (:domain d)
            (:objects a a - thing) (:init) (:goal (on a)))";
        let result = task(&tiny_domain(":strips :typing", ""), problem);
        assert!(matches!(
            result,
            Err(TranslateError::Duplicate { kind: "object", .. })
        ));
    }

    #[test]
    fn unknown_metric_is_unsupported() {
        let problem = "(define (problem p) (:domain d)
            (:objects a - thing) (:init) (:goal (on a)) (:metric maximize (total-cost)))";
        let result = task(&tiny_domain(":strips :typing", ""), problem);
        assert!(matches!(result, Err(TranslateError::Unsupported(_))));
    }
}
