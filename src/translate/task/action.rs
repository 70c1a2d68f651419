//! Lifted and ground operators.

use crate::parsed_types::Name;
use crate::translate::task::{Atom, Condition, Impossible, Literal, TypedObject};
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::{Display, Formatter};

/// A single-literal effect, possibly universally quantified and conditional.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Effect {
    pub parameters: Vec<TypedObject>,
    pub condition: Condition,
    pub literal: Literal,
}

impl Effect {
    pub fn new(parameters: Vec<TypedObject>, condition: Condition, literal: Literal) -> Self {
        Self {
            parameters,
            condition,
            literal,
        }
    }

    fn uniquify_variables(&self, type_map: &mut HashMap<Name, Name>) -> Effect {
        let mut renamings = HashMap::new();
        let parameters = self
            .parameters
            .iter()
            .map(|parameter| parameter.uniquify_name(type_map, &mut renamings))
            .collect();
        Effect {
            parameters,
            condition: self.condition.uniquify_variables(type_map, &renamings),
            literal: self.literal.rename_variables(&renamings),
        }
    }

    /// Grounds the effect for every binding of its own parameters. Returns
    /// `(condition, literal)` pairs for the fluent effects that can fire.
    pub fn instantiate(
        &self,
        var_mapping: &HashMap<Name, Name>,
        init_facts: &HashSet<Atom>,
        fluent_facts: &HashSet<Atom>,
        objects_by_type: &HashMap<Name, Vec<Name>>,
        result: &mut Vec<(Vec<Literal>, Literal)>,
    ) {
        if self.parameters.is_empty() {
            self.instantiate_once(var_mapping, init_facts, fluent_facts, result);
            return;
        }
        let mut var_mapping = var_mapping.clone();
        let object_lists = self
            .parameters
            .iter()
            .map(|parameter| {
                objects_by_type
                    .get(&parameter.type_name)
                    .cloned()
                    .unwrap_or_default()
            })
            .collect_vec();
        for objects in object_lists.into_iter().multi_cartesian_product() {
            for (parameter, object) in self.parameters.iter().zip(objects) {
                var_mapping.insert(parameter.name, object);
            }
            self.instantiate_once(&var_mapping, init_facts, fluent_facts, result);
        }
    }

    fn instantiate_once(
        &self,
        var_mapping: &HashMap<Name, Name>,
        init_facts: &HashSet<Atom>,
        fluent_facts: &HashSet<Atom>,
        result: &mut Vec<(Vec<Literal>, Literal)>,
    ) {
        let mut condition = vec![];
        if self
            .condition
            .instantiate(var_mapping, init_facts, fluent_facts, &mut condition)
            .is_err()
        {
            return;
        }
        let literal = self.literal.ground(var_mapping);
        if fluent_facts.contains(&literal.atom) {
            result.push((condition, literal));
        }
    }
}

/// The cost of an action: a constant or a function looked up in the
/// numeric part of the initial state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CostExpression {
    Constant(i64),
    Function(Atom),
}

impl CostExpression {
    pub fn instantiate(
        &self,
        var_mapping: &HashMap<Name, Name>,
        init_assignments: &BTreeMap<Atom, i64>,
    ) -> i64 {
        match self {
            CostExpression::Constant(value) => *value,
            CostExpression::Function(function) => init_assignments
                .get(&function.rename_variables(var_mapping))
                .copied()
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: Name,
    pub parameters: Vec<TypedObject>,
    /// How many leading parameters appear in the ground action's name.
    /// Parameters introduced for existential preconditions come after them.
    pub num_external_parameters: usize,
    pub precondition: Condition,
    pub effects: Vec<Effect>,
    pub cost: Option<CostExpression>,
}

impl Action {
    pub fn new(
        name: Name,
        parameters: Vec<TypedObject>,
        precondition: Condition,
        effects: Vec<Effect>,
        cost: Option<CostExpression>,
    ) -> Self {
        let num_external_parameters = parameters.len();
        let mut action = Self {
            name,
            parameters,
            num_external_parameters,
            precondition,
            effects,
            cost,
        };
        action.uniquify_variables();
        action
    }

    pub fn type_map(&self) -> HashMap<Name, Name> {
        let mut type_map: HashMap<Name, Name> = self
            .parameters
            .iter()
            .map(|parameter| (parameter.name, parameter.type_name))
            .collect();
        self.precondition.quantified_variable_types(&mut type_map);
        for effect in &self.effects {
            for parameter in &effect.parameters {
                type_map.insert(parameter.name, parameter.type_name);
            }
            effect.condition.quantified_variable_types(&mut type_map);
        }
        type_map
    }

    fn uniquify_variables(&mut self) {
        let mut type_map: HashMap<Name, Name> = self
            .parameters
            .iter()
            .map(|parameter| (parameter.name, parameter.type_name))
            .collect();
        self.precondition = self
            .precondition
            .uniquify_variables(&mut type_map, &HashMap::new());
        self.effects = self
            .effects
            .iter()
            .map(|effect| effect.uniquify_variables(&mut type_map))
            .collect();
    }

    /// Grounds the action under `var_mapping`, which must bind all
    /// parameters. Returns `None` if the precondition is impossible or no
    /// fluent effect remains.
    pub fn instantiate(
        &self,
        var_mapping: &HashMap<Name, Name>,
        init_facts: &HashSet<Atom>,
        init_assignments: &BTreeMap<Atom, i64>,
        fluent_facts: &HashSet<Atom>,
        objects_by_type: &HashMap<Name, Vec<Name>>,
    ) -> Option<PropositionalAction> {
        let args = self.parameters[..self.num_external_parameters]
            .iter()
            .map(|parameter| var_mapping[&parameter.name].as_str())
            .join(" ");
        let name = format!("({} {})", self.name, args);

        let mut precondition = vec![];
        self.precondition
            .instantiate(var_mapping, init_facts, fluent_facts, &mut precondition)
            .ok()?;

        let mut effects = vec![];
        for effect in &self.effects {
            effect.instantiate(
                var_mapping,
                init_facts,
                fluent_facts,
                objects_by_type,
                &mut effects,
            );
        }
        if effects.is_empty() {
            return None;
        }
        let cost = self
            .cost
            .as_ref()
            .map_or(0, |cost| cost.instantiate(var_mapping, init_assignments));
        Some(PropositionalAction::new(name, precondition, effects, cost))
    }
}

/// A derived predicate rule `name(external parameters) :- condition`.
#[derive(Debug, Clone, PartialEq)]
pub struct Axiom {
    pub name: Name,
    pub parameters: Vec<TypedObject>,
    pub num_external_parameters: usize,
    pub condition: Condition,
}

impl Axiom {
    pub fn new(name: Name, parameters: Vec<TypedObject>, condition: Condition) -> Self {
        let num_external_parameters = parameters.len();
        let mut type_map: HashMap<Name, Name> = parameters
            .iter()
            .map(|parameter| (parameter.name, parameter.type_name))
            .collect();
        let condition = condition.uniquify_variables(&mut type_map, &HashMap::new());
        Self {
            name,
            parameters,
            num_external_parameters,
            condition,
        }
    }

    pub fn type_map(&self) -> HashMap<Name, Name> {
        let mut type_map: HashMap<Name, Name> = self
            .parameters
            .iter()
            .map(|parameter| (parameter.name, parameter.type_name))
            .collect();
        self.condition.quantified_variable_types(&mut type_map);
        type_map
    }

    pub fn instantiate(
        &self,
        var_mapping: &HashMap<Name, Name>,
        init_facts: &HashSet<Atom>,
        fluent_facts: &HashSet<Atom>,
    ) -> Option<PropositionalAxiom> {
        let args = self
            .parameters
            .iter()
            .map(|parameter| var_mapping[&parameter.name].as_str())
            .join(" ");
        let name = format!("({} {})", self.name, args);

        let mut condition = vec![];
        self.condition
            .instantiate(var_mapping, init_facts, fluent_facts, &mut condition)
            .ok()?;
        let effect_args = self.parameters[..self.num_external_parameters]
            .iter()
            .map(|parameter| *var_mapping.get(&parameter.name).unwrap_or(&parameter.name))
            .collect_vec();
        let effect = Literal::positive(Atom::new(self.name, effect_args));
        Some(PropositionalAxiom::new(name, condition, effect))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropositionalAction {
    pub name: String,
    pub precondition: Vec<Literal>,
    pub add_effects: Vec<(Vec<Literal>, Atom)>,
    pub del_effects: Vec<(Vec<Literal>, Atom)>,
    pub cost: i64,
}

impl PropositionalAction {
    /// Splits effects into adds and deletes. A delete whose condition and
    /// atom match an add effect is dropped, so adds win over deletes.
    pub fn new(
        name: String,
        precondition: Vec<Literal>,
        effects: Vec<(Vec<Literal>, Literal)>,
        cost: i64,
    ) -> Self {
        let add_effects = effects
            .iter()
            .filter(|(_, effect)| !effect.negated)
            .map(|(condition, effect)| (condition.clone(), effect.atom.clone()))
            .collect_vec();
        let mut del_effects = vec![];
        for (condition, effect) in effects.into_iter().filter(|(_, e)| e.negated) {
            let pair = (condition, effect.atom);
            if !add_effects.contains(&pair) {
                del_effects.push(pair);
            }
        }
        Self {
            name,
            precondition,
            add_effects,
            del_effects,
            cost,
        }
    }
}

impl Display for PropositionalAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.name)?;
        for fact in &self.precondition {
            writeln!(f, "PRE: {}", fact)?;
        }
        for (condition, fact) in &self.add_effects {
            writeln!(f, "ADD: {} -> {}", condition.iter().join(", "), fact)?;
        }
        for (condition, fact) in &self.del_effects {
            writeln!(f, "DEL: {} -> {}", condition.iter().join(", "), fact)?;
        }
        write!(f, "cost: {}", self.cost)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropositionalAxiom {
    pub name: String,
    pub condition: Vec<Literal>,
    pub effect: Literal,
}

impl PropositionalAxiom {
    pub const fn new(name: String, condition: Vec<Literal>, effect: Literal) -> Self {
        Self {
            name,
            condition,
            effect,
        }
    }
}

impl Display for PropositionalAxiom {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} => {}",
            self.name,
            self.condition.iter().join(", "),
            self.effect
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(predicate: &str, args: &[&str]) -> Atom {
        Atom::new(
            Name::new(predicate),
            args.iter().map(|a| Name::new(a)).collect::<Vec<_>>(),
        )
    }

    #[test]
    fn adds_win_over_identical_deletes() {
        let effects = vec![
            (vec![], Literal::positive(atom("p", &[]))),
            (vec![], Literal::negative(atom("p", &[]))),
            (vec![], Literal::negative(atom("q", &[]))),
        ];
        let action = PropositionalAction::new("(a )".to_string(), vec![], effects, 1);
        assert_eq!(action.add_effects, vec![(vec![], atom("p", &[]))]);
        assert_eq!(action.del_effects, vec![(vec![], atom("q", &[]))]);
    }

    #[test]
    fn action_parameters_are_uniquified() {
        let x = TypedObject::new(Name::new("?x"), Name::new("object"));
        let effect = Effect::new(
            vec![x.clone()],
            Condition::Truth,
            Literal::positive(atom("p", &["?x"])),
        );
        let action = Action::new(Name::new("a"), vec![x], Condition::Truth, vec![effect], None);
        assert_eq!(action.effects[0].parameters[0].name, Name::new("?x1"));
        assert_eq!(action.effects[0].literal.atom, atom("p", &["?x1"]));
    }

    #[test]
    fn universal_effects_expand_over_objects() {
        let b = TypedObject::new(Name::new("?b"), Name::new("ball"));
        let effect = Effect::new(
            vec![b],
            Condition::Truth,
            Literal::negative(atom("at", &["?b"])),
        );
        let objects_by_type = HashMap::from([(
            Name::new("ball"),
            vec![Name::new("b1"), Name::new("b2")],
        )]);
        let fluents = HashSet::from([atom("at", &["b1"]), atom("at", &["b2"])]);
        let mut result = vec![];
        effect.instantiate(
            &HashMap::new(),
            &HashSet::new(),
            &fluents,
            &objects_by_type,
            &mut result,
        );
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn cost_functions_are_looked_up_in_init() {
        let cost = CostExpression::Function(atom("dist", &["?a", "?b"]));
        let mapping = HashMap::from([
            (Name::new("?a"), Name::new("l1")),
            (Name::new("?b"), Name::new("l2")),
        ]);
        let assignments = BTreeMap::from([(atom("dist", &["l1", "l2"]), 7)]);
        assert_eq!(cost.instantiate(&mapping, &assignments), 7);
        assert_eq!(cost.instantiate(&HashMap::new(), &assignments), 0);
    }
}
