use crate::parsed_types::Name;
use crate::translate::datalog::{split_rules::split_rule, DatalogAtom, ModelPredicate, AUXILIARY_PREFIX};
use crate::translate::task::{Condition, NameGenerator, Task, TypedObject};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use strum_macros::Display as StrumDisplay;
use tracing::{debug, info, trace};

pub const ALWAYS_FALSE: &str = "@always-false";
pub const OBJECT: &str = "@object";
const EQUALITY: &str = "=";

/// How the model builder evaluates a split rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum RuleKind {
    /// Two conditions sharing variables.
    Join,
    /// One condition; variables not in the effect are projected away.
    Project,
    /// Conditions with pairwise disjoint variables.
    Product,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub conditions: Vec<DatalogAtom>,
    pub effect: DatalogAtom,
    /// Set once the rule has been split.
    pub kind: Option<RuleKind>,
}

impl Rule {
    pub fn new(conditions: Vec<DatalogAtom>, effect: DatalogAtom) -> Self {
        Self {
            conditions,
            effect,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: RuleKind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn condition_variables(&self) -> BTreeSet<Name> {
        self.conditions.iter().flat_map(|c| c.variables()).collect()
    }

    /// Renames repeated variables within one atom, `p(?x, ?x)` becoming
    /// `p(?x, ?x@0)` together with the condition `=(?x, ?x@0)`. Returns
    /// whether anything was renamed.
    fn rename_duplicate_variables(&mut self) -> bool {
        fn rename(atom: &DatalogAtom, extra: &mut Vec<DatalogAtom>) -> DatalogAtom {
            let mut used = BTreeSet::new();
            let mut result = atom.clone();
            for (i, arg) in atom.args.iter().enumerate() {
                if !arg.is_variable() {
                    continue;
                }
                if used.insert(*arg) {
                    continue;
                }
                let new_name = Name::new(format!("{}@{}", arg, extra.len()));
                result.args[i] = new_name;
                extra.push(DatalogAtom::new(
                    ModelPredicate::Name(Name::new(EQUALITY)),
                    vec![*arg, new_name],
                ));
            }
            result
        }

        let mut extra = vec![];
        self.effect = rename(&self.effect, &mut extra);
        self.conditions = self
            .conditions
            .iter()
            .map(|condition| rename(condition, &mut extra))
            .collect();
        let renamed = !extra.is_empty();
        self.conditions.extend(extra);
        renamed
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} :- ", self.effect)?;
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", condition)?;
        }
        write!(f, ".")
    }
}

/// A Datalog program whose least model contains every relaxed-reachable
/// fact, action and axiom instantiation.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub facts: Vec<DatalogAtom>,
    pub rules: Vec<Rule>,
    objects: BTreeSet<Name>,
}

impl Program {
    /// Builds the program of a normalized task, with its rules already
    /// split into joins, projections and products.
    pub fn from_task(task: &Task) -> Self {
        let mut program = Self::default();
        program.add_task_facts(task);
        program.rules = exploration_rules(task);
        program.normalize();

        let mut names = NameGenerator::new(AUXILIARY_PREFIX);
        program.rules = std::mem::take(&mut program.rules)
            .into_iter()
            .flat_map(|rule| split_rule(rule, &mut names))
            .collect();
        info!(
            facts = program.facts.len(),
            rules = program.rules.len(),
            "generated Datalog program"
        );
        for rule in &program.rules {
            trace!(kind = ?rule.kind, "{}", rule);
        }
        program
    }

    pub fn add_fact(&mut self, atom: DatalogAtom) {
        self.objects.extend(atom.args.iter().copied());
        self.facts.push(atom);
    }

    fn add_task_facts(&mut self, task: &Task) {
        for object in &task.objects {
            self.add_fact(object.type_atom().into());
            for supertype in task.supertypes_of(object.type_name) {
                self.add_fact(TypedObject::new(object.name, *supertype).type_atom().into());
            }
        }
        for fact in &task.init {
            self.add_fact(fact.clone().into());
        }
    }

    /// Establishes the properties the model builder relies on: every effect
    /// variable occurs in a condition, no atom repeats a variable, and no
    /// rule has an empty body.
    pub fn normalize(&mut self) {
        self.remove_free_effect_variables();
        self.split_duplicate_arguments();
        self.convert_trivial_rules();
    }

    fn remove_free_effect_variables(&mut self) {
        let object = ModelPredicate::Name(Name::new(OBJECT));
        let mut must_add_predicate = false;
        for rule in &mut self.rules {
            let condition_variables = rule.condition_variables();
            let free = rule
                .effect
                .variables()
                .filter(|v| !condition_variables.contains(v))
                .collect::<BTreeSet<_>>();
            if !free.is_empty() {
                must_add_predicate = true;
                for variable in free {
                    rule.conditions.push(DatalogAtom::new(object, vec![variable]));
                }
            }
        }
        if must_add_predicate {
            debug!("unbound effect variables: adding {} predicate", OBJECT);
            let objects = self.objects.iter().copied().collect::<Vec<_>>();
            for name in objects {
                self.facts.push(DatalogAtom::new(object, vec![name]));
            }
        }
    }

    fn split_duplicate_arguments(&mut self) {
        let mut renamed = false;
        for rule in &mut self.rules {
            renamed |= rule.rename_duplicate_variables();
        }
        if renamed {
            debug!("duplicate arguments: adding equality conditions");
        }
    }

    fn convert_trivial_rules(&mut self) {
        let (trivial, rules): (Vec<_>, Vec<_>) = std::mem::take(&mut self.rules)
            .into_iter()
            .partition(|rule| rule.conditions.is_empty());
        self.rules = rules;
        if !trivial.is_empty() {
            debug!(count = trivial.len(), "trivial rules: converted to facts");
        }
        for rule in trivial {
            assert!(
                rule.effect.variables().next().is_none(),
                "Rule without conditions has variables in its effect: {}",
                rule
            );
            self.add_fact(rule.effect);
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for fact in &self.facts {
            writeln!(f, "{}.", fact)?;
        }
        for rule in &self.rules {
            match rule.kind {
                Some(kind) => writeln!(f, "{} {}", kind, rule)?,
                None => writeln!(f, "none {}", rule)?,
            }
        }
        Ok(())
    }
}

/// Type atoms for `parameters` followed by the positive literals of a
/// normalized condition. A false condition yields a body that never fires.
fn condition_to_rule_body(parameters: &[TypedObject], condition: &Condition) -> Vec<DatalogAtom> {
    let mut body = parameters
        .iter()
        .map(|p| DatalogAtom::from(p.type_atom()))
        .collect::<Vec<_>>();
    match condition.literals() {
        None => return vec![DatalogAtom::new(ModelPredicate::Name(Name::new(ALWAYS_FALSE)), vec![])],
        Some(literals) => body.extend(
            literals
                .into_iter()
                .filter(|literal| !literal.negated)
                .map(|literal| DatalogAtom::from(literal.atom.clone())),
        ),
    }
    body
}

fn exploration_rules(task: &Task) -> Vec<Rule> {
    let mut rules = vec![];
    for (index, action) in task.actions.iter().enumerate() {
        let head = DatalogAtom::new(
            ModelPredicate::Action(index),
            action.parameters.iter().map(|p| p.name).collect::<Vec<_>>(),
        );
        rules.push(Rule::new(
            condition_to_rule_body(&action.parameters, &action.precondition),
            head.clone(),
        ));
        for effect in action.effects.iter().filter(|e| !e.literal.negated) {
            let mut body = vec![head.clone()];
            body.extend(condition_to_rule_body(&effect.parameters, &effect.condition));
            rules.push(Rule::new(body, effect.literal.atom.clone().into()));
        }
    }
    for (index, axiom) in task.axioms.iter().enumerate() {
        let head = DatalogAtom::new(
            ModelPredicate::Axiom(index),
            axiom.parameters.iter().map(|p| p.name).collect::<Vec<_>>(),
        );
        rules.push(Rule::new(
            condition_to_rule_body(&axiom.parameters, &axiom.condition),
            head.clone(),
        ));
        let effect = DatalogAtom::new(
            ModelPredicate::Name(axiom.name),
            axiom.parameters[..axiom.num_external_parameters]
                .iter()
                .map(|p| p.name)
                .collect::<Vec<_>>(),
        );
        rules.push(Rule::new(vec![head], effect));
    }
    rules.push(Rule::new(
        condition_to_rule_body(&[], &task.goal),
        DatalogAtom::new(ModelPredicate::GoalReachable, vec![]),
    ));
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::translate::normalize::{normalize, NEW_AXIOM_PREFIX};

    fn atom(predicate: &str, args: &[&str]) -> DatalogAtom {
        DatalogAtom::new(
            ModelPredicate::Name(Name::new(predicate)),
            args.iter().map(|a| Name::new(a)).collect::<Vec<_>>(),
        )
    }

    #[test]
    fn duplicate_variables_get_equality_conditions() {
        let mut rule = Rule::new(vec![atom("p", &["?x", "?x"])], atom("q", &["?x"]));
        assert!(rule.rename_duplicate_variables());
        assert_eq!(
            rule.conditions,
            vec![atom("p", &["?x", "?x@0"]), atom("=", &["?x", "?x@0"])]
        );
    }

    #[test]
    fn free_effect_variables_are_bound_by_object() {
        let mut program = Program::default();
        program.add_fact(atom("p", &["a"]));
        program
            .rules
            .push(Rule::new(vec![atom("p", &["?x"])], atom("q", &["?x", "?y"])));
        program.normalize();
        assert!(program.rules[0].conditions.contains(&atom(OBJECT, &["?y"])));
        assert!(program.facts.contains(&atom(OBJECT, &["a"])));
    }

    #[test]
    fn rules_without_conditions_become_facts() {
        let mut program = Program::default();
        program.rules.push(Rule::new(vec![], atom("q", &["a"])));
        program.normalize();
        assert!(program.rules.is_empty());
        assert_eq!(program.facts, vec![atom("q", &["a"])]);
    }

    #[test]
    fn gripper_program_has_split_rules() {
        let mut task = Task::from_text(GRIPPER_DOMAIN_TEXT, GRIPPER_PROBLEM_TEXT).unwrap();
        normalize(&mut task, &mut NameGenerator::new(NEW_AXIOM_PREFIX)).unwrap();
        let program = Program::from_task(&task);
        assert!(program.facts.contains(&atom("room", &["rooma"])));
        assert!(program.facts.contains(&atom("object", &["rooma"])));
        for rule in &program.rules {
            assert!(rule.kind.is_some());
            assert!(rule.conditions.len() <= 2 || rule.kind == Some(RuleKind::Product));
        }
        assert!(program
            .rules
            .iter()
            .any(|r| r.effect.predicate == ModelPredicate::GoalReachable));
    }
}
