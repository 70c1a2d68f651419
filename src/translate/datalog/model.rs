//! Bottom-up evaluation of a split [`Program`].

use crate::parsed_types::Name;
use crate::translate::datalog::{DatalogAtom, ModelPredicate, Program, Rule, RuleKind};
use itertools::Itertools;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// A rule argument after numbering the rule's variables in order of first
/// occurrence, starting with the effect.
/// Join keys rarely have more than a few shared variables.
type JoinKey = SmallVec<[Name; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arg {
    Var(usize),
    Const(Name),
}

#[derive(Debug)]
struct RulePattern {
    effect: ModelPredicate,
    effect_args: Vec<Arg>,
    conditions: Vec<Vec<Arg>>,
    num_variables: usize,
}

impl RulePattern {
    fn new(rule: &Rule) -> Self {
        let mut numbers: HashMap<Name, usize> = HashMap::new();
        let mut number = |name: &Name| {
            if name.is_variable() {
                let next = numbers.len();
                Arg::Var(*numbers.entry(*name).or_insert(next))
            } else {
                Arg::Const(*name)
            }
        };
        let effect_args = rule.effect.args.iter().map(&mut number).collect_vec();
        let conditions = rule
            .conditions
            .iter()
            .map(|c| c.args.iter().map(&mut number).collect_vec())
            .collect_vec();
        Self {
            effect: rule.effect.predicate,
            effect_args,
            conditions,
            num_variables: numbers.len(),
        }
    }

    fn variables(&self, condition: usize) -> HashSet<usize> {
        self.conditions[condition]
            .iter()
            .filter_map(|arg| match arg {
                Arg::Var(v) => Some(*v),
                Arg::Const(_) => None,
            })
            .collect()
    }

    fn bind(&self, args: &[Name], condition: usize, binding: &mut [Option<Name>]) {
        for (arg, object) in self.conditions[condition].iter().zip(args) {
            if let Arg::Var(v) = arg {
                binding[*v] = Some(*object);
            }
        }
    }

    fn push_effect(&self, binding: &[Option<Name>], queue: &mut Queue) {
        let args = self
            .effect_args
            .iter()
            .map(|arg| match arg {
                Arg::Var(v) => binding[*v].unwrap_or_else(|| panic!("Unbound effect variable")),
                Arg::Const(name) => *name,
            })
            .collect();
        queue.push(self.effect, args);
    }
}

#[derive(Debug)]
enum RuleIndex {
    Project,
    Join {
        /// Positions of the shared variables in each condition.
        key_positions: [Vec<usize>; 2],
        atoms_by_key: [HashMap<JoinKey, Vec<Vec<Name>>>; 2],
    },
    Product {
        atoms_by_condition: Vec<Vec<Vec<Name>>>,
        empty_conditions: usize,
    },
}

#[derive(Debug)]
struct BuildRule {
    pattern: RulePattern,
    index: RuleIndex,
}

impl BuildRule {
    fn new(rule: &Rule) -> Self {
        let pattern = RulePattern::new(rule);
        let num_conditions = pattern.conditions.len();
        let index = match rule.kind {
            Some(RuleKind::Project) => {
                assert_eq!(num_conditions, 1, "Invalid projection rule {}", rule);
                RuleIndex::Project
            }
            Some(RuleKind::Join) => {
                assert_eq!(num_conditions, 2, "Invalid join rule {}", rule);
                let common = pattern
                    .variables(0)
                    .intersection(&pattern.variables(1))
                    .copied()
                    .sorted()
                    .collect_vec();
                let positions = |condition: usize| {
                    common
                        .iter()
                        .filter_map(|v| {
                            pattern.conditions[condition]
                                .iter()
                                .position(|arg| *arg == Arg::Var(*v))
                        })
                        .collect_vec()
                };
                RuleIndex::Join {
                    key_positions: [positions(0), positions(1)],
                    atoms_by_key: [HashMap::new(), HashMap::new()],
                }
            }
            Some(RuleKind::Product) => {
                assert!(num_conditions >= 2, "Invalid product rule {}", rule);
                RuleIndex::Product {
                    atoms_by_condition: vec![vec![]; num_conditions],
                    empty_conditions: num_conditions,
                }
            }
            None => panic!("Rule has not been split: {}", rule),
        };
        Self { pattern, index }
    }

    /// Records a new atom matching `condition` and pushes every effect it
    /// enables.
    fn fire(&mut self, args: &[Name], condition: usize, queue: &mut Queue) {
        let pattern = &self.pattern;
        let mut binding = vec![None; pattern.num_variables];
        pattern.bind(args, condition, &mut binding);
        match &mut self.index {
            RuleIndex::Project => pattern.push_effect(&binding, queue),
            RuleIndex::Join {
                key_positions,
                atoms_by_key,
            } => {
                let key = key_positions[condition]
                    .iter()
                    .map(|p| args[*p])
                    .collect::<JoinKey>();
                let other = 1 - condition;
                if let Some(partners) = atoms_by_key[other].get(&key) {
                    for partner in partners {
                        pattern.bind(partner, other, &mut binding);
                        pattern.push_effect(&binding, queue);
                    }
                }
                atoms_by_key[condition]
                    .entry(key)
                    .or_default()
                    .push(args.to_vec());
            }
            RuleIndex::Product {
                atoms_by_condition,
                empty_conditions,
            } => {
                if atoms_by_condition[condition].is_empty() {
                    *empty_conditions -= 1;
                }
                atoms_by_condition[condition].push(args.to_vec());
                if *empty_conditions > 0 {
                    return;
                }
                let factors = atoms_by_condition
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != condition)
                    .map(|(i, atoms)| atoms.iter().map(move |atom| (i, atom)).collect_vec());
                for combination in factors.multi_cartesian_product() {
                    for (i, atom) in combination {
                        pattern.bind(atom, i, &mut binding);
                    }
                    pattern.push_effect(&binding, queue);
                }
            }
        }
    }
}

/// Finds the rule conditions an atom can match: by predicate, and by the
/// first constant argument of the condition if it has one.
#[derive(Debug, Default)]
struct Unifier {
    by_predicate: HashMap<ModelPredicate, PredicateMatches>,
}

#[derive(Debug, Default)]
struct PredicateMatches {
    without_constants: Vec<(usize, usize)>,
    by_first_constant: HashMap<(usize, Name), Vec<(usize, usize, Vec<(usize, Name)>)>>,
}

impl Unifier {
    fn new(program: &Program) -> Self {
        let mut unifier = Self::default();
        for (rule_index, rule) in program.rules.iter().enumerate() {
            for (condition_index, condition) in rule.conditions.iter().enumerate() {
                let constants = condition
                    .args
                    .iter()
                    .enumerate()
                    .filter(|(_, arg)| !arg.is_variable())
                    .map(|(position, arg)| (position, *arg))
                    .collect::<Vec<_>>();
                let matches = unifier.by_predicate.entry(condition.predicate).or_default();
                match constants.split_first() {
                    None => matches.without_constants.push((rule_index, condition_index)),
                    Some((first, rest)) => matches
                        .by_first_constant
                        .entry(*first)
                        .or_default()
                        .push((rule_index, condition_index, rest.to_vec())),
                }
            }
        }
        unifier
    }

    fn unify(&self, atom: &DatalogAtom, result: &mut Vec<(usize, usize)>) {
        result.clear();
        let Some(matches) = self.by_predicate.get(&atom.predicate) else {
            return;
        };
        result.extend_from_slice(&matches.without_constants);
        if matches.by_first_constant.is_empty() {
            return;
        }
        for (position, arg) in atom.args.iter().enumerate() {
            if let Some(candidates) = matches.by_first_constant.get(&(position, *arg)) {
                result.extend(
                    candidates
                        .iter()
                        .filter(|(_, _, rest)| rest.iter().all(|(p, c)| atom.args[*p] == *c))
                        .map(|(rule, condition, _)| (*rule, *condition)),
                );
            }
        }
    }
}

struct Queue {
    atoms: Vec<DatalogAtom>,
    position: usize,
    enqueued: HashSet<DatalogAtom>,
    num_pushes: usize,
}

impl Queue {
    fn new(facts: Vec<DatalogAtom>) -> Self {
        let num_pushes = facts.len();
        let mut queue = Self {
            atoms: vec![],
            position: 0,
            enqueued: HashSet::new(),
            num_pushes: 0,
        };
        for fact in facts {
            queue.push(fact.predicate, fact.args);
        }
        queue.num_pushes = num_pushes;
        queue
    }

    fn push(&mut self, predicate: ModelPredicate, args: Vec<Name>) {
        self.num_pushes += 1;
        let atom = DatalogAtom::new(predicate, args);
        if !self.enqueued.contains(&atom) {
            self.enqueued.insert(atom.clone());
            self.atoms.push(atom);
        }
    }

    fn pop(&mut self) -> Option<DatalogAtom> {
        let atom = self.atoms.get(self.position).cloned();
        if atom.is_some() {
            self.position += 1;
        }
        atom
    }
}

/// Computes the least model of `program`: every atom derivable from its
/// facts, in the order in which they were first derived.
pub fn compute_model(program: &Program) -> Vec<DatalogAtom> {
    let mut rules = program.rules.iter().map(BuildRule::new).collect::<Vec<_>>();
    let unifier = Unifier::new(program);
    let mut facts = program.facts.clone();
    facts.sort();
    let mut queue = Queue::new(facts);
    info!(rules = rules.len(), "computing model");

    let mut relevant_atoms = 0;
    let mut auxiliary_atoms = 0;
    let mut matches = vec![];
    while let Some(atom) = queue.pop() {
        if atom.predicate.is_auxiliary() {
            auxiliary_atoms += 1;
        } else {
            relevant_atoms += 1;
        }
        unifier.unify(&atom, &mut matches);
        for &(rule, condition) in &matches {
            rules[rule].fire(&atom.args, condition, &mut queue);
        }
    }
    info!(
        relevant_atoms,
        auxiliary_atoms,
        final_queue_length = queue.atoms.len(),
        total_queue_pushes = queue.num_pushes,
        "computed model"
    );
    queue.atoms
}
