//! Translation of PDDL tasks into finite-domain (SAS+) tasks.
//!
//! The pipeline normalizes the lifted task, computes its relaxed reachable
//! part with a Datalog program, grounds it, synthesises mutex invariants to
//! group facts into variables, stratifies the axioms, encodes everything as
//! a [`SasTask`] and finally drops the facts the encoding can never reach.
//!
//! ## Example
//!
//! ```no_run
//! use sastranslate::translate::{pddl_to_sas, Task, TranslateOptions, TranslationOutcome};
//!
//! let task = Task::from_path("domain.pddl", "problem.pddl")?;
//! match pddl_to_sas(task, &TranslateOptions::default())? {
//!     TranslationOutcome::Solvable(sas_task) => print!("{}", sas_task.to_sas_string()?),
//!     TranslationOutcome::Unsolvable { reason, .. } => eprintln!("unsolvable: {}", reason),
//!     TranslationOutcome::AxiomsNotSupported => eprintln!("axioms are not supported"),
//! }
//! # Ok::<(), sastranslate::translate::TranslateError>(())
//! ```

mod axiom_rules;
mod datalog;
mod error;
mod fact_groups;
mod instantiate;
mod invariants;
mod normalize;
mod options;
pub mod sas;
mod sas_translation;
mod simplify;
mod statistics;
pub mod task;

pub use axiom_rules::{compute_axiom_layers, handle_axioms, AxiomRules};
pub use error::{Result, TranslateError};
pub use fact_groups::{compute_groups, FactGroups, NONE_OF_THOSE};
pub use instantiate::{explore, Instantiation};
pub use invariants::{find_invariants, get_groups, BalanceChecker, Invariant, InvariantPart};
pub use normalize::{normalize, NEW_AXIOM_PREFIX};
pub use options::TranslateOptions;
pub use sas::SasTask;
pub use sas_translation::{translate_task, unsolvable_sas_task, GroundTask};
pub use simplify::{filter_unreachable_propositions, Impossible};
pub use statistics::log_statistics;
pub use task::{NameGenerator, Task};

use std::time::Instant;
use tracing::info;

/// Result of a translation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Solvable(SasTask),
    /// The task was proven unsolvable. `task` is a trivially unsolvable SAS
    /// task standing in for it.
    Unsolvable { reason: String, task: SasTask },
    /// The task needs axioms, which the options forbid.
    AxiomsNotSupported,
}

impl TranslationOutcome {
    /// The SAS task to write, if there is one.
    pub fn sas_task(&self) -> Option<&SasTask> {
        match self {
            TranslationOutcome::Solvable(task) | TranslationOutcome::Unsolvable { task, .. } => {
                Some(task)
            }
            TranslationOutcome::AxiomsNotSupported => None,
        }
    }

    fn unsolvable(reason: &str) -> Self {
        info!("{}! Generating unsolvable task", reason);
        TranslationOutcome::Unsolvable {
            reason: reason.to_string(),
            task: unsolvable_sas_task(),
        }
    }
}

/// Removes all delete effects.
fn relax(task: &mut Task) {
    for action in &mut task.actions {
        action.effects.retain(|effect| !effect.literal.negated);
    }
}

pub fn pddl_to_sas(mut task: Task, options: &TranslateOptions) -> Result<TranslationOutcome> {
    let start = Instant::now();
    normalize(&mut task, &mut NameGenerator::new(NEW_AXIOM_PREFIX))?;
    if options.relaxed {
        relax(&mut task);
    }
    if options.forbid_axioms && !task.axioms.is_empty() {
        return Ok(TranslationOutcome::AxiomsNotSupported);
    }
    info!(elapsed = start.elapsed().as_secs_f64(), "normalized task");

    let instantiation = explore(&task);
    info!(elapsed = start.elapsed().as_secs_f64(), "instantiated task");
    if !instantiation.relaxed_reachable {
        return Ok(TranslationOutcome::unsolvable("No relaxed solution"));
    }
    let Some(goals) = task.goal.literals() else {
        return Ok(TranslationOutcome::unsolvable("Goal is false"));
    };
    let goals = goals.into_iter().cloned().collect::<Vec<_>>();

    let groups = compute_groups(
        &task,
        &instantiation.fluent_facts,
        &instantiation.reachable_action_parameters,
        options,
    );
    info!(
        elapsed = start.elapsed().as_secs_f64(),
        groups = groups.groups.len(),
        "computed fact groups"
    );

    let ground = GroundTask {
        init: &task.init,
        goals: &goals,
        actions: &instantiation.actions,
        axioms: instantiation.axioms.clone(),
        metric: task.use_min_cost_metric,
    };
    let Some(mut sas_task) = translate_task(ground, &groups, options.partial_encoding)? else {
        return Ok(TranslationOutcome::unsolvable("Goal violates a mutex"));
    };
    info!(elapsed = start.elapsed().as_secs_f64(), "translated task");
    if options.detect_unreachable {
        if filter_unreachable_propositions(&mut sas_task).is_err() {
            return Ok(TranslationOutcome::unsolvable("Simplified to trivially false goal"));
        }
        info!(elapsed = start.elapsed().as_secs_f64(), "detected unreachable propositions");
    }
    log_statistics(&sas_task);
    Ok(TranslationOutcome::Solvable(sas_task))
}
