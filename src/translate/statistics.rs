use crate::translate::sas::SasTask;
use memory_stats::memory_stats;
use tracing::info;

/// Logs the size of the translated task and the peak memory seen so far.
pub fn log_statistics(task: &SasTask) {
    let derived_variables = task
        .variables
        .axiom_layers
        .iter()
        .filter(|layer| **layer >= 0)
        .count();
    info!(
        variables = task.variables.len(),
        derived_variables,
        facts = task.variables.ranges.iter().sum::<usize>(),
        mutex_groups = task.mutexes.len(),
        total_mutex_groups_size = task
            .mutexes
            .iter()
            .map(|mutex| mutex.encoding_size())
            .sum::<usize>(),
        operators = task.operators.len(),
        axioms = task.axioms.len(),
        task_size = task.encoding_size(),
        "translator statistics"
    );
    let memory_usage = memory_stats().map(|usage| usage.physical_mem / 1024 / 1024);
    info!(memory_usage_mb = memory_usage);
}
