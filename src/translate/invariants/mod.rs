//! Synthesis of mutex invariants over the fluent predicates of a task.

mod constraints;
mod invariant;
mod invariant_finder;

pub use constraints::{ConstraintSystem, EqualityConjunction, InequalityDisjunction};
pub use invariant::{Invariant, InvariantPart, COUNTED_ARGUMENT};
pub use invariant_finder::{find_invariants, get_groups, useful_groups, BalanceChecker};
