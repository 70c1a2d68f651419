pub const GRIPPER_DOMAIN_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/gripper/domain.pddl"
));

pub const GRIPPER_PROBLEM_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/gripper/problem.pddl"
));

pub const AT_DOMAIN_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/object-at/domain.pddl"
));

pub const AT_PROBLEM_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/object-at/problem.pddl"
));

pub const UNREACHABLE_DOMAIN_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/unreachable/domain.pddl"
));

pub const UNREACHABLE_PROBLEM_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/unreachable/problem.pddl"
));

pub const NEGATIVE_AXIOM_CYCLE_DOMAIN_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/negative-axiom-cycle/domain.pddl"
));

pub const NEGATIVE_AXIOM_CYCLE_PROBLEM_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/negative-axiom-cycle/problem.pddl"
));

pub const CANDIDATE_CAP_DOMAIN_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/candidate-cap/domain.pddl"
));

pub const CANDIDATE_CAP_PROBLEM_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/candidate-cap/problem.pddl"
));

pub const ADL_DOMAIN_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/briefcase-adl/domain.pddl"
));

pub const ADL_PROBLEM_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/briefcase-adl/problem.pddl"
));

pub const ACTION_COST_DOMAIN_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/action-cost/domain.pddl"
));

pub const ACTION_COST_PROBLEM_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/action-cost/problem.pddl"
));

pub const MUTEX_UNREACHABLE_DOMAIN_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/mutex-unreachable/domain.pddl"
));

pub const MUTEX_UNREACHABLE_PROBLEM_TEXT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/benchmarks/mutex-unreachable/problem.pddl"
));
