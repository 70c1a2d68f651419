use crate::parsed_types::{Name, Requirement};
use std::path::PathBuf;
use thiserror::Error;

/// User-visible failures of the translator. Internal inconsistencies are
/// not represented here; they panic.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("failed to parse {what}: {message}")]
    Parse { what: &'static str, message: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("problem is for domain {problem:?}, but the domain file defines {domain:?}")]
    DomainMismatch { domain: Name, problem: Name },
    #[error("undefined type {0:?}")]
    UndefinedType(Name),
    #[error("undefined predicate {0:?}")]
    UndefinedPredicate(Name),
    #[error("undefined object {0:?}")]
    UndefinedObject(Name),
    #[error("variable {variable:?} is not bound in {context}")]
    UnboundVariable { variable: Name, context: String },
    #[error("{predicate:?} expects {expected} arguments, but {found} were given")]
    ArityMismatch {
        predicate: Name,
        expected: usize,
        found: usize,
    },
    #[error("duplicate {kind} {name:?}")]
    Duplicate { kind: &'static str, name: Name },
    #[error("derived predicate {predicate:?} appears in {location}")]
    DerivedPredicateMisuse { predicate: Name, location: String },
    #[error("{construct} used without declaring the {requirement} requirement")]
    MissingRequirement {
        requirement: Requirement,
        construct: &'static str,
    },
    #[error("unsupported {0}")]
    Unsupported(String),
    #[error("invalid options file {path}: {source}")]
    Options {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("malformed SAS file at line {line}: {message}")]
    SasFormat { line: usize, message: String },
    #[error("failed to write output: {0}")]
    Output(#[from] std::fmt::Error),
}

pub type Result<T, E = TranslateError> = std::result::Result<T, E>;
