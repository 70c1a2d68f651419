//! Contains requirements via the [`Requirements`] and [`Requirement`] types.

use std::ops::Deref;
use strum_macros::{Display, EnumString};

/// The requirement keys the translator understands. Any other key, such as
/// `:durative-actions`, fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Requirement {
    #[strum(serialize = ":strips")]
    Strips,
    #[strum(serialize = ":typing")]
    Typing,
    #[strum(serialize = ":negative-preconditions")]
    NegativePreconditions,
    #[strum(serialize = ":disjunctive-preconditions")]
    DisjunctivePreconditions,
    #[strum(serialize = ":equality")]
    Equality,
    #[strum(serialize = ":existential-preconditions")]
    ExistentialPreconditions,
    #[strum(serialize = ":universal-preconditions")]
    UniversalPreconditions,
    #[strum(serialize = ":quantified-preconditions")]
    QuantifiedPreconditions,
    #[strum(serialize = ":conditional-effects")]
    ConditionalEffects,
    #[strum(serialize = ":adl")]
    Adl,
    #[strum(serialize = ":derived-predicates")]
    DerivedPredicates,
    /// Only `total-cost` increases, see the task builder.
    #[strum(serialize = ":action-costs")]
    ActionCosts,
}

impl Requirement {
    /// Requirements implied by declaring `self`.
    pub fn implied(&self) -> &'static [Requirement] {
        use Requirement::*;
        match self {
            Adl => &[
                Strips,
                Typing,
                NegativePreconditions,
                DisjunctivePreconditions,
                Equality,
                ExistentialPreconditions,
                UniversalPreconditions,
                QuantifiedPreconditions,
                ConditionalEffects,
            ],
            QuantifiedPreconditions => &[ExistentialPreconditions, UniversalPreconditions],
            _ => &[],
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Requirements(Vec<Requirement>);

impl Requirements {
    pub fn new<T: IntoIterator<Item = Requirement>>(requirements: T) -> Self {
        Self(requirements.into_iter().collect())
    }

    /// Whether `requirement` is declared, directly or through an implying
    /// requirement such as `:adl`.
    pub fn supports(&self, requirement: Requirement) -> bool {
        self.0
            .iter()
            .any(|r| *r == requirement || r.implied().contains(&requirement))
    }

    pub fn merged(&self, other: &Requirements) -> Requirements {
        let mut merged = self.0.clone();
        for r in other.iter() {
            if !merged.contains(r) {
                merged.push(*r);
            }
        }
        Requirements(merged)
    }
}

impl Deref for Requirements {
    type Target = [Requirement];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}
