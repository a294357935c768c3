//! Domain error types.

use thiserror::Error;

/// Top-level error type for publish, replay, and dispatch.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Invalid command or entity reference (caller bug).
    #[error("validation error: {0}")]
    Validation(String),

    /// An aggregate snapshot or view model was expected but is missing.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind of snapshot that was looked up.
        kind: &'static str,
        /// Entity identifier that was looked up.
        id: i64,
    },

    /// A business invariant rejected the command.
    #[error("rule violation: {0}")]
    RuleViolation(String),

    /// Append, load, or persist failed in a store adapter.
    #[error("store error: {0}")]
    Store(String),

    /// More than one subscriber failed during a single fan-out.
    #[error("{} subscribers failed: {}", .0.len(), summarize(.0))]
    Dispatch(Vec<DomainError>),
}

impl DomainError {
    /// Folds the failures collected from a fan-out into one error.
    ///
    /// Returns `None` when nothing failed and the single failure unchanged
    /// when exactly one subscriber failed.
    #[must_use]
    pub fn from_failures(mut failures: Vec<DomainError>) -> Option<Self> {
        match failures.len() {
            0 => None,
            1 => failures.pop(),
            _ => Some(Self::Dispatch(failures)),
        }
    }

    /// Whether this error (or any error it aggregates) is a rule violation.
    #[must_use]
    pub fn is_rule_violation(&self) -> bool {
        match self {
            Self::RuleViolation(_) => true,
            Self::Dispatch(failures) => failures.iter().any(Self::is_rule_violation),
            _ => false,
        }
    }
}

fn summarize(failures: &[DomainError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
