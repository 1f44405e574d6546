//! Error handling follows the teacher crate's convention: `eyre::Result` for
//! anything that can fail during construction or single-shot computation.
//! Per-connection routing failures are not propagated as `Err` — the
//! pipeline records them and continues (spec.md section 7) — so
//! `FailureKind` exists to classify those recorded failures, not to be
//! thrown.

use std::fmt;

pub use eyre::{eyre, Result, WrapErr};

use crate::name::Id;

/// Classifies a non-fatal failure recorded against a connection or stage,
/// mirroring spec.md section 7's error taxonomy. Only `InvalidInput` and
/// `InvariantViolation` are fatal; the others are recorded and the pipeline
/// proceeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Degenerate board, unreachable endpoint, fully-occluded target. Fatal.
    InvalidInput(String),
    /// A stage could not place all required crossings for a connection.
    CapacityExhaustion { connection: Id, detail: String },
    /// A soft per-path or per-section iteration budget ran out.
    IterationBudgetExceeded { connection: Id, stage: &'static str },
    /// A structural invariant broke (node cycle, via outside bounds). Fatal.
    InvariantViolation(String),
}

impl FailureKind {
    pub fn is_fatal(&self) -> bool {
        matches!(self, FailureKind::InvalidInput(_) | FailureKind::InvariantViolation(_))
    }

    pub fn connection(&self) -> Option<&Id> {
        match self {
            FailureKind::CapacityExhaustion { connection, .. }
            | FailureKind::IterationBudgetExceeded { connection, .. } => Some(connection),
            _ => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            FailureKind::CapacityExhaustion { connection, detail } => {
                write!(f, "capacity exhausted routing {connection}: {detail}")
            }
            FailureKind::IterationBudgetExceeded { connection, stage } => {
                write!(f, "iteration budget exceeded in {stage} routing {connection}")
            }
            FailureKind::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
        }
    }
}

impl std::error::Error for FailureKind {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(FailureKind::InvalidInput("no outline".into()).is_fatal());
        assert!(FailureKind::InvariantViolation("cycle".into()).is_fatal());
        assert!(!FailureKind::CapacityExhaustion { connection: Id::from("n1"), detail: "x".into() }
            .is_fatal());
    }

    #[test]
    fn connection_extraction() {
        let f = FailureKind::IterationBudgetExceeded { connection: Id::from("n1"), stage: "unravel" };
        assert_eq!(f.connection(), Some(&Id::from("n1")));
        assert_eq!(FailureKind::InvalidInput("x".into()).connection(), None);
    }
}
