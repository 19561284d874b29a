//! Error types for timetable generation.
//!
//! Only [`SchedulingError::InvariantViolation`], [`SchedulingError::InputInconsistency`],
//! [`SchedulingError::InvalidConfig`] and the commit-path variants abort a run. The
//! remaining variants describe why an individual request ended up unplaced and
//! travel inside a successful [`Outcome`](crate::scheduler::Outcome).

use thiserror::Error;

use crate::models::ScopeKey;
use crate::validation::{ValidationError, Violation};

/// Errors raised by the scheduling engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulingError {
    /// No slot/room combination exists for the request.
    #[error("no available slot for request '{request_id}'")]
    NoAvailableSlot { request_id: String },

    /// A conflict involving the request survived the resolver.
    #[error("unresolved {kind} conflict pulled request '{request_id}'")]
    UnresolvedConflict { request_id: String, kind: String },

    /// The request stayed unplaced after every recovery pass.
    #[error("request '{request_id}' still unplaced after {attempts} recovery passes")]
    RetryBudgetExhausted { request_id: String, attempts: u32 },

    /// Final validation rejected the schedule.
    #[error("schedule failed validation with {} violation(s)", violations.len())]
    InvariantViolation { violations: Vec<Violation> },

    /// Scope or resource data is malformed or contradictory.
    #[error("inconsistent input: {} problem(s) found", errors.len())]
    InputInconsistency { errors: Vec<ValidationError> },

    /// Engine configuration is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Another run holds the write lock for this scope.
    #[error("a commit for scope {0} is already in flight")]
    ScopeBusy(ScopeKey),

    /// The collaborator store rejected the commit.
    #[error("store error: {0}")]
    Store(String),
}

impl SchedulingError {
    /// Whether this error aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvariantViolation { .. }
                | Self::InputInconsistency { .. }
                | Self::InvalidConfig(_)
                | Self::ScopeBusy(_)
                | Self::Store(_)
        )
    }

    /// Request the error refers to, if any.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::NoAvailableSlot { request_id }
            | Self::UnresolvedConflict { request_id, .. }
            | Self::RetryBudgetExhausted { request_id, .. } => Some(request_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let soft = SchedulingError::NoAvailableSlot {
            request_id: "R1".into(),
        };
        assert!(!soft.is_fatal());
        assert_eq!(soft.request_id(), Some("R1"));

        let hard = SchedulingError::InvariantViolation {
            violations: Vec::new(),
        };
        assert!(hard.is_fatal());
        assert_eq!(hard.request_id(), None);

        let busy = SchedulingError::ScopeBusy(ScopeKey::new("2024/2025", 1));
        assert!(busy.is_fatal());

        let config = SchedulingError::InvalidConfig("slot_step_min must be positive".into());
        assert!(config.is_fatal());
        assert_eq!(config.request_id(), None);
    }

    #[test]
    fn test_display() {
        let e = SchedulingError::RetryBudgetExhausted {
            request_id: "R9".into(),
            attempts: 3,
        };
        assert_eq!(
            e.to_string(),
            "request 'R9' still unplaced after 3 recovery passes"
        );
    }
}
