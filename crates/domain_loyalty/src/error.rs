//! Loyalty domain errors
//!
//! Business-rule failures are not errors of the policies themselves: the
//! policies return [`crate::ValidationResult`] values and the service wraps
//! them into [`LoyaltyError::ValidationFailed`] only at its boundary.

use thiserror::Error;

use core_kernel::{PortError, ProgramId};

use crate::violation::Violation;

/// Errors surfaced by the loyalty program service
#[derive(Debug, Error)]
pub enum LoyaltyError {
    /// One or more business invariants are violated; carries every violation in order
    #[error("Program definition failed validation with {} violation(s)", .0.len())]
    ValidationFailed(Vec<Violation>),

    /// A read or write against the store failed; the transaction was rolled back
    #[error("Persistence failed during {operation}")]
    PersistenceFailed {
        operation: &'static str,
        #[source]
        source: PortError,
    },

    /// No program header exists for the id
    #[error("Loyalty program not found: {0}")]
    NotFound(ProgramId),

    /// A stored or submitted code does not belong to its closed set
    #[error("Unknown {kind} code: {value}")]
    UnknownCode {
        kind: &'static str,
        value: String,
    },
}

impl LoyaltyError {
    /// Creates a persistence failure for the named operation
    pub fn persistence(operation: &'static str, source: PortError) -> Self {
        LoyaltyError::PersistenceFailed { operation, source }
    }

    /// Returns the violations when this is a validation failure
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            LoyaltyError::ValidationFailed(violations) => Some(violations),
            _ => None,
        }
    }

    /// Checks if this error is a persistence failure
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, LoyaltyError::PersistenceFailed { .. })
    }

    /// Checks if this error indicates the program was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoyaltyError::NotFound(_))
    }
}
