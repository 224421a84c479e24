//! # AppError
//!
//! Centralized error handling for the message board.
//! Maps domain-specific failures to actionable error types.

use std::fmt;

use thiserror::Error;

/// Which entity a lookup missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Board,
    Thread,
    Reply,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Board => "board",
            Resource::Thread => "thread",
            Resource::Reply => "reply",
        };
        f.write_str(name)
    }
}

/// The primary error type for all mb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (board, thread, or reply)
    #[error("{0} not found")]
    NotFound(Resource),

    /// Validation failure (e.g., a required field is absent)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The supplied delete password does not match
    #[error("incorrect password")]
    IncorrectPassword,

    /// Infrastructure failure (e.g., DB down, hashing backend error)
    #[error("internal service error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// A specialized Result type for message board logic.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_missing_resource() {
        assert_eq!(AppError::NotFound(Resource::Reply).to_string(), "reply not found");
        assert_eq!(AppError::IncorrectPassword.to_string(), "incorrect password");
    }

    #[test]
    fn anyhow_errors_become_internal() {
        let err: AppError = anyhow::anyhow!("disk full").into();
        assert!(matches!(err, AppError::Internal(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
