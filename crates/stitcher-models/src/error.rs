//! Validation error types.

use thiserror::Error;

/// Result type for job validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Reasons a job payload is rejected before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Credential field {0} holds a reserved test value")]
    ReservedCredential(&'static str),

    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    #[error("Malformed job input: {0}")]
    Malformed(String),
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
