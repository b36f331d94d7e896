//! # Validation Error Types

use std::fmt;

/// Submission field a validation failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Message,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Message => "message",
        };
        f.write_str(name)
    }
}

/// Error types for validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid {field}: {reason}")]
    InvalidFormat { field: Field, reason: String },

    #[error("Input too large: {actual} characters exceeds maximum {max}")]
    TooLarge { actual: usize, max: usize },
}

impl ValidationError {
    pub(crate) fn invalid(field: Field, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;
