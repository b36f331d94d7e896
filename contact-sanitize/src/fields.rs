//! # Sanitized Submission Fields

use crate::error::{Field, ValidationError, ValidationResult};
use crate::safe::{BodySafe, HeaderSafe};
use crate::sanitize::{sanitize_body, sanitize_display_name, sanitize_header_token};
use crate::validate::{validate_email, validate_name};

/// Contact-form fields after sanitization and validation.
///
/// Each field is derived from its raw value alone: every stage consumes the
/// previous stage's output and never looks at the raw input again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedFields {
    name: BodySafe,
    email: HeaderSafe,
    message: BodySafe,
}

impl SanitizedFields {
    /// Sanitize and validate raw field values.
    ///
    /// - name: allow-list, then single-line collapse, then length check
    /// - email: header allow-list, then grammar and length check
    /// - message: body sanitization, then a non-empty check
    pub fn from_raw(name: &str, email: &str, message: &str) -> ValidationResult<Self> {
        let name = sanitize_display_name(name).collapse_to_single_line();
        validate_name(&name)?;

        let email = sanitize_header_token(email);
        validate_email(&email)?;

        let message = sanitize_body(message);
        if message.as_str().trim().is_empty() {
            return Err(ValidationError::InvalidFormat {
                field: Field::Message,
                reason: "message is empty".to_string(),
            });
        }

        Ok(Self {
            name,
            email,
            message,
        })
    }

    pub fn name(&self) -> &BodySafe {
        &self.name
    }

    /// The reply address, restricted to the header allow-list
    pub fn email(&self) -> &HeaderSafe {
        &self.email
    }

    pub fn message(&self) -> &BodySafe {
        &self.message
    }
}
