//! # Acceptance Rules
//!
//! Pure predicates over sanitized values. Each returns `Ok(())` or the
//! [`ValidationError`] describing why the value is refused.

use crate::error::{Field, ValidationError, ValidationResult};
use crate::limits::{MAX_EMAIL_LENGTH, MAX_MESSAGE_CHARS, MAX_NAME_LENGTH};
use crate::safe::{BodySafe, HeaderSafe};
use once_cell::sync::Lazy;
use regex::Regex;

/// `local-part@domain.tld` with a final label of at least two letters
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$")
        .expect("Email regex should compile - static pattern")
});

/// Validate a sanitized display name: non-empty and at most
/// [`MAX_NAME_LENGTH`] characters.
pub fn validate_name(name: &BodySafe) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(ValidationError::invalid(Field::Name, "name is empty"));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::invalid(
            Field::Name,
            format!("name exceeds {MAX_NAME_LENGTH} characters"),
        ));
    }

    if !name.is_single_line() {
        return Err(ValidationError::invalid(Field::Name, "name spans lines"));
    }

    Ok(())
}

/// Validate a sanitized reply address.
pub fn validate_email(email: &HeaderSafe) -> ValidationResult<()> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::invalid(
            Field::Email,
            format!("address exceeds {MAX_EMAIL_LENGTH} characters"),
        ));
    }

    if !is_email_shaped(email.as_str()) {
        return Err(ValidationError::invalid(
            Field::Email,
            "address is not of the form local@domain.tld",
        ));
    }

    Ok(())
}

/// Check the email grammar on an arbitrary string.
///
/// Anchored over the whole input, so any CR or LF makes it fail.
pub fn is_email_shaped(candidate: &str) -> bool {
    candidate.chars().count() <= MAX_EMAIL_LENGTH && EMAIL_REGEX.is_match(candidate)
}

/// Admission check on the raw, unsanitized message.
pub fn validate_message_length(raw: &str) -> ValidationResult<()> {
    // Bounded count: stop as soon as the limit is exceeded.
    let actual = raw.chars().take(MAX_MESSAGE_CHARS + 1).count();
    if actual > MAX_MESSAGE_CHARS {
        return Err(ValidationError::TooLarge {
            actual: raw.chars().count(),
            max: MAX_MESSAGE_CHARS,
        });
    }

    Ok(())
}
