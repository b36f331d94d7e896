//! # Size Limits
//!
//! Length limits applied to contact-form fields. All limits count characters,
//! not bytes.

/// Maximum display name length after sanitization
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum reply address length after sanitization (RFC 5321 path limit)
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum raw message length, checked before any other work
pub const MAX_MESSAGE_CHARS: usize = 10_000;

/// Replacement text for every URL found in a message body
pub const URL_PLACEHOLDER: &str = "[URL Removed]";
