//! # Contact Sanitize
//!
//! Field sanitizers and acceptance rules for untrusted contact-form input.
//!
//! Every value submitted through the public form is attacker-controlled. This
//! crate turns those strings into values that can be embedded in a mail header,
//! a mail body, or an HTML page without changing the structure around them.
//!
//! ## Sanitized string kinds
//!
//! - [`HeaderSafe`]: limited to `[A-Za-z0-9@.+-]`. The only kind accepted in a
//!   header position.
//! - [`BodySafe`]: printable ASCII plus line feed and tab. Accepted in the body.
//!
//! A `HeaderSafe` can be widened into a `BodySafe` with `BodySafe::from`; there
//! is no conversion in the other direction.
//!
//! ## Usage
//!
//! ```rust
//! use contact_sanitize::SanitizedFields;
//!
//! let fields = SanitizedFields::from_raw(
//!     "O'Brien  Jr.",
//!     "user@example.com\r\nBcc: evil@x.com",
//!     "Hi\r\nVisit http://phish.example",
//! );
//! assert!(fields.is_err()); // the smuggled header collapses into an invalid address
//! ```

pub mod error;
pub mod fields;
pub mod limits;
pub mod safe;
pub mod sanitize;
pub mod validate;

pub use error::{Field, ValidationError, ValidationResult};
pub use fields::SanitizedFields;
pub use limits::{MAX_EMAIL_LENGTH, MAX_MESSAGE_CHARS, MAX_NAME_LENGTH, URL_PLACEHOLDER};
pub use safe::{BodySafe, HeaderSafe};
pub use sanitize::{
    clean_body, collapse_to_single_line, escape_html, sanitize_body, sanitize_display_name,
    sanitize_header_token,
};
pub use validate::{is_email_shaped, validate_email, validate_message_length, validate_name};
