//! # Sanitized String Kinds
//!
//! Values that left a sanitizer carry the context they were sanitized for in
//! their type. Constructors are crate-private; the public sanitizers in
//! [`crate::sanitize`] are the only way to obtain one.

use std::fmt;

/// A value restricted to `[A-Za-z0-9@.+-]`, safe for a header position.
///
/// Carriage return, line feed, colon, and whitespace are all outside the
/// allow-list, so a `HeaderSafe` can never terminate the header it is placed
/// in or start a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeaderSafe(String);

impl HeaderSafe {
    pub(crate) fn new(value: String) -> Self {
        debug_assert!(value.bytes().all(is_header_byte));
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters (the allow-list is ASCII, so also bytes)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for HeaderSafe {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeaderSafe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text restricted to printable ASCII, line feed, and tab.
///
/// May span multiple lines but never contains a carriage return. Use
/// [`BodySafe::collapse_to_single_line`] where a single line is required.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BodySafe(String);

impl BodySafe {
    pub(crate) fn new(value: String) -> Self {
        debug_assert!(value.bytes().all(is_body_byte));
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters (the allow-list is ASCII, so also bytes)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_single_line(&self) -> bool {
        !self.0.contains('\n')
    }

    /// Fold line feeds and tabs into single spaces.
    pub fn collapse_to_single_line(self) -> Self {
        Self::new(crate::sanitize::collapse_to_single_line(&self.0))
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Every header-safe character is also body-safe.
impl From<HeaderSafe> for BodySafe {
    fn from(value: HeaderSafe) -> Self {
        BodySafe::new(value.0)
    }
}

impl AsRef<str> for BodySafe {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BodySafe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_header_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'@' | b'.' | b'+' | b'-')
}

fn is_body_byte(b: u8) -> bool {
    matches!(b, 0x20..=0x7E | b'\n' | b'\t')
}
