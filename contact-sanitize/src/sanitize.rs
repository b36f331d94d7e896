//! # Field Sanitizers
//!
//! Total, stateless transforms from untrusted strings to sanitized values.
//! Each sanitizer removes everything outside a small allow-list chosen for the
//! place the value ends up in; none of them can fail.
//!
//! Patterns are compiled once on first use and shared by every caller.

use crate::limits::URL_PLACEHOLDER;
use crate::safe::{BodySafe, HeaderSafe};
use once_cell::sync::Lazy;
use regex::Regex;

/// Anything that is not a letter, space, hyphen, or apostrophe
static DISPLAY_NAME_DISALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-zA-Z '\-]").expect("Display name regex should compile - static pattern")
});

/// Anything outside the header allow-list
static HEADER_TOKEN_DISALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-zA-Z0-9@.+\-]").expect("Header token regex should compile - static pattern")
});

/// Bytes outside printable ASCII, except line feed and tab
static BODY_NON_PRINTABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\x20-\x7E\n\t]").expect("Body filter regex should compile - static pattern")
});

static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://\S+").expect("URL regex should compile - static pattern")
});

/// C0 controls, DEL, NEL, and the Unicode line/paragraph separators
static LINE_BREAKING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00-\x1F\x7F\x{0085}\x{2028}\x{2029}]")
        .expect("Line break regex should compile - static pattern")
});

static SPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" {2,}").expect("Space run regex should compile - static pattern"));

/// Sanitize a submitter's display name.
///
/// Keeps ASCII letters, space, hyphen, and apostrophe, collapses runs of
/// spaces, and trims. The result is already a single line.
pub fn sanitize_display_name(input: &str) -> BodySafe {
    let kept = DISPLAY_NAME_DISALLOWED.replace_all(input, "");
    let collapsed = SPACE_RUN.replace_all(&kept, " ");
    BodySafe::new(collapsed.trim_matches(' ').to_string())
}

/// Sanitize a value destined for a header, such as the reply address.
///
/// Keeps ASCII letters, digits, and `@ . + -`. CR and LF are outside that set,
/// so no input can smuggle an extra header through the result.
pub fn sanitize_header_token(input: &str) -> HeaderSafe {
    HeaderSafe::new(HEADER_TOKEN_DISALLOWED.replace_all(input, "").into_owned())
}

/// Sanitize free-text message content for a mail body.
///
/// Runs [`clean_body`] and then HTML-escapes the result. The escaping stage is
/// not idempotent: `&` becomes `&amp;` and then `&amp;amp;`.
pub fn sanitize_body(input: &str) -> BodySafe {
    BodySafe::new(escape_html(&clean_body(input)))
}

/// The stripping stages of [`sanitize_body`], without the escape.
///
/// 1. `\r\n` and lone `\r` become `\n`.
/// 2. Everything outside printable ASCII, `\n`, and `\t` is removed.
/// 3. Every `http://` or `https://` run up to the next whitespace becomes
///    [`URL_PLACEHOLDER`].
///
/// Control bytes are removed before URL detection so they cannot split a
/// scheme (`ht\u{1}tp://`) past the URL filter. This function is idempotent.
pub fn clean_body(input: &str) -> String {
    let normalized = input.replace("\r\n", "\n").replace('\r', "\n");
    let printable = BODY_NON_PRINTABLE.replace_all(&normalized, "");
    URL.replace_all(&printable, URL_PLACEHOLDER).into_owned()
}

/// Replace every control character and Unicode line separator with a space,
/// collapse runs of spaces, and trim.
pub fn collapse_to_single_line(input: &str) -> String {
    let spaced = LINE_BREAKING.replace_all(input, " ");
    let collapsed = SPACE_RUN.replace_all(&spaced, " ");
    collapsed.trim().to_string()
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&#39;"),
            '"' => escaped.push_str("&#34;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
