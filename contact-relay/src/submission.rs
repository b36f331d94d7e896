//! # Inbound Submissions
//!
//! The two request encodings accepted on `/email` are two variants of one
//! decoder, chosen once from the `Content-Type` header. Both produce the same
//! [`InboundSubmission`].

use axum::http::HeaderValue;
use serde::Deserialize;

/// A contact-form submission exactly as received. Every field is untrusted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InboundSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "g-recaptcha-response", default)]
    pub captcha_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("form body is not valid UTF-8")]
    FormEncoding,

    #[error("unreadable request body: {0}")]
    Body(String),
}

/// Request body encoding, which also decides the response style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionDecoder {
    /// `application/json`; answered with status codes
    Json,
    /// Anything else is treated as a form post; answered with redirects
    Form,
}

impl SubmissionDecoder {
    pub fn for_content_type(content_type: Option<&HeaderValue>) -> Self {
        let is_json = content_type
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false);

        if is_json {
            SubmissionDecoder::Json
        } else {
            SubmissionDecoder::Form
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionDecoder::Json => "json",
            SubmissionDecoder::Form => "form",
        }
    }

    pub fn decode(&self, body: &[u8]) -> Result<InboundSubmission, DecodeError> {
        match self {
            SubmissionDecoder::Json => Ok(serde_json::from_slice(body)?),
            SubmissionDecoder::Form => decode_form(body),
        }
    }
}

/// Decode `application/x-www-form-urlencoded`. The first occurrence of a
/// field wins; the token is read from `recaptcha_response`, falling back to
/// the widget's own `g-recaptcha-response`.
fn decode_form(body: &[u8]) -> Result<InboundSubmission, DecodeError> {
    std::str::from_utf8(body).map_err(|_| DecodeError::FormEncoding)?;

    let mut submission = InboundSubmission::default();
    let mut widget_token = None;
    let mut seen = [false; 4];

    for (key, value) in url::form_urlencoded::parse(body) {
        let (slot, index) = match key.as_ref() {
            "name" => (&mut submission.name, 0),
            "email" => (&mut submission.email, 1),
            "message" => (&mut submission.message, 2),
            "recaptcha_response" => (&mut submission.captcha_token, 3),
            "g-recaptcha-response" => {
                widget_token.get_or_insert_with(|| value.into_owned());
                continue;
            }
            _ => continue,
        };
        if !seen[index] {
            *slot = value.into_owned();
            seen[index] = true;
        }
    }

    if !seen[3] {
        if let Some(token) = widget_token {
            submission.captcha_token = token;
        }
    }

    Ok(submission)
}
