//! # Message Composition
//!
//! An [`OutboundMessage`] is assembled from operator configuration and
//! [`SanitizedFields`] only. Header values come from configuration plus the
//! header-safe reply address; the display name and free-text message are
//! rendered into a fixed body template and never reach a header.

use crate::config::{ConfigError, OperatorConfig};
use crate::error::{RelayError, RelayResult};
use contact_sanitize::{collapse_to_single_line, BodySafe, Field, SanitizedFields, ValidationError};
use indexmap::IndexMap;
use lettre::Address;
use once_cell::sync::Lazy;
use std::fmt;
use tera::{Context as TeraContext, Tera};

pub const CONTENT_TYPE_TEXT_UTF8: &str = "text/plain; charset=utf-8";

const BODY_TEMPLATE_NAME: &str = "contact_body.txt";
const BODY_TEMPLATE: &str =
    "Submitted Name: {{ name }}\nSubmitted Email: {{ email }}\nMessage:\n{{ message }}";

// `.txt` templates are not autoescaped; the message is already HTML-escaped.
static BODY: Lazy<Tera> = Lazy::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_template(BODY_TEMPLATE_NAME, BODY_TEMPLATE)
        .expect("contact body template should parse");
    tera
});

/// Headers the composer is able to set. `To` is the only recipient header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderName {
    From,
    To,
    ReplyTo,
    Subject,
    ContentType,
}

impl HeaderName {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderName::From => "From",
            HeaderName::To => "To",
            HeaderName::ReplyTo => "Reply-To",
            HeaderName::Subject => "Subject",
            HeaderName::ContentType => "Content-Type",
        }
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A header value that cannot contain a carriage return or line feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderValue(String);

impl HeaderValue {
    fn new(value: impl Into<String>) -> RelayResult<Self> {
        let value = value.into();
        if value.contains(['\r', '\n']) {
            return Err(RelayError::Internal(
                "header value contains a line break".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A message ready for the mail transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    headers: IndexMap<HeaderName, HeaderValue>,
    body: String,
}

impl OutboundMessage {
    /// Headers in the order they are written
    pub fn headers(&self) -> impl Iterator<Item = (HeaderName, &str)> {
        self.headers.iter().map(|(name, value)| (*name, value.as_str()))
    }

    pub fn header(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(&name).map(HeaderValue::as_str)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn sender(&self) -> Option<&str> {
        self.header(HeaderName::From)
    }

    pub fn recipient(&self) -> Option<&str> {
        self.header(HeaderName::To)
    }

    /// RFC 5322-style rendering, used for logs and tests
    pub fn formatted(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.headers {
            out.push_str(name.as_str());
            out.push_str(": ");
            out.push_str(value.as_str());
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out.push_str(&self.body);
        out
    }
}

/// Assemble the outbound message for one submission.
///
/// An unusable `From` or `To` is an operator problem and fails as
/// configuration; a reply address the mail library cannot parse fails as a
/// validation error of the email field.
pub fn compose(config: &OperatorConfig, fields: &SanitizedFields) -> RelayResult<OutboundMessage> {
    let sender = config
        .smtp
        .sender
        .as_deref()
        .ok_or(ConfigError::MissingSmtpSetting("SMTP_FROM"))?;
    let recipient = config
        .smtp
        .recipient()
        .ok_or(ConfigError::MissingSmtpSetting("SMTP_FROM"))?;

    let sender = operator_address("SMTP_FROM", sender)?;
    let recipient = operator_address("SMTP_TO", recipient)?;

    let reply_to = fields.email().as_str().parse::<Address>().map_err(|e| {
        ValidationError::InvalidFormat {
            field: Field::Email,
            reason: format!("unusable reply address: {e}"),
        }
    })?;

    let mut headers = IndexMap::new();
    headers.insert(HeaderName::From, HeaderValue::new(sender.to_string())?);
    headers.insert(HeaderName::To, HeaderValue::new(recipient.to_string())?);
    headers.insert(HeaderName::ReplyTo, HeaderValue::new(reply_to.to_string())?);
    headers.insert(
        HeaderName::Subject,
        HeaderValue::new(collapse_to_single_line(&config.subject))?,
    );
    headers.insert(
        HeaderName::ContentType,
        HeaderValue::new(CONTENT_TYPE_TEXT_UTF8)?,
    );

    Ok(OutboundMessage {
        headers,
        body: render_body(fields)?,
    })
}

fn operator_address(setting: &'static str, value: &str) -> RelayResult<Address> {
    value.parse().map_err(|e: lettre::address::AddressError| {
        RelayError::Configuration(ConfigError::InvalidAddress {
            setting,
            reason: e.to_string(),
        })
    })
}

fn render_body(fields: &SanitizedFields) -> RelayResult<String> {
    let mut context = TeraContext::new();
    context.insert("name", fields.name().as_str());
    context.insert("email", BodySafe::from(fields.email().clone()).as_str());
    context.insert("message", fields.message().as_str());

    BODY.render(BODY_TEMPLATE_NAME, &context)
        .map_err(|e| RelayError::Internal(format!("failed to render message body: {e}")))
}
