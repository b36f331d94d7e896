//! # Mail Transport
//!
//! Delivery of a composed [`OutboundMessage`]. The SMTP implementation is
//! built on `lettre`; tests substitute their own [`MailTransport`].

use crate::compose::{HeaderName, OutboundMessage};
use crate::config::{ConfigError, SmtpSettings, SmtpTls};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("invalid {header} address: {reason}")]
    Address {
        header: &'static str,
        reason: String,
    },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),
}

/// Sends a composed message to its single recipient
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError>;
}

/// Authenticated SMTP delivery
pub struct SmtpMailer {
    transport: Result<AsyncSmtpTransport<Tokio1Executor>, ConfigError>,
}

impl SmtpMailer {
    /// Prepare the SMTP client. Missing settings do not fail here; every send
    /// reports them instead.
    pub fn new(settings: &SmtpSettings) -> Self {
        Self {
            transport: build_transport(settings),
        }
    }
}

fn build_transport(
    settings: &SmtpSettings,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, ConfigError> {
    let endpoint = settings.endpoint()?;
    let invalid_host = |e: lettre::transport::smtp::Error| {
        ConfigError::InvalidSmtpHost(format!("{}: {e}", endpoint.host))
    };

    let builder = match endpoint.tls {
        SmtpTls::StartTls => {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&endpoint.host)
                .map_err(invalid_host)?
        }
        SmtpTls::Implicit => {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&endpoint.host).map_err(invalid_host)?
        }
        SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&endpoint.host),
    };

    debug!(
        host = %endpoint.host,
        port = endpoint.port,
        tls = ?endpoint.tls,
        "Configured SMTP transport"
    );

    Ok(builder
        .port(endpoint.port)
        .credentials(Credentials::new(
            endpoint.username.clone(),
            endpoint.password.expose().to_string(),
        ))
        .timeout(Some(settings.timeout))
        .build())
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let transport = self.transport.as_ref().map_err(|e| e.clone())?;
        let email = to_lettre_message(message)?;

        let response = transport
            .send(email)
            .await
            .map_err(|e| TransportError::Smtp(e.to_string()))?;

        info!(code = %response.code(), "Message accepted by SMTP server");
        Ok(())
    }
}

fn mailbox(message: &OutboundMessage, header: HeaderName) -> Result<Mailbox, TransportError> {
    let value = message
        .header(header)
        .ok_or_else(|| TransportError::Address {
            header: header.as_str(),
            reason: "header missing".to_string(),
        })?;
    let address: Address = value.parse().map_err(|e: lettre::address::AddressError| {
        TransportError::Address {
            header: header.as_str(),
            reason: e.to_string(),
        }
    })?;
    Ok(Mailbox::new(None, address))
}

/// Convert a composed message into the mail library's representation.
pub fn to_lettre_message(message: &OutboundMessage) -> Result<Message, TransportError> {
    let mut builder = Message::builder()
        .from(mailbox(message, HeaderName::From)?)
        .to(mailbox(message, HeaderName::To)?);

    if message.header(HeaderName::ReplyTo).is_some() {
        builder = builder.reply_to(mailbox(message, HeaderName::ReplyTo)?);
    }
    if let Some(subject) = message.header(HeaderName::Subject) {
        builder = builder.subject(subject);
    }
    if let Some(content_type) = message.header(HeaderName::ContentType) {
        let content_type = ContentType::parse(content_type)
            .map_err(|e| TransportError::Build(format!("content type: {e}")))?;
        builder = builder.header(content_type);
    }

    builder
        .body(message.body().to_string())
        .map_err(|e| TransportError::Build(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::compose;
    use crate::config::OperatorConfig;
    use contact_sanitize::SanitizedFields;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> OperatorConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        OperatorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_lettre_message_carries_composed_headers() {
        let config = config(&[("SMTP_FROM", "site@example.com")]);
        let fields =
            SanitizedFields::from_raw("Ada", "ada@example.com", "Hi\r\nBcc: evil@x.com").unwrap();
        let composed = compose(&config, &fields).unwrap();

        let email = to_lettre_message(&composed).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        let (headers, _body) = raw.split_once("\r\n\r\n").unwrap();

        assert!(headers.contains("From: site@example.com"));
        assert!(headers.contains("To: site@example.com"));
        assert!(headers.contains("Reply-To: ada@example.com"));
        assert!(headers.contains("Subject: Contact Form Submission"));
        assert!(headers.contains("Content-Type: text/plain; charset=utf-8"));
        assert!(!headers.to_ascii_lowercase().contains("bcc"));
    }

    #[tokio::test]
    async fn test_missing_settings_fail_on_send() {
        let config = config(&[("SMTP_FROM", "site@example.com")]);
        let fields = SanitizedFields::from_raw("Ada", "ada@example.com", "Hello").unwrap();
        let composed = compose(&config, &fields).unwrap();

        let mailer = SmtpMailer::new(&config.smtp);
        let err = mailer.send(&composed).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Configuration(ConfigError::MissingSmtpSetting("SMTP_PASSWORD"))
        ));
    }

    #[test]
    fn test_plain_transport_builds() {
        let config = config(&[
            ("SMTP_FROM", "site@example.com"),
            ("SMTP_PASSWORD", "pw"),
            ("SMTP_HOST", "127.0.0.1:2525"),
            ("SMTP_TLS", "none"),
        ]);
        assert!(build_transport(&config.smtp).is_ok());
    }
}
