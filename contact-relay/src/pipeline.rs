//! # Submission Pipeline
//!
//! One request moves through a fixed sequence of stages:
//!
//! 1. length check on the raw message
//! 2. human verification
//! 3. sanitization and validation
//! 4. composition
//! 5. delivery
//!
//! The first failing stage ends the request. No submitted field is sanitized
//! or composed before verification passes, and nothing is sent unless every
//! earlier stage succeeded. The whole run is bounded by the configured
//! request timeout.

use crate::captcha::{CaptchaOutcome, CaptchaVerifier};
use crate::compose::{compose, OutboundMessage};
use crate::config::OperatorConfig;
use crate::error::{RelayError, RelayResult};
use crate::submission::InboundSubmission;
use crate::transport::MailTransport;
use contact_sanitize::{validate_message_length, SanitizedFields};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pipeline stage, recorded on every log event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Length,
    Captcha,
    Sanitize,
    Compose,
    Send,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Length => "length",
            Stage::Captcha => "captcha",
            Stage::Sanitize => "sanitize",
            Stage::Compose => "compose",
            Stage::Send => "send",
        })
    }
}

/// The request-handling core, shared by every connection
#[derive(Clone)]
pub struct ContactPipeline {
    config: Arc<OperatorConfig>,
    captcha: Arc<dyn CaptchaVerifier>,
    transport: Arc<dyn MailTransport>,
}

impl ContactPipeline {
    pub fn new(
        config: Arc<OperatorConfig>,
        captcha: Arc<dyn CaptchaVerifier>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            config,
            captcha,
            transport,
        }
    }

    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    /// Run a submission through every stage within the request timeout.
    pub async fn process(&self, submission: InboundSubmission) -> RelayResult<()> {
        let budget = self.config.request_timeout;
        match tokio::time::timeout(budget, self.run(submission)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?budget, "Submission timed out");
                Err(RelayError::Timeout(budget))
            }
        }
    }

    async fn run(&self, submission: InboundSubmission) -> RelayResult<()> {
        validate_message_length(&submission.message)?;
        debug!(stage = %Stage::Length, "Message length accepted");

        self.verify_captcha(&submission.captcha_token).await?;
        debug!(stage = %Stage::Captcha, "Captcha verified");

        let fields =
            SanitizedFields::from_raw(&submission.name, &submission.email, &submission.message)?;
        debug!(stage = %Stage::Sanitize, "Fields sanitized");

        let message = self.compose(&fields)?;
        debug!(stage = %Stage::Compose, headers = message.headers().count(), "Message composed");

        self.transport.send(&message).await?;
        info!(stage = %Stage::Send, "Contact message sent");
        Ok(())
    }

    async fn verify_captcha(&self, token: &str) -> RelayResult<()> {
        match self.captcha.verify(token).await? {
            CaptchaOutcome::Verified => Ok(()),
            CaptchaOutcome::Rejected(codes) => {
                let codes = codes.into_iter().collect::<Vec<_>>().join(",");
                warn!(stage = %Stage::Captcha, reasons = %codes, "Captcha rejected");
                Err(RelayError::CaptchaRejected(codes))
            }
            CaptchaOutcome::ProviderUnavailable(reason) => {
                warn!(stage = %Stage::Captcha, %reason, "Captcha provider unavailable");
                Err(RelayError::CaptchaRejected(format!(
                    "provider unavailable: {reason}"
                )))
            }
        }
    }

    fn compose(&self, fields: &SanitizedFields) -> RelayResult<OutboundMessage> {
        compose(&self.config, fields)
    }
}
