//! # Request Error Taxonomy
//!
//! Every way a submission can fail maps onto one [`RelayError`] variant. The
//! full error, including provider reason codes and transport detail, is for
//! the server log only; callers see [`RelayError::status`] and
//! [`RelayError::public_message`].

use crate::config::ConfigError;
use crate::submission::DecodeError;
use crate::transport::TransportError;
use axum::http::StatusCode;
use contact_sanitize::{Field, ValidationError};
use std::time::Duration;

pub type RelayResult<T> = Result<T, RelayError>;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("undecodable submission: {0}")]
    Decode(#[from] DecodeError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("captcha rejected: {0}")]
    CaptchaRejected(String),

    #[error("mail transport failed: {0}")]
    Transport(TransportError),

    #[error("request exceeded its {0:?} budget")]
    Timeout(Duration),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TransportError> for RelayError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Configuration(config) => RelayError::Configuration(config),
            other => RelayError::Transport(other),
        }
    }
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Decode(_) | RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::CaptchaRejected(_) => StatusCode::UNAUTHORIZED,
            RelayError::Configuration(_)
            | RelayError::Transport(_)
            | RelayError::Timeout(_)
            | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Coarse, non-identifying text that is safe to return to the caller
    pub fn public_message(&self) -> &'static str {
        match self {
            RelayError::Decode(_) => "Invalid request body",
            RelayError::Validation(ValidationError::TooLarge { .. }) => "Message too long",
            RelayError::Validation(ValidationError::InvalidFormat { field, .. }) => match field {
                Field::Name => "Invalid name format",
                Field::Email => "Invalid email address",
                Field::Message => "Invalid message",
            },
            RelayError::CaptchaRejected(_) => "Recaptcha verification failed",
            RelayError::Configuration(_)
            | RelayError::Transport(_)
            | RelayError::Timeout(_)
            | RelayError::Internal(_) => "Failed to send email",
        }
    }

    /// Failures caused by the caller rather than by this service
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            RelayError::from(ValidationError::TooLarge {
                actual: 10_001,
                max: 10_000
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::CaptchaRejected("timeout-or-duplicate".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RelayError::from(ConfigError::MissingCaptchaSecret).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RelayError::Timeout(Duration::from_secs(30)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_transport_configuration_becomes_configuration_error() {
        let err = RelayError::from(TransportError::Configuration(
            ConfigError::MissingSmtpSetting("SMTP_HOST"),
        ));
        assert!(matches!(err, RelayError::Configuration(_)));

        let err = RelayError::from(TransportError::Smtp("535 auth failed".into()));
        assert!(matches!(err, RelayError::Transport(_)));
    }

    #[test]
    fn test_public_message_hides_detail() {
        let err = RelayError::from(TransportError::Smtp(
            "535 5.7.8 credentials for site@example.com rejected".into(),
        ));
        assert_eq!(err.public_message(), "Failed to send email");

        let err = RelayError::CaptchaRejected("invalid-input-secret".into());
        assert!(!err.public_message().contains("secret"));

        let err = RelayError::from(ConfigError::MissingSmtpSetting("SMTP_PASSWORD"));
        assert!(!err.public_message().contains("SMTP"));
    }
}
