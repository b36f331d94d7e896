//! # Human Verification
//!
//! Submissions must carry a token issued by the reCAPTCHA widget. The token is
//! checked with the provider before any submitted field is sanitized or used.

use crate::config::{CaptchaSettings, ConfigError, Secret};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Reason code used when the caller sent no token at all
pub const MISSING_INPUT_RESPONSE: &str = "missing-input-response";
/// Reason code used when the provider reports failure without codes
pub const VERIFICATION_FAILED: &str = "verification-failed";
/// Reason code used when a score-based token scores below the threshold
pub const SCORE_BELOW_THRESHOLD: &str = "score-below-threshold";
/// Reason code used when a threshold is configured but the provider sent no score
pub const MISSING_SCORE: &str = "missing-score";

/// Result of a verification attempt
#[derive(Debug, Clone, PartialEq)]
pub enum CaptchaOutcome {
    Verified,
    /// The provider answered and refused the token
    Rejected(BTreeSet<String>),
    /// The provider could not be reached or answered unintelligibly
    ProviderUnavailable(String),
}

impl CaptchaOutcome {
    pub fn rejected(codes: &[&str]) -> Self {
        CaptchaOutcome::Rejected(codes.iter().map(|c| c.to_string()).collect())
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, CaptchaOutcome::Verified)
    }
}

/// Checks a widget token with the verification provider.
///
/// A missing provider secret is a configuration error rather than an outcome:
/// nothing is sent to the provider without one.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<CaptchaOutcome, ConfigError>;
}

/// The provider's siteverify response body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteVerifyResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub challenge_ts: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(rename = "error-codes", default)]
    pub error_codes: Vec<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub action: Option<String>,
}

impl SiteVerifyResponse {
    /// Interpret the response against an optional minimum score.
    pub fn outcome(&self, min_score: Option<f64>) -> CaptchaOutcome {
        if !self.success {
            if self.error_codes.is_empty() {
                return CaptchaOutcome::rejected(&[VERIFICATION_FAILED]);
            }
            return CaptchaOutcome::Rejected(self.error_codes.iter().cloned().collect());
        }

        match (min_score, self.score) {
            (Some(min), Some(score)) if score < min => {
                CaptchaOutcome::rejected(&[SCORE_BELOW_THRESHOLD])
            }
            (Some(_), None) => CaptchaOutcome::rejected(&[MISSING_SCORE]),
            _ => CaptchaOutcome::Verified,
        }
    }
}

/// Verifier backed by the reCAPTCHA siteverify endpoint
pub struct RecaptchaVerifier {
    client: Client,
    settings: CaptchaSettings,
}

impl RecaptchaVerifier {
    pub fn new(settings: CaptchaSettings) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("contact-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client, settings })
    }

    async fn site_verify(&self, secret: &Secret, token: &str) -> CaptchaOutcome {
        let params = [("secret", secret.expose()), ("response", token)];

        let response = match self
            .client
            .post(&self.settings.verify_url)
            .form(&params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Verification provider unreachable");
                return CaptchaOutcome::ProviderUnavailable(e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Verification provider returned an error status");
            return CaptchaOutcome::ProviderUnavailable(format!("provider returned {status}"));
        }

        match response.json::<SiteVerifyResponse>().await {
            Ok(body) => {
                debug!(
                    success = body.success,
                    score = ?body.score,
                    action = ?body.action,
                    hostname = ?body.hostname,
                    "Verification provider answered"
                );
                body.outcome(self.settings.min_score)
            }
            Err(e) => {
                warn!(error = %e, "Undecodable verification response");
                CaptchaOutcome::ProviderUnavailable(format!("undecodable response: {e}"))
            }
        }
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str) -> Result<CaptchaOutcome, ConfigError> {
        let secret = self
            .settings
            .secret
            .as_ref()
            .ok_or(ConfigError::MissingCaptchaSecret)?;

        if token.is_empty() {
            return Ok(CaptchaOutcome::rejected(&[MISSING_INPUT_RESPONSE]));
        }

        Ok(self.site_verify(secret, token).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn response(json: &str) -> SiteVerifyResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_success_is_verified() {
        let body = response(r#"{"success": true, "hostname": "example.com"}"#);
        assert_eq!(body.outcome(None), CaptchaOutcome::Verified);
    }

    #[test]
    fn test_failure_carries_error_codes() {
        let body = response(
            r#"{"success": false, "error-codes": ["timeout-or-duplicate", "invalid-input-response"]}"#,
        );
        assert_eq!(
            body.outcome(None),
            CaptchaOutcome::rejected(&["invalid-input-response", "timeout-or-duplicate"])
        );
    }

    #[test]
    fn test_failure_without_codes() {
        let body = response(r#"{"success": false}"#);
        assert_eq!(
            body.outcome(None),
            CaptchaOutcome::rejected(&[VERIFICATION_FAILED])
        );
    }

    #[test]
    fn test_score_threshold() {
        let body = response(r#"{"success": true, "score": 0.3, "action": "contact"}"#);
        assert_eq!(
            body.outcome(Some(0.5)),
            CaptchaOutcome::rejected(&[SCORE_BELOW_THRESHOLD])
        );
        assert_eq!(body.outcome(Some(0.3)), CaptchaOutcome::Verified);
        assert_eq!(body.outcome(None), CaptchaOutcome::Verified);
    }

    #[test]
    fn test_threshold_requires_score() {
        let body = response(r#"{"success": true}"#);
        assert_eq!(
            body.outcome(Some(0.9)),
            CaptchaOutcome::rejected(&[MISSING_SCORE])
        );
        assert_eq!(body.outcome(None), CaptchaOutcome::Verified);
    }

    fn settings(secret: Option<&str>) -> CaptchaSettings {
        CaptchaSettings {
            secret: secret.map(Secret::new),
            // Never contacted by these tests
            verify_url: "http://127.0.0.1:9/siteverify".to_string(),
            min_score: None,
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_missing_secret_is_configuration_error() {
        let verifier = RecaptchaVerifier::new(settings(None)).unwrap();
        assert_eq!(
            verifier.verify("token").await,
            Err(ConfigError::MissingCaptchaSecret)
        );
    }

    #[tokio::test]
    async fn test_empty_token_rejected_locally() {
        let verifier = RecaptchaVerifier::new(settings(Some("secret"))).unwrap();
        assert_eq!(
            verifier.verify("").await,
            Ok(CaptchaOutcome::rejected(&[MISSING_INPUT_RESPONSE]))
        );
    }
}
