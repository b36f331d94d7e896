//! Stage ordering and failure behaviour of the submission pipeline

mod common;

use common::{config_from, pipeline, test_config, RecordingTransport, ScriptedCaptcha};
use contact_relay::{CaptchaOutcome, ConfigError, HeaderName, InboundSubmission, RelayError};
use contact_sanitize::ValidationError;
use std::time::Duration;

fn submission(name: &str, email: &str, message: &str) -> InboundSubmission {
    InboundSubmission {
        name: name.to_string(),
        email: email.to_string(),
        message: message.to_string(),
        captcha_token: "token".to_string(),
    }
}

#[tokio::test]
async fn test_injection_attempt_is_neutralized() {
    let captcha = ScriptedCaptcha::verified();
    let transport = RecordingTransport::new();
    let pipeline = pipeline(test_config(), captcha.clone(), transport.clone());

    pipeline
        .process(submission(
            "O'Brien  Jr.",
            "user@example.com",
            "Hi\r\nBcc: evil@x.com\nVisit http://phish.example",
        ))
        .await
        .unwrap();

    assert_eq!(captcha.calls(), 1);
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    let message = &sent[0];

    assert!(message
        .headers()
        .all(|(name, value)| !name.as_str().eq_ignore_ascii_case("bcc")
            && !value.contains('\r')
            && !value.contains('\n')));
    assert_eq!(message.header(HeaderName::ReplyTo), Some("user@example.com"));
    assert!(message.body().contains("Submitted Name: O'Brien Jr\n"));
    assert!(!message.body().contains("O'Brien  Jr"));
    assert!(message.body().contains("[URL Removed]"));
    assert!(!message.body().contains("phish.example"));
}

#[tokio::test]
async fn test_oversized_message_skips_captcha() {
    let captcha = ScriptedCaptcha::verified();
    let transport = RecordingTransport::new();
    let pipeline = pipeline(test_config(), captcha.clone(), transport.clone());

    let err = pipeline
        .process(submission("Ada", "ada@example.com", &"a".repeat(10_001)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RelayError::Validation(ValidationError::TooLarge {
            actual: 10_001,
            max: 10_000
        })
    ));
    assert_eq!(err.public_message(), "Message too long");
    assert_eq!(captcha.calls(), 0);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_message_at_limit_is_accepted() {
    let captcha = ScriptedCaptcha::verified();
    let transport = RecordingTransport::new();
    let pipeline = pipeline(test_config(), captcha, transport.clone());

    pipeline
        .process(submission("Ada", "ada@example.com", &"a".repeat(10_000)))
        .await
        .unwrap();
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_captcha_rejection_prevents_send() {
    let captcha = ScriptedCaptcha::rejected(&["timeout-or-duplicate"]);
    let transport = RecordingTransport::new();
    let pipeline = pipeline(test_config(), captcha.clone(), transport.clone());

    let err = pipeline
        .process(submission("Ada", "ada@example.com", "Hello"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, RelayError::CaptchaRejected(ref codes) if codes == "timeout-or-duplicate")
    );
    assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    assert_eq!(captcha.calls(), 1);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_provider_outage_is_a_rejection() {
    let captcha = ScriptedCaptcha::answering(Ok(CaptchaOutcome::ProviderUnavailable(
        "connection refused".to_string(),
    )));
    let transport = RecordingTransport::new();
    let pipeline = pipeline(test_config(), captcha, transport.clone());

    let err = pipeline
        .process(submission("Ada", "ada@example.com", "Hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::CaptchaRejected(_)));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_captcha_runs_before_validation() {
    let captcha = ScriptedCaptcha::rejected(&["invalid-input-response"]);
    let transport = RecordingTransport::new();
    let pipeline = pipeline(test_config(), captcha.clone(), transport);

    let err = pipeline
        .process(submission("Ada", "not-an-address", "Hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::CaptchaRejected(_)));
    assert_eq!(captcha.calls(), 1);
}

#[tokio::test]
async fn test_invalid_email_after_captcha() {
    let captcha = ScriptedCaptcha::verified();
    let transport = RecordingTransport::new();
    let pipeline = pipeline(test_config(), captcha, transport.clone());

    let err = pipeline
        .process(submission("Ada", "user@example.com\r\nBcc: evil@x.com", "Hello"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(err.public_message(), "Invalid email address");
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_missing_secret_is_configuration_error() {
    let captcha = ScriptedCaptcha::answering(Err(ConfigError::MissingCaptchaSecret));
    let transport = RecordingTransport::new();
    let pipeline = pipeline(test_config(), captcha, transport.clone());

    let err = pipeline
        .process(submission("Ada", "ada@example.com", "Hello"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RelayError::Configuration(ConfigError::MissingCaptchaSecret)
    ));
    assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_missing_sender_fails_before_send() {
    let captcha = ScriptedCaptcha::verified();
    let transport = RecordingTransport::new();
    let config = config_from(&[("RECAPTCHA_SECRET_KEY", "test-secret")]);
    let pipeline = pipeline(config, captcha, transport.clone());

    let err = pipeline
        .process(submission("Ada", "ada@example.com", "Hello"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RelayError::Configuration(ConfigError::MissingSmtpSetting("SMTP_FROM"))
    ));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_transport_failure_is_reported() {
    let captcha = ScriptedCaptcha::verified();
    let transport = RecordingTransport::failing("535 5.7.8 authentication failed");
    let pipeline = pipeline(test_config(), captcha, transport.clone());

    let err = pipeline
        .process(submission("Ada", "ada@example.com", "Hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Transport(_)));
    assert_eq!(err.public_message(), "Failed to send email");
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_request_timeout_bounds_the_run() {
    let captcha = ScriptedCaptcha::slow(Duration::from_secs(5));
    let transport = RecordingTransport::new();
    let mut config = test_config();
    config.request_timeout = Duration::from_millis(50);
    let pipeline = pipeline(config, captcha, transport.clone());

    let err = pipeline
        .process(submission("Ada", "ada@example.com", "Hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Timeout(d) if d == Duration::from_millis(50)));
    assert_eq!(transport.calls(), 0);
}
