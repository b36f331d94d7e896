//! Shared fixtures and test doubles for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use contact_relay::{
    create_app, AppState, CaptchaOutcome, CaptchaVerifier, ConfigError, ContactPipeline,
    MailTransport, OperatorConfig, OutboundMessage, Redirects, TransportError,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Captcha verifier that answers with a fixed outcome
pub struct ScriptedCaptcha {
    outcome: Result<CaptchaOutcome, ConfigError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedCaptcha {
    pub fn verified() -> Arc<Self> {
        Self::answering(Ok(CaptchaOutcome::Verified))
    }

    pub fn rejected(codes: &[&str]) -> Arc<Self> {
        Self::answering(Ok(CaptchaOutcome::rejected(codes)))
    }

    pub fn answering(outcome: Result<CaptchaOutcome, ConfigError>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(CaptchaOutcome::Verified),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptchaVerifier for ScriptedCaptcha {
    async fn verify(&self, _token: &str) -> Result<CaptchaOutcome, ConfigError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

/// Mail transport that records every message instead of sending it
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    calls: AtomicUsize,
    failure: Option<String>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(reason.to_string()),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.failure {
            return Err(TransportError::Smtp(reason.clone()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub fn config_from(vars: &[(&str, &str)]) -> OperatorConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    OperatorConfig::from_lookup(|key| vars.get(key).cloned())
}

/// A fully configured operator
pub fn test_config() -> OperatorConfig {
    config_from(&[
        ("RECAPTCHA_SECRET_KEY", "test-secret"),
        ("SMTP_FROM", "site@example.com"),
        ("SMTP_PASSWORD", "smtp-password"),
        ("SMTP_HOST", "smtp.example.com:587"),
    ])
}

pub fn pipeline(
    config: OperatorConfig,
    captcha: Arc<ScriptedCaptcha>,
    transport: Arc<RecordingTransport>,
) -> ContactPipeline {
    ContactPipeline::new(Arc::new(config), captcha, transport)
}

pub fn test_app(
    captcha: Arc<ScriptedCaptcha>,
    transport: Arc<RecordingTransport>,
    static_dir: &Path,
) -> axum::Router {
    let state = AppState::new(
        pipeline(test_config(), captcha, transport),
        Redirects::default(),
    );
    create_app(state, static_dir)
}
