//! # Contact Relay
//!
//! Turns untrusted contact-form submissions into a single email to a fixed
//! operator address, gated by reCAPTCHA verification.
//!
//! A submission is decoded ([`submission`]), length-checked, verified
//! ([`captcha`]), sanitized (`contact_sanitize`), composed ([`compose`]) and
//! delivered ([`transport`]) by the [`pipeline::ContactPipeline`]. The HTTP
//! surface lives in [`routes`].

pub mod captcha;
pub mod compose;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod server;
pub mod state;
pub mod submission;
pub mod transport;

pub use captcha::{CaptchaOutcome, CaptchaVerifier, RecaptchaVerifier};
pub use compose::{compose, HeaderName, OutboundMessage};
pub use config::{ConfigError, OperatorConfig, Redirects, ServerConfig};
pub use error::{RelayError, RelayResult};
pub use pipeline::ContactPipeline;
pub use routes::create_app;
pub use state::AppState;
pub use submission::{InboundSubmission, SubmissionDecoder};
pub use transport::{MailTransport, SmtpMailer, TransportError};
