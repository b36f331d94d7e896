//! # Configuration
//!
//! Operator settings are read from the environment exactly once, at startup,
//! and shared read-only with every component through an `Arc`. Nothing in the
//! request path reads the environment.
//!
//! Required operator settings are allowed to be missing at startup so that the
//! health endpoints and static site keep working; requests that need a missing
//! setting fail closed with [`ConfigError`].
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `RECAPTCHA_SECRET_KEY` | Verification provider secret |
//! | `RECAPTCHA_VERIFY_URL` | Provider endpoint (default: Google siteverify) |
//! | `RECAPTCHA_MIN_SCORE` | Minimum accepted score for score-based tokens |
//! | `SMTP_FROM` | Sender address, also the SMTP username |
//! | `SMTP_PASSWORD` | SMTP credential |
//! | `SMTP_HOST` | `host` or `host:port` |
//! | `SMTP_PORT` | Port when `SMTP_HOST` has none (default: 587) |
//! | `SMTP_TLS` | `starttls` (default), `tls`, or `none` |
//! | `SMTP_TO` | Fixed recipient (default: `SMTP_FROM`) |
//! | `CONTACT_SUBJECT` | Subject line |
//! | `CAPTCHA_TIMEOUT_SECS` / `SMTP_TIMEOUT_SECS` / `REQUEST_TIMEOUT_SECS` | Call bounds |
//! | `BIND_ADDR` / `PORT` | Listen address (default: `0.0.0.0:8080`) |
//! | `KO_DATA_PATH` | Static site directory (default: `./kodata`) |
//! | `REDIRECT_SUCCESS` / `REDIRECT_FAILURE` | Redirect targets for form posts |

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";
pub const DEFAULT_SUBJECT: &str = "Contact Form Submission";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Errors caused by missing or unusable operator settings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("RECAPTCHA_SECRET_KEY not set")]
    MissingCaptchaSecret,

    #[error("SMTP configuration missing: {0} not set")]
    MissingSmtpSetting(&'static str),

    #[error("invalid SMTP_HOST format: {0}")]
    InvalidSmtpHost(String),

    #[error("{setting} is not a usable address: {reason}")]
    InvalidAddress {
        setting: &'static str,
        reason: String,
    },

    #[error("failed to create HTTP client: {0}")]
    HttpClient(String),
}

/// A credential that never appears in `Debug` output or logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Human-verification provider settings
#[derive(Debug, Clone)]
pub struct CaptchaSettings {
    pub secret: Option<Secret>,
    pub verify_url: String,
    pub min_score: Option<f64>,
    pub timeout: Duration,
}

/// Transport security for the SMTP connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    /// Plain connection upgraded with STARTTLS (required)
    StartTls,
    /// TLS from the first byte
    Implicit,
    /// No encryption; only for local relays
    None,
}

impl SmtpTls {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "starttls" => Some(SmtpTls::StartTls),
            "tls" | "smtps" => Some(SmtpTls::Implicit),
            "none" | "plain" => Some(SmtpTls::None),
            _ => None,
        }
    }
}

/// Mail server settings
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub sender: Option<String>,
    pub credential: Option<Secret>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<SmtpTls>,
    pub recipient: Option<String>,
    pub timeout: Duration,
}

/// A fully resolved SMTP connection target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpEndpoint {
    pub host: String,
    pub port: u16,
    pub tls: SmtpTls,
    pub username: String,
    pub password: Secret,
}

impl SmtpSettings {
    /// Resolve the connection target, failing if any required setting is absent.
    pub fn endpoint(&self) -> Result<SmtpEndpoint, ConfigError> {
        let username = self
            .sender
            .clone()
            .ok_or(ConfigError::MissingSmtpSetting("SMTP_FROM"))?;
        let password = self
            .credential
            .clone()
            .ok_or(ConfigError::MissingSmtpSetting("SMTP_PASSWORD"))?;
        let raw_host = self
            .host
            .as_deref()
            .ok_or(ConfigError::MissingSmtpSetting("SMTP_HOST"))?;

        let (host, embedded_port) = split_host_port(raw_host)?;
        let port = embedded_port.or(self.port).unwrap_or(DEFAULT_SMTP_PORT);
        let tls = self.tls.unwrap_or(if port == IMPLICIT_TLS_PORT {
            SmtpTls::Implicit
        } else {
            SmtpTls::StartTls
        });

        Ok(SmtpEndpoint {
            host,
            port,
            tls,
            username,
            password,
        })
    }

    /// The single address every message is delivered to
    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref().or(self.sender.as_deref())
    }
}

/// Split `host[:port]`, accepting bracketed IPv6 literals.
fn split_host_port(raw: &str) -> Result<(String, Option<u16>), ConfigError> {
    let raw = raw.trim();
    let invalid = || ConfigError::InvalidSmtpHost(raw.to_string());

    if let Some(rest) = raw.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        let port = match tail.strip_prefix(':') {
            Some(port) => Some(port.parse().map_err(|_| invalid())?),
            None if tail.is_empty() => None,
            None => return Err(invalid()),
        };
        return Ok((host.to_string(), port));
    }

    let (host, port) = match raw.rsplit_once(':') {
        Some((host, port)) => (host, Some(port.parse().map_err(|_| invalid())?)),
        None => (raw, None),
    };

    if host.is_empty() || host.contains(':') || host.chars().any(|c| c.is_whitespace()) {
        return Err(invalid());
    }

    Ok((host.to_string(), port))
}

/// Operator-controlled settings consumed by the request pipeline
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    pub captcha: CaptchaSettings,
    pub smtp: SmtpSettings,
    pub subject: String,
    pub request_timeout: Duration,
}

impl OperatorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        Self {
            captcha: CaptchaSettings {
                secret: vars.get("RECAPTCHA_SECRET_KEY").map(Secret::new),
                verify_url: vars
                    .get("RECAPTCHA_VERIFY_URL")
                    .unwrap_or_else(|| DEFAULT_VERIFY_URL.to_string()),
                min_score: vars.parsed("RECAPTCHA_MIN_SCORE"),
                timeout: vars.seconds("CAPTCHA_TIMEOUT_SECS", 10),
            },
            smtp: SmtpSettings {
                sender: vars.get("SMTP_FROM"),
                credential: vars.get("SMTP_PASSWORD").map(Secret::new),
                host: vars.get("SMTP_HOST"),
                port: vars.parsed("SMTP_PORT"),
                tls: vars.get("SMTP_TLS").and_then(|v| {
                    let tls = SmtpTls::parse(&v);
                    if tls.is_none() {
                        warn!(value = %v, "Ignoring unrecognised SMTP_TLS");
                    }
                    tls
                }),
                recipient: vars.get("SMTP_TO"),
                timeout: vars.seconds("SMTP_TIMEOUT_SECS", 15),
            },
            subject: vars
                .get("CONTACT_SUBJECT")
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            request_timeout: vars.seconds("REQUEST_TIMEOUT_SECS", 30),
        }
    }

    /// Names of required settings that are absent
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.captcha.secret.is_none() {
            missing.push("RECAPTCHA_SECRET_KEY");
        }
        if self.smtp.sender.is_none() {
            missing.push("SMTP_FROM");
        }
        if self.smtp.credential.is_none() {
            missing.push("SMTP_PASSWORD");
        }
        if self.smtp.host.is_none() {
            missing.push("SMTP_HOST");
        }
        missing
    }
}

/// Listener and static-site settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub redirects: Redirects,
}

/// Redirect targets for form-encoded submissions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirects {
    pub success: String,
    pub failure: String,
}

impl Default for Redirects {
    fn default() -> Self {
        Self {
            success: "/#emailSent".to_string(),
            failure: "/#emailFailed".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let defaults = Redirects::default();

        Self {
            bind_addr: vars.get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: vars.parsed("PORT").unwrap_or(8080),
            static_dir: vars
                .get("KO_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./kodata")),
            redirects: Redirects {
                success: vars.get("REDIRECT_SUCCESS").unwrap_or(defaults.success),
                failure: vars.get("REDIRECT_FAILURE").unwrap_or(defaults.failure),
            },
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Environment lookup that treats blank values as unset
struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(key, value = %raw, "Ignoring unparseable setting");
                None
            }
        }
    }

    fn seconds(&self, key: &str, default: u64) -> Duration {
        Duration::from_secs(self.parsed(key).filter(|s| *s > 0).unwrap_or(default))
    }
}
