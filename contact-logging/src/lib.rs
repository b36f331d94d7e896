//! Process-wide tracing setup for the contact relay.
//!
//! Output is selected from the environment:
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `LOG_LEVEL` | any `EnvFilter` directive | `info` |
//! | `LOG_OUTPUT` | `console`, `file`, `both` | `console` |
//! | `LOG_FORMAT` | `human`, `json` | `human` |
//! | `LOG_FILE_PATH` | path of the daily-rolled log file | `/tmp/contact-relay.log` |
//!
//! `RUST_LOG`, when set, takes precedence over `LOG_LEVEL`.

use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt::MakeWriter, prelude::*, registry, EnvFilter};

const DEFAULT_LOG_FILE: &str = "/tmp/contact-relay.log";

/// Dependencies whose debug output drowns the relay's own events
const QUIET_TARGETS: &[&str] = &["tokio=warn", "hyper=warn", "hyper_util=warn", "rustls=warn"];

/// Duplicates each formatted event into two sinks. The write succeeds when
/// either sink took the whole line.
struct TeeWriter<P, S> {
    primary: P,
    secondary: S,
}

impl<P: Write, S: Write> Write for TeeWriter<P, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let primary = self.primary.write_all(buf);
        let secondary = self.secondary.write_all(buf);
        primary.or(secondary).map(|()| buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let primary = self.primary.flush();
        let secondary = self.secondary.flush();
        primary.and(secondary)
    }
}

#[derive(Clone)]
struct MakeTeeWriter<P, S> {
    primary: P,
    secondary: S,
}

impl<'a, P, S> MakeWriter<'a> for MakeTeeWriter<P, S>
where
    P: MakeWriter<'a>,
    S: MakeWriter<'a>,
{
    type Writer = TeeWriter<P::Writer, S::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        TeeWriter {
            primary: self.primary.make_writer(),
            secondary: self.secondary.make_writer(),
        }
    }
}

/// Where log lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Console,
    File,
    Both,
}

impl LogOutput {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => LogOutput::File,
            "both" => LogOutput::Both,
            _ => LogOutput::Console,
        }
    }

    fn to_console(self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    fn to_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

/// Line format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Human
        }
    }
}

/// Logging settings resolved from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub output: LogOutput,
    pub format: LogFormat,
    pub file_path: PathBuf,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            level: non_empty("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            output: non_empty("LOG_OUTPUT")
                .map(|v| LogOutput::parse(&v))
                .unwrap_or(LogOutput::Console),
            format: non_empty("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(LogFormat::Human),
            file_path: non_empty("LOG_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        for target in QUIET_TARGETS {
            if let Ok(directive) = target.parse() {
                filter = filter.add_directive(directive);
            }
        }
        filter
    }
}

/// Initializes the global tracing subscriber based on environment variables.
///
/// The returned guard flushes the file writer on drop; hold it for the life of
/// the process.
pub fn init_subscriber() -> Option<WorkerGuard> {
    init_with(&LogSettings::from_env())
}

/// Initializes the global tracing subscriber from explicit settings.
pub fn init_with(settings: &LogSettings) -> Option<WorkerGuard> {
    let is_json = settings.format == LogFormat::Json;
    let subscriber = registry().with(settings.env_filter());

    let log_path = settings.file_path.as_path();
    let log_dir = log_path.parent().unwrap_or_else(|| Path::new("/tmp"));
    let log_filename = log_path
        .file_name()
        .unwrap_or("contact-relay.log".as_ref());

    match (settings.output.to_console(), settings.output.to_file()) {
        (true, true) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, log_filename);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let tee_writer = MakeTeeWriter {
                primary: std::io::stdout,
                secondary: non_blocking,
            };

            let fmt_layer = tracing_subscriber::fmt::layer().with_writer(tee_writer);
            if is_json {
                subscriber.with(fmt_layer.json()).init();
            } else {
                subscriber.with(fmt_layer.pretty()).init();
            }
            Some(guard)
        }
        (false, true) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, log_filename);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let fmt_layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if is_json {
                subscriber.with(fmt_layer.json()).init();
            } else {
                subscriber.with(fmt_layer.pretty()).init();
            }
            Some(guard)
        }
        _ => {
            let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);
            if is_json {
                subscriber.with(fmt_layer.json()).init();
            } else {
                subscriber.with(fmt_layer.pretty()).init();
            }
            None
        }
    }
}
