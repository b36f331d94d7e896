//! `contact-relay` binary
//!
//! Reads operator settings from the environment once, then serves `/email`,
//! the health endpoints, and the static site until shut down.

use anyhow::{Context, Result};
use clap::Parser;
use contact_relay::{
    server::run_server, AppState, ContactPipeline, OperatorConfig, RecaptchaVerifier,
    ServerConfig, SmtpMailer,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "contact-relay")]
#[command(about = "Contact form relay - verifies submissions and forwards them by email")]
#[command(version)]
struct Cli {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind to (overrides BIND_ADDR)
    #[arg(long)]
    bind: Option<String>,

    /// Directory served for every non-API path (overrides KO_DATA_PATH)
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = contact_logging::init_subscriber();

    let mut server_config = ServerConfig::from_env();
    if let Some(port) = cli.port {
        server_config.port = port;
    }
    if let Some(bind) = cli.bind {
        server_config.bind_addr = bind;
    }
    if let Some(static_dir) = cli.static_dir {
        server_config.static_dir = static_dir;
    }

    let operator_config = Arc::new(OperatorConfig::from_env());
    report_settings(&operator_config);

    let captcha = RecaptchaVerifier::new(operator_config.captcha.clone())
        .context("Failed to initialize reCAPTCHA client")?;
    let transport = SmtpMailer::new(&operator_config.smtp);

    let pipeline = ContactPipeline::new(
        operator_config.clone(),
        Arc::new(captcha),
        Arc::new(transport),
    );
    let state = AppState::new(pipeline, server_config.redirects.clone());

    run_server(&server_config, state).await
}

/// Log which required settings are missing, by name only.
fn report_settings(config: &OperatorConfig) {
    let missing = config.missing_settings();
    if missing.is_empty() {
        info!("All required settings present");
        return;
    }
    for setting in &missing {
        warn!(setting, "Required setting missing; submissions will fail until it is set");
    }
}
