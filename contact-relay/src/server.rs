//! Server bootstrap

use crate::config::ServerConfig;
use crate::routes::create_app;
use crate::state::AppState;
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

/// Bind the listener and serve until Ctrl-C or SIGTERM.
pub async fn run_server(config: &ServerConfig, state: AppState) -> Result<()> {
    let app = create_app(state, &config.static_dir);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(
        addr = %addr,
        static_dir = %config.static_dir.display(),
        "Contact relay listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    info!("Contact relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
