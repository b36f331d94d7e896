//! Liveness and readiness endpoints. Neither checks a dependency.

use crate::state::AppState;
use axum::{routing::get, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(ok))
        .route("/startupz", get(ok))
}

async fn ok() -> &'static str {
    "OK"
}
