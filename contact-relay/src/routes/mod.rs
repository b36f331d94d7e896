//! HTTP surface

pub mod email;
pub mod health;

use crate::state::AppState;
use axum::Router;
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Build the application router: `/email`, the health endpoints, and the static site
/// as the fallback for every other path.
pub fn create_app(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .merge(email::routes())
        .merge(health::routes())
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
