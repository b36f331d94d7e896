//! Shared application state

use crate::config::Redirects;
use crate::pipeline::ContactPipeline;
use std::sync::Arc;

/// State handed to every handler. Cloning is cheap; the pipeline and its
/// configuration are shared read-only.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ContactPipeline>,
    pub redirects: Arc<Redirects>,
}

impl AppState {
    pub fn new(pipeline: ContactPipeline, redirects: Redirects) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            redirects: Arc::new(redirects),
        }
    }
}
