use std::sync::Arc;

use crate::analysis::pipeline::AnalysisPipeline;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Resume analysis pipeline. Stateless between requests.
    pub pipeline: Arc<AnalysisPipeline>,
    pub config: Config,
}
