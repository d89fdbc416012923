use std::sync::Arc;

use crate::config::Config;
use crate::search::SearchCoordinator;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds no per-search data; every request gets its own pipeline.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Coordinator wired with the configured job source and résumé matcher.
    pub coordinator: Arc<SearchCoordinator>,
}
