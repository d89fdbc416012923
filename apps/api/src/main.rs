mod config;
mod errors;
mod matcher;
mod resume;
mod routes;
mod search;
mod sources;
mod state;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, MatcherBackend};
use crate::matcher::{KeywordResumeMatcher, LlmResumeMatcher, ResumeMatcher};
use crate::routes::build_router;
use crate::search::{SearchCoordinator, Timeouts};
use crate::sources::LinkedInJobSource;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; invalid values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize job source
    let source = LinkedInJobSource::from_config(&config)
        .context("Failed to build the LinkedIn job source")?;
    info!("Job source initialized ({})", config.job_source_base_url);

    // Initialize résumé matcher (MATCHER_BACKEND selects keyword or llm)
    let matcher = build_matcher(&config)?;

    let coordinator = SearchCoordinator::new(Arc::new(source), matcher, Timeouts::from(&config));
    info!(
        "Search timeouts: source {}s, matcher {}s",
        config.source_timeout.as_secs(),
        config.matcher_timeout.as_secs()
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        coordinator: Arc::new(coordinator),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the frontend origin once it is deployed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_matcher(config: &Config) -> Result<Arc<dyn ResumeMatcher>> {
    match config.matcher_backend {
        MatcherBackend::Keyword => {
            info!("Résumé matcher: keyword");
            Ok(Arc::new(KeywordResumeMatcher::new()))
        }
        MatcherBackend::Llm => {
            let api_key = config
                .anthropic_api_key
                .clone()
                .context("ANTHROPIC_API_KEY is required for the LLM matcher")?;
            let matcher = LlmResumeMatcher::new(api_key)
                .context("Failed to build the LLM résumé matcher")?;
            info!("Résumé matcher: llm (model: {})", crate::matcher::llm::MODEL);
            Ok(Arc::new(matcher))
        }
    }
}
