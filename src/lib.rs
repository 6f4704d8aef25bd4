// src/lib.rs
// Public library surface for the server binary, the CLI and integration tests.

pub mod api;
pub mod config;
pub mod ingest;
pub mod service;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::ingest::types::{Author, FeedFetcher, Question};
pub use crate::service::QueryService;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "answers_scraper=info,tower_http=info,warn";

/// Install a compact tracing subscriber honoring `RUST_LOG`.
/// No-op if a global subscriber is already set (e.g. by the deployment runtime).
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// Build the HTTP app from env/file configuration.
pub async fn app() -> anyhow::Result<axum::Router> {
    let cfg = AppConfig::load_default()?;
    tracing::info!(
        feed = %cfg.feed_base_url,
        timeout_secs = cfg.timeout_secs,
        recency_hours = cfg.recency_hours,
        retry_transient = cfg.retry_transient,
        "config loaded"
    );
    let service = QueryService::from_config(&cfg)?;
    Ok(router(AppState::new(service)))
}
