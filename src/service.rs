//! # Query Service
//! Fetch → parse → normalize → recency filter, one independent pass per call.
//!
//! The service holds only immutable configuration and the fetcher (whose
//! HTTP client is internally pooled), so it is shared across requests
//! behind an `Arc` without locking.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::ingest::error::{FetchError, QueryError};
use crate::ingest::providers::answers_atom::AnswersAtomFetcher;
use crate::ingest::recency;
use crate::ingest::types::{FeedFetcher, Question};

#[derive(Clone)]
pub struct QueryService {
    fetcher: Arc<dyn FeedFetcher>,
    window: Duration,
}

impl QueryService {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, window: Duration) -> Self {
        Self { fetcher, window }
    }

    /// Service with the default 48h window.
    pub fn with_fetcher(fetcher: Arc<dyn FeedFetcher>) -> Self {
        Self::new(fetcher, recency::default_window())
    }

    /// HTTP-backed service built from configuration.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, FetchError> {
        let fetcher = AnswersAtomFetcher::from_config(cfg)?;
        Ok(Self::new(Arc::new(fetcher), cfg.recency_window()))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Search using the current time as the recency reference.
    /// An empty term is forwarded unchanged.
    pub async fn search(&self, term: &str) -> Result<Vec<Question>, QueryError> {
        self.search_at(term, Utc::now()).await
    }

    pub async fn search_at(
        &self,
        term: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Question>, QueryError> {
        crate::ingest::run_query(self.fetcher.as_ref(), term, now, self.window).await
    }
}
