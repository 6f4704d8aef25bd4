use async_trait::async_trait;
use metrics::counter;
use std::time::Duration;

use crate::config::AppConfig;
use crate::ingest::error::FetchError;
use crate::ingest::types::FeedFetcher;

/// MATLAB Answers Atom search feed.
pub struct AnswersAtomFetcher {
    mode: Mode,
}

enum Mode {
    /// In-memory payload, returned for every term.
    Fixture(String),
    Http {
        client: reqwest::Client,
        base_url: String,
        params: FeedParams,
        retry_transient: bool,
    },
}

/// Fixed query parameters sent alongside the search term.
#[derive(Debug, Clone)]
pub struct FeedParams {
    pub format: String,
    pub sort: String,
    pub status: String,
}

impl FeedParams {
    fn query<'a>(&'a self, term: &'a str) -> [(&'static str, &'a str); 4] {
        [
            ("format", self.format.as_str()),
            ("sort", self.sort.as_str()),
            ("status", self.status.as_str()),
            ("term", term),
        ]
    }
}

impl AnswersAtomFetcher {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            mode: Mode::Http {
                client,
                base_url: cfg.feed_base_url.clone(),
                params: FeedParams {
                    format: cfg.feed_format.clone(),
                    sort: cfg.sort.clone(),
                    status: cfg.status.clone(),
                },
                retry_transient: cfg.retry_transient,
            },
        })
    }

    async fn get_once(
        client: &reqwest::Client,
        base_url: &str,
        params: &FeedParams,
        term: &str,
    ) -> Result<String, FetchError> {
        let resp = client.get(base_url).query(&params.query(term)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl FeedFetcher for AnswersAtomFetcher {
    async fn fetch(&self, term: &str) -> Result<String, FetchError> {
        counter!("ingest_fetch_total").increment(1);
        match &self.mode {
            Mode::Fixture(s) => Ok(s.clone()),
            Mode::Http {
                client,
                base_url,
                params,
                retry_transient,
            } => {
                let max_attempts: u8 = if *retry_transient { 2 } else { 1 };
                let mut attempt: u8 = 0;
                loop {
                    attempt += 1;
                    match Self::get_once(client, base_url, params, term).await {
                        Ok(body) => return Ok(body),
                        Err(e) if e.is_transient() && attempt < max_attempts => {
                            tracing::warn!(error = %e, attempt, provider = "answers", "transient feed error, retrying");
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, provider = "answers", "feed fetch failed");
                            counter!("ingest_fetch_errors_total").increment(1);
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "answers"
    }
}
