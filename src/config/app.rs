// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

pub const ENV_CONFIG_PATH: &str = "SCRAPER_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/scraper.toml";

const ENV_FEED_URL: &str = "SCRAPER_FEED_URL";
const ENV_TIMEOUT_SECS: &str = "SCRAPER_TIMEOUT_SECS";
const ENV_RECENCY_HOURS: &str = "SCRAPER_RECENCY_HOURS";
const ENV_RETRY_TRANSIENT: &str = "SCRAPER_RETRY_TRANSIENT";

// ten years; keeps the chrono duration in range
const MAX_RECENCY_HOURS: i64 = 24 * 365 * 10;

fn default_feed_base_url() -> String {
    "https://in.mathworks.com/matlabcentral/answers/questions".to_string()
}
fn default_feed_format() -> String {
    "atom".to_string()
}
fn default_sort() -> String {
    "relevance".to_string()
}
fn default_status() -> String {
    "unanswered".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_connect_timeout_secs() -> u64 {
    4
}
fn default_user_agent() -> String {
    concat!("answers-scraper/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_recency_hours() -> i64 {
    crate::ingest::recency::DEFAULT_SETTLE_HOURS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_feed_base_url")]
    pub feed_base_url: String,
    #[serde(default = "default_feed_format")]
    pub feed_format: String,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_status")]
    pub status: String,
    /// Whole-request timeout for the upstream fetch.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// One extra attempt on connect errors / timeouts.
    #[serde(default)]
    pub retry_transient: bool,
    /// Questions younger than this (inclusive) are held back.
    #[serde(default = "default_recency_hours")]
    pub recency_hours: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_base_url: default_feed_base_url(),
            feed_format: default_feed_format(),
            sort: default_sort(),
            status: default_status(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
            retry_transient: false,
            recency_hours: default_recency_hours(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks, then apply per-field env overrides:
    /// 1) $SCRAPER_CONFIG_PATH (must exist)
    /// 2) config/scraper.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };
        base.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(url) = env::var(ENV_FEED_URL) {
            self.feed_base_url = url;
        }
        if let Ok(v) = env::var(ENV_TIMEOUT_SECS) {
            self.timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_SECS}={v:?} is not a number"))?;
        }
        if let Ok(v) = env::var(ENV_RECENCY_HOURS) {
            self.recency_hours = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_RECENCY_HOURS}={v:?} is not a number"))?;
        }
        if let Ok(v) = env::var(ENV_RETRY_TRANSIENT) {
            self.retry_transient = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(self.sanitized())
    }

    fn sanitized(mut self) -> Self {
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > self.timeout_secs {
            self.connect_timeout_secs = self.connect_timeout_secs.clamp(1, self.timeout_secs);
        }
        if !(0..=MAX_RECENCY_HOURS).contains(&self.recency_hours) {
            self.recency_hours = default_recency_hours();
        }
        self
    }

    pub fn recency_window(&self) -> Duration {
        Duration::hours(self.recency_hours)
    }
}
