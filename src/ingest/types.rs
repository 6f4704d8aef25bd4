// src/ingest/types.rs
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::ingest::error::FetchError;

/// One upstream `<entry>` as decoded from the feed, before normalization.
/// Every field is optional here; required-ness is enforced by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub link: Option<String>,
    pub content: Option<String>,
    pub author: Option<RawAuthor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAuthor {
    pub name: Option<String>,
    pub uri: Option<String>,
}

/// Canonical record returned to API consumers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub id: String,
    pub title: String,
    pub published: String, // verbatim upstream timestamp
    pub updated: String,   // == published when never edited
    pub link: String,
    pub content: String,
    pub author: Option<Author>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub uri: String,
}

impl Question {
    /// Instant the question was published, in the offset the feed used.
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.published)
    }

    pub fn updated_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.updated)
    }

    pub fn is_edited(&self) -> bool {
        self.updated != self.published
    }
}

/// Parse an upstream timestamp. Atom uses RFC 3339; RFC 2822 is accepted
/// for feeds that leak RSS-style dates.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<FixedOffset>> {
    let ts = ts.trim();
    DateTime::parse_from_rfc3339(ts)
        .or_else(|_| DateTime::parse_from_rfc2822(ts))
        .ok()
}

/// Source of raw feed payloads for a search term.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, term: &str) -> Result<String, FetchError>;
    fn name(&self) -> &'static str;
}
