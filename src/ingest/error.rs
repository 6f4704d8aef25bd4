// src/ingest/error.rs
use thiserror::Error;

/// Failure reaching the upstream feed. Never parsed further.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("feed request timed out")]
    Timeout,

    #[error("feed returned HTTP {0}")]
    Status(u16),

    #[error("feed transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// Connect failures and timeouts; a non-success status is never transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Timeout | FetchError::Transport(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// The payload as a whole is not an Atom document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("feed payload is empty")]
    Empty,

    #[error("expected <feed> root element, found {0}")]
    UnexpectedRoot(String),

    #[error("malformed feed xml: {0}")]
    Xml(String),
}

/// A single entry cannot become a `Question`; the entry is skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("entry has no identifier")]
    MissingId,

    #[error("entry identifier {0:?} has an empty final segment")]
    EmptyId(String),

    #[error("entry has no link")]
    MissingLink,

    #[error("entry has a missing or unparsable published timestamp: {0:?}")]
    InvalidPublished(Option<String>),
}

/// Request-level failure surfaced by the query service.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
