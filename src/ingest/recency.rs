// src/ingest/recency.rs
//! Recency filter: questions published within the settle window are held back
//! because answers are likely still coming in.

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::ingest::types::Question;

pub const DEFAULT_SETTLE_HOURS: i64 = 48;

pub fn default_window() -> Duration {
    Duration::hours(DEFAULT_SETTLE_HOURS)
}

/// Closed interval: an entry exactly `window` old is still too recent.
/// Entries dated in the future are too recent as well.
pub fn is_too_recent(
    published: DateTime<FixedOffset>,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    now.signed_duration_since(published) <= window
}

/// Keep settled questions, preserving order. Returns the kept list and the
/// number of questions held back.
pub fn retain_settled(
    questions: Vec<Question>,
    now: DateTime<Utc>,
    window: Duration,
) -> (Vec<Question>, usize) {
    let total = questions.len();
    let kept: Vec<Question> = questions
        .into_iter()
        .filter(|q| match q.published_at() {
            Some(at) => !is_too_recent(at, now, window),
            // normalizer guarantees a valid timestamp; hold back anything else
            None => false,
        })
        .collect();
    let held = total - kept.len();
    (kept, held)
}
