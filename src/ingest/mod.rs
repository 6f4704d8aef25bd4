// src/ingest/mod.rs
pub mod error;
pub mod normalize;
pub mod parser;
pub mod providers;
pub mod recency;
pub mod scan;
pub mod types;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::ingest::error::{ParseError, QueryError};
use crate::ingest::types::{FeedFetcher, Question};

/// One-time metrics registration (so series show up in any installed recorder).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_fetch_total", "Upstream feed fetches attempted.");
        describe_counter!(
            "ingest_fetch_errors_total",
            "Upstream feed fetches that failed."
        );
        describe_counter!(
            "ingest_parse_errors_total",
            "Payloads rejected as not being an Atom feed."
        );
        describe_counter!("ingest_entries_total", "Entries decoded from feeds.");
        describe_counter!(
            "ingest_lenient_entries_total",
            "Entries read by the lenient scanner after typed decode failed."
        );
        describe_counter!(
            "ingest_skipped_total",
            "Entries skipped because normalization failed."
        );
        describe_counter!(
            "ingest_recent_filtered_total",
            "Questions held back by the recency window."
        );
        describe_counter!("ingest_kept_total", "Questions returned to callers.");
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Counts for one pipeline pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub entries: usize,
    pub skipped: usize,
    pub too_recent: usize,
}

/// Parse, normalize and filter an already fetched payload.
///
/// Entries that fail normalization are skipped and logged; the rest of the
/// feed proceeds. Output order is the feed's entry order.
pub fn process_payload(
    payload: &str,
    now: DateTime<Utc>,
    window: Duration,
) -> Result<(Vec<Question>, PipelineStats), ParseError> {
    ensure_metrics_described();

    let raw = parser::parse_feed(payload)?;
    let entries = raw.len();

    let mut questions = Vec::with_capacity(entries);
    let mut skipped = 0usize;
    for (index, entry) in raw.into_iter().enumerate() {
        match normalize::normalize(entry) {
            Ok(q) => questions.push(q),
            Err(e) => {
                skipped += 1;
                tracing::warn!(target: "ingest", index, error = %e, "skipping feed entry");
            }
        }
    }

    let (kept, too_recent) = recency::retain_settled(questions, now, window);

    counter!("ingest_skipped_total").increment(skipped as u64);
    counter!("ingest_recent_filtered_total").increment(too_recent as u64);
    counter!("ingest_kept_total").increment(kept.len() as u64);

    Ok((
        kept,
        PipelineStats {
            entries,
            skipped,
            too_recent,
        },
    ))
}

/// Fetch the feed for `term` and run it through the pipeline.
pub async fn run_query(
    fetcher: &dyn FeedFetcher,
    term: &str,
    now: DateTime<Utc>,
    window: Duration,
) -> Result<Vec<Question>, QueryError> {
    ensure_metrics_described();

    let payload = fetcher.fetch(term).await?;
    let (kept, stats) = process_payload(&payload, now, window)?;

    tracing::info!(
        target: "ingest",
        provider = fetcher.name(),
        term,
        entries = stats.entries,
        skipped = stats.skipped,
        too_recent = stats.too_recent,
        kept = kept.len(),
        "feed query done"
    );
    Ok(kept)
}
