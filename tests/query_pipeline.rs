// tests/query_pipeline.rs
use std::sync::{Arc, Mutex};

use answers_scraper::ingest::error::{FetchError, QueryError};
use answers_scraper::ingest::providers::answers_atom::AnswersAtomFetcher;
use answers_scraper::ingest::recency::default_window;
use answers_scraper::ingest::{process_payload, run_query};
use answers_scraper::{FeedFetcher, QueryService};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};

const FEED_XML: &str = include_str!("fixtures/answers_feed.xml");

fn fixture_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-10T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Returns a fixed payload and records the terms it was asked for.
struct MockFetcher {
    payload: Result<String, u16>,
    terms: Mutex<Vec<String>>,
}

impl MockFetcher {
    fn ok(payload: impl Into<String>) -> Self {
        Self {
            payload: Ok(payload.into()),
            terms: Mutex::new(Vec::new()),
        }
    }

    fn status(code: u16) -> Self {
        Self {
            payload: Err(code),
            terms: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FeedFetcher for MockFetcher {
    async fn fetch(&self, term: &str) -> Result<String, FetchError> {
        self.terms.lock().unwrap().push(term.to_string());
        match &self.payload {
            Ok(s) => Ok(s.clone()),
            Err(code) => Err(FetchError::Status(*code)),
        }
    }
    fn name(&self) -> &'static str {
        "MockFetcher"
    }
}

fn entry(id: &str, published: DateTime<Utc>, author: bool) -> String {
    let ts = published.to_rfc3339_opts(SecondsFormat::Secs, true);
    let author = if author {
        format!("<author><name>user{id}</name><uri>https://example.test/u/{id}</uri></author>")
    } else {
        String::new()
    };
    format!(
        "<entry><id>tag:example.test,2005:Question/{id}</id><title>Question {id}</title>\
         <published>{ts}</published><updated>{ts}</updated>\
         <link rel=\"alternate\" href=\"https://example.test/answers/{id}\"/>\
         <content type=\"html\">&lt;p&gt;body {id}&lt;/p&gt;</content>{author}</entry>"
    )
}

fn feed(entries: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><feed xmlns="http://www.w3.org/2005/Atom"><title>t</title>{}</feed>"#,
        entries.concat()
    )
}

#[tokio::test]
async fn only_settled_entry_survives_in_order() {
    let now = Utc::now();
    let xml = feed(&[
        entry("A", now - Duration::hours(72), true),
        entry("B", now - Duration::hours(30), true),
        entry("C", now - Duration::minutes(10), false),
    ]);
    let svc = QueryService::with_fetcher(Arc::new(MockFetcher::ok(xml)));

    let out = svc.search_at("ode45", now).await.expect("search ok");
    assert_eq!(out.len(), 1);
    let a = &out[0];
    assert_eq!(a.id, "A");
    assert_eq!(a.link, "https://example.test/answers/A");
    assert_eq!(a.content, "<p>body A</p>");
    let author = a.author.as_ref().expect("author populated");
    assert_eq!(author.name, "userA");
    assert_eq!(author.uri, "https://example.test/u/A");
}

#[tokio::test]
async fn fixture_feed_end_to_end() {
    let svc = QueryService::with_fetcher(Arc::new(MockFetcher::ok(FEED_XML)));
    let out = svc.search_at("plot", fixture_now()).await.unwrap();

    let ids: Vec<_> = out.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["2120001", "2120003"]);

    assert!(!out[0].is_edited());
    assert!(out[1].is_edited());
    assert_eq!(out[1].published, "2024-06-01T08:00:00+02:00");
    assert_eq!(out[1].title, "Surface plot colormap\u{a0}limits");
    assert!(out[1].author.is_none());
}

#[tokio::test]
async fn empty_feed_is_success() {
    let xml = feed(&[]);
    let svc = QueryService::with_fetcher(Arc::new(MockFetcher::ok(xml)));
    let out = svc.search("anything").await.expect("empty feed is not an error");
    assert!(out.is_empty());
}

#[tokio::test]
async fn malformed_payload_is_parse_error() {
    let svc = QueryService::with_fetcher(Arc::new(MockFetcher::ok("<<< definitely not atom")));
    let err = svc.search("x").await.unwrap_err();
    assert!(matches!(err, QueryError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn fetch_failure_is_not_parsed() {
    let svc = QueryService::with_fetcher(Arc::new(MockFetcher::status(503)));
    let err = svc.search("x").await.unwrap_err();
    assert!(matches!(err, QueryError::Fetch(FetchError::Status(503))));
}

#[tokio::test]
async fn empty_term_is_forwarded_unchanged() {
    let fetcher = Arc::new(MockFetcher::ok(feed(&[])));
    let svc = QueryService::with_fetcher(fetcher.clone());
    svc.search("").await.unwrap();
    svc.search("  fft & ifft ").await.unwrap();
    assert_eq!(
        *fetcher.terms.lock().unwrap(),
        vec!["".to_string(), "  fft & ifft ".to_string()]
    );
}

#[tokio::test]
async fn entry_missing_link_is_skipped_not_fatal() {
    let now = fixture_now();
    let ts = (now - Duration::hours(100)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let no_link = format!(
        "<entry><id>tag:x,2005:Question/NL</id><published>{ts}</published><updated>{ts}</updated></entry>"
    );
    let no_id = format!(
        "<entry><published>{ts}</published><link href=\"https://example.test/answers/NI\"/></entry>"
    );
    let xml = feed(&[
        entry("1", now - Duration::hours(60), false),
        no_link,
        no_id,
        entry("2", now - Duration::hours(90), false),
    ]);
    let fetcher = MockFetcher::ok(xml);
    let out = run_query(&fetcher, "", now, default_window()).await.unwrap();
    let ids: Vec<_> = out.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn mixed_content_title_keeps_neighbouring_entries() {
    let now = fixture_now();
    let ts = (now - Duration::hours(80)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let mixed = format!(
        "<entry><id>tag:x,2005:Question/M</id><title>Use <b>ode45</b> here</title>\
         <published>{ts}</published><updated>{ts}</updated>\
         <link href=\"https://example.test/answers/M\"/></entry>"
    );
    let xml = feed(&[
        entry("1", now - Duration::hours(60), false),
        mixed,
        entry("3", now - Duration::hours(90), true),
    ]);
    let out = run_query(&MockFetcher::ok(xml), "ode45", now, default_window())
        .await
        .expect("one odd entry must not fail the feed");
    let ids: Vec<_> = out.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "M", "3"]);
    assert_eq!(out[1].title, "Use ode45 here");
    assert_eq!(out[2].author.as_ref().map(|a| a.name.as_str()), Some("user3"));
}

#[test]
fn xhtml_content_survives_the_pipeline() {
    let now = fixture_now();
    let ts = (now - Duration::hours(72)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let xml = feed(&[format!(
        "<entry><id>tag:x,2005:Question/X</id><title>xhtml body</title>\
         <published>{ts}</published><link href=\"https://example.test/answers/X\"/>\
         <content type=\"xhtml\"><div xmlns=\"http://www.w3.org/1999/xhtml\">a <b>bold</b> c</div></content></entry>"
    )]);
    let (out, stats) = process_payload(&xml, now, default_window()).unwrap();
    assert_eq!(stats.skipped, 0);
    assert_eq!(out.len(), 1);
    assert!(!out[0].content.is_empty());
    assert!(out[0].content.contains("<b>bold</b>"));
}

#[test]
fn pipeline_is_idempotent_on_same_payload() {
    let now = fixture_now();
    let (first, s1) = process_payload(FEED_XML, now, default_window()).unwrap();
    let (second, s2) = process_payload(FEED_XML, now, default_window()).unwrap();
    assert_eq!(first, second);
    assert_eq!(s1, s2);
    assert_eq!(s1.entries, 4);
    assert_eq!(s1.too_recent, 2);
}

#[tokio::test]
async fn fixture_fetcher_drives_the_service() {
    let svc = QueryService::new(
        Arc::new(AnswersAtomFetcher::from_fixture_str(FEED_XML)),
        Duration::hours(1),
    );
    // 1h window keeps everything older than an hour; entry 4 is 10 min old.
    let out = svc.search_at("", fixture_now()).await.unwrap();
    assert_eq!(out.len(), 3);
}
