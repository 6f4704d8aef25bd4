// src/ingest/parser.rs
//! Typed Atom decode. The document either decodes into `RawEntry` values at
//! this boundary or fails with a `ParseError`; nothing half-decoded leaks out.
//!
//! Each `<entry>` is decoded on its own. An entry that does not fit the
//! typed schema (mixed-content title, xhtml body) is read by the lenient
//! scanner instead, so one odd entry never costs the rest of the feed.

use metrics::{counter, histogram};
use serde::Deserialize;

use crate::ingest::error::ParseError;
use crate::ingest::scan;
use crate::ingest::types::{RawAuthor, RawEntry};

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: Option<Text>,
    title: Option<Text>,
    published: Option<Text>,
    updated: Option<Text>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    content: Option<Text>,
    #[serde(rename = "author", default)]
    authors: Vec<AtomPerson>,
}

/// Element text plus its Atom `type` attribute.
#[derive(Debug, Deserialize)]
struct Text {
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "$text", default)]
    value: String,
}

impl Text {
    fn is_xhtml(&self) -> bool {
        self.kind.as_deref() == Some("xhtml")
    }
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomPerson {
    name: Option<Text>,
    uri: Option<Text>,
}

impl From<AtomEntry> for RawEntry {
    fn from(e: AtomEntry) -> Self {
        let link = pick_link(&e.links);
        RawEntry {
            id: e.id.map(|t| t.value),
            title: e.title.map(|t| t.value),
            published: e.published.map(|t| t.value),
            updated: e.updated.map(|t| t.value),
            link,
            content: e.content.map(|t| t.value),
            author: e.authors.into_iter().next().map(|p| RawAuthor {
                name: p.name.map(|t| t.value),
                uri: p.uri.map(|t| t.value),
            }),
        }
    }
}

/// Prefer the `alternate` (or rel-less) link, else whatever link comes first.
fn pick_link(links: &[AtomLink]) -> Option<String> {
    links
        .iter()
        .find(|l| l.href.is_some() && matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.iter().find(|l| l.href.is_some()))
        .and_then(|l| l.href.clone())
}

/// Decode an Atom payload into entries, in document order.
pub fn parse_feed(payload: &str) -> Result<Vec<RawEntry>, ParseError> {
    let t0 = std::time::Instant::now();
    let res = decode(payload);

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    match &res {
        Ok(entries) => counter!("ingest_entries_total").increment(entries.len() as u64),
        Err(_) => counter!("ingest_parse_errors_total").increment(1),
    }
    res
}

fn decode(payload: &str) -> Result<Vec<RawEntry>, ParseError> {
    let payload = payload.trim_start_matches('\u{feff}');
    if payload.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let xml_clean = scrub_html_entities_for_xml(payload);
    // the serde decoder ignores the root element's name, so an HTML error
    // page would decode as an empty feed; the span walk checks it
    let spans = scan::entry_spans(&xml_clean)?;
    Ok(spans
        .into_iter()
        .enumerate()
        .map(|(index, span)| decode_entry(index, span))
        .collect())
}

fn decode_entry(index: usize, span: &str) -> RawEntry {
    match quick_xml::de::from_str::<AtomEntry>(span) {
        Ok(e) => {
            let xhtml_title = e.title.as_ref().is_some_and(Text::is_xhtml);
            let xhtml_content = e.content.as_ref().is_some_and(Text::is_xhtml);
            let mut raw = RawEntry::from(e);
            // serde drops child elements of xhtml constructs; take them from the scan
            if xhtml_title || xhtml_content {
                let scanned = scan::scan_entry(span);
                if xhtml_title {
                    raw.title = scanned.title;
                }
                if xhtml_content {
                    raw.content = scanned.content;
                }
            }
            raw
        }
        Err(e) => {
            tracing::warn!(target: "ingest", index, error = %e, "entry outside typed schema, scanning leniently");
            counter!("ingest_lenient_entries_total").increment(1);
            scan::scan_entry(span)
        }
    }
}

/// Upstream HTML-ish feeds leak named entities that XML does not define.
/// Rewrite them as numeric references so the decoded text is unchanged.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", "&#160;")
        .replace("&ndash;", "&#8211;")
        .replace("&mdash;", "&#8212;")
        .replace("&lsquo;", "&#8216;")
        .replace("&rsquo;", "&#8217;")
        .replace("&ldquo;", "&#8220;")
        .replace("&rdquo;", "&#8221;")
        .replace("&hellip;", "&#8230;")
}
