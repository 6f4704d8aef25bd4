// src/ingest/scan.rs
//! Streaming walk over the feed document.
//!
//! `entry_spans` checks the root element and cuts the document into one
//! slice per `<entry>`, so each entry decodes on its own. `scan_entry` is the
//! lenient reader used when an entry does not fit the typed schema (mixed
//! content, `type="xhtml"` bodies): text is collected across child elements,
//! and xhtml content keeps its inner markup verbatim.

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

use crate::ingest::error::ParseError;
use crate::ingest::types::{RawAuthor, RawEntry};

fn position(reader: &Reader<&[u8]>) -> usize {
    reader.buffer_position() as usize
}

fn check_root(e: &BytesStart) -> Result<(), ParseError> {
    if e.local_name().as_ref() == b"feed" {
        Ok(())
    } else {
        Err(ParseError::UnexpectedRoot(format!(
            "<{}>",
            String::from_utf8_lossy(e.name().as_ref())
        )))
    }
}

/// Slices of `payload`, one per top-level `<entry>`, in document order.
///
/// Fails when the root is not `<feed>` or the document is not well-formed.
pub fn entry_spans(payload: &str) -> Result<Vec<&str>, ParseError> {
    let mut reader = Reader::from_str(payload);
    reader.config_mut().trim_text(true);

    let mut root_seen = false;
    let mut depth = 0usize;
    let mut entry_start: Option<usize> = None;
    let mut spans = Vec::new();

    loop {
        let before = position(&reader);
        let ev = reader
            .read_event()
            .map_err(|e| ParseError::Xml(e.to_string()))?;
        match ev {
            Event::Start(e) => {
                if !root_seen {
                    check_root(&e)?;
                    root_seen = true;
                } else if depth == 1 && e.local_name().as_ref() == b"entry" {
                    entry_start = Some(before);
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if !root_seen {
                    check_root(&e)?;
                    return Ok(spans);
                }
                if depth == 1 && e.local_name().as_ref() == b"entry" {
                    spans.push(&payload[before..position(&reader)]);
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 1 {
                    if let Some(start) = entry_start.take() {
                        spans.push(&payload[start..position(&reader)]);
                    }
                }
                if depth == 0 {
                    return Ok(spans);
                }
            }
            Event::Text(_) | Event::CData(_) if !root_seen => {
                return Err(ParseError::UnexpectedRoot("text".into()));
            }
            Event::Eof => {
                return Err(if root_seen {
                    ParseError::Xml("document ended inside <feed>".into())
                } else {
                    ParseError::Empty
                });
            }
            _ => {} // declaration, comments, doctype, feed-level text
        }
    }
}

/// True when the element carries `type="xhtml"`.
pub fn is_xhtml(e: &BytesStart) -> bool {
    matches!(
        e.try_get_attribute("type"),
        Ok(Some(a)) if a.value.as_ref() == b"xhtml"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Title,
    Published,
    Updated,
    Content,
    AuthorName,
    AuthorUri,
}

impl Field {
    fn entry_child(name: &[u8]) -> Option<Self> {
        match name {
            b"id" => Some(Field::Id),
            b"title" => Some(Field::Title),
            b"published" => Some(Field::Published),
            b"updated" => Some(Field::Updated),
            b"content" => Some(Field::Content),
            _ => None,
        }
    }

    fn author_child(name: &[u8]) -> Option<Self> {
        match name {
            b"name" => Some(Field::AuthorName),
            b"uri" => Some(Field::AuthorUri),
            _ => None,
        }
    }
}

struct Collector {
    entry: RawEntry,
    author: Option<RawAuthor>,
    links: Vec<(Option<String>, Option<String>)>, // (href, rel)
}

impl Collector {
    fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Id => &mut self.entry.id,
            Field::Title => &mut self.entry.title,
            Field::Published => &mut self.entry.published,
            Field::Updated => &mut self.entry.updated,
            Field::Content => &mut self.entry.content,
            Field::AuthorName => &mut self.author.get_or_insert_with(RawAuthor::default).name,
            Field::AuthorUri => &mut self.author.get_or_insert_with(RawAuthor::default).uri,
        };
        // first occurrence wins, as with the first author block
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fn push_link(&mut self, e: &BytesStart) {
        let attr = |key: &str| {
            e.try_get_attribute(key)
                .ok()
                .flatten()
                .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
        };
        self.links.push((attr("href"), attr("rel")));
    }

    fn finish(mut self) -> RawEntry {
        self.entry.link = self
            .links
            .iter()
            .find(|(href, rel)| href.is_some() && matches!(rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.links.iter().find(|(href, _)| href.is_some()))
            .and_then(|(href, _)| href.clone());
        self.entry.author = self.author;
        self.entry
    }
}

/// Best-effort decode of a single entry span. Never fails: whatever can be
/// read is kept, and required-field checks are left to the normalizer.
pub fn scan_entry(span: &str) -> RawEntry {
    let mut reader = Reader::from_str(span);
    let mut out = Collector {
        entry: RawEntry::default(),
        author: None,
        links: Vec::new(),
    };

    let mut depth = 0usize;
    let mut in_author = false;
    let mut authors_seen = 0usize;
    // field being collected, the depth it opened at, and for xhtml
    // content the byte offset where its inner markup starts
    let mut current: Option<(Field, usize, Option<usize>)> = None;
    let mut text = String::new();

    loop {
        let before = position(&reader);
        let ev = match reader.read_event() {
            Ok(ev) => ev,
            Err(_) => break,
        };
        match ev {
            Event::Start(e) => {
                depth += 1;
                if current.is_some() {
                    continue;
                }
                let name = e.local_name();
                let field = match depth {
                    2 if name.as_ref() == b"author" => {
                        authors_seen += 1;
                        in_author = authors_seen == 1;
                        None
                    }
                    2 if name.as_ref() == b"link" => {
                        out.push_link(&e);
                        None
                    }
                    2 => Field::entry_child(name.as_ref()),
                    3 if in_author => Field::author_child(name.as_ref()),
                    _ => None,
                };
                if let Some(f) = field {
                    let markup_start =
                        (f == Field::Content && is_xhtml(&e)).then(|| position(&reader));
                    current = Some((f, depth, markup_start));
                    text.clear();
                }
            }
            Event::Empty(e) => {
                if current.is_some() {
                    continue;
                }
                let name = e.local_name();
                let field = match depth + 1 {
                    2 if name.as_ref() == b"link" => {
                        out.push_link(&e);
                        None
                    }
                    2 => Field::entry_child(name.as_ref()),
                    3 if in_author => Field::author_child(name.as_ref()),
                    _ => None,
                };
                if let Some(f) = field {
                    out.set(f, String::new());
                }
            }
            Event::Text(t) => {
                if current.is_some() {
                    match t.unescape() {
                        Ok(s) => text.push_str(&s),
                        Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Event::CData(c) => {
                if current.is_some() {
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some((f, opened_at, markup_start)) = current {
                    if depth == opened_at {
                        let value = match markup_start {
                            Some(start) => span[start..before].trim().to_string(),
                            None => text.trim().to_string(),
                        };
                        out.set(f, value);
                        current = None;
                    }
                }
                if depth == 2 && in_author {
                    in_author = false;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    out.finish()
}
