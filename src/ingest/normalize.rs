// src/ingest/normalize.rs
//! RawEntry -> Question mapping.
//!
//! Only the identifier, the link and a parsable `published` timestamp are
//! required. Everything else degrades: missing title/content become empty
//! strings, an unusable `updated` falls back to `published`, and an author
//! block without both name and uri is dropped as a whole.
//!
//! The id is the last segment after either `:` or `/`, so
//! `tag:host,2005:Question/2120001` becomes `2120001`. The previous backend
//! split on `:` only and returned `Question/2120001`; clients that stored
//! those ids need to map them.

use crate::ingest::error::NormalizeError;
use crate::ingest::types::{parse_timestamp, Author, Question, RawAuthor, RawEntry};

/// Upstream identifiers look like `tag:host,2005:Question/123` or plain URLs.
const ID_SEPARATORS: [char; 2] = [':', '/'];

pub fn normalize(raw: RawEntry) -> Result<Question, NormalizeError> {
    let id = extract_id(raw.id.as_deref())?;

    let link = non_blank(raw.link).ok_or(NormalizeError::MissingLink)?;

    let published = match raw.published {
        Some(p) if parse_timestamp(&p).is_some() => p,
        other => return Err(NormalizeError::InvalidPublished(other)),
    };

    let updated = match raw.updated {
        Some(u) if parse_timestamp(&u).is_some() => u,
        _ => published.clone(),
    };

    Ok(Question {
        id,
        title: raw.title.unwrap_or_default(),
        published,
        updated,
        link,
        content: raw.content.unwrap_or_default(),
        author: raw.author.and_then(normalize_author),
    })
}

/// Last segment of the identifier after splitting on `:` and `/`.
pub fn extract_id(raw: Option<&str>) -> Result<String, NormalizeError> {
    let raw = raw.ok_or(NormalizeError::MissingId)?;
    let last = raw.trim().rsplit(ID_SEPARATORS).next().unwrap_or_default();
    if last.is_empty() {
        return Err(NormalizeError::EmptyId(raw.to_string()));
    }
    Ok(last.to_string())
}

fn normalize_author(raw: RawAuthor) -> Option<Author> {
    let name = non_blank(raw.name)?;
    let uri = non_blank(raw.uri)?;
    Some(Author { name, uri })
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}
