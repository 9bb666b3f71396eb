//! On-disk encoding of graph objects
//!
//! Notes, aliases and file sidecars share one format: a run of
//! `:key:value` header lines, a blank separator line, then the note content.
//! Aliases and sidecars have headers only.
//!
//! ```text
//! :created-at:2024-01-01T10:00:00+00:00
//! :updated-at:2024-01-02T10:00:00+00:00
//! :neno-flags:draft,idea
//!
//! # Note title
//! ```
//!
//! The kind of object is decided by its headers: `alias-of` marks an alias,
//! `file` marks a file sidecar, anything else is a note.

use crate::error::{NotegraphError, NotegraphResult};
use crate::note::{ExistingNote, FileInfo, NoteMeta};
use chrono::{DateTime, Utc};
use notegraph_parser::{is_valid_note_slug, is_valid_slug, Slug};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::warn;

pub const HEADER_CREATED_AT: &str = "created-at";
pub const HEADER_UPDATED_AT: &str = "updated-at";
pub const HEADER_FLAGS: &str = "neno-flags";
pub const HEADER_ALIAS_OF: &str = "alias-of";
pub const HEADER_FILE: &str = "file";
pub const HEADER_SIZE: &str = "size";

static HEADER_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([^:\s]+):(.*)$").expect("header line regex"));

/// A decoded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphObject {
    Note(ExistingNote),
    Alias { slug: Slug, canonical: Slug },
    File(FileInfo),
}

/// Split a raw object into its ordered headers and the remaining content
pub fn split_headers(raw: &str) -> (Vec<(String, String)>, String) {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let lines: Vec<&str> = raw.split('\n').collect();
    let mut headers = Vec::new();
    let mut body_start = 0;

    for line in &lines {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match HEADER_LINE_REGEX.captures(line) {
            Some(caps) => {
                headers.push((caps[1].to_string(), caps[2].to_string()));
                body_start += 1;
            }
            None => break,
        }
    }

    // The blank separator belongs to the header section
    let separator = lines
        .get(body_start)
        .is_some_and(|line| line.trim_end_matches('\r').is_empty());
    if !headers.is_empty() && separator {
        body_start += 1;
    }

    let content = lines
        .get(body_start..)
        .map(|rest| rest.join("\n"))
        .unwrap_or_default();
    (headers, content)
}

fn join_headers(headers: &[(&str, String)]) -> String {
    headers
        .iter()
        .map(|(key, value)| format!(":{key}:{value}\n"))
        .collect()
}

fn parse_timestamp(slug: &str, key: &str, value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value.trim()) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            warn!(slug, header = key, value, error = %e, "Ignoring unparseable timestamp");
            None
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a note with its metadata headers
pub fn serialize_note(note: &ExistingNote) -> String {
    let meta = &note.meta;
    let mut headers: Vec<(&str, String)> = Vec::new();
    if let Some(created_at) = &meta.created_at {
        headers.push((HEADER_CREATED_AT, format_timestamp(created_at)));
    }
    if let Some(updated_at) = &meta.updated_at {
        headers.push((HEADER_UPDATED_AT, format_timestamp(updated_at)));
    }
    if !meta.flags.is_empty() {
        headers.push((HEADER_FLAGS, meta.flags.join(",")));
    }
    for (key, value) in &meta.additional_headers {
        headers.push((key.as_str(), value.clone()));
    }

    if headers.is_empty() {
        return note.content.clone();
    }
    format!("{}\n{}", join_headers(&headers), note.content)
}

pub fn serialize_alias(canonical: &str) -> String {
    join_headers(&[(HEADER_ALIAS_OF, canonical.to_string())])
}

pub fn serialize_file_info(info: &FileInfo) -> String {
    let mut headers = vec![
        (HEADER_FILE, info.filename.clone()),
        (HEADER_SIZE, info.size.to_string()),
    ];
    if let Some(created_at) = &info.created_at {
        headers.push((HEADER_CREATED_AT, format_timestamp(created_at)));
    }
    if let Some(updated_at) = &info.updated_at {
        headers.push((HEADER_UPDATED_AT, format_timestamp(updated_at)));
    }
    join_headers(&headers)
}

/// Encode a pin list, one slug per line
pub fn serialize_pins(pins: &[Slug]) -> String {
    pins.join("\n")
}

pub fn parse_pins(raw: &str) -> Vec<Slug> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode the object stored under `slug`
pub fn parse_graph_object(slug: &str, raw: &str) -> NotegraphResult<GraphObject> {
    let (headers, content) = split_headers(raw);

    if let Some((_, canonical)) = headers.iter().find(|(key, _)| key == HEADER_ALIAS_OF) {
        let canonical = canonical.trim();
        if !is_valid_note_slug(slug) || !is_valid_note_slug(canonical) {
            return Err(NotegraphError::InvalidNoteStructure(format!(
                "alias {slug} points at invalid slug {canonical:?}"
            )));
        }
        return Ok(GraphObject::Alias {
            slug: slug.to_string(),
            canonical: canonical.to_string(),
        });
    }

    if let Some((_, filename)) = headers.iter().find(|(key, _)| key == HEADER_FILE) {
        if !is_valid_slug(slug) {
            return Err(NotegraphError::InvalidNoteStructure(format!(
                "file sidecar has invalid slug {slug:?}"
            )));
        }
        let size = headers
            .iter()
            .find(|(key, _)| key == HEADER_SIZE)
            .and_then(|(_, value)| value.trim().parse::<u64>().ok())
            .ok_or_else(|| {
                NotegraphError::InvalidNoteStructure(format!("file {slug} has no valid size"))
            })?;
        let mut info = FileInfo {
            slug: slug.to_string(),
            filename: filename.clone(),
            size,
            created_at: None,
            updated_at: None,
        };
        for (key, value) in &headers {
            match key.as_str() {
                HEADER_CREATED_AT => info.created_at = parse_timestamp(slug, key, value),
                HEADER_UPDATED_AT => info.updated_at = parse_timestamp(slug, key, value),
                _ => {}
            }
        }
        return Ok(GraphObject::File(info));
    }

    if !is_valid_note_slug(slug) {
        return Err(NotegraphError::InvalidNoteStructure(format!(
            "note has invalid slug {slug:?}"
        )));
    }

    let mut meta = NoteMeta::new(slug);
    let mut additional_headers = BTreeMap::new();
    for (key, value) in headers {
        match key.as_str() {
            HEADER_CREATED_AT => meta.created_at = parse_timestamp(slug, &key, &value),
            HEADER_UPDATED_AT => meta.updated_at = parse_timestamp(slug, &key, &value),
            HEADER_FLAGS => {
                meta.flags = value
                    .split(',')
                    .map(str::trim)
                    .filter(|flag| !flag.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ => {
                additional_headers.insert(key, value);
            }
        }
    }
    meta.additional_headers = additional_headers;

    Ok(GraphObject::Note(ExistingNote { content, meta }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_note() -> ExistingNote {
        let mut meta = NoteMeta::new("my-note");
        meta.created_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
        meta.updated_at = Some(Utc.with_ymd_and_hms(2024, 1, 2, 11, 30, 0).unwrap());
        meta.flags = vec!["draft".into(), "idea".into()];
        meta.additional_headers.insert("custom".into(), "value: with colon".into());
        ExistingNote {
            content: "# My Note\n\nbody\n".into(),
            meta,
        }
    }

    #[test]
    fn test_note_survives_encoding() {
        let note = sample_note();
        let raw = serialize_note(&note);
        assert!(raw.starts_with(":created-at:2024-01-01T10:00:00+00:00\n"));
        assert!(raw.contains(":neno-flags:draft,idea\n"));

        assert_eq!(
            parse_graph_object("my-note", &raw).unwrap(),
            GraphObject::Note(note)
        );
    }

    #[test]
    fn test_note_without_headers() {
        let GraphObject::Note(note) = parse_graph_object("plain", "just text\nmore").unwrap()
        else {
            panic!("expected a note");
        };
        assert_eq!(note.content, "just text\nmore");
        assert_eq!(note.meta.created_at, None);
        assert!(note.meta.flags.is_empty());
    }

    #[test]
    fn test_empty_content_with_headers() {
        let mut note = sample_note();
        note.content = String::new();
        let raw = serialize_note(&note);
        assert_eq!(
            parse_graph_object("my-note", &raw).unwrap(),
            GraphObject::Note(note)
        );
    }

    #[test]
    fn test_content_starting_with_colon_line_is_kept_after_separator() {
        let mut note = sample_note();
        note.content = ":not:a header\nbody".into();
        let raw = serialize_note(&note);
        let GraphObject::Note(decoded) = parse_graph_object("my-note", &raw).unwrap() else {
            panic!("expected a note");
        };
        assert_eq!(decoded.content, ":not:a header\nbody");
    }

    #[test]
    fn test_alias_object() {
        let raw = serialize_alias("canonical");
        assert_eq!(raw, ":alias-of:canonical\n");
        assert_eq!(
            parse_graph_object("nickname", &raw).unwrap(),
            GraphObject::Alias {
                slug: "nickname".into(),
                canonical: "canonical".into()
            }
        );
        assert!(parse_graph_object("nickname", ":alias-of:bad slug\n").is_err());
    }

    #[test]
    fn test_file_sidecar() {
        let info = FileInfo {
            slug: "files/report.pdf".into(),
            filename: "Report.pdf".into(),
            size: 1024,
            created_at: Some(Utc.with_ymd_and_hms(2024, 3, 3, 0, 0, 0).unwrap()),
            updated_at: None,
        };
        let raw = serialize_file_info(&info);
        assert_eq!(
            parse_graph_object("files/report.pdf", &raw).unwrap(),
            GraphObject::File(info)
        );

        let err = parse_graph_object("files/x.pdf", ":file:x.pdf\n:size:lots\n").unwrap_err();
        assert_eq!(err.code(), "INVALID_NOTE_STRUCTURE");
    }

    #[test]
    fn test_bad_timestamp_is_dropped() {
        let GraphObject::Note(note) =
            parse_graph_object("n", ":created-at:yesterday\n\ntext").unwrap()
        else {
            panic!("expected a note");
        };
        assert_eq!(note.meta.created_at, None);
        assert_eq!(note.content, "text");
    }

    #[test]
    fn test_pins() {
        let pins = vec!["a".to_string(), "b/c".to_string()];
        assert_eq!(parse_pins(&serialize_pins(&pins)), pins);
        assert!(parse_pins("\n\n").is_empty());
    }
}
