//! Notegraph Markup Parser
//!
//! Parser, serializer and slug utilities for *subwaytext*, the line-oriented
//! markup every notegraph note is written in.
//!
//! This crate provides:
//! - [`parse`]: raw note text into an ordered sequence of typed [`Block`]s
//! - [`serialize`]: the exact inverse of [`parse`] (`serialize(&parse(x)) == x`)
//! - Inline span tokenization (plain text, hyperlinks, slashlinks, wikilinks)
//! - Slug normalisation and validation ([`sluggify`], [`is_valid_slug`], ...)
//! - Title inference and media-type detection used by the indexes
//!
//! Everything here is pure and synchronous; the graph store in `notegraph-core`
//! calls into it from worker threads during cold load.

pub mod error;
pub mod media;
pub mod parser;
pub mod serializer;
pub mod slug;
pub mod spans;
pub mod title;
pub mod types;

pub use error::{SlugError, SlugResult};
pub use media::MediaType;
pub use parser::{parse, CODE_FENCE};
pub use serializer::serialize;
pub use slug::{
    create_slug, ensure_valid_note_slug, ensure_valid_slug, get_slug_for_new_file,
    is_valid_note_slug, is_valid_slug, sluggify, sluggify_filename, Slug, MAX_SLUG_LENGTH,
};
pub use spans::parse_spans;
pub use title::infer_note_title;
pub use types::{Block, BlockType, Span, SpanType};
