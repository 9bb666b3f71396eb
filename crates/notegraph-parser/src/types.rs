//! Block and span types produced by the subwaytext parser

use crate::slug::sluggify;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Inline span type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanType {
    /// Plain text
    NormalText,
    /// `http://` or `https://` link running until whitespace
    Hyperlink,
    /// `/slug` reference to a note or file
    Slashlink,
    /// `[[Title]]` reference to a note
    Wikilink,
}

/// One inline run of text within a block
///
/// The payload is the exact source substring including delimiters, so the
/// concatenation of all spans of a line reconstructs that line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum Span {
    NormalText(String),
    Hyperlink(String),
    Slashlink(String),
    Wikilink(String),
}

impl Span {
    /// Exact source text of this span
    pub fn text(&self) -> &str {
        match self {
            Span::NormalText(text)
            | Span::Hyperlink(text)
            | Span::Slashlink(text)
            | Span::Wikilink(text) => text,
        }
    }

    pub fn span_type(&self) -> SpanType {
        match self {
            Span::NormalText(_) => SpanType::NormalText,
            Span::Hyperlink(_) => SpanType::Hyperlink,
            Span::Slashlink(_) => SpanType::Slashlink,
            Span::Wikilink(_) => SpanType::Wikilink,
        }
    }

    /// Inner text of a wikilink without the surrounding brackets
    pub fn wikilink_inner(&self) -> Option<&str> {
        match self {
            Span::Wikilink(text) => text
                .strip_prefix("[[")
                .and_then(|t| t.strip_suffix("]]")),
            _ => None,
        }
    }

    /// Slug referenced by this span, if it is a link to a note or file
    ///
    /// Slashlinks reference their text after the leading `/` verbatim,
    /// wikilinks reference the sluggified inner text.
    pub fn link_target(&self) -> Option<String> {
        match self {
            Span::Slashlink(text) => text
                .strip_prefix('/')
                .filter(|target| !target.is_empty())
                .map(str::to_string),
            Span::Wikilink(_) => self
                .wikilink_inner()
                .map(sluggify)
                .filter(|target| !target.is_empty()),
            _ => None,
        }
    }
}

/// Block type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    Paragraph,
    Heading,
    UnorderedListItem,
    OrderedListItem,
    Code,
    Quote,
    KeyValuePair,
    Empty,
}

impl BlockType {
    /// Get the string representation used in search queries
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Paragraph => "paragraph",
            BlockType::Heading => "heading",
            BlockType::UnorderedListItem => "unordered-list-item",
            BlockType::OrderedListItem => "ordered-list-item",
            BlockType::Code => "code",
            BlockType::Quote => "quote",
            BlockType::KeyValuePair => "key-value-pair",
            BlockType::Empty => "empty",
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paragraph" => Ok(BlockType::Paragraph),
            "heading" => Ok(BlockType::Heading),
            "unordered-list-item" => Ok(BlockType::UnorderedListItem),
            "ordered-list-item" => Ok(BlockType::OrderedListItem),
            "code" => Ok(BlockType::Code),
            "quote" => Ok(BlockType::Quote),
            "key-value-pair" => Ok(BlockType::KeyValuePair),
            "empty" => Ok(BlockType::Empty),
            other => Err(format!("unknown block type: {other}")),
        }
    }
}

/// One structural unit of parsed note content
///
/// `whitespace` fields hold the exact whitespace between a block's sigil and
/// its text so that serialization reproduces the source byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Block {
    Paragraph {
        text: Vec<Span>,
    },
    Heading {
        whitespace: String,
        text: Vec<Span>,
    },
    UnorderedListItem {
        whitespace: String,
        text: Vec<Span>,
    },
    OrderedListItem {
        /// Numeric index exactly as written (`"01"` stays `"01"`)
        index: String,
        whitespace: String,
        text: Vec<Span>,
    },
    Code {
        whitespace: String,
        content_type: String,
        /// Unescaped code lines; a fence directly followed by its closing
        /// fence has none
        lines: Vec<String>,
        /// Whatever follows the closing fence on its line, `None` when the
        /// block runs to the end of the note unclosed
        closing: Option<String>,
    },
    Quote {
        whitespace: String,
        text: Vec<Span>,
    },
    KeyValuePair {
        key: String,
        whitespace: String,
        value: Vec<Span>,
    },
    Empty {
        whitespace: String,
    },
}

impl Block {
    pub fn block_type(&self) -> BlockType {
        match self {
            Block::Paragraph { .. } => BlockType::Paragraph,
            Block::Heading { .. } => BlockType::Heading,
            Block::UnorderedListItem { .. } => BlockType::UnorderedListItem,
            Block::OrderedListItem { .. } => BlockType::OrderedListItem,
            Block::Code { .. } => BlockType::Code,
            Block::Quote { .. } => BlockType::Quote,
            Block::KeyValuePair { .. } => BlockType::KeyValuePair,
            Block::Empty { .. } => BlockType::Empty,
        }
    }

    /// Inline spans of this block; empty for code and empty blocks
    pub fn spans(&self) -> &[Span] {
        match self {
            Block::Paragraph { text }
            | Block::Heading { text, .. }
            | Block::UnorderedListItem { text, .. }
            | Block::OrderedListItem { text, .. }
            | Block::Quote { text, .. } => text,
            Block::KeyValuePair { value, .. } => value,
            Block::Code { .. } | Block::Empty { .. } => &[],
        }
    }

    /// Mutable access to the inline spans, used when rewriting references
    pub fn spans_mut(&mut self) -> Option<&mut Vec<Span>> {
        match self {
            Block::Paragraph { text }
            | Block::Heading { text, .. }
            | Block::UnorderedListItem { text, .. }
            | Block::OrderedListItem { text, .. }
            | Block::Quote { text, .. } => Some(text),
            Block::KeyValuePair { value, .. } => Some(value),
            Block::Code { .. } | Block::Empty { .. } => None,
        }
    }
}
