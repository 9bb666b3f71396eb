//! Subwaytext serializer, the inverse of [`crate::parse`]

use crate::parser::{CODE_FENCE, ESCAPED_CODE_FENCE};
use crate::types::{Block, Span};

fn spans_to_string(spans: &[Span]) -> String {
    spans.iter().map(Span::text).collect()
}

fn serialize_code(
    whitespace: &str,
    content_type: &str,
    lines: &[String],
    closing: Option<&str>,
) -> String {
    let mut out = format!("{CODE_FENCE}{whitespace}{content_type}");
    for line in lines {
        out.push('\n');
        let line = line.as_str();
        out.push_str(if line == CODE_FENCE { ESCAPED_CODE_FENCE } else { line });
    }
    if let Some(trailing) = closing {
        out.push('\n');
        out.push_str(CODE_FENCE);
        out.push_str(trailing);
    }
    out
}

fn serialize_block(block: &Block) -> String {
    match block {
        Block::Paragraph { text } => spans_to_string(text),
        Block::Heading { whitespace, text } => {
            format!("#{}{}", whitespace, spans_to_string(text))
        }
        Block::UnorderedListItem { whitespace, text } => {
            format!("-{}{}", whitespace, spans_to_string(text))
        }
        Block::OrderedListItem {
            index,
            whitespace,
            text,
        } => format!("{}.{}{}", index, whitespace, spans_to_string(text)),
        Block::Quote { whitespace, text } => {
            format!(">{}{}", whitespace, spans_to_string(text))
        }
        Block::KeyValuePair {
            key,
            whitespace,
            value,
        } => format!("${}{}{}", key, whitespace, spans_to_string(value)),
        Block::Code {
            whitespace,
            content_type,
            lines,
            closing,
        } => serialize_code(whitespace, content_type, lines, closing.as_deref()),
        Block::Empty { whitespace } => whitespace.clone(),
    }
}

/// Serialize blocks back into note text, joining blocks with `\n`
pub fn serialize(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(serialize_block)
        .collect::<Vec<_>>()
        .join("\n")
}
