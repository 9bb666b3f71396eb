//! Subwaytext block parser
//!
//! Single forward pass over the lines of a note. Each line becomes exactly one
//! block, except inside a code fence where lines accumulate into the open
//! [`Block::Code`] until the closing fence.
//!
//! Line classification, first match wins:
//! 1. `#` heading
//! 2. `$key value` key-value pair
//! 3. `- ` unordered list item
//! 4. `>` quote
//! 5. `1.` ordered list item
//! 6. ```` ``` ```` code fence
//! 7. whitespace-only line: empty block
//! 8. paragraph

use crate::spans::parse_spans;
use crate::types::Block;
use regex::Regex;
use std::sync::LazyLock;

/// Sigil opening and closing a code block
pub const CODE_FENCE: &str = "```";

/// Escaped form of a literal fence line inside a code block
pub(crate) const ESCAPED_CODE_FENCE: &str = "\\```";

static KEY_VALUE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$([\p{L}\p{M}\p{Nd}_-]+)(\s.*)?$").expect("key-value regex")
});

static ORDERED_LIST_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.(.*)$").expect("ordered list regex"));

/// Split a string into its leading whitespace and the remainder
fn split_leading_whitespace(s: &str) -> (&str, &str) {
    let idx = s.find(|c: char| !c.is_whitespace()).unwrap_or(s.len());
    s.split_at(idx)
}

/// A code block that has been opened but not yet closed
struct OpenCodeBlock {
    whitespace: String,
    content_type: String,
    lines: Vec<String>,
}

impl OpenCodeBlock {
    fn push_line(&mut self, line: &str) {
        let line = if line == ESCAPED_CODE_FENCE {
            CODE_FENCE
        } else {
            line
        };
        self.lines.push(line.to_string());
    }

    fn finish(self, closing: Option<&str>) -> Block {
        Block::Code {
            whitespace: self.whitespace,
            content_type: self.content_type,
            lines: self.lines,
            closing: closing.map(str::to_string),
        }
    }
}

fn parse_line(line: &str) -> Result<Block, OpenCodeBlock> {
    if let Some(rest) = line.strip_prefix('#') {
        let (whitespace, text) = split_leading_whitespace(rest);
        return Ok(Block::Heading {
            whitespace: whitespace.to_string(),
            text: parse_spans(text),
        });
    }

    if let Some(caps) = KEY_VALUE_REGEX.captures(line) {
        let key = caps.get(1).map_or("", |m| m.as_str());
        let rest = caps.get(2).map_or("", |m| m.as_str());
        let (whitespace, value) = split_leading_whitespace(rest);
        return Ok(Block::KeyValuePair {
            key: key.to_string(),
            whitespace: whitespace.to_string(),
            value: parse_spans(value),
        });
    }

    if line.starts_with("- ") {
        let (whitespace, text) = split_leading_whitespace(&line[1..]);
        return Ok(Block::UnorderedListItem {
            whitespace: whitespace.to_string(),
            text: parse_spans(text),
        });
    }

    if let Some(rest) = line.strip_prefix('>') {
        let (whitespace, text) = split_leading_whitespace(rest);
        return Ok(Block::Quote {
            whitespace: whitespace.to_string(),
            text: parse_spans(text),
        });
    }

    if let Some(caps) = ORDERED_LIST_REGEX.captures(line) {
        let index = caps.get(1).map_or("", |m| m.as_str());
        let rest = caps.get(2).map_or("", |m| m.as_str());
        let (whitespace, text) = split_leading_whitespace(rest);
        return Ok(Block::OrderedListItem {
            index: index.to_string(),
            whitespace: whitespace.to_string(),
            text: parse_spans(text),
        });
    }

    if let Some(rest) = line.strip_prefix(CODE_FENCE) {
        let (whitespace, content_type) = split_leading_whitespace(rest);
        return Err(OpenCodeBlock {
            whitespace: whitespace.to_string(),
            content_type: content_type.to_string(),
            lines: Vec::new(),
        });
    }

    if line.trim().is_empty() {
        return Ok(Block::Empty {
            whitespace: line.to_string(),
        });
    }

    Ok(Block::Paragraph {
        text: parse_spans(line),
    })
}

/// Parse raw note text into blocks
///
/// Carriage returns are stripped before the text is split on `\n`. A code
/// fence left open at the end of the input ends the note without a closing
/// fence.
pub fn parse(input: &str) -> Vec<Block> {
    let input = input.replace('\r', "");
    let mut blocks = Vec::new();
    let mut open_code: Option<OpenCodeBlock> = None;

    for line in input.split('\n') {
        if let Some(mut code) = open_code.take() {
            if line.trim_end() == CODE_FENCE {
                blocks.push(code.finish(Some(&line[CODE_FENCE.len()..])));
            } else {
                code.push_line(line);
                open_code = Some(code);
            }
            continue;
        }

        match parse_line(line) {
            Ok(block) => blocks.push(block),
            Err(code) => open_code = Some(code),
        }
    }

    if let Some(code) = open_code {
        blocks.push(code.finish(None));
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlockType, Span};

    fn text(s: &str) -> Vec<Span> {
        vec![Span::NormalText(s.to_string())]
    }

    #[test]
    fn test_heading() {
        assert_eq!(
            parse("#  Title"),
            vec![Block::Heading {
                whitespace: "  ".to_string(),
                text: text("Title"),
            }]
        );
    }

    #[test]
    fn test_key_value_pair() {
        assert_eq!(
            parse("$status  in progress"),
            vec![Block::KeyValuePair {
                key: "status".to_string(),
                whitespace: "  ".to_string(),
                value: text("in progress"),
            }]
        );
        assert_eq!(
            parse("$flag"),
            vec![Block::KeyValuePair {
                key: "flag".to_string(),
                whitespace: String::new(),
                value: Vec::new(),
            }]
        );
    }

    #[test]
    fn test_dollar_amount_is_paragraph() {
        assert_eq!(parse("$5.00 spent")[0].block_type(), BlockType::Paragraph);
    }

    #[test]
    fn test_list_items() {
        let blocks = parse("- first\n12. twelfth\n-not a list");
        assert_eq!(
            blocks,
            vec![
                Block::UnorderedListItem {
                    whitespace: " ".to_string(),
                    text: text("first"),
                },
                Block::OrderedListItem {
                    index: "12".to_string(),
                    whitespace: " ".to_string(),
                    text: text("twelfth"),
                },
                Block::Paragraph {
                    text: text("-not a list"),
                },
            ]
        );
    }

    #[test]
    fn test_quote() {
        assert_eq!(
            parse(">quoted"),
            vec![Block::Quote {
                whitespace: String::new(),
                text: text("quoted"),
            }]
        );
    }

    #[test]
    fn test_code_block() {
        let blocks = parse("```rust\nfn main() {}\n\\```\n# not a heading\n```\nafter");
        assert_eq!(
            blocks,
            vec![
                Block::Code {
                    whitespace: String::new(),
                    content_type: "rust".to_string(),
                    lines: vec![
                        "fn main() {}".to_string(),
                        "```".to_string(),
                        "# not a heading".to_string(),
                    ],
                    closing: Some(String::new()),
                },
                Block::Paragraph {
                    text: text("after"),
                },
            ]
        );
    }

    #[test]
    fn test_closing_fence_allows_trailing_whitespace() {
        let blocks = parse("```\ncode\n```   ");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block_type(), BlockType::Code);
        assert!(matches!(
            &blocks[0],
            Block::Code { closing: Some(trailing), .. } if trailing == "   "
        ));
    }

    #[test]
    fn test_empty_code_block_has_no_lines() {
        assert_eq!(
            parse("```\n```"),
            vec![Block::Code {
                whitespace: String::new(),
                content_type: String::new(),
                lines: Vec::new(),
                closing: Some(String::new()),
            }]
        );
        assert!(matches!(
            &parse("```\n\n```")[0],
            Block::Code { lines, .. } if lines == &vec![String::new()]
        ));
    }

    #[test]
    fn test_unclosed_code_block() {
        let blocks = parse("``` text\nline one\nline two");
        assert_eq!(
            blocks,
            vec![Block::Code {
                whitespace: " ".to_string(),
                content_type: "text".to_string(),
                lines: vec!["line one".to_string(), "line two".to_string()],
                closing: None,
            }]
        );
    }

    #[test]
    fn test_empty_blocks_keep_whitespace() {
        assert_eq!(
            parse("a\n   \n\nb"),
            vec![
                Block::Paragraph { text: text("a") },
                Block::Empty {
                    whitespace: "   ".to_string()
                },
                Block::Empty {
                    whitespace: String::new()
                },
                Block::Paragraph { text: text("b") },
            ]
        );
        assert_eq!(
            parse(""),
            vec![Block::Empty {
                whitespace: String::new()
            }]
        );
    }

    #[test]
    fn test_carriage_returns_are_stripped() {
        assert_eq!(parse("a\r\nb"), parse("a\nb"));
    }

    #[test]
    fn test_links_inside_blocks() {
        let blocks = parse("- see [[Other]] and /slug");
        let spans = blocks[0].spans();
        assert_eq!(spans[1], Span::Wikilink("[[Other]]".to_string()));
        assert_eq!(spans[3], Span::Slashlink("/slug".to_string()));
    }
}
