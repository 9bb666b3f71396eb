//! Inline span tokenizer
//!
//! Splits one line of text into [`Span`]s. The cursor walks Unicode scalar
//! values, never bytes, so multi-byte characters next to link delimiters are
//! handled like any other character.
//!
//! Links are recognised as follows:
//! - Hyperlink: at start of line or after whitespace, `http:/` or `https:/`,
//!   running until the next whitespace.
//! - Slashlink: at start of line or after whitespace, `/` followed by a letter,
//!   digit or `_`, running until the next whitespace, and the run must also end
//!   in a letter, digit or `_`.
//! - Wikilink: `[[` with a closing `]]` later on the line and no `[` or `]` in
//!   between.

use crate::types::Span;

const HTTP_PREFIX: [char; 6] = ['h', 't', 't', 'p', ':', '/'];
const HTTPS_PREFIX: [char; 7] = ['h', 't', 't', 'p', 's', ':', '/'];

fn is_slug_boundary_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn starts_with_at(chars: &[char], pos: usize, prefix: &[char]) -> bool {
    chars.len() >= pos + prefix.len() && &chars[pos..pos + prefix.len()] == prefix
}

/// Index of the first whitespace at or after `pos`, or the line length
fn run_end(chars: &[char], pos: usize) -> usize {
    chars[pos..]
        .iter()
        .position(|c| c.is_whitespace())
        .map_or(chars.len(), |offset| pos + offset)
}

fn slashlink_end(chars: &[char], pos: usize) -> Option<usize> {
    if chars.get(pos) != Some(&'/') {
        return None;
    }
    if !chars.get(pos + 1).copied().is_some_and(is_slug_boundary_char) {
        return None;
    }
    let end = run_end(chars, pos);
    is_slug_boundary_char(chars[end - 1]).then_some(end)
}

/// Exclusive end index of a wikilink starting at `pos`
fn wikilink_end(chars: &[char], pos: usize) -> Option<usize> {
    if !starts_with_at(chars, pos, &['[', '[']) {
        return None;
    }
    let mut cursor = pos + 2;
    while cursor + 1 < chars.len() {
        match chars[cursor] {
            ']' if chars[cursor + 1] == ']' => return Some(cursor + 2),
            '[' | ']' => return None,
            _ => cursor += 1,
        }
    }
    None
}

fn flush_text(spans: &mut Vec<Span>, text: &mut String) {
    if !text.is_empty() {
        spans.push(Span::NormalText(std::mem::take(text)));
    }
}

/// Tokenize a single line into spans
///
/// The concatenation of the returned span texts is always equal to `line`.
pub fn parse_spans(line: &str) -> Vec<Span> {
    let chars: Vec<char> = line.chars().collect();
    let mut spans = Vec::new();
    let mut text = String::new();
    let mut pos = 0;

    while pos < chars.len() {
        let at_boundary = pos == 0 || chars[pos - 1].is_whitespace();

        if at_boundary
            && (starts_with_at(&chars, pos, &HTTPS_PREFIX)
                || starts_with_at(&chars, pos, &HTTP_PREFIX))
        {
            flush_text(&mut spans, &mut text);
            let end = run_end(&chars, pos);
            spans.push(Span::Hyperlink(chars[pos..end].iter().collect()));
            pos = end;
            continue;
        }

        if at_boundary {
            if let Some(end) = slashlink_end(&chars, pos) {
                flush_text(&mut spans, &mut text);
                spans.push(Span::Slashlink(chars[pos..end].iter().collect()));
                pos = end;
                continue;
            }
        }

        if let Some(end) = wikilink_end(&chars, pos) {
            flush_text(&mut spans, &mut text);
            spans.push(Span::Wikilink(chars[pos..end].iter().collect()));
            pos = end;
            continue;
        }

        text.push(chars[pos]);
        pos += 1;
    }

    flush_text(&mut spans, &mut text);
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(spans: &[Span]) -> String {
        spans.iter().map(Span::text).collect()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            parse_spans("just some text"),
            vec![Span::NormalText("just some text".to_string())]
        );
        assert!(parse_spans("").is_empty());
    }

    #[test]
    fn test_hyperlink() {
        let spans = parse_spans("see https://example.com/a?b=c for more");
        assert_eq!(
            spans,
            vec![
                Span::NormalText("see ".to_string()),
                Span::Hyperlink("https://example.com/a?b=c".to_string()),
                Span::NormalText(" for more".to_string()),
            ]
        );
    }

    #[test]
    fn test_hyperlink_requires_boundary() {
        let spans = parse_spans("xhttp://example.com");
        assert_eq!(spans, vec![Span::NormalText("xhttp://example.com".to_string())]);
    }

    #[test]
    fn test_slashlink() {
        let spans = parse_spans("/notes/rust is linked");
        assert_eq!(
            spans,
            vec![
                Span::Slashlink("/notes/rust".to_string()),
                Span::NormalText(" is linked".to_string()),
            ]
        );
    }

    #[test]
    fn test_slashlink_rejects_trailing_punctuation_and_paths() {
        assert_eq!(
            parse_spans("see /note."),
            vec![Span::NormalText("see /note.".to_string())]
        );
        assert_eq!(
            parse_spans("and/or"),
            vec![Span::NormalText("and/or".to_string())]
        );
        assert_eq!(
            parse_spans("/ alone"),
            vec![Span::NormalText("/ alone".to_string())]
        );
        assert_eq!(
            parse_spans("/.hidden"),
            vec![Span::NormalText("/.hidden".to_string())]
        );
    }

    #[test]
    fn test_wikilink() {
        let spans = parse_spans("A [[Note 1]] and [[Ünïcödé]]!");
        assert_eq!(
            spans,
            vec![
                Span::NormalText("A ".to_string()),
                Span::Wikilink("[[Note 1]]".to_string()),
                Span::NormalText(" and ".to_string()),
                Span::Wikilink("[[Ünïcödé]]".to_string()),
                Span::NormalText("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_unclosed_or_nested_wikilink_is_text() {
        assert_eq!(
            parse_spans("[[open"),
            vec![Span::NormalText("[[open".to_string())]
        );
        let spans = parse_spans("[[a [[b]]");
        assert_eq!(
            spans,
            vec![
                Span::NormalText("[[a ".to_string()),
                Span::Wikilink("[[b]]".to_string()),
            ]
        );
    }

    #[test]
    fn test_wikilink_without_boundary() {
        let spans = parse_spans("prefix[[link]]suffix");
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1], Span::Wikilink("[[link]]".to_string()));
    }

    #[test]
    fn test_spans_reconstruct_line() {
        let lines = [
            "mixed /a and [[b]] and https://c.d/e plus /f.",
            "  leading whitespace [[x]]",
            "日本語 /日本 [[日本]]",
            "[[]] ]] [[ [",
        ];
        for line in lines {
            assert_eq!(concat(&parse_spans(line)), line);
        }
    }
}
