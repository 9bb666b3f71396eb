//! Search filters
//!
//! Each filter narrows a candidate list of notes. Filters are applied in
//! query order, so later tokens only see what earlier tokens kept.

use super::query::QueryToken;
use crate::graph::Graph;
use crate::note::ExistingNote;
use notegraph_parser::{infer_note_title, Block, BlockType, MediaType, Span};
use std::collections::HashMap;
use std::str::FromStr;

/// Which notes `duplicates:` compares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DuplicateKind {
    Url,
    Title,
}

/// A parsed filter token
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Filter {
    /// `None` for an unknown kind, which matches nothing
    Duplicates(Option<DuplicateKind>),
    Exact(String),
    HasUrl(bool),
    HasFile(bool),
    LinksTo(String),
    HasFlag(String),
    HasBlock(Vec<BlockType>),
    HasMedia(Vec<MediaType>),
    FullText(String),
    KeyValue { key: String, value: String },
    Default(String),
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "" | "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl Filter {
    /// Interpret a query token; unknown keys search for the whole token text
    pub(crate) fn from_token(token: &QueryToken) -> Self {
        let value = token.value.clone();
        let fallback = || Filter::Default(token.text());
        match token.key.as_str() {
            "" => Filter::Default(value),
            "duplicates" => match value.as_str() {
                "url" => Filter::Duplicates(Some(DuplicateKind::Url)),
                "title" => Filter::Duplicates(Some(DuplicateKind::Title)),
                _ => Filter::Duplicates(None),
            },
            "exact" => Filter::Exact(value),
            "has-url" => parse_bool(&value).map_or_else(fallback, Filter::HasUrl),
            "has-file" => parse_bool(&value).map_or_else(fallback, Filter::HasFile),
            "links-to" => Filter::LinksTo(value),
            "has-flag" => Filter::HasFlag(value),
            "has-block" => Filter::HasBlock(
                value
                    .split('|')
                    .filter_map(|name| BlockType::from_str(name.trim()).ok())
                    .collect(),
            ),
            "has-media" => Filter::HasMedia(
                value
                    .split('|')
                    .filter_map(|name| MediaType::from_str(name.trim()).ok())
                    .collect(),
            ),
            "ft" => Filter::FullText(value),
            key if key.len() > 1 && key.starts_with('$') => Filter::KeyValue {
                key: key[1..].to_string(),
                value,
            },
            _ => fallback(),
        }
    }
}

/// Case handling for substring matches
#[derive(Debug, Clone, Copy)]
pub(crate) struct Matcher {
    pub case_sensitive: bool,
}

impl Matcher {
    fn contains(&self, haystack: &str, needle: &str) -> bool {
        if self.case_sensitive {
            haystack.contains(needle)
        } else {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }
    }
}

fn hyperlinks_of<'a>(graph: &'a Graph, note: &ExistingNote) -> impl Iterator<Item = &'a str> {
    graph
        .blocks_of(note.slug())
        .iter()
        .flat_map(|block| block.spans())
        .filter_map(|span| match span {
            Span::Hyperlink(url) => Some(url.as_str()),
            _ => None,
        })
}

/// Keep notes that share a hyperlink or a title with another candidate
fn duplicates<'a>(
    graph: &Graph,
    candidates: Vec<&'a ExistingNote>,
    kind: DuplicateKind,
) -> Vec<&'a ExistingNote> {
    let keys_of = |note: &ExistingNote| -> Vec<String> {
        match kind {
            DuplicateKind::Url => {
                let mut urls: Vec<String> =
                    hyperlinks_of(graph, note).map(str::to_string).collect();
                urls.sort();
                urls.dedup();
                urls
            }
            DuplicateKind::Title => vec![infer_note_title(&note.content)],
        }
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    for note in &candidates {
        for key in keys_of(note) {
            *counts.entry(key).or_default() += 1;
        }
    }
    candidates
        .into_iter()
        .filter(|note| {
            keys_of(note)
                .iter()
                .any(|key| counts.get(key).is_some_and(|count| *count > 1))
        })
        .collect()
}

/// Apply one filter to the candidate list
pub(crate) fn apply<'a>(
    graph: &Graph,
    candidates: Vec<&'a ExistingNote>,
    filter: &Filter,
    matcher: Matcher,
) -> Vec<&'a ExistingNote> {
    let keep = |predicate: &dyn Fn(&ExistingNote) -> bool| -> Vec<&'a ExistingNote> {
        candidates
            .iter()
            .copied()
            .filter(|note| predicate(note))
            .collect()
    };

    match filter {
        Filter::Duplicates(Some(kind)) => duplicates(graph, candidates.clone(), *kind),
        Filter::Duplicates(None) => Vec::new(),
        Filter::Exact(title) => keep(&|note| infer_note_title(&note.content) == *title),
        Filter::HasUrl(wanted) => {
            keep(&|note| hyperlinks_of(graph, note).next().is_some() == *wanted)
        }
        Filter::HasFile(wanted) => {
            keep(&|note| graph.file_slugs_of(note.slug()).is_empty() != *wanted)
        }
        Filter::LinksTo(target) => {
            // Links through an alias count as links to its note
            let canonical = graph.resolve_note_slug(target).unwrap_or(target);
            keep(&|note| {
                graph
                    .indexes
                    .outgoing_links
                    .get(note.slug())
                    .is_some_and(|links| {
                        links.iter().any(|link| {
                            link == target || graph.resolve_note_slug(link) == Some(canonical)
                        })
                    })
            })
        }
        Filter::HasFlag(flag) => keep(&|note| note.meta.flags.iter().any(|f| f == flag)),
        Filter::HasBlock(types) => keep(&|note| {
            graph
                .blocks_of(note.slug())
                .iter()
                .any(|block| types.contains(&block.block_type()))
        }),
        Filter::HasMedia(types) => keep(&|note| {
            graph
                .file_slugs_of(note.slug())
                .iter()
                .any(|file| types.contains(&MediaType::from_filename(file)))
        }),
        Filter::FullText(value) => keep(&|note| {
            value
                .split_whitespace()
                .all(|word| matcher.contains(&note.content, word))
        }),
        Filter::KeyValue { key, value } => keep(&|note| {
            graph.blocks_of(note.slug()).iter().any(|block| match block {
                Block::KeyValuePair {
                    key: k,
                    value: spans,
                    ..
                } => {
                    k == key && {
                        let text: String = spans.iter().map(Span::text).collect();
                        value.is_empty() || matcher.contains(&text, value)
                    }
                }
                _ => false,
            })
        }),
        Filter::Default(value) => keep(&|note| {
            matcher.contains(&infer_note_title(&note.content), value)
                || matcher.contains(note.slug(), value)
                || graph
                    .aliases_of(note.slug())
                    .iter()
                    .any(|alias| matcher.contains(alias, value))
        }),
    }
}
