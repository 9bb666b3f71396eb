//! Link index maintenance
//!
//! After every mutation, a note's backlink set holds exactly those other
//! notes whose outgoing links contain the note's slug or one of its
//! aliases. A note never appears in its own backlinks.

use super::Graph;
use notegraph_parser::{parse, Block, Slug};
use std::collections::{HashMap, HashSet};

/// Every slug referenced by slashlinks and wikilinks in `blocks`
pub fn outgoing_links_of(blocks: &[Block]) -> HashSet<Slug> {
    blocks
        .iter()
        .flat_map(Block::spans)
        .filter_map(|span| span.link_target())
        .collect()
}

/// Canonical note slugs reached from a set of link targets, excluding `source`
fn canonical_targets<'a>(graph: &'a Graph, source: &str, targets: &'a HashSet<Slug>) -> HashSet<&'a str> {
    targets
        .iter()
        .filter_map(|target| graph.resolve_note_slug(target))
        .filter(|canonical| *canonical != source)
        .collect()
}

/// Reparse a note and bring every index entry touching it up to date
///
/// Does nothing when `slug` is not a note in the graph.
pub fn update_indexes_for_note(graph: &mut Graph, slug: &str) {
    let Some(note) = graph.notes.get(slug) else {
        return;
    };
    let blocks = parse(&note.content);
    let outgoing = outgoing_links_of(&blocks);
    graph.indexes.blocks.insert(slug.to_string(), blocks);
    graph.indexes.outgoing_links.insert(slug.to_string(), outgoing);
    refresh_backlinks_around(graph, slug);
}

/// Recompute the backlinks of `slug` and its membership in every other
/// note's backlinks
fn refresh_backlinks_around(graph: &mut Graph, slug: &str) {
    let own_aliases: HashSet<Slug> = graph.aliases_of(slug).into_iter().collect();

    let incoming: HashSet<Slug> = graph
        .indexes
        .outgoing_links
        .iter()
        .filter(|(source, _)| source.as_str() != slug)
        .filter(|(_, targets)| {
            targets.contains(slug) || targets.iter().any(|t| own_aliases.contains(t))
        })
        .map(|(source, _)| source.clone())
        .collect();

    let reached: HashSet<Slug> = match graph.indexes.outgoing_links.get(slug) {
        Some(targets) => canonical_targets(graph, slug, targets)
            .into_iter()
            .map(str::to_string)
            .collect(),
        None => HashSet::new(),
    };

    let other_notes: Vec<Slug> = graph
        .notes
        .keys()
        .filter(|other| other.as_str() != slug)
        .cloned()
        .collect();
    for other in other_notes {
        let backlinks = graph.indexes.backlinks.entry(other.clone()).or_default();
        if reached.contains(&other) {
            backlinks.insert(slug.to_string());
        } else {
            backlinks.remove(slug);
        }
    }

    graph.indexes.backlinks.insert(slug.to_string(), incoming);
}

/// Drop `slug` from every index, including other notes' backlinks
pub fn remove_slug_from_indexes(graph: &mut Graph, slug: &str) {
    graph.indexes.blocks.remove(slug);
    graph.indexes.outgoing_links.remove(slug);
    graph.indexes.backlinks.remove(slug);
    for backlinks in graph.indexes.backlinks.values_mut() {
        backlinks.remove(slug);
    }
}

/// Rebuild all indexes from already-parsed blocks
///
/// Notes missing from `parsed` are parsed here.
pub fn rebuild_indexes(graph: &mut Graph, mut parsed: HashMap<Slug, Vec<Block>>) {
    graph.indexes.blocks.clear();
    graph.indexes.outgoing_links.clear();
    graph.indexes.backlinks.clear();

    let slugs: Vec<Slug> = graph.notes.keys().cloned().collect();
    for slug in &slugs {
        let blocks = match parsed.remove(slug) {
            Some(blocks) => blocks,
            None => parse(&graph.notes[slug].content),
        };
        let outgoing = outgoing_links_of(&blocks);
        graph.indexes.blocks.insert(slug.clone(), blocks);
        graph.indexes.outgoing_links.insert(slug.clone(), outgoing);
        graph.indexes.backlinks.insert(slug.clone(), HashSet::new());
    }

    let mut edges: Vec<(Slug, Slug)> = Vec::new();
    for (source, targets) in &graph.indexes.outgoing_links {
        for canonical in canonical_targets(graph, source, targets) {
            edges.push((canonical.to_string(), source.clone()));
        }
    }
    for (target, source) in edges {
        graph
            .indexes
            .backlinks
            .entry(target)
            .or_default()
            .insert(source);
    }
}
