//! Graph statistics

use super::NotesProvider;
use crate::error::NotegraphResult;
use crate::graph::Graph;
use crate::note::{GraphSize, GraphStats, StatsOptions};

/// Counts derivable from the graph alone
fn count_stats(graph: &Graph) -> GraphStats {
    let mut number_of_links = 0;
    let mut number_of_unlinked_notes = 0;
    for slug in graph.notes.keys() {
        let outgoing = graph.outgoing_note_slugs(slug).len();
        number_of_links += outgoing;
        let has_backlinks = graph
            .indexes
            .backlinks
            .get(slug)
            .is_some_and(|backlinks| !backlinks.is_empty());
        if outgoing == 0 && !has_backlinks {
            number_of_unlinked_notes += 1;
        }
    }

    GraphStats {
        number_of_all_notes: graph.notes.len(),
        number_of_links,
        number_of_files: graph.files.len(),
        number_of_pins: graph
            .pinned_notes
            .iter()
            .filter(|slug| graph.notes.contains_key(slug.as_str()))
            .count(),
        number_of_aliases: graph.aliases.len(),
        number_of_unlinked_notes,
        size: None,
    }
}

impl NotesProvider {
    pub async fn get_stats(&self, options: StatsOptions) -> NotegraphResult<GraphStats> {
        let graph = self.io.read().await?;
        let mut stats = count_stats(&graph);
        if options.include_size {
            stats.size = Some(GraphSize {
                graph: self.io.total_size().await?,
                files: graph.files.values().map(|file| file.size).sum(),
            });
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::indexes::update_indexes_for_note;
    use crate::note::{ExistingNote, NoteMeta};

    fn graph_of(notes: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for (slug, content) in notes {
            graph.notes.insert(
                slug.to_string(),
                ExistingNote {
                    content: content.to_string(),
                    meta: NoteMeta::new(*slug),
                },
            );
        }
        for (slug, _) in notes {
            update_indexes_for_note(&mut graph, slug);
        }
        graph
    }

    #[test]
    fn test_links_counted_once_per_pair() {
        let graph = graph_of(&[
            ("a", "/b /b [[B]] /a"),
            ("b", "B"),
            ("c", "[[Missing]] /nowhere"),
        ]);
        let stats = count_stats(&graph);
        assert_eq!(stats.number_of_all_notes, 3);
        assert_eq!(stats.number_of_links, 1);
        assert_eq!(stats.number_of_unlinked_notes, 1);
    }
}
