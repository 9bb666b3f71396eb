//! Pinned notes

use super::{NotesProvider, Persist};
use crate::error::{NotegraphError, NotegraphResult};
use crate::graph::Graph;
use crate::note::NoteListItem;
use crate::storage::GraphChanges;
use tracing::debug;

/// List views of pinned notes that still exist, in pin order
fn pinned_items(graph: &Graph) -> Vec<NoteListItem> {
    graph.list_items(&graph.pinned_notes)
}

impl NotesProvider {
    pub async fn get_pins(&self) -> NotegraphResult<Vec<NoteListItem>> {
        let graph = self.io.read().await?;
        Ok(pinned_items(&graph))
    }

    /// Append a note to the pins; pinning twice is a no-op
    pub async fn pin(&self, slug: &str) -> NotegraphResult<Vec<NoteListItem>> {
        let mut graph = self.io.write().await?;
        if !graph.notes.contains_key(slug) {
            return Err(NotegraphError::NoteNotFound(slug.to_string()));
        }
        if !graph.pinned_notes.iter().any(|pinned| pinned == slug) {
            graph.pinned_notes.push(slug.to_string());
            self.commit(&graph, GraphChanges::new().pins(), Persist::Immediately)
                .await?;
            debug!(%slug, "Pinned note");
        }
        Ok(pinned_items(&graph))
    }

    /// Remove a note from the pins; unpinning an unpinned note is a no-op
    pub async fn unpin(&self, slug: &str) -> NotegraphResult<Vec<NoteListItem>> {
        let mut graph = self.io.write().await?;
        let before = graph.pinned_notes.len();
        graph.pinned_notes.retain(|pinned| pinned != slug);
        if graph.pinned_notes.len() != before {
            self.commit(&graph, GraphChanges::new().pins(), Persist::Immediately)
                .await?;
            debug!(%slug, "Unpinned note");
        }
        Ok(pinned_items(&graph))
    }

    /// Move a pin by `offset` positions, clamped to the ends of the list
    ///
    /// A move that leaves the pin where it was writes nothing.
    pub async fn move_pin_position(
        &self,
        slug: &str,
        offset: isize,
    ) -> NotegraphResult<Vec<NoteListItem>> {
        let mut graph = self.io.write().await?;
        let Some(from) = graph.pinned_notes.iter().position(|pinned| pinned == slug) else {
            return Err(NotegraphError::PinnedNoteNotFound(slug.to_string()));
        };
        let last = graph.pinned_notes.len() - 1;
        let to = from.saturating_add_signed(offset).min(last);

        if to != from {
            let pinned = graph.pinned_notes.remove(from);
            graph.pinned_notes.insert(to, pinned);
            self.commit(&graph, GraphChanges::new().pins(), Persist::Immediately)
                .await?;
            debug!(%slug, from, to, "Moved pin");
        }
        Ok(pinned_items(&graph))
    }
}
