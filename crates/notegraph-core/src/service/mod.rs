//! Note service
//!
//! [`NotesProvider`] is the public face of a note graph. Reads take the graph
//! read lock; every mutation takes the write lock, validates, applies the
//! change, updates indexes and persists, all before releasing it.

mod files;
mod notes;
mod pins;
mod references;
mod stats;

use crate::error::{NotegraphError, NotegraphResult};
use crate::graph::Graph;
use crate::note::{ExistingNote, NoteListItem, NoteToTransmit};
use crate::search::{self, NoteListOptions, NoteListPage};
use crate::storage::{DatabaseIo, GraphChanges, ObjectStore};
use notegraph_config::NotegraphConfig;
use notegraph_parser::{infer_note_title, is_valid_slug, Block, Slug};
use std::sync::Arc;
use tracing::instrument;

/// How a mutation hands its changes to storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Persist {
    /// Flush each change as soon as it is applied
    Immediately,
    /// Leave flushing to the caller, used by bulk import
    Deferred,
}

/// Entry point for reading and changing a note graph
#[derive(Debug, Clone)]
pub struct NotesProvider {
    io: Arc<DatabaseIo>,
    config: Arc<NotegraphConfig>,
}

impl NotesProvider {
    pub fn new(store: Arc<dyn ObjectStore>, config: NotegraphConfig) -> Self {
        let io = DatabaseIo::new(store, config.graph.clone());
        Self {
            io: Arc::new(io),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &NotegraphConfig {
        &self.config
    }

    async fn commit(
        &self,
        graph: &Graph,
        changes: GraphChanges,
        persist: Persist,
    ) -> NotegraphResult<()> {
        if persist == Persist::Immediately && !changes.is_empty() {
            self.io.flush_changes(graph, &changes).await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Fetch a note with its links, backlinks, aliases and files
    ///
    /// An alias slug resolves to its canonical note.
    #[instrument(skip(self))]
    pub async fn get(&self, slug: &str) -> NotegraphResult<NoteToTransmit> {
        let graph = self.io.read().await?;
        let canonical = graph
            .resolve_note_slug(slug)
            .ok_or_else(|| NotegraphError::NoteNotFound(slug.to_string()))?;
        Ok(note_to_transmit(&graph, &graph.notes[canonical]))
    }

    /// Fetch the stored representation of a note, headers included
    pub async fn get_raw_note(&self, slug: &str) -> NotegraphResult<String> {
        let graph = self.io.read().await?;
        let canonical = graph
            .resolve_note_slug(slug)
            .ok_or_else(|| NotegraphError::NoteNotFound(slug.to_string()))?;
        Ok(crate::storage::codec::serialize_note(&graph.notes[canonical]))
    }

    /// Search, sort and paginate notes
    #[instrument(skip(self, options), fields(query = %options.search_query))]
    pub async fn get_notes_list(&self, options: &NoteListOptions) -> NotegraphResult<NoteListPage> {
        let graph = self.io.read().await?;
        Ok(search::search(&graph, options, &self.config.search))
    }

    /// Whether `slug` is a valid slug not yet used by any note, alias or file
    pub async fn is_slug_available(&self, slug: &str) -> NotegraphResult<bool> {
        if !is_valid_slug(slug) {
            return Ok(false);
        }
        let graph = self.io.read().await?;
        Ok(!graph.is_slug_taken(slug))
    }

    /// Parsed blocks of a note, for scripting
    pub async fn get_blocks(&self, slug: &str) -> NotegraphResult<Vec<Block>> {
        let graph = self.io.read().await?;
        let canonical = graph
            .resolve_note_slug(slug)
            .ok_or_else(|| NotegraphError::NoteNotFound(slug.to_string()))?;
        Ok(graph.blocks_of(canonical).to_vec())
    }

    /// Existing notes a note links to, for scripting
    pub async fn get_outgoing_slugs(&self, slug: &str) -> NotegraphResult<Vec<Slug>> {
        let graph = self.io.read().await?;
        let canonical = graph
            .resolve_note_slug(slug)
            .ok_or_else(|| NotegraphError::NoteNotFound(slug.to_string()))?;
        Ok(graph.outgoing_note_slugs(canonical))
    }
}

pub(crate) fn note_to_transmit(graph: &Graph, note: &ExistingNote) -> NoteToTransmit {
    let slug = note.slug();
    let outgoing_links: Vec<NoteListItem> = graph.list_items(&graph.outgoing_note_slugs(slug));
    let backlinks: Vec<NoteListItem> = graph.list_items(&graph.backlink_slugs(slug));
    let files = graph
        .file_slugs_of(slug)
        .iter()
        .filter_map(|file| graph.files.get(file))
        .cloned()
        .collect();

    NoteToTransmit {
        content: note.content.clone(),
        meta: note.meta.clone(),
        title: infer_note_title(&note.content),
        aliases: graph.aliases_of(slug),
        outgoing_links,
        backlinks,
        files,
        number_of_characters: note.content.chars().count(),
    }
}
