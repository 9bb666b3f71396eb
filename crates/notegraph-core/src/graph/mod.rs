//! In-memory graph of notes, aliases, files and pins
//!
//! The [`Graph`] is the authoritative working copy of a note collection. It
//! is loaded once from the object store and then mutated in place by the
//! note service, which persists each change right after applying it.
//!
//! Link indexes live in [`GraphIndexes`] and are maintained by the functions
//! in [`indexes`]. They are never stored, only rebuilt on load.

pub mod indexes;

use crate::note::{ExistingNote, FileInfo, NoteListItem};
use notegraph_parser::{infer_note_title, Block, Slug};
use std::collections::{HashMap, HashSet};

/// Derived link indexes over the notes of a [`Graph`]
#[derive(Debug, Default, Clone)]
pub struct GraphIndexes {
    /// Parsed blocks of every note
    pub blocks: HashMap<Slug, Vec<Block>>,
    /// Every slug a note links to, whether or not it exists
    pub outgoing_links: HashMap<Slug, HashSet<Slug>>,
    /// Notes linking to a note directly or through one of its aliases
    pub backlinks: HashMap<Slug, HashSet<Slug>>,
}

/// The note graph
#[derive(Debug, Default, Clone)]
pub struct Graph {
    pub notes: HashMap<Slug, ExistingNote>,
    /// Alias slug to canonical note slug
    pub aliases: HashMap<Slug, Slug>,
    pub files: HashMap<Slug, FileInfo>,
    /// Pinned note slugs in display order
    pub pinned_notes: Vec<Slug>,
    pub indexes: GraphIndexes,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `slug` is in use by a note, an alias or a file
    pub fn is_slug_taken(&self, slug: &str) -> bool {
        self.notes.contains_key(slug)
            || self.aliases.contains_key(slug)
            || self.files.contains_key(slug)
    }

    /// Canonical note slug for `slug`, following an alias if needed
    pub fn resolve_note_slug<'a>(&'a self, slug: &'a str) -> Option<&'a str> {
        if self.notes.contains_key(slug) {
            Some(slug)
        } else {
            self.aliases
                .get(slug)
                .filter(|canonical| self.notes.contains_key(canonical.as_str()))
                .map(String::as_str)
        }
    }

    /// Aliases of a canonical note, sorted
    pub fn aliases_of(&self, canonical: &str) -> Vec<Slug> {
        let mut aliases: Vec<Slug> = self
            .aliases
            .iter()
            .filter(|(_, target)| target.as_str() == canonical)
            .map(|(alias, _)| alias.clone())
            .collect();
        aliases.sort();
        aliases
    }

    pub fn blocks_of(&self, slug: &str) -> &[Block] {
        self.indexes
            .blocks
            .get(slug)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Existing notes `slug` links to, resolved through aliases and
    /// excluding `slug` itself, sorted
    pub fn outgoing_note_slugs(&self, slug: &str) -> Vec<Slug> {
        let Some(targets) = self.indexes.outgoing_links.get(slug) else {
            return Vec::new();
        };
        let mut resolved: Vec<Slug> = targets
            .iter()
            .filter_map(|target| self.resolve_note_slug(target))
            .filter(|canonical| *canonical != slug)
            .map(str::to_string)
            .collect();
        resolved.sort();
        resolved.dedup();
        resolved
    }

    /// Notes linking to `slug`, sorted
    pub fn backlink_slugs(&self, slug: &str) -> Vec<Slug> {
        let mut backlinks: Vec<Slug> = self
            .indexes
            .backlinks
            .get(slug)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        backlinks.sort();
        backlinks
    }

    /// Existing files a note links to, sorted
    pub fn file_slugs_of(&self, slug: &str) -> Vec<Slug> {
        let mut files: Vec<Slug> = self
            .indexes
            .outgoing_links
            .get(slug)
            .map(|targets| {
                targets
                    .iter()
                    .filter(|target| self.files.contains_key(target.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        files.sort();
        files
    }

    /// Notes whose outgoing links contain the given file slug, sorted
    pub fn notes_referencing_file(&self, file_slug: &str) -> Vec<Slug> {
        let mut slugs: Vec<Slug> = self
            .indexes
            .outgoing_links
            .iter()
            .filter(|(_, targets)| targets.contains(file_slug))
            .map(|(slug, _)| slug.clone())
            .collect();
        slugs.sort();
        slugs
    }

    /// Build the list view of a note
    pub fn list_item(&self, note: &ExistingNote) -> NoteListItem {
        let slug = note.slug();
        NoteListItem {
            slug: slug.to_string(),
            title: infer_note_title(&note.content),
            created_at: note.meta.created_at,
            updated_at: note.meta.updated_at,
            flags: note.meta.flags.clone(),
            number_of_characters: note.content.chars().count(),
            number_of_blocks: self.blocks_of(slug).len(),
            number_of_outgoing_links: self.outgoing_note_slugs(slug).len(),
            number_of_backlinks: self
                .indexes
                .backlinks
                .get(slug)
                .map_or(0, HashSet::len),
            number_of_files: self.file_slugs_of(slug).len(),
        }
    }

    /// List views for the given slugs, skipping any that are not notes
    pub fn list_items<'a, I>(&self, slugs: I) -> Vec<NoteListItem>
    where
        I: IntoIterator<Item = &'a Slug>,
    {
        slugs
            .into_iter()
            .filter_map(|slug| self.notes.get(slug))
            .map(|note| self.list_item(note))
            .collect()
    }
}
