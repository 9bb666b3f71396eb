//! Note, file and request types shared by the store and the service

use chrono::{DateTime, Utc};
use notegraph_parser::Slug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Stored entities
// ============================================================================

/// Metadata persisted alongside a note's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteMeta {
    pub slug: Slug,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Free-form user flags, order preserved
    #[serde(default)]
    pub flags: Vec<String>,
    /// Headers without a dedicated field, persisted verbatim
    #[serde(default)]
    pub additional_headers: BTreeMap<String, String>,
}

impl NoteMeta {
    pub fn new(slug: impl Into<Slug>) -> Self {
        Self {
            slug: slug.into(),
            created_at: None,
            updated_at: None,
            flags: Vec::new(),
            additional_headers: BTreeMap::new(),
        }
    }
}

/// A note as held in the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingNote {
    pub content: String,
    pub meta: NoteMeta,
}

impl ExistingNote {
    pub fn slug(&self) -> &str {
        &self.meta.slug
    }
}

/// Metadata of an uploaded file
///
/// The bytes live in the object store under `slug`; this record lives in a
/// sidecar object next to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub slug: Slug,
    /// Filename as supplied by the uploader
    pub filename: String,
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Save requests
// ============================================================================

/// Content and metadata of a note being saved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteToSave {
    pub content: String,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub additional_headers: BTreeMap<String, String>,
    /// Explicit timestamps, honoured on create and on import
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A create or update request for [`crate::NotesProvider::put`]
///
/// `existing_slug == None` creates a new note. Otherwise the note stored
/// under that slug is updated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSaveRequest {
    pub existing_slug: Option<Slug>,
    pub note: NoteToSave,
    /// Explicit slug on create, rename target on update
    pub change_slug_to: Option<Slug>,
    /// Desired alias set; `None` leaves aliases untouched on update
    pub aliases: Option<BTreeSet<Slug>>,
    pub disable_timestamp_update: bool,
    /// Rewrite links in referring notes when renaming
    pub update_references: bool,
}

impl NoteSaveRequest {
    /// Request creating a new note with the given content
    pub fn create(content: impl Into<String>) -> Self {
        Self {
            note: NoteToSave {
                content: content.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Request replacing the content of an existing note
    pub fn update(slug: impl Into<Slug>, content: impl Into<String>) -> Self {
        Self {
            existing_slug: Some(slug.into()),
            ..Self::create(content)
        }
    }

    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<Slug>) -> Self {
        self.change_slug_to = Some(slug.into());
        self
    }

    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Slug>,
    {
        self.aliases = Some(aliases.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.note.flags = flags;
        self
    }

    #[must_use]
    pub fn with_update_references(mut self, update_references: bool) -> Self {
        self.update_references = update_references;
        self
    }

    #[must_use]
    pub fn with_timestamp_update_disabled(mut self) -> Self {
        self.disable_timestamp_update = true;
        self
    }

    pub fn is_create(&self) -> bool {
        self.existing_slug.is_none()
    }
}

// ============================================================================
// Read views
// ============================================================================

/// Compact description of a note for lists, link panels and search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteListItem {
    pub slug: Slug,
    pub title: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub flags: Vec<String>,
    pub number_of_characters: usize,
    pub number_of_blocks: usize,
    /// Outgoing links to other existing notes
    pub number_of_outgoing_links: usize,
    pub number_of_backlinks: usize,
    /// Referenced files that exist
    pub number_of_files: usize,
}

impl NoteListItem {
    /// Outgoing links plus backlinks, used for sorting by connectivity
    pub fn number_of_links(&self) -> usize {
        self.number_of_outgoing_links + self.number_of_backlinks
    }
}

/// A note with everything a client needs to render it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteToTransmit {
    pub content: String,
    pub meta: NoteMeta,
    pub title: String,
    pub aliases: Vec<Slug>,
    pub outgoing_links: Vec<NoteListItem>,
    pub backlinks: Vec<NoteListItem>,
    pub files: Vec<FileInfo>,
    pub number_of_characters: usize,
}

/// Byte sizes reported by [`GraphStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSize {
    /// Everything in the object store
    pub graph: u64,
    /// Uploaded file bytes only
    pub files: u64,
}

/// Aggregate graph statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub number_of_all_notes: usize,
    /// Distinct links between two different existing notes
    pub number_of_links: usize,
    pub number_of_files: usize,
    pub number_of_pins: usize,
    pub number_of_aliases: usize,
    /// Notes with neither outgoing links nor backlinks
    pub number_of_unlinked_notes: usize,
    pub size: Option<GraphSize>,
}

/// Options for [`crate::NotesProvider::get_stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsOptions {
    /// Also report object store sizes, which touches storage
    pub include_size: bool,
}
