//! Note search, sorting and pagination
//!
//! A query narrows all notes token by token (see [`query`] for the syntax).
//! Sort modes that only need stored fields sort the raw notes before list
//! items are built; the others build list items first and sort those.
//! Results are cut into pages of a fixed size.

mod filters;
pub mod query;

use crate::graph::Graph;
use crate::note::{ExistingNote, NoteListItem};
use filters::{Filter, Matcher};
use notegraph_config::SearchConfig;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

pub use query::{tokenize, QueryToken};

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortMode {
    CreationDateAscending,
    CreationDateDescending,
    UpdateDateAscending,
    #[default]
    UpdateDateDescending,
    TitleAscending,
    TitleDescending,
    NumberOfLinksAscending,
    NumberOfLinksDescending,
    NumberOfFilesAscending,
    NumberOfFilesDescending,
    NumberOfCharactersAscending,
    NumberOfCharactersDescending,
}

impl SortMode {
    /// Whether the ordering needs only stored note fields
    fn is_cheap(self) -> bool {
        matches!(
            self,
            SortMode::CreationDateAscending
                | SortMode::CreationDateDescending
                | SortMode::UpdateDateAscending
                | SortMode::UpdateDateDescending
                | SortMode::NumberOfCharactersAscending
                | SortMode::NumberOfCharactersDescending
        )
    }

    fn compare_notes(self, a: &ExistingNote, b: &ExistingNote) -> Ordering {
        match self {
            SortMode::CreationDateAscending => a.meta.created_at.cmp(&b.meta.created_at),
            SortMode::CreationDateDescending => b.meta.created_at.cmp(&a.meta.created_at),
            SortMode::UpdateDateAscending => a.meta.updated_at.cmp(&b.meta.updated_at),
            SortMode::UpdateDateDescending => b.meta.updated_at.cmp(&a.meta.updated_at),
            SortMode::NumberOfCharactersAscending => {
                a.content.chars().count().cmp(&b.content.chars().count())
            }
            SortMode::NumberOfCharactersDescending => {
                b.content.chars().count().cmp(&a.content.chars().count())
            }
            _ => Ordering::Equal,
        }
    }

    fn compare_items(self, a: &NoteListItem, b: &NoteListItem) -> Ordering {
        match self {
            SortMode::TitleAscending => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortMode::TitleDescending => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
            SortMode::NumberOfLinksAscending => a.number_of_links().cmp(&b.number_of_links()),
            SortMode::NumberOfLinksDescending => b.number_of_links().cmp(&a.number_of_links()),
            SortMode::NumberOfFilesAscending => a.number_of_files.cmp(&b.number_of_files),
            SortMode::NumberOfFilesDescending => b.number_of_files.cmp(&a.number_of_files),
            _ => Ordering::Equal,
        }
    }
}

/// Parameters of a note list request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteListOptions {
    pub search_query: String,
    pub sort_mode: SortMode,
    /// 1-based page number; 0 is treated as 1
    pub page: usize,
    /// Cap on the number of sorted results considered
    pub limit: Option<usize>,
    /// Overrides the configured case sensitivity
    pub case_sensitive: Option<bool>,
}

impl NoteListOptions {
    pub fn query(search_query: impl Into<String>) -> Self {
        Self {
            search_query: search_query.into(),
            page: 1,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_sort_mode(mut self, sort_mode: SortMode) -> Self {
        self.sort_mode = sort_mode;
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteListPage {
    pub results: Vec<NoteListItem>,
    /// Matches across all pages, after `limit`
    pub number_of_unlimited_results: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Run a search against the graph
pub fn search(graph: &Graph, options: &NoteListOptions, config: &SearchConfig) -> NoteListPage {
    let matcher = Matcher {
        case_sensitive: options.case_sensitive.unwrap_or(config.case_sensitive),
    };

    let mut candidates: Vec<&ExistingNote> = graph.notes.values().collect();
    for token in tokenize(&options.search_query) {
        if candidates.is_empty() {
            break;
        }
        let filter = Filter::from_token(&token);
        candidates = filters::apply(graph, candidates, &filter, matcher);
    }

    // Slug order first so ties come out the same on every run
    candidates.sort_by(|a, b| a.slug().cmp(b.slug()));
    let sort_mode = options.sort_mode;
    let mut items: Vec<NoteListItem> = if sort_mode.is_cheap() {
        candidates.sort_by(|a, b| sort_mode.compare_notes(a, b));
        if let Some(limit) = options.limit {
            candidates.truncate(limit);
        }
        candidates.iter().map(|note| graph.list_item(note)).collect()
    } else {
        let mut items: Vec<NoteListItem> =
            candidates.iter().map(|note| graph.list_item(note)).collect();
        items.sort_by(|a, b| sort_mode.compare_items(a, b));
        if let Some(limit) = options.limit {
            items.truncate(limit);
        }
        items
    };

    let page_size = config.page_size.max(1);
    let page = options.page.max(1);
    let number_of_unlimited_results = items.len();
    let start = (page - 1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    let results: Vec<NoteListItem> = items.drain(start..end).collect();

    debug!(
        query = %options.search_query,
        matches = number_of_unlimited_results,
        page,
        returned = results.len(),
        "Searched notes"
    );
    NoteListPage {
        results,
        number_of_unlimited_results,
        page,
        page_size,
    }
}
