//! Notegraph Core
//!
//! A note graph store: notes written in subwaytext, their aliases, uploaded
//! files and pins, with link and backlink indexes kept consistent on every
//! change and persisted to a pluggable object store.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use notegraph_core::{MemoryObjectStore, NoteSaveRequest, NotesProvider};
//! use notegraph_config::NotegraphConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> notegraph_core::NotegraphResult<()> {
//! let provider = NotesProvider::new(Arc::new(MemoryObjectStore::new()), NotegraphConfig::default());
//!
//! provider.put(NoteSaveRequest::create("# Rust\nSee [[Tokio]]")).await?;
//! provider.put(NoteSaveRequest::create("# Tokio")).await?;
//!
//! let tokio = provider.get("tokio").await?;
//! assert_eq!(tokio.backlinks[0].slug, "rust");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`storage`]: [`ObjectStore`] backends, the on-disk codec and the
//!   [`DatabaseIo`] gateway that loads the graph once and flushes changes
//! - [`graph`]: the in-memory [`Graph`] and its link indexes
//! - [`NotesProvider`]: validation, mutation and persistence of notes, files
//!   and pins under a single writer lock
//! - [`search`]: query filters, sort modes and pagination

pub mod error;
pub mod graph;
pub mod note;
pub mod search;
pub mod service;
pub mod storage;

pub use error::{NotegraphError, NotegraphResult, StorageError, StorageResult};
pub use graph::{Graph, GraphIndexes};
pub use note::{
    ExistingNote, FileInfo, GraphSize, GraphStats, NoteListItem, NoteMeta, NoteSaveRequest,
    NoteToSave, NoteToTransmit, StatsOptions,
};
pub use search::{NoteListOptions, NoteListPage, SortMode};
pub use service::NotesProvider;
pub use storage::{ByteRange, DatabaseIo, GraphChanges, MemoryObjectStore, ObjectReader, ObjectStore};

pub use notegraph_parser::{Block, BlockType, MediaType, Slug, Span, SpanType};
