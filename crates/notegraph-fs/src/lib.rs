//! Filesystem backend for the notegraph object store
//!
//! Every object is a file below a root directory; `/` in an object path
//! becomes a directory separator. Writes go through a temporary file and a
//! rename, so a crash never leaves a half-written note behind.
//!
//! ```rust,no_run
//! use notegraph_config::NotegraphConfig;
//! use notegraph_core::NotesProvider;
//! use notegraph_fs::FsObjectStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NotegraphConfig::default();
//! let store = FsObjectStore::open(&config.storage).await?;
//! let provider = NotesProvider::new(Arc::new(store), config);
//! println!("{} notes", provider.get_stats(Default::default()).await?.number_of_all_notes);
//! # Ok(())
//! # }
//! ```

mod path;
mod store;

pub use path::resolve_object_path;
pub use store::{FsObjectStore, TEMP_SUFFIX};
