#![allow(dead_code)]

use notegraph_config::NotegraphConfig;
use notegraph_core::{MemoryObjectStore, NotesProvider};
use std::sync::Arc;

/// A provider over a fresh in-memory store, plus a handle to that store
pub fn provider() -> (NotesProvider, MemoryObjectStore) {
    let store = MemoryObjectStore::new();
    (provider_over(&store), store)
}

/// A new provider over an existing store, as after a restart
pub fn provider_over(store: &MemoryObjectStore) -> NotesProvider {
    let mut config = NotegraphConfig::default();
    config.graph.parse_workers = Some(2);
    NotesProvider::new(Arc::new(store.clone()), config)
}
