//! Persistence gateway between the in-memory graph and an object store
//!
//! The graph is loaded on first use. Concurrent first callers share one load
//! through a [`OnceCell`]; a failed load leaves the cell empty so the next
//! caller retries. Parsing during the load runs on a dedicated rayon pool
//! that is built once and reused.
//!
//! Every mutation happens under the graph write lock, which the caller keeps
//! until the change has been flushed. Readers take the read lock.

use super::codec::{self, GraphObject};
use super::{ByteRange, ObjectReader, ObjectStore};
use crate::error::{StorageError, StorageResult};
use crate::graph::{indexes, Graph};
use futures::future::try_join_all;
use notegraph_config::GraphConfig;
use notegraph_parser::{is_valid_slug, parse, Block, Slug};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio::sync::{oneshot, OnceCell, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Slugs touched by one mutation, grouped by role
///
/// Each listed slug is written if it still holds that role in the graph
/// and deleted otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphChanges {
    pub notes: Vec<Slug>,
    pub aliases: Vec<Slug>,
    pub files: Vec<Slug>,
    pub pins: bool,
}

impl GraphChanges {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn note(mut self, slug: impl Into<Slug>) -> Self {
        self.notes.push(slug.into());
        self
    }

    #[must_use]
    pub fn aliases<I>(mut self, slugs: I) -> Self
    where
        I: IntoIterator<Item = Slug>,
    {
        self.aliases.extend(slugs);
        self
    }

    #[must_use]
    pub fn file(mut self, slug: impl Into<Slug>) -> Self {
        self.files.push(slug.into());
        self
    }

    #[must_use]
    pub fn pins(mut self) -> Self {
        self.pins = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.aliases.is_empty() && self.files.is_empty() && !self.pins
    }
}

type ParsedObject = (Slug, Result<GraphObject, String>, Option<Vec<Block>>);

/// Loads, guards and persists the [`Graph`]
pub struct DatabaseIo {
    store: Arc<dyn ObjectStore>,
    config: GraphConfig,
    graph: OnceCell<RwLock<Graph>>,
    parse_pool: OnceLock<rayon::ThreadPool>,
}

impl std::fmt::Debug for DatabaseIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseIo")
            .field("config", &self.config)
            .field("loaded", &self.graph.initialized())
            .finish()
    }
}

impl DatabaseIo {
    pub fn new(store: Arc<dyn ObjectStore>, config: GraphConfig) -> Self {
        Self {
            store,
            config,
            graph: OnceCell::new(),
            parse_pool: OnceLock::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.graph.initialized()
    }

    fn object_name(&self, slug: &str) -> String {
        format!("{slug}{}", self.config.note_extension)
    }

    async fn graph(&self) -> StorageResult<&RwLock<Graph>> {
        self.graph
            .get_or_try_init(|| async { self.load_graph().await.map(RwLock::new) })
            .await
    }

    /// Shared access to the graph, loading it first if needed
    pub async fn read(&self) -> StorageResult<RwLockReadGuard<'_, Graph>> {
        Ok(self.graph().await?.read().await)
    }

    /// Exclusive access to the graph, loading it first if needed
    ///
    /// Hold the guard until the mutation has been flushed.
    pub async fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Graph>> {
        Ok(self.graph().await?.write().await)
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    fn parse_pool(&self) -> StorageResult<&rayon::ThreadPool> {
        if let Some(pool) = self.parse_pool.get() {
            return Ok(pool);
        }
        let workers = self.config.effective_parse_workers();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("notegraph-parse-{index}"))
            .build()
            .map_err(|e| StorageError::backend(format!("failed to build parse pool: {e}")))?;
        debug!(workers, "Built parse pool");
        Ok(self.parse_pool.get_or_init(|| pool))
    }

    /// Decode and parse raw objects on the parse pool
    async fn parse_objects(&self, raw: Vec<(Slug, String)>) -> StorageResult<Vec<ParsedObject>> {
        let pool = self.parse_pool()?;
        let (tx, rx) = oneshot::channel();
        pool.spawn(move || {
            let parsed: Vec<ParsedObject> = raw
                .into_par_iter()
                .map(|(slug, raw)| {
                    let object = codec::parse_graph_object(&slug, &raw).map_err(|e| e.to_string());
                    let blocks = match &object {
                        Ok(GraphObject::Note(note)) => Some(parse(&note.content)),
                        _ => None,
                    };
                    (slug, object, blocks)
                })
                .collect();
            let _ = tx.send(parsed);
        });
        rx.await
            .map_err(|_| StorageError::backend("parse pool dropped the load result"))
    }

    async fn load_pins(&self) -> StorageResult<Vec<Slug>> {
        match self.store.read_object_as_string(&self.config.pins_object).await {
            Ok(raw) => Ok(codec::parse_pins(&raw)),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn load_graph(&self) -> StorageResult<Graph> {
        let started = Instant::now();
        let extension = self.config.note_extension.as_str();

        let slugs: Vec<Slug> = self
            .store
            .get_all_object_names()
            .await?
            .into_iter()
            .filter_map(|name| name.strip_suffix(extension).map(str::to_string))
            .filter(|slug| is_valid_slug(slug))
            .collect();

        // Undecodable objects are skipped, any other read failure aborts the load
        let read = try_join_all(slugs.into_iter().map(|slug| async move {
            match self
                .store
                .read_object_as_string(&self.object_name(&slug))
                .await
            {
                Ok(raw) => Ok(Ok((slug, raw))),
                Err(StorageError::InvalidText(error)) => Ok(Err((slug, error))),
                Err(e) => Err(e),
            }
        }))
        .await?;

        let mut skipped = 0usize;
        let mut raw = Vec::with_capacity(read.len());
        for object in read {
            match object {
                Ok(object) => raw.push(object),
                Err((slug, error)) => {
                    skipped += 1;
                    warn!(%slug, %error, "Skipping object that is not text");
                }
            }
        }

        let mut graph = Graph::new();
        let mut parsed_blocks: HashMap<Slug, Vec<Block>> = HashMap::new();
        for (slug, object, blocks) in self.parse_objects(raw).await? {
            match object {
                Ok(GraphObject::Note(note)) => {
                    if let Some(blocks) = blocks {
                        parsed_blocks.insert(slug.clone(), blocks);
                    }
                    graph.notes.insert(slug, note);
                }
                Ok(GraphObject::Alias { slug, canonical }) => {
                    graph.aliases.insert(slug, canonical);
                }
                Ok(GraphObject::File(info)) => {
                    graph.files.insert(slug, info);
                }
                Err(error) => {
                    skipped += 1;
                    warn!(%slug, %error, "Skipping unreadable object");
                }
            }
        }

        let notes = &graph.notes;
        graph.aliases.retain(|alias, canonical| {
            let live = notes.contains_key(canonical) && !notes.contains_key(alias);
            if !live {
                warn!(%alias, %canonical, "Ignoring alias without a target note");
            }
            live
        });

        graph.pinned_notes = self.load_pins().await?;
        indexes::rebuild_indexes(&mut graph, parsed_blocks);

        info!(
            notes = graph.notes.len(),
            aliases = graph.aliases.len(),
            files = graph.files.len(),
            pins = graph.pinned_notes.len(),
            skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Loaded note graph"
        );
        Ok(graph)
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    async fn remove_if_present(&self, path: &str) -> StorageResult<()> {
        match self.store.remove_object(path).await {
            Err(e) if !e.is_not_found() => Err(e),
            _ => Ok(()),
        }
    }

    /// Write or delete the object of one slug according to its current role
    async fn flush_slug(&self, graph: &Graph, slug: &str) -> StorageResult<()> {
        let path = self.object_name(slug);
        let encoded = if let Some(note) = graph.notes.get(slug) {
            Some(codec::serialize_note(note))
        } else if let Some(canonical) = graph.aliases.get(slug) {
            Some(codec::serialize_alias(canonical))
        } else {
            graph.files.get(slug).map(codec::serialize_file_info)
        };

        match encoded {
            Some(encoded) => self.store.write_object(&path, encoded.as_bytes()).await,
            None => self.remove_if_present(&path).await,
        }
    }

    async fn flush_pins(&self, graph: &Graph) -> StorageResult<()> {
        let encoded = codec::serialize_pins(&graph.pinned_notes);
        self.store
            .write_object(&self.config.pins_object, encoded.as_bytes())
            .await
    }

    /// Persist the objects named by `changes`
    pub async fn flush_changes(&self, graph: &Graph, changes: &GraphChanges) -> StorageResult<()> {
        let slugs: BTreeSet<&str> = changes
            .notes
            .iter()
            .chain(&changes.aliases)
            .chain(&changes.files)
            .map(String::as_str)
            .collect();

        debug!(objects = slugs.len(), pins = changes.pins, "Flushing graph changes");
        try_join_all(slugs.into_iter().map(|slug| self.flush_slug(graph, slug))).await?;
        if changes.pins {
            self.flush_pins(graph).await?;
        }
        Ok(())
    }

    /// Persist every note, alias, file sidecar and the pin list
    pub async fn flush_all(&self, graph: &Graph) -> StorageResult<()> {
        let slugs: BTreeSet<&str> = graph
            .notes
            .keys()
            .chain(graph.aliases.keys())
            .chain(graph.files.keys())
            .map(String::as_str)
            .collect();

        info!(objects = slugs.len(), "Flushing whole graph");
        try_join_all(slugs.into_iter().map(|slug| self.flush_slug(graph, slug))).await?;
        self.flush_pins(graph).await
    }

    // ------------------------------------------------------------------------
    // File bytes
    // ------------------------------------------------------------------------

    pub async fn write_file_bytes(&self, slug: &str, reader: ObjectReader) -> StorageResult<u64> {
        self.store.write_object_from_reader(slug, reader).await
    }

    pub async fn read_file_bytes(
        &self,
        slug: &str,
        range: Option<ByteRange>,
    ) -> StorageResult<ObjectReader> {
        self.store.get_readable_stream(slug, range).await
    }

    pub async fn rename_file_bytes(&self, old_slug: &str, new_slug: &str) -> StorageResult<()> {
        self.store.rename_object(old_slug, new_slug).await
    }

    pub async fn remove_file_bytes(&self, slug: &str) -> StorageResult<()> {
        self.remove_if_present(slug).await
    }

    pub async fn total_size(&self) -> StorageResult<u64> {
        self.store.get_total_size().await
    }
}
