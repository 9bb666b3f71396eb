//! Concurrent access through a shared provider

mod common;

use async_trait::async_trait;
use common::provider;
use notegraph_config::NotegraphConfig;
use notegraph_core::{
    ByteRange, MemoryObjectStore, NoteSaveRequest, NotesProvider, ObjectReader, ObjectStore,
    StorageResult,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts how often the graph is listed, which happens once per load
#[derive(Debug)]
struct CountingStore {
    inner: MemoryObjectStore,
    listings: AtomicUsize,
}

#[async_trait]
impl ObjectStore for CountingStore {
    async fn read_object_as_string(&self, path: &str) -> StorageResult<String> {
        self.inner.read_object_as_string(path).await
    }

    async fn write_object(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        self.inner.write_object(path, data).await
    }

    async fn write_object_from_reader(
        &self,
        path: &str,
        reader: ObjectReader,
    ) -> StorageResult<u64> {
        self.inner.write_object_from_reader(path, reader).await
    }

    async fn get_readable_stream(
        &self,
        path: &str,
        range: Option<ByteRange>,
    ) -> StorageResult<ObjectReader> {
        self.inner.get_readable_stream(path, range).await
    }

    async fn remove_object(&self, path: &str) -> StorageResult<()> {
        self.inner.remove_object(path).await
    }

    async fn rename_object(&self, old_path: &str, new_path: &str) -> StorageResult<()> {
        self.inner.rename_object(old_path, new_path).await
    }

    async fn get_all_object_names(&self) -> StorageResult<Vec<String>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.inner.get_all_object_names().await
    }

    async fn get_object_size(&self, path: &str) -> StorageResult<u64> {
        self.inner.get_object_size(path).await
    }

    async fn get_total_size(&self) -> StorageResult<u64> {
        self.inner.get_total_size().await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_reads_share_one_load() {
    let inner = MemoryObjectStore::with_objects([
        ("a.subtext", "# A\n/b"),
        ("b.subtext", "# B"),
        ("c.subtext", ":alias-of:a\n"),
    ]);
    let store = Arc::new(CountingStore {
        inner,
        listings: AtomicUsize::new(0),
    });
    let provider = NotesProvider::new(store.clone(), NotegraphConfig::default());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let provider = provider.clone();
            tokio::spawn(async move {
                let slug = ["a", "b", "c"][i % 3];
                provider.get(slug).await
            })
        })
        .collect();

    for handle in handles {
        let note = handle.await.unwrap().unwrap();
        assert!(note.meta.slug == "a" || note.meta.slug == "b");
    }
    assert_eq!(store.listings.load(Ordering::SeqCst), 1);

    let b = provider.get("b").await.unwrap();
    assert_eq!(b.backlinks.len(), 1);
    assert_eq!(store.listings.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_get_unique_slugs() {
    let (provider, store) = provider();

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let provider = provider.clone();
            tokio::spawn(async move {
                provider
                    .put(NoteSaveRequest::create("# Idea\nsame title"))
                    .await
            })
        })
        .collect();

    let mut slugs = HashSet::new();
    for handle in handles {
        let note = handle.await.unwrap().unwrap();
        assert!(slugs.insert(note.meta.slug));
    }

    assert_eq!(slugs.len(), 12);
    assert!(slugs.contains("idea"));
    assert!(slugs.contains("idea-12"));
    assert!(!slugs.contains("idea-1"));
    assert_eq!(store.len(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_links_keep_backlinks() {
    let (provider, _) = provider();
    provider
        .put(NoteSaveRequest::create("# Hub").with_slug("hub"))
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let provider = provider.clone();
            tokio::spawn(async move {
                provider
                    .put(
                        NoteSaveRequest::create(format!("# Spoke {i}\n[[Hub]]"))
                            .with_slug(format!("spoke-{i}")),
                    )
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let hub = provider.get("hub").await.unwrap();
    let backlinks: Vec<&str> = hub.backlinks.iter().map(|b| b.slug.as_str()).collect();
    assert_eq!(
        backlinks,
        (0..8).map(|i| format!("spoke-{i}")).collect::<Vec<_>>()
    );
}
