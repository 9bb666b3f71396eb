//! In-memory object store

use super::{ByteRange, ObjectReader, ObjectStore};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Object store keeping every object in a shared map
///
/// Clones share the same contents, so a test can keep a handle and inspect
/// what the graph persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with string objects
    pub fn with_objects<I, K, V>(objects: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        {
            let mut map = store.objects.write();
            for (path, data) in objects {
                map.insert(path.into(), data.into().into_bytes());
            }
        }
        store
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.read().contains_key(path)
    }

    /// Object contents as a string, if present and valid UTF-8
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.objects
            .read()
            .get(path)
            .and_then(|bytes| String::from_utf8(bytes.clone()).ok())
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    fn get_bytes(&self, path: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn read_object_as_string(&self, path: &str) -> StorageResult<String> {
        let bytes = self.get_bytes(path)?;
        String::from_utf8(bytes)
            .map_err(|e| StorageError::InvalidText(format!("{path}: {e}")))
    }

    async fn write_object(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        self.objects.write().insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn write_object_from_reader(
        &self,
        path: &str,
        mut reader: ObjectReader,
    ) -> StorageResult<u64> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        let size = data.len() as u64;
        self.objects.write().insert(path.to_string(), data);
        Ok(size)
    }

    async fn get_readable_stream(
        &self,
        path: &str,
        range: Option<ByteRange>,
    ) -> StorageResult<ObjectReader> {
        let bytes = self.get_bytes(path)?;
        let bytes = match range {
            Some(range) => {
                let start = (range.start as usize).min(bytes.len());
                let len = range.len_within(bytes.len() as u64) as usize;
                bytes[start..start + len].to_vec()
            }
            None => bytes,
        };
        Ok(Box::new(Cursor::new(bytes)))
    }

    async fn remove_object(&self, path: &str) -> StorageResult<()> {
        self.objects
            .write()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn rename_object(&self, old_path: &str, new_path: &str) -> StorageResult<()> {
        let mut objects = self.objects.write();
        let data = objects
            .remove(old_path)
            .ok_or_else(|| StorageError::NotFound(old_path.to_string()))?;
        objects.insert(new_path.to_string(), data);
        Ok(())
    }

    async fn get_all_object_names(&self) -> StorageResult<Vec<String>> {
        Ok(self.objects.read().keys().cloned().collect())
    }

    async fn get_object_size(&self, path: &str) -> StorageResult<u64> {
        self.objects
            .read()
            .get(path)
            .map(|bytes| bytes.len() as u64)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn get_total_size(&self) -> StorageResult<u64> {
        Ok(self
            .objects
            .read()
            .values()
            .map(|bytes| bytes.len() as u64)
            .sum())
    }
}
