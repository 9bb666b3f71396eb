//! Object storage abstraction and the graph persistence gateway
//!
//! - [`ObjectStore`] - flat, path-addressed byte storage
//! - [`MemoryObjectStore`] - in-process backend for tests and embedding
//! - [`codec`] - the on-disk encoding of notes, aliases and file sidecars
//! - [`DatabaseIo`] - loads the [`crate::Graph`] once and persists changes

pub mod codec;
pub mod gateway;
pub mod memory;

pub use gateway::{DatabaseIo, GraphChanges};
pub use memory::MemoryObjectStore;

use crate::error::StorageResult;
use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Boxed async byte stream returned by and handed to an [`ObjectStore`]
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Inclusive byte range, as used by HTTP range requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    /// Last byte to include; `None` reads to the end
    pub end: Option<u64>,
}

impl ByteRange {
    pub fn new(start: u64, end: Option<u64>) -> Self {
        Self { start, end }
    }

    /// Number of bytes covered within an object of `size` bytes
    pub fn len_within(&self, size: u64) -> u64 {
        if self.start >= size {
            return 0;
        }
        let last = self.end.map_or(size - 1, |end| end.min(size - 1));
        last.saturating_sub(self.start) + u64::from(last >= self.start)
    }
}

/// Path-addressed object storage
///
/// Paths are `/`-separated and relative. Backends decide how they map onto
/// their medium but must treat every path as opaque otherwise.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn read_object_as_string(&self, path: &str) -> StorageResult<String>;

    async fn write_object(&self, path: &str, data: &[u8]) -> StorageResult<()>;

    /// Stream `reader` into `path`, returning the number of bytes written
    async fn write_object_from_reader(
        &self,
        path: &str,
        reader: ObjectReader,
    ) -> StorageResult<u64>;

    async fn get_readable_stream(
        &self,
        path: &str,
        range: Option<ByteRange>,
    ) -> StorageResult<ObjectReader>;

    async fn remove_object(&self, path: &str) -> StorageResult<()>;

    async fn rename_object(&self, old_path: &str, new_path: &str) -> StorageResult<()>;

    /// Every object path, in no particular order
    async fn get_all_object_names(&self) -> StorageResult<Vec<String>>;

    async fn get_object_size(&self, path: &str) -> StorageResult<u64>;

    /// Sum of all object sizes
    async fn get_total_size(&self) -> StorageResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_range_len_within() {
        assert_eq!(ByteRange::new(0, None).len_within(10), 10);
        assert_eq!(ByteRange::new(2, Some(4)).len_within(10), 3);
        assert_eq!(ByteRange::new(8, Some(100)).len_within(10), 2);
        assert_eq!(ByteRange::new(10, None).len_within(10), 0);
        assert_eq!(ByteRange::new(5, Some(3)).len_within(10), 0);
        assert_eq!(ByteRange::new(0, None).len_within(0), 0);
    }
}
