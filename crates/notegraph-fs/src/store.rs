//! Directory-backed object store

use crate::path::{object_path_of, resolve_object_path};
use async_trait::async_trait;
use notegraph_config::StorageConfig;
use notegraph_core::{ByteRange, ObjectReader, ObjectStore, StorageError, StorageResult};
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, ReadBuf, Take};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace};

/// Suffix of in-flight writes; such files are never listed as objects
pub const TEMP_SUFFIX: &str = ".notegraph-tmp";

fn io_error(path: &str, err: io::Error) -> StorageError {
    match err.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
        _ => StorageError::Io(format!("{path}: {err}")),
    }
}

/// Object store rooted at a directory
///
/// At most `max_open_files` handles are open at once, counting readers
/// handed out by [`ObjectStore::get_readable_stream`] until they drop.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    open_files: Arc<Semaphore>,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, max_open_files: usize) -> Self {
        Self {
            root: root.into(),
            open_files: Arc::new(Semaphore::new(max_open_files.max(1))),
        }
    }

    /// Create the root directory if needed and open a store over it
    pub async fn open(config: &StorageConfig) -> StorageResult<Self> {
        fs::create_dir_all(&config.root)
            .await
            .map_err(|e| io_error(&config.root.display().to_string(), e))?;
        debug!(root = %config.root.display(), "Opened filesystem object store");
        Ok(Self::new(&config.root, config.max_open_files))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        resolve_object_path(&self.root, path)
    }

    async fn permit(&self) -> StorageResult<OwnedSemaphorePermit> {
        self.open_files
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| StorageError::backend(e.to_string()))
    }

    async fn ensure_parent(&self, path: &str, file: &Path) -> StorageResult<()> {
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(path, e))?;
        }
        Ok(())
    }

    fn temp_path_for(file: &Path) -> PathBuf {
        let mut name = file.file_name().unwrap_or_default().to_os_string();
        name.push(TEMP_SUFFIX);
        file.with_file_name(name)
    }

    /// Write through a temporary sibling, then rename it into place
    async fn write_atomically(
        &self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64> {
        let file_path = self.resolve(path)?;
        self.ensure_parent(path, &file_path).await?;
        let temp_path = Self::temp_path_for(&file_path);

        let _permit = self.permit().await?;
        let written = async {
            let mut file = File::create(&temp_path).await?;
            let written = tokio::io::copy(reader, &mut file).await?;
            file.flush().await?;
            file.sync_all().await?;
            Ok::<_, io::Error>(written)
        }
        .await;

        let written = match written {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                return Err(io_error(path, e));
            }
        };
        fs::rename(&temp_path, &file_path)
            .await
            .map_err(|e| io_error(path, e))?;
        trace!(%path, bytes = written, "Wrote object");
        Ok(written)
    }

    /// Remove directories left empty below the root, bottom-up from `dir`
    async fn prune_empty_dirs(&self, mut dir: Option<&Path>) {
        while let Some(current) = dir {
            if current == self.root.as_path() || !current.starts_with(&self.root) {
                break;
            }
            if fs::remove_dir(current).await.is_err() {
                break;
            }
            dir = current.parent();
        }
    }

    /// Every regular file below the root, skipping in-flight writes
    async fn walk(&self) -> StorageResult<Vec<(PathBuf, u64)>> {
        let root_name = self.root.display().to_string();
        let mut files = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound && dir == self.root => {
                    return Ok(files);
                }
                Err(e) => return Err(io_error(&root_name, e)),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| io_error(&root_name, e))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| io_error(&root_name, e))?;
                let path = entry.path();
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file()
                    && !entry.file_name().to_string_lossy().ends_with(TEMP_SUFFIX)
                {
                    let size = entry
                        .metadata()
                        .await
                        .map_err(|e| io_error(&root_name, e))?
                        .len();
                    files.push((path, size));
                }
            }
        }
        Ok(files)
    }
}

/// A file reader that holds its open-file permit until dropped
struct PermitReader {
    inner: Take<File>,
    _permit: OwnedSemaphorePermit,
}

impl AsyncRead for PermitReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn read_object_as_string(&self, path: &str) -> StorageResult<String> {
        let file_path = self.resolve(path)?;
        let _permit = self.permit().await?;
        let bytes = fs::read(&file_path).await.map_err(|e| io_error(path, e))?;
        String::from_utf8(bytes)
            .map_err(|e| StorageError::InvalidText(format!("{path}: {e}")))
    }

    async fn write_object(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let mut reader = data;
        self.write_atomically(path, &mut reader).await?;
        Ok(())
    }

    async fn write_object_from_reader(
        &self,
        path: &str,
        mut reader: ObjectReader,
    ) -> StorageResult<u64> {
        self.write_atomically(path, &mut *reader).await
    }

    async fn get_readable_stream(
        &self,
        path: &str,
        range: Option<ByteRange>,
    ) -> StorageResult<ObjectReader> {
        let file_path = self.resolve(path)?;
        let permit = self.permit().await?;
        let mut file = File::open(&file_path)
            .await
            .map_err(|e| io_error(path, e))?;
        let size = file.metadata().await.map_err(|e| io_error(path, e))?.len();

        let (start, len) = match range {
            Some(range) => (range.start.min(size), range.len_within(size)),
            None => (0, size),
        };
        if start > 0 {
            file.seek(SeekFrom::Start(start))
                .await
                .map_err(|e| io_error(path, e))?;
        }
        Ok(Box::new(PermitReader {
            inner: file.take(len),
            _permit: permit,
        }))
    }

    async fn remove_object(&self, path: &str) -> StorageResult<()> {
        let file_path = self.resolve(path)?;
        fs::remove_file(&file_path)
            .await
            .map_err(|e| io_error(path, e))?;
        self.prune_empty_dirs(file_path.parent()).await;
        trace!(%path, "Removed object");
        Ok(())
    }

    async fn rename_object(&self, old_path: &str, new_path: &str) -> StorageResult<()> {
        let from = self.resolve(old_path)?;
        let to = self.resolve(new_path)?;
        if fs::metadata(&from).await.is_err() {
            return Err(StorageError::NotFound(old_path.to_string()));
        }
        self.ensure_parent(new_path, &to).await?;
        fs::rename(&from, &to)
            .await
            .map_err(|e| io_error(old_path, e))?;
        self.prune_empty_dirs(from.parent()).await;
        trace!(from = %old_path, to = %new_path, "Renamed object");
        Ok(())
    }

    async fn get_all_object_names(&self) -> StorageResult<Vec<String>> {
        let files = self.walk().await?;
        Ok(files
            .iter()
            .filter_map(|(path, _)| object_path_of(&self.root, path))
            .collect())
    }

    async fn get_object_size(&self, path: &str) -> StorageResult<u64> {
        let file_path = self.resolve(path)?;
        let metadata = fs::metadata(&file_path)
            .await
            .map_err(|e| io_error(path, e))?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        Ok(metadata.len())
    }

    async fn get_total_size(&self) -> StorageResult<u64> {
        Ok(self.walk().await?.iter().map(|(_, size)| size).sum())
    }
}
