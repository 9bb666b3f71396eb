//! Uploaded files: storing bytes, sidecar metadata and renames

use super::references::rewrite_references;
use super::{NotesProvider, Persist};
use crate::error::{NotegraphError, NotegraphResult};
use crate::graph::indexes;
use crate::note::FileInfo;
use crate::storage::{ByteRange, GraphChanges, ObjectReader};
use chrono::Utc;
use notegraph_parser::{ensure_valid_note_slug, ensure_valid_slug, get_slug_for_new_file, Slug};
use tracing::{debug, info, instrument, warn};

impl NotesProvider {
    /// File slugs may not end in the note extension, or their bytes would
    /// shadow a note object
    fn ensure_valid_file_slug(&self, slug: &str) -> NotegraphResult<()> {
        ensure_valid_slug(slug)?;
        if slug.ends_with(&self.config.graph.note_extension) {
            return Err(NotegraphError::InvalidSlug(format!(
                "{slug} ends with the reserved extension {}",
                self.config.graph.note_extension
            )));
        }
        Ok(())
    }

    /// Store an uploaded file under a fresh slug in `namespace`
    #[instrument(skip(self, reader))]
    pub async fn add_file(
        &self,
        reader: ObjectReader,
        namespace: &str,
        filename: &str,
    ) -> NotegraphResult<FileInfo> {
        let namespace = namespace.trim_matches('/');
        if !namespace.is_empty() {
            ensure_valid_note_slug(namespace)?;
        }

        let mut graph = self.io.write().await?;
        let slug = get_slug_for_new_file(namespace, filename, |candidate| {
            graph.is_slug_taken(candidate)
        });
        self.ensure_valid_file_slug(&slug)?;

        let size = self.io.write_file_bytes(&slug, reader).await?;
        let now = Utc::now();
        let info = FileInfo {
            slug: slug.clone(),
            filename: filename.to_string(),
            size,
            created_at: Some(now),
            updated_at: Some(now),
        };
        graph.files.insert(slug.clone(), info.clone());
        let committed = self
            .commit(&graph, GraphChanges::new().file(&slug), Persist::Immediately)
            .await;
        if let Err(error) = committed {
            graph.files.remove(&slug);
            if let Err(cleanup) = self.io.remove_file_bytes(&slug).await {
                warn!(%slug, error = %cleanup, "Failed to remove bytes of unrecorded file");
            }
            return Err(error);
        }

        info!(%slug, size, "Added file");
        Ok(info)
    }

    /// Move a file to a new slug, optionally rewriting slashlinks to it
    #[instrument(skip(self))]
    pub async fn rename_file_slug(
        &self,
        old_slug: &str,
        new_slug: &str,
        update_references: bool,
    ) -> NotegraphResult<FileInfo> {
        let mut graph = self.io.write().await?;
        let Some(mut info) = graph.files.get(old_slug).cloned() else {
            return Err(NotegraphError::FileNotFound(old_slug.to_string()));
        };
        if old_slug == new_slug {
            return Ok(info);
        }
        self.ensure_valid_file_slug(new_slug)?;
        if graph.is_slug_taken(new_slug) {
            return Err(NotegraphError::SlugExists(new_slug.to_string()));
        }

        self.io.rename_file_bytes(old_slug, new_slug).await?;
        info.slug = new_slug.to_string();
        info.updated_at = Some(Utc::now());
        graph.files.remove(old_slug);
        graph.files.insert(new_slug.to_string(), info.clone());
        let changes = GraphChanges::new().file(old_slug).file(new_slug);
        self.commit(&graph, changes, Persist::Immediately).await?;
        info!(from = %old_slug, to = %new_slug, "Renamed file");

        if update_references {
            for referrer in graph.notes_referencing_file(old_slug) {
                let Some(note) = graph.notes.get_mut(&referrer) else {
                    continue;
                };
                let Some(content) = rewrite_references(&note.content, old_slug, new_slug, None)
                else {
                    continue;
                };
                note.content = content;
                indexes::update_indexes_for_note(&mut graph, &referrer);
                debug!(%referrer, "Rewrote file references");
                self.commit(&graph, GraphChanges::new().note(&referrer), Persist::Immediately)
                    .await?;
            }
        }

        Ok(info)
    }

    /// Delete a file's bytes and metadata
    #[instrument(skip(self))]
    pub async fn delete_file(&self, slug: &str) -> NotegraphResult<()> {
        let mut graph = self.io.write().await?;
        if !graph.files.contains_key(slug) {
            return Err(NotegraphError::FileNotFound(slug.to_string()));
        }
        self.io.remove_file_bytes(slug).await?;
        graph.files.remove(slug);
        self.commit(&graph, GraphChanges::new().file(slug), Persist::Immediately)
            .await?;
        info!(%slug, "Deleted file");
        Ok(())
    }

    /// All files, sorted by slug
    pub async fn get_files(&self) -> NotegraphResult<Vec<FileInfo>> {
        let graph = self.io.read().await?;
        let mut files: Vec<FileInfo> = graph.files.values().cloned().collect();
        files.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(files)
    }

    pub async fn get_file_info(&self, slug: &str) -> NotegraphResult<FileInfo> {
        let graph = self.io.read().await?;
        graph
            .files
            .get(slug)
            .cloned()
            .ok_or_else(|| NotegraphError::FileNotFound(slug.to_string()))
    }

    /// Stream a file's bytes, optionally restricted to a byte range
    pub async fn get_readable_file_stream(
        &self,
        slug: &str,
        range: Option<ByteRange>,
    ) -> NotegraphResult<ObjectReader> {
        let graph = self.io.read().await?;
        if !graph.files.contains_key(slug) {
            return Err(NotegraphError::FileNotFound(slug.to_string()));
        }
        Ok(self.io.read_file_bytes(slug, range).await?)
    }

    /// Notes linking to a file, sorted
    pub async fn get_slugs_of_notes_referencing_file(
        &self,
        slug: &str,
    ) -> NotegraphResult<Vec<Slug>> {
        let graph = self.io.read().await?;
        if !graph.files.contains_key(slug) {
            return Err(NotegraphError::FileNotFound(slug.to_string()));
        }
        Ok(graph.notes_referencing_file(slug))
    }
}
