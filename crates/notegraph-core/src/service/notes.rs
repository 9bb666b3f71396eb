//! Creating, updating, renaming, deleting and importing notes

use super::references::rewrite_references;
use super::{note_to_transmit, NotesProvider, Persist};
use crate::error::{NotegraphError, NotegraphResult};
use crate::graph::{indexes, Graph};
use crate::note::{ExistingNote, NoteMeta, NoteSaveRequest, NoteToTransmit};
use crate::storage::GraphChanges;
use chrono::Utc;
use notegraph_parser::{create_slug, ensure_valid_note_slug, infer_note_title, Slug};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// Check a requested alias set for a note that will end up at `final_slug`
///
/// `previous_slug` is the slug the note had before a rename; it may become
/// one of its own aliases.
fn validate_aliases(
    graph: &Graph,
    aliases: &BTreeSet<Slug>,
    final_slug: &str,
    previous_slug: Option<&str>,
) -> NotegraphResult<()> {
    let owner = previous_slug.unwrap_or(final_slug);
    for alias in aliases {
        if alias == final_slug {
            return Err(NotegraphError::InvalidAlias(format!(
                "{alias} is the slug of the note itself"
            )));
        }
        ensure_valid_note_slug(alias)
            .map_err(|e| NotegraphError::InvalidAlias(e.to_string()))?;

        let freed_by_rename = previous_slug.is_some_and(|previous| previous == alias);
        if (graph.notes.contains_key(alias) && !freed_by_rename) || graph.files.contains_key(alias)
        {
            return Err(NotegraphError::SlugExists(alias.clone()));
        }
        if graph
            .aliases
            .get(alias)
            .is_some_and(|canonical| canonical != owner)
        {
            return Err(NotegraphError::AliasExists(alias.clone()));
        }
    }
    Ok(())
}

/// Point the aliases of `slug` at exactly `requested`, returning every alias
/// slug whose stored object changed
fn reconcile_aliases(graph: &mut Graph, slug: &str, requested: &BTreeSet<Slug>) -> Vec<Slug> {
    let mut changed = Vec::new();
    for alias in graph.aliases_of(slug) {
        if !requested.contains(&alias) {
            graph.aliases.remove(&alias);
            changed.push(alias);
        }
    }
    for alias in requested {
        if graph.aliases.get(alias).map(String::as_str) != Some(slug) {
            graph.aliases.insert(alias.clone(), slug.to_string());
            changed.push(alias.clone());
        }
    }
    changed
}

impl NotesProvider {
    /// Create or update a note
    ///
    /// On update with `change_slug_to`, the note is moved to the new slug,
    /// its aliases follow it and, with `update_references`, every note that
    /// linked to the old slug is rewritten to link to the new one.
    #[instrument(skip(self, request), fields(existing = ?request.existing_slug))]
    pub async fn put(&self, request: NoteSaveRequest) -> NotegraphResult<NoteToTransmit> {
        let mut graph = self.io.write().await?;
        let slug = self
            .put_locked(&mut graph, request, Persist::Immediately)
            .await?;
        Ok(note_to_transmit(&graph, &graph.notes[&slug]))
    }

    async fn put_locked(
        &self,
        graph: &mut Graph,
        request: NoteSaveRequest,
        persist: Persist,
    ) -> NotegraphResult<Slug> {
        match request.existing_slug.clone() {
            None => self.create_note(graph, request, persist).await,
            Some(slug) => self.update_note(graph, &slug, request, persist).await,
        }
    }

    async fn create_note(
        &self,
        graph: &mut Graph,
        request: NoteSaveRequest,
        persist: Persist,
    ) -> NotegraphResult<Slug> {
        let slug = match &request.change_slug_to {
            Some(slug) => {
                ensure_valid_note_slug(slug)?;
                if graph.is_slug_taken(slug) {
                    return Err(NotegraphError::SlugExists(slug.clone()));
                }
                slug.clone()
            }
            None => create_slug(&request.note.content, |candidate| {
                graph.is_slug_taken(candidate)
            }),
        };
        let aliases = request.aliases.unwrap_or_default();
        validate_aliases(graph, &aliases, &slug, None)?;

        let now = Utc::now();
        let note = request.note;
        let meta = NoteMeta {
            slug: slug.clone(),
            created_at: Some(note.created_at.unwrap_or(now)),
            updated_at: Some(note.updated_at.unwrap_or(now)),
            flags: note.flags,
            additional_headers: note.additional_headers,
        };
        graph.notes.insert(
            slug.clone(),
            ExistingNote {
                content: note.content,
                meta,
            },
        );
        let changed_aliases = reconcile_aliases(graph, &slug, &aliases);
        indexes::update_indexes_for_note(graph, &slug);

        debug!(%slug, aliases = changed_aliases.len(), "Created note");
        let changes = GraphChanges::new().note(&slug).aliases(changed_aliases);
        self.commit(graph, changes, persist).await?;
        Ok(slug)
    }

    async fn update_note(
        &self,
        graph: &mut Graph,
        slug: &str,
        request: NoteSaveRequest,
        persist: Persist,
    ) -> NotegraphResult<Slug> {
        if !graph.notes.contains_key(slug) {
            return Err(NotegraphError::NoteNotFound(slug.to_string()));
        }

        let new_slug = request
            .change_slug_to
            .as_deref()
            .filter(|new_slug| *new_slug != slug)
            .map(str::to_string);
        if let Some(new_slug) = &new_slug {
            ensure_valid_note_slug(new_slug)?;
            if graph.is_slug_taken(new_slug) {
                return Err(NotegraphError::SlugExists(new_slug.clone()));
            }
        }
        let final_slug = new_slug.clone().unwrap_or_else(|| slug.to_string());
        if let Some(aliases) = &request.aliases {
            let previous = new_slug.as_ref().map(|_| slug);
            validate_aliases(graph, aliases, &final_slug, previous)?;
        }

        let now = Utc::now();
        if let Some(note) = graph.notes.get_mut(slug) {
            note.content = request.note.content;
            note.meta.flags = request.note.flags;
            note.meta.additional_headers = request.note.additional_headers;
            if let Some(updated_at) = request.note.updated_at {
                note.meta.updated_at = Some(updated_at);
            } else if !request.disable_timestamp_update {
                note.meta.updated_at = Some(now);
            }
            // Notes loaded without headers get them on their first write, so
            // header-like content lines are never read back as headers
            let stamp = note.meta.updated_at.unwrap_or(now);
            if note.meta.created_at.is_none() {
                note.meta.created_at = Some(request.note.created_at.unwrap_or(stamp));
            }
            note.meta.updated_at.get_or_insert(stamp);
        }

        let mut changes = GraphChanges::new().note(&final_slug);
        let mut referrers = Vec::new();

        if let Some(new_slug) = &new_slug {
            referrers = graph.backlink_slugs(slug);
            let Some(mut note) = graph.notes.remove(slug) else {
                return Err(NotegraphError::NoteNotFound(slug.to_string()));
            };
            indexes::remove_slug_from_indexes(graph, slug);
            self.commit(graph, GraphChanges::new().note(slug), persist)
                .await?;

            note.meta.slug = new_slug.clone();
            graph.notes.insert(new_slug.clone(), note);

            let remapped: Vec<Slug> = graph.aliases_of(slug);
            for alias in &remapped {
                graph.aliases.insert(alias.clone(), new_slug.clone());
            }
            changes = changes.aliases(remapped);

            let mut pins_changed = false;
            let pinned_old = graph
                .pinned_notes
                .iter_mut()
                .filter(|pinned| pinned.as_str() == slug);
            for pinned in pinned_old {
                *pinned = new_slug.clone();
                pins_changed = true;
            }
            if pins_changed {
                changes = changes.pins();
            }
            info!(from = %slug, to = %new_slug, "Renamed note");
        }

        if let Some(aliases) = &request.aliases {
            changes = changes.aliases(reconcile_aliases(graph, &final_slug, aliases));
        }
        indexes::update_indexes_for_note(graph, &final_slug);
        self.commit(graph, changes, persist).await?;

        if let Some(new_slug) = &new_slug {
            if request.update_references {
                self.rewrite_note_references(graph, slug, new_slug, &referrers, persist)
                    .await?;
            }
        }

        Ok(final_slug)
    }

    /// Rewrite links to a renamed note in each referrer, one flush per note
    async fn rewrite_note_references(
        &self,
        graph: &mut Graph,
        old_slug: &str,
        new_slug: &str,
        referrers: &[Slug],
        persist: Persist,
    ) -> NotegraphResult<()> {
        let title = graph
            .notes
            .get(new_slug)
            .map(|note| infer_note_title(&note.content))
            .unwrap_or_default();

        for referrer in referrers.iter().filter(|referrer| *referrer != new_slug) {
            let Some(note) = graph.notes.get_mut(referrer) else {
                continue;
            };
            let Some(content) = rewrite_references(&note.content, old_slug, new_slug, Some(&title))
            else {
                continue;
            };
            note.content = content;
            indexes::update_indexes_for_note(graph, referrer);
            debug!(%referrer, from = %old_slug, to = %new_slug, "Rewrote references");
            self.commit(graph, GraphChanges::new().note(referrer), persist)
                .await?;
        }
        Ok(())
    }

    /// Delete a note together with its aliases and pin
    #[instrument(skip(self))]
    pub async fn remove(&self, slug: &str) -> NotegraphResult<()> {
        let mut graph = self.io.write().await?;
        if graph.notes.remove(slug).is_none() {
            return Err(NotegraphError::NoteNotFound(slug.to_string()));
        }

        let aliases = graph.aliases_of(slug);
        for alias in &aliases {
            graph.aliases.remove(alias);
        }
        let pins_before = graph.pinned_notes.len();
        graph.pinned_notes.retain(|pinned| pinned != slug);
        indexes::remove_slug_from_indexes(&mut graph, slug);

        let mut changes = GraphChanges::new().note(slug).aliases(aliases);
        if graph.pinned_notes.len() != pins_before {
            changes = changes.pins();
        }
        self.commit(&graph, changes, Persist::Immediately).await?;
        info!(%slug, "Removed note");
        Ok(())
    }

    /// Apply many save requests and persist the whole graph once
    ///
    /// Updated notes keep their timestamps unless the request carries them.
    /// Requests are applied in order to a staged copy of the graph; the first
    /// failing one aborts the import with nothing written.
    #[instrument(skip(self, requests), fields(count = requests.len()))]
    pub async fn import_notes(&self, requests: Vec<NoteSaveRequest>) -> NotegraphResult<Vec<Slug>> {
        let mut graph = self.io.write().await?;
        let mut staged = graph.clone();
        let mut slugs = Vec::with_capacity(requests.len());
        for mut request in requests {
            request.disable_timestamp_update = true;
            slugs.push(self.put_locked(&mut staged, request, Persist::Deferred).await?);
        }

        // Objects whose slug no longer has any role, e.g. after a rename
        let mut stale = GraphChanges::new();
        for slug in graph
            .notes
            .keys()
            .chain(graph.aliases.keys())
            .chain(graph.files.keys())
            .filter(|slug| !staged.is_slug_taken(slug))
        {
            stale = stale.note(slug);
        }

        self.io.flush_all(&staged).await?;
        self.io.flush_changes(&staged, &stale).await?;
        *graph = staged;
        info!(imported = slugs.len(), "Imported notes");
        Ok(slugs)
    }
}
