//! Vault synchronization engine
//!
//! [`VaultSync`] is the only writer of the draft model. It discovers drafts,
//! reconciles each declared scene order against the files present, and
//! applies change notifications one at a time. Corrections are written back
//! to the index note and marked so the echo notification is ignored.

use crate::cache::SceneCache;
use crate::error::SyncError;
use crate::reconcile::cross_reference;
use crate::view::{DraftSet, ModelReader};
use longform_model::{
    frontmatter, Draft, DraftSnapshot, SceneText, Vault, VaultEvent, VaultPath,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;

/// Keeps drafts consistent with an externally mutated vault
#[derive(Debug)]
pub struct VaultSync<V: Vault> {
    vault: Arc<V>,
    drafts: BTreeMap<VaultPath, Draft>,
    self_writes: HashSet<VaultPath>,
    cache: SceneCache,
    publisher: watch::Sender<Arc<DraftSet>>,
}

impl<V: Vault> VaultSync<V> {
    /// Create engine with an empty model
    #[must_use]
    pub fn new(vault: Arc<V>, cache: SceneCache) -> Self {
        let (publisher, _) = watch::channel(Arc::new(DraftSet::default()));
        Self {
            vault,
            drafts: BTreeMap::new(),
            self_writes: HashSet::new(),
            cache,
            publisher,
        }
    }

    /// Subscribe to committed models
    #[must_use]
    pub fn reader(&self) -> ModelReader {
        ModelReader::new(self.publisher.subscribe())
    }

    /// Latest committed model
    #[must_use]
    pub fn drafts(&self) -> Arc<DraftSet> {
        Arc::clone(&*self.publisher.borrow())
    }

    /// The document store
    #[inline]
    #[must_use]
    pub fn vault(&self) -> &Arc<V> {
        &self.vault
    }

    /// Check if a write by this engine is still waiting for its echo
    #[inline]
    #[must_use]
    pub fn has_pending_write(&self, path: &VaultPath) -> bool {
        self.self_writes.contains(path)
    }

    /// Walk the vault and rebuild the model from scratch
    ///
    /// Returns the number of drafts found.
    ///
    /// # Errors
    /// Returns error if the vault cannot be walked
    pub async fn discover_drafts(&mut self) -> Result<usize, SyncError> {
        let files = self.vault.walk(&VaultPath::root()).await?;
        let mut found = BTreeMap::new();
        for path in files.iter().filter(|p| p.is_markdown()) {
            if let Some(draft) = self.read_index(path).await {
                found.insert(path.clone(), draft);
            }
        }

        self.drafts = found;
        self.cache.invalidate_all();
        let indexes: Vec<VaultPath> = self.drafts.keys().cloned().collect();
        for index in &indexes {
            if let Err(e) = self.refresh(index, false).await {
                tracing::warn!(draft = %index, error = %e, "failed to reconcile draft");
            }
        }

        self.publish();
        tracing::info!(drafts = self.drafts.len(), "discovered drafts");
        Ok(self.drafts.len())
    }

    /// Apply one change notification
    ///
    /// Returns `true` if the committed model changed. Reconciliation
    /// failures are logged and leave the affected draft as it was.
    ///
    /// # Errors
    /// Returns error if a changed index note cannot be read
    pub async fn handle(&mut self, event: &VaultEvent) -> Result<bool, SyncError> {
        tracing::debug!(kind = event.kind(), paths = ?event.paths(), "vault event");

        if let VaultEvent::Modified(path) | VaultEvent::MetadataChanged(path) = event {
            if self.self_writes.remove(path) {
                tracing::debug!(path = %path, "ignoring echo of own write");
                return Ok(false);
            }
        } else {
            for path in event.paths() {
                self.self_writes.remove(path);
            }
        }

        for path in event.paths() {
            self.cache.invalidate(path).await;
        }
        if matches!(event, VaultEvent::Deleted(_) | VaultEvent::Renamed { .. }) {
            // folder moves leave stale entries under old paths
            self.cache.invalidate_all();
        }

        let mut changed = match event {
            VaultEvent::Created(path) => self.scan_new(path).await,
            VaultEvent::Modified(path) | VaultEvent::MetadataChanged(path) => {
                self.on_metadata_changed(path).await?
            }
            VaultEvent::Deleted(path) => self.on_deleted(path),
            VaultEvent::Renamed { from, to } => self.on_renamed(from, to).await,
        };
        changed |= self.refresh_affected(&event.paths()).await;

        if changed {
            self.publish();
        }
        Ok(changed)
    }

    /// Immutable copy of a draft with its content loaded
    ///
    /// Multi-file drafts load every scene in order; single-file drafts load
    /// the index note.
    ///
    /// # Errors
    /// Returns error if the draft is unknown or a note cannot be read
    pub async fn snapshot(&self, index: &VaultPath) -> Result<DraftSnapshot, SyncError> {
        let draft = self
            .drafts
            .get(index)
            .cloned()
            .ok_or_else(|| SyncError::UnknownDraft(index.clone()))?;

        if !draft.is_multi_file() {
            let note = self.cache.load(self.vault.as_ref(), index).await?;
            return Ok(DraftSnapshot::single(draft, &note));
        }

        let mut scenes = Vec::new();
        for scene in draft.scene_list() {
            let content = self.cache.load(self.vault.as_ref(), &scene.path).await?;
            scenes.push(SceneText {
                title: scene.title,
                path: scene.path,
                indent: scene.indent,
                content: content.to_string(),
            });
        }
        Ok(DraftSnapshot::new(draft, scenes))
    }

    fn publish(&self) {
        self.publisher
            .send_replace(Arc::new(DraftSet::new(self.drafts.clone())));
    }

    /// Read a note and parse its draft declaration
    async fn read_index(&self, path: &VaultPath) -> Option<Draft> {
        let content = match self.vault.read(path).await {
            Ok(content) => content,
            Err(e) => {
                if !e.is_not_found() {
                    tracing::warn!(path = %path, error = %e, "failed to read note");
                }
                return None;
            }
        };
        match frontmatter::read_draft(path, &content) {
            Ok(Some(draft)) if has_valid_scene_folder(&draft) => Some(draft),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "skipping note with malformed frontmatter");
                None
            }
        }
    }

    /// Load drafts declared at or beneath a new path
    async fn scan_new(&mut self, path: &VaultPath) -> bool {
        let candidates = if self.vault.is_dir(path).await {
            match self.vault.walk(path).await {
                Ok(files) => files,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "failed to scan folder");
                    return false;
                }
            }
        } else {
            vec![path.clone()]
        };

        let mut changed = false;
        for candidate in candidates {
            if !candidate.is_markdown() || self.drafts.contains_key(&candidate) {
                continue;
            }
            if let Some(draft) = self.read_index(&candidate).await {
                tracing::info!(draft = %candidate, "draft created");
                self.drafts.insert(candidate.clone(), draft);
                if let Err(e) = self.refresh(&candidate, false).await {
                    tracing::warn!(draft = %candidate, error = %e, "failed to reconcile draft");
                }
                changed = true;
            }
        }
        changed
    }

    async fn on_metadata_changed(&mut self, path: &VaultPath) -> Result<bool, SyncError> {
        if self.drafts.contains_key(path) {
            let content = match self.vault.read(path).await {
                Ok(content) => content,
                Err(e) if e.is_not_found() => {
                    self.remove_draft(path);
                    return Ok(true);
                }
                Err(e) => return Err(e.into()),
            };
            return match frontmatter::read_draft(path, &content) {
                Ok(Some(declared)) if !has_valid_scene_folder(&declared) => {
                    tracing::warn!(draft = %path, "keeping previous declaration");
                    Ok(false)
                }
                Ok(Some(declared)) => {
                    let before = self.drafts.insert(path.clone(), declared.clone());
                    match self.refresh(path, false).await {
                        Ok(refreshed) => Ok(refreshed || before.as_ref() != Some(&declared)),
                        Err(e) => {
                            // unreconciled entries must not stay in the model
                            tracing::warn!(draft = %path, error = %e, "failed to reconcile draft");
                            if let Some(previous) = before {
                                self.drafts.insert(path.clone(), previous);
                            }
                            Ok(false)
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!(draft = %path, "note no longer declares a draft");
                    self.remove_draft(path);
                    Ok(true)
                }
                Err(e) => {
                    tracing::warn!(draft = %path, error = %e, "keeping draft with malformed frontmatter");
                    Ok(false)
                }
            };
        }

        if self.drafts.values().any(|d| d.owns_path(path)) {
            // tracked scene: content cache already invalidated
            return Ok(false);
        }

        if path.is_markdown() {
            return Ok(self.scan_new(path).await);
        }
        Ok(false)
    }

    fn on_deleted(&mut self, path: &VaultPath) -> bool {
        let removed: Vec<VaultPath> = self
            .drafts
            .keys()
            .filter(|index| index.starts_with(path))
            .cloned()
            .collect();
        for index in &removed {
            self.remove_draft(index);
        }
        !removed.is_empty()
    }

    async fn on_renamed(&mut self, from: &VaultPath, to: &VaultPath) -> bool {
        let mut changed = false;

        // index notes at or beneath `from`
        let moved: Vec<VaultPath> = self
            .drafts
            .keys()
            .filter(|index| index.starts_with(from))
            .cloned()
            .collect();
        for old in moved {
            let Some(new) = old.rebase(from, to) else {
                continue;
            };
            if let Some(mut draft) = self.drafts.remove(&old) {
                tracing::info!(from = %old, to = %new, "draft moved");
                draft.vault_path = new.clone();
                self.drafts.insert(new.clone(), draft);
                self.retitle(&new).await;
                changed = true;
            }
        }

        // scene renamed inside its own scene folder keeps its position
        let renamed_in_place: Vec<VaultPath> = self
            .drafts
            .iter_mut()
            .filter_map(|(index, draft)| {
                let old_name = draft.candidate_scene_name(from)?;
                let new_name = draft.candidate_scene_name(to)?;
                let position = draft.scene_position(&old_name)?;
                if draft.contains_scene(&new_name) {
                    return None;
                }
                tracing::debug!(draft = %index, from = %old_name, to = %new_name, "scene renamed");
                draft.scenes[position].name = new_name;
                Some(index.clone())
            })
            .collect();
        for index in &renamed_in_place {
            if let Err(e) = self.refresh(index, true).await {
                tracing::warn!(draft = %index, error = %e, "failed to write renamed scene");
            }
            changed = true;
        }

        if !self.drafts.contains_key(to) {
            changed |= self.scan_new(to).await;
        }
        changed
    }

    /// Take the title from a moved index note
    ///
    /// Notes without an explicit title are named after the file.
    async fn retitle(&mut self, index: &VaultPath) {
        let Ok(content) = self.vault.read(index).await else {
            return;
        };
        let Ok(Some(declared)) = frontmatter::read_draft(index, &content) else {
            return;
        };
        if let Some(draft) = self.drafts.get_mut(index) {
            draft.title = declared.title;
        }
    }

    fn remove_draft(&mut self, index: &VaultPath) {
        if self.drafts.remove(index).is_some() {
            self.self_writes.remove(index);
            tracing::info!(draft = %index, "draft removed");
        }
    }

    /// Reconcile every multi-file draft whose scene folder an event touched
    async fn refresh_affected(&mut self, paths: &[&VaultPath]) -> bool {
        let affected: Vec<VaultPath> = self
            .drafts
            .values()
            .filter(|draft| draft.is_multi_file())
            .filter(|draft| {
                let Ok(dir) = draft.scene_dir() else {
                    return false;
                };
                paths
                    .iter()
                    .any(|p| p.parent().as_ref() == Some(&dir) || dir.starts_with(p))
            })
            .map(|draft| draft.vault_path.clone())
            .collect();

        let mut changed = false;
        for index in affected {
            match self.refresh(&index, false).await {
                Ok(refreshed) => changed |= refreshed,
                Err(e) => tracing::warn!(draft = %index, error = %e, "failed to reconcile draft"),
            }
        }
        changed
    }

    /// Scene names currently on disk for a draft
    async fn present_scenes(&self, draft: &Draft) -> Result<Vec<String>, SyncError> {
        let dir = draft.scene_dir()?;
        let entries = match self.vault.list(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(entries
            .into_iter()
            .filter(|e| e.is_file() && !self.drafts.contains_key(&e.path))
            .filter_map(|e| draft.candidate_scene_name(&e.path))
            .collect())
    }

    /// Cross-reference one draft and write back any correction
    ///
    /// `force_write` persists the current order even if reconciliation
    /// changes nothing. Returns `true` if the draft's order changed.
    async fn refresh(&mut self, index: &VaultPath, force_write: bool) -> Result<bool, SyncError> {
        let Some(draft) = self.drafts.get(index) else {
            return Ok(false);
        };
        if !draft.is_multi_file() {
            return Ok(false);
        }
        let draft = draft.clone();
        let present = self.present_scenes(&draft).await?;

        // the draft may have been dropped while the listing was pending
        let Some(current) = self.drafts.get_mut(index) else {
            return Ok(false);
        };
        let reconciled = cross_reference(&current.scenes, &present);
        for inconsistency in &reconciled.inconsistencies {
            tracing::warn!(draft = %index, "{inconsistency}");
        }

        let corrected = reconciled.scenes != current.scenes;
        if corrected {
            current.scenes = reconciled.scenes;
        }
        if corrected || force_write {
            self.persist_order(index).await?;
        }
        Ok(corrected || force_write)
    }

    /// Write a draft's order back into its index note
    async fn persist_order(&mut self, index: &VaultPath) -> Result<(), SyncError> {
        let content = match self.vault.read(index).await {
            Ok(content) => content,
            Err(e) if e.is_not_found() => {
                self.remove_draft(index);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        // re-validate after the read: still tracked, still a draft
        let Some(draft) = self.drafts.get(index) else {
            return Ok(());
        };
        match frontmatter::read_draft(index, &content) {
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => {
                tracing::warn!(draft = %index, "index note changed underneath; skipping write");
                return Ok(());
            }
        }

        let updated = frontmatter::write_scenes(&content, &draft.scenes)
            .map_err(|e| SyncError::frontmatter(index, &e))?;
        if updated == content {
            return Ok(());
        }

        self.self_writes.insert(index.clone());
        if let Err(e) = self.vault.write(index, &updated).await {
            self.self_writes.remove(index);
            return Err(e.into());
        }
        self.cache.invalidate(index).await;
        tracing::debug!(draft = %index, scenes = draft.scenes.len(), "wrote scene order");
        Ok(())
    }
}

fn has_valid_scene_folder(draft: &Draft) -> bool {
    if !draft.is_multi_file() {
        return true;
    }
    match draft.scene_dir() {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(draft = %draft.vault_path, error = %e, "invalid scene folder");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use longform_model::{MemoryVault, SceneEntry};
    use pretty_assertions::assert_eq;

    fn p(s: &str) -> VaultPath {
        VaultPath::new(s).unwrap()
    }

    fn index_note(scenes: &[&str]) -> String {
        let draft = Draft::new(p("Novel/Index.md"), "Novel")
            .with_scenes(scenes.iter().map(|s| SceneEntry::new(*s)).collect());
        frontmatter::render_index(&draft, "").unwrap()
    }

    fn order(sync: &VaultSync<MemoryVault>, index: &str) -> Vec<String> {
        sync.drafts()
            .get(&p(index))
            .map(|d| d.scenes.iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default()
    }

    async fn engine(vault: &MemoryVault) -> VaultSync<MemoryVault> {
        let mut sync = VaultSync::new(Arc::new(vault.clone()), SceneCache::default());
        sync.discover_drafts().await.unwrap();
        sync
    }

    fn novel() -> MemoryVault {
        let vault = MemoryVault::new();
        vault.insert(p("Novel/Index.md"), index_note(&["Opening", "Middle"]));
        vault.insert(p("Novel/Opening.md"), "It began.");
        vault.insert(p("Novel/Middle.md"), "It went on.");
        vault
    }

    #[tokio::test]
    async fn discover_reconciles_and_writes_back() {
        let vault = novel();
        vault.insert(p("Novel/Extra.md"), "More.");
        vault.remove(&p("Novel/Middle.md"));

        let sync = engine(&vault).await;
        assert_eq!(order(&sync, "Novel/Index.md"), vec!["Opening", "Extra"]);

        let written = vault.get(&p("Novel/Index.md")).unwrap();
        let reread = frontmatter::read_draft(&p("Novel/Index.md"), &written)
            .unwrap()
            .unwrap();
        assert_eq!(reread.scenes, vec![SceneEntry::new("Opening"), SceneEntry::new("Extra")]);
        assert!(sync.has_pending_write(&p("Novel/Index.md")));
    }

    #[tokio::test]
    async fn created_scene_is_appended() {
        let vault = novel();
        let mut sync = engine(&vault).await;

        let event = vault.insert(p("Novel/Ending.md"), "Fin.");
        assert!(sync.handle(&event).await.unwrap());
        assert_eq!(order(&sync, "Novel/Index.md"), vec!["Opening", "Middle", "Ending"]);
    }

    #[tokio::test]
    async fn echo_of_own_write_is_ignored() {
        let vault = novel();
        let mut sync = engine(&vault).await;
        let event = vault.insert(p("Novel/Ending.md"), "Fin.");
        sync.handle(&event).await.unwrap();
        assert!(sync.has_pending_write(&p("Novel/Index.md")));

        let echo = VaultEvent::MetadataChanged(p("Novel/Index.md"));
        assert!(!sync.handle(&echo).await.unwrap());
        assert!(!sync.has_pending_write(&p("Novel/Index.md")));
    }

    #[tokio::test]
    async fn renamed_scene_keeps_position() {
        let vault = novel();
        let mut sync = engine(&vault).await;

        let event = vault
            .rename(&p("Novel/Opening.md"), &p("Novel/Prologue.md"))
            .unwrap();
        assert!(sync.handle(&event).await.unwrap());
        assert_eq!(order(&sync, "Novel/Index.md"), vec!["Prologue", "Middle"]);
    }

    #[tokio::test]
    async fn scene_moved_out_is_pruned() {
        let vault = novel();
        let mut sync = engine(&vault).await;

        let event = vault
            .rename(&p("Novel/Opening.md"), &p("Archive/Opening.md"))
            .unwrap();
        assert!(sync.handle(&event).await.unwrap());
        assert_eq!(order(&sync, "Novel/Index.md"), vec!["Middle"]);
    }

    #[tokio::test]
    async fn deleted_index_removes_draft() {
        let vault = novel();
        let mut sync = engine(&vault).await;

        let event = vault.remove(&p("Novel/Index.md")).unwrap();
        assert!(sync.handle(&event).await.unwrap());
        assert!(sync.drafts().is_empty());
        assert!(sync.drafts().draft_for_path(&p("Novel/Opening.md")).is_none());
    }

    #[tokio::test]
    async fn folder_rename_moves_draft() {
        let vault = novel();
        let mut sync = engine(&vault).await;

        let event = vault.rename(&p("Novel"), &p("Saga")).unwrap();
        assert!(sync.handle(&event).await.unwrap());
        assert_eq!(order(&sync, "Saga/Index.md"), vec!["Opening", "Middle"]);
        assert!(sync.drafts().get(&p("Novel/Index.md")).is_none());
        let snapshot = sync.snapshot(&p("Saga/Index.md")).await.unwrap();
        assert_eq!(snapshot.scenes[0].path, p("Saga/Opening.md"));
    }

    #[tokio::test]
    async fn marker_removed_and_added() {
        let vault = novel();
        let mut sync = engine(&vault).await;

        let event = vault.insert(p("Novel/Index.md"), "Just a note now.");
        assert!(sync.handle(&event).await.unwrap());
        assert!(sync.drafts().is_empty());

        let event = vault.insert(p("Novel/Index.md"), index_note(&["Middle"]));
        assert!(sync.handle(&event).await.unwrap());
        assert_eq!(order(&sync, "Novel/Index.md"), vec!["Middle", "Opening"]);
    }

    #[tokio::test]
    async fn scene_edit_only_invalidates_content() {
        let vault = novel();
        let mut sync = engine(&vault).await;
        let before = sync.snapshot(&p("Novel/Index.md")).await.unwrap();
        assert_eq!(before.scenes[0].content, "It began.");

        let event = vault.insert(p("Novel/Opening.md"), "It began again.");
        assert!(!sync.handle(&event).await.unwrap());
        let after = sync.snapshot(&p("Novel/Index.md")).await.unwrap();
        assert_eq!(after.scenes[0].content, "It began again.");
        assert_eq!(order(&sync, "Novel/Index.md"), vec!["Opening", "Middle"]);
    }

    #[tokio::test]
    async fn reader_observes_commits() {
        let vault = novel();
        let mut sync = engine(&vault).await;
        let mut reader = sync.reader();
        assert_eq!(reader.current().len(), 1);

        let event = vault.remove(&p("Novel/Index.md")).unwrap();
        sync.handle(&event).await.unwrap();
        assert!(reader.changed().await);
        assert!(reader.current().is_empty());
    }

    #[tokio::test]
    async fn single_file_snapshot_reads_index() {
        let vault = MemoryVault::new();
        vault.insert(
            p("Story.md"),
            "---\nlongform:\n  format: single\n---\nOnce upon a time.",
        );
        let sync = engine(&vault).await;
        let snapshot = sync.snapshot(&p("Story.md")).await.unwrap();
        assert_eq!(snapshot.scenes[0].content, "Once upon a time.");
        assert_eq!(snapshot.compiled_text(), "Once upon a time.");
        assert!(matches!(
            sync.snapshot(&p("Missing.md")).await,
            Err(SyncError::UnknownDraft(_))
        ));
    }

    #[tokio::test]
    async fn escaping_scene_folder_keeps_previous_declaration() {
        let vault = novel();
        let mut sync = engine(&vault).await;

        let mut declared = Draft::new(p("Novel/Index.md"), "Novel")
            .with_scenes(vec![SceneEntry::new("Opening"), SceneEntry::new("Ghost")]);
        declared.scene_folder = "../../elsewhere".to_string();
        let event = vault.insert(
            p("Novel/Index.md"),
            frontmatter::render_index(&declared, "").unwrap(),
        );

        assert!(!sync.handle(&event).await.unwrap());
        assert_eq!(order(&sync, "Novel/Index.md"), vec!["Opening", "Middle"]);
        let internal: Vec<&str> = sync.drafts[&p("Novel/Index.md")]
            .scenes
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(internal, vec!["Opening", "Middle"]);
    }

    #[tokio::test]
    async fn escaping_scene_folder_is_not_discovered() {
        let vault = MemoryVault::new();
        let mut declared = Draft::new(p("Novel/Index.md"), "Novel")
            .with_scenes(vec![SceneEntry::new("Ghost")]);
        declared.scene_folder = "../../elsewhere".to_string();
        vault.insert(
            p("Novel/Index.md"),
            frontmatter::render_index(&declared, "").unwrap(),
        );

        let sync = engine(&vault).await;
        assert!(sync.drafts().is_empty());
    }

    #[tokio::test]
    async fn untitled_draft_takes_new_file_name() {
        let vault = MemoryVault::new();
        vault.insert(
            p("Novel/Index.md"),
            "---\nlongform:\n  format: scenes\n  scenes:\n    - Opening\n---\n",
        );
        vault.insert(p("Novel/Opening.md"), "It began.");
        let mut sync = engine(&vault).await;
        assert_eq!(sync.drafts().get(&p("Novel/Index.md")).unwrap().title, "Index");

        let event = vault
            .rename(&p("Novel/Index.md"), &p("Novel/Manuscript.md"))
            .unwrap();
        assert!(sync.handle(&event).await.unwrap());
        assert_eq!(sync.drafts().get(&p("Novel/Manuscript.md")).unwrap().title, "Manuscript");
    }

    #[tokio::test]
    async fn titled_draft_keeps_title_on_rename() {
        let vault = novel();
        let mut sync = engine(&vault).await;

        let event = vault
            .rename(&p("Novel/Index.md"), &p("Novel/Manuscript.md"))
            .unwrap();
        assert!(sync.handle(&event).await.unwrap());
        assert_eq!(sync.drafts().get(&p("Novel/Manuscript.md")).unwrap().title, "Novel");
    }
}
