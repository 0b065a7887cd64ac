//! Read-only views of the draft model

use longform_model::{Draft, Scene, VaultPath};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Committed set of drafts, keyed by index note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftSet {
    drafts: BTreeMap<VaultPath, Draft>,
}

impl DraftSet {
    /// Create from a map of drafts
    #[inline]
    #[must_use]
    pub fn new(drafts: BTreeMap<VaultPath, Draft>) -> Self {
        Self { drafts }
    }

    /// All drafts ordered by index path
    pub fn list(&self) -> impl Iterator<Item = &Draft> {
        self.drafts.values()
    }

    /// Draft by index note
    #[inline]
    #[must_use]
    pub fn get(&self, index: &VaultPath) -> Option<&Draft> {
        self.drafts.get(index)
    }

    /// Check if a path is a draft's index note
    #[inline]
    #[must_use]
    pub fn contains(&self, index: &VaultPath) -> bool {
        self.drafts.contains_key(index)
    }

    /// Draft owning a path, as index note or tracked scene
    #[must_use]
    pub fn draft_for_path(&self, path: &VaultPath) -> Option<&Draft> {
        self.drafts
            .get(path)
            .or_else(|| self.drafts.values().find(|d| d.owns_path(path)))
    }

    /// Resolved scenes of a draft
    #[must_use]
    pub fn scenes_of(&self, index: &VaultPath) -> Option<Vec<Scene>> {
        self.drafts.get(index).map(Draft::scene_list)
    }

    /// Get number of drafts
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    /// Check if there are no drafts
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}

/// Subscriber to the latest committed [`DraftSet`]
#[derive(Debug, Clone)]
pub struct ModelReader {
    rx: watch::Receiver<Arc<DraftSet>>,
}

impl ModelReader {
    pub(crate) fn new(rx: watch::Receiver<Arc<DraftSet>>) -> Self {
        Self { rx }
    }

    /// Latest committed model
    #[must_use]
    pub fn current(&self) -> Arc<DraftSet> {
        Arc::clone(&*self.rx.borrow())
    }

    /// Wait for the next commit
    ///
    /// Returns `false` once the engine is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use longform_model::SceneEntry;

    fn p(s: &str) -> VaultPath {
        VaultPath::new(s).unwrap()
    }

    #[test]
    fn draft_for_path_matches_index_and_scenes() {
        let draft = Draft::new(p("Novel/Index.md"), "Novel").with_scenes(vec![SceneEntry::new("A")]);
        let mut map = BTreeMap::new();
        map.insert(draft.vault_path.clone(), draft);
        let set = DraftSet::new(map);

        assert!(set.draft_for_path(&p("Novel/Index.md")).is_some());
        assert!(set.draft_for_path(&p("Novel/A.md")).is_some());
        assert!(set.draft_for_path(&p("Novel/B.md")).is_none());
        assert_eq!(set.scenes_of(&p("Novel/Index.md")).unwrap().len(), 1);
    }
}
