//! User-script loader
//!
//! Keeps the script-defined part of a [`StepRegistry`] in step with one
//! folder of the vault. Only files directly inside the folder with a
//! `.yaml`, `.yml` or `.json` extension are scripts.

use crate::error::ScriptLoadError;
use crate::registry::{RegistryReader, StepRegistry};
use crate::script::{parse_definition, ScriptStep, ScriptSyntax};
use crate::step::{Step as _, StepOrigin};
use longform_model::{ContentHash, Vault, VaultEvent, VaultPath};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What the loader knows about one script file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserScriptEntry {
    /// Script path
    pub path: VaultPath,
    /// Registered step id (`None` when the last evaluation failed)
    pub step_id: Option<String>,
    /// Hash of the content last evaluated
    pub hash: ContentHash,
    /// Evaluated, but the registry refused its id
    ///
    /// Blocked scripts are evaluated again whenever a step is released.
    pub blocked: bool,
}

/// Outcome of loading a whole folder
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Step ids registered
    pub loaded: Vec<String>,
    /// Scripts that failed
    pub failed: Vec<ScriptLoadError>,
}

impl LoadReport {
    /// Check if every script loaded
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Tracks a script folder and owns the step registry
#[derive(Debug)]
pub struct UserScriptLoader<V: Vault> {
    vault: Arc<V>,
    folder: Option<VaultPath>,
    registry: StepRegistry,
    entries: BTreeMap<VaultPath, UserScriptEntry>,
}

impl<V: Vault> UserScriptLoader<V> {
    /// Create loader for `folder` (none = no user scripts)
    #[must_use]
    pub fn new(vault: Arc<V>, registry: StepRegistry, folder: Option<VaultPath>) -> Self {
        Self {
            vault,
            folder,
            registry,
            entries: BTreeMap::new(),
        }
    }

    /// The owned registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Mutable access to the owned registry
    #[inline]
    pub fn registry_mut(&mut self) -> &mut StepRegistry {
        &mut self.registry
    }

    /// Read-only handle to the registry
    #[inline]
    #[must_use]
    pub fn reader(&self) -> RegistryReader {
        self.registry.reader()
    }

    /// Tracked folder
    #[inline]
    #[must_use]
    pub fn folder(&self) -> Option<&VaultPath> {
        self.folder.as_ref()
    }

    /// Known script files
    pub fn entries(&self) -> impl Iterator<Item = &UserScriptEntry> {
        self.entries.values()
    }

    /// Entry for a script path
    #[must_use]
    pub fn entry(&self, path: &VaultPath) -> Option<&UserScriptEntry> {
        self.entries.get(path)
    }

    /// Check if a path is a script in the tracked folder
    #[must_use]
    pub fn tracks(&self, path: &VaultPath) -> bool {
        let Some(folder) = &self.folder else {
            return false;
        };
        path.parent().as_ref() == Some(folder)
            && path
                .extension()
                .and_then(ScriptSyntax::from_extension)
                .is_some()
    }

    /// Load every script in the folder
    ///
    /// Failures are logged and reported; they never stop other scripts.
    pub async fn load_all(&mut self) -> LoadReport {
        let mut report = LoadReport::default();
        let Some(folder) = self.folder.clone() else {
            return report;
        };
        if !self.vault.is_dir(&folder).await {
            tracing::debug!(folder = %folder, "script folder does not exist");
            return report;
        }

        let listed = match self.vault.list(&folder).await {
            Ok(listed) => listed,
            Err(e) => {
                tracing::warn!(folder = %folder, error = %e, "failed to list script folder");
                report.failed.push(e.into());
                return report;
            }
        };

        for entry in listed.into_iter().filter(|e| e.is_file()) {
            if !self.tracks(&entry.path) {
                continue;
            }
            match self.load_file(&entry.path).await {
                Ok(Some(id)) => report.loaded.push(id),
                Ok(None) => {}
                Err(e) => report.failed.push(e),
            }
        }

        tracing::info!(
            folder = %folder,
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "loaded user scripts"
        );
        report
    }

    /// Switch to another folder, dropping every step of the old one
    pub async fn set_folder(&mut self, folder: Option<VaultPath>) -> LoadReport {
        let paths: Vec<VaultPath> = self.entries.keys().cloned().collect();
        for path in paths {
            self.remove_file(&path);
        }
        self.folder = folder;
        self.load_all().await
    }

    /// React to a vault notification
    ///
    /// Returns `true` if the registry changed.
    pub async fn handle(&mut self, event: &VaultEvent) -> bool {
        match event {
            VaultEvent::Created(path) | VaultEvent::Modified(path) => {
                if !self.tracks(path) {
                    return false;
                }
                let changed = self.reload(path).await;
                self.settle(changed).await
            }
            VaultEvent::MetadataChanged(_) => false,
            VaultEvent::Deleted(path) => {
                if self.folder.as_ref().is_some_and(|f| f.starts_with(path)) {
                    return self.drop_all();
                }
                let changed = self.remove_file(path);
                self.settle(changed).await
            }
            VaultEvent::Renamed { from, to } => {
                if self.folder.as_ref().is_some_and(|f| f.starts_with(from)) {
                    return self.drop_all();
                }
                let changed = match (self.entries.contains_key(from), self.tracks(to)) {
                    (true, true) => self.rekey(from, to),
                    (true, false) => self.remove_file(from),
                    (false, true) => self.reload(to).await,
                    (false, false) => false,
                };
                self.settle(changed).await
            }
        }
    }

    /// Give blocked scripts another chance once the registry changed
    async fn settle(&mut self, changed: bool) -> bool {
        if !changed {
            return false;
        }
        let blocked: Vec<VaultPath> = self
            .entries
            .values()
            .filter(|e| e.blocked)
            .map(|e| e.path.clone())
            .collect();
        for path in blocked {
            match self.load_file(&path).await {
                Ok(Some(id)) => tracing::info!(path = %path, step = %id, "blocked script registered"),
                Ok(None) => {}
                Err(e) => tracing::debug!(path = %path, error = %e, "script still blocked"),
            }
        }
        true
    }

    async fn reload(&mut self, path: &VaultPath) -> bool {
        let before = self.entries.get(path).and_then(|e| e.step_id.clone());
        match self.load_file(path).await {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "failed to load user script");
                before.is_some()
            }
        }
    }

    /// Evaluate one script and register its step
    ///
    /// Returns `Ok(None)` when the content is unchanged since the last
    /// evaluation.
    async fn load_file(&mut self, path: &VaultPath) -> Result<Option<String>, ScriptLoadError> {
        let content = self.vault.read(path).await?;
        let hash = ContentHash::of_text(&content);
        if self.entries.get(path).is_some_and(|e| e.hash == hash && !e.blocked) {
            tracing::debug!(path = %path, "script unchanged");
            return Ok(None);
        }

        let previous = self.entries.get(path).and_then(|e| e.step_id.clone());
        let compiled = self.evaluate(path, &content);

        let step = match compiled {
            Ok(step) => step,
            Err(e) => {
                if let Some(old) = previous {
                    self.registry.unregister(&old);
                }
                self.entries.insert(
                    path.clone(),
                    UserScriptEntry {
                        path: path.clone(),
                        step_id: None,
                        hash,
                        blocked: false,
                    },
                );
                return Err(e);
            }
        };

        let id = step.descriptor().id.clone();
        if let Some(old) = previous.filter(|old| old != &id) {
            self.registry.unregister(&old);
        }

        let registered = self
            .registry
            .register_script(Arc::new(step), path)
            .map_err(|source| ScriptLoadError::Registration {
                path: path.clone(),
                source,
            });
        let step_id = registered.as_ref().ok().map(|_| id.clone());
        self.entries.insert(
            path.clone(),
            UserScriptEntry {
                path: path.clone(),
                blocked: step_id.is_none(),
                step_id,
                hash,
            },
        );
        registered?;

        tracing::info!(path = %path, step = %id, %hash, "registered user script");
        Ok(Some(id))
    }

    fn evaluate(&self, path: &VaultPath, content: &str) -> Result<ScriptStep, ScriptLoadError> {
        let syntax = path
            .extension()
            .and_then(ScriptSyntax::from_extension)
            .ok_or_else(|| ScriptLoadError::invalid(path, "not a script file"))?;
        let definition =
            parse_definition(content, syntax).map_err(|m| ScriptLoadError::parse(path, m))?;
        ScriptStep::compile(definition, path.clone())
            .map_err(|reason| ScriptLoadError::invalid(path, reason))
    }

    fn remove_file(&mut self, path: &VaultPath) -> bool {
        let Some(entry) = self.entries.remove(path) else {
            return false;
        };
        let Some(id) = entry.step_id else {
            return false;
        };
        if self.registry.origin(&id) != Some(StepOrigin::UserScript(path.clone())) {
            return false;
        }
        self.registry.unregister(&id);
        tracing::info!(path = %path, step = %id, "unregistered user script");
        true
    }

    fn rekey(&mut self, from: &VaultPath, to: &VaultPath) -> bool {
        let Some(mut entry) = self.entries.remove(from) else {
            return false;
        };
        if let Some(id) = &entry.step_id {
            self.registry.relocate(id, to);
        }
        tracing::debug!(from = %from, to = %to, "script renamed");
        entry.path = to.clone();
        self.entries.insert(to.clone(), entry);
        false
    }

    fn drop_all(&mut self) -> bool {
        let paths: Vec<VaultPath> = self.entries.keys().cloned().collect();
        let mut changed = false;
        for path in paths {
            changed |= self.remove_file(&path);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use longform_model::MemoryVault;

    const SHOUT: &str = "id: shout\ninput: text\noutput: text\nops:\n  - uppercase\n";
    const WHISPER: &str = "id: whisper\ninput: text\noutput: text\nops:\n  - lowercase\n";

    fn p(s: &str) -> VaultPath {
        VaultPath::new(s).unwrap()
    }

    fn loader(vault: &MemoryVault) -> UserScriptLoader<MemoryVault> {
        UserScriptLoader::new(
            Arc::new(vault.clone()),
            StepRegistry::with_builtins(),
            Some(p("Scripts")),
        )
    }

    #[tokio::test]
    async fn load_all_skips_bad_scripts() {
        let vault = MemoryVault::new();
        vault.insert(p("Scripts/shout.yaml"), SHOUT);
        vault.insert(p("Scripts/broken.yaml"), "id: [unclosed");
        vault.insert(p("Scripts/notes.md"), "not a script");
        vault.insert(p("Scripts/nested/whisper.yaml"), WHISPER);

        let mut loader = loader(&vault);
        let report = loader.load_all().await;
        assert_eq!(report.loaded, vec!["shout".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert!(loader.registry().contains("shout"));
        assert!(!loader.registry().contains("whisper"));
    }

    #[tokio::test]
    async fn modify_is_idempotent_and_rekeys_ids() {
        let vault = MemoryVault::new();
        vault.insert(p("Scripts/a.yaml"), SHOUT);
        let mut loader = loader(&vault);
        loader.load_all().await;

        let same = vault.insert(p("Scripts/a.yaml"), SHOUT);
        assert!(!loader.handle(&same).await);

        let changed = vault.insert(p("Scripts/a.yaml"), WHISPER);
        assert!(loader.handle(&changed).await);
        assert!(!loader.registry().contains("shout"));
        assert!(loader.registry().contains("whisper"));
    }

    #[tokio::test]
    async fn failed_reload_unregisters_previous_step() {
        let vault = MemoryVault::new();
        vault.insert(p("Scripts/a.yaml"), SHOUT);
        let mut loader = loader(&vault);
        loader.load_all().await;

        let broken = vault.insert(p("Scripts/a.yaml"), "id: shout\ninput: nope\n");
        assert!(loader.handle(&broken).await);
        assert!(!loader.registry().contains("shout"));
        assert_eq!(loader.entry(&p("Scripts/a.yaml")).unwrap().step_id, None);
    }

    #[tokio::test]
    async fn rename_rekeys_and_moves_out() {
        let vault = MemoryVault::new();
        vault.insert(p("Scripts/a.yaml"), SHOUT);
        let mut loader = loader(&vault);
        loader.load_all().await;

        let renamed = vault.rename(&p("Scripts/a.yaml"), &p("Scripts/b.yaml")).unwrap();
        assert!(!loader.handle(&renamed).await);
        assert_eq!(
            loader.registry().origin("shout"),
            Some(StepOrigin::UserScript(p("Scripts/b.yaml")))
        );
        assert!(loader.entry(&p("Scripts/a.yaml")).is_none());

        let moved_out = vault.rename(&p("Scripts/b.yaml"), &p("Archive/b.yaml")).unwrap();
        assert!(loader.handle(&moved_out).await);
        assert!(!loader.registry().contains("shout"));

        let moved_in = vault.rename(&p("Archive/b.yaml"), &p("Scripts/c.yaml")).unwrap();
        assert!(loader.handle(&moved_in).await);
        assert!(loader.registry().contains("shout"));
    }

    #[tokio::test]
    async fn delete_unregisters() {
        let vault = MemoryVault::new();
        vault.insert(p("Scripts/a.yaml"), SHOUT);
        let mut loader = loader(&vault);
        loader.load_all().await;

        let deleted = vault.remove(&p("Scripts/a.yaml")).unwrap();
        assert!(loader.handle(&deleted).await);
        assert!(!loader.registry().contains("shout"));
        assert_eq!(loader.entries().count(), 0);
    }

    #[tokio::test]
    async fn duplicate_id_keeps_first() {
        let vault = MemoryVault::new();
        vault.insert(p("Scripts/a.yaml"), SHOUT);
        vault.insert(p("Scripts/b.yaml"), SHOUT);
        let mut loader = loader(&vault);
        let report = loader.load_all().await;
        assert_eq!(report.loaded, vec!["shout".to_string()]);
        assert!(matches!(
            report.failed.as_slice(),
            [ScriptLoadError::Registration { .. }]
        ));
        assert_eq!(
            loader.registry().origin("shout"),
            Some(StepOrigin::UserScript(p("Scripts/a.yaml")))
        );

        // deleting the loser must not drop the winner's step
        let deleted = vault.remove(&p("Scripts/b.yaml")).unwrap();
        assert!(!loader.handle(&deleted).await);
        assert!(loader.registry().contains("shout"));
    }

    #[tokio::test]
    async fn blocked_script_takes_over_released_id() {
        let vault = MemoryVault::new();
        vault.insert(p("Scripts/a.yaml"), SHOUT);
        vault.insert(p("Scripts/b.yaml"), SHOUT);
        let mut loader = loader(&vault);
        loader.load_all().await;
        assert!(loader.entry(&p("Scripts/b.yaml")).unwrap().blocked);

        let deleted = vault.remove(&p("Scripts/a.yaml")).unwrap();
        assert!(loader.handle(&deleted).await);
        assert_eq!(
            loader.registry().origin("shout"),
            Some(StepOrigin::UserScript(p("Scripts/b.yaml")))
        );
        let entry = loader.entry(&p("Scripts/b.yaml")).unwrap();
        assert_eq!(entry.step_id.as_deref(), Some("shout"));
        assert!(!entry.blocked);
    }

    #[tokio::test]
    async fn unchanged_blocked_script_is_evaluated_again() {
        let vault = MemoryVault::new();
        vault.insert(p("Scripts/a.yaml"), SHOUT);
        vault.insert(p("Scripts/b.yaml"), SHOUT);
        let mut loader = loader(&vault);
        loader.load_all().await;

        // winner switches id without releasing through a delete
        let changed = vault.insert(p("Scripts/a.yaml"), WHISPER);
        assert!(loader.handle(&changed).await);
        assert_eq!(
            loader.registry().origin("shout"),
            Some(StepOrigin::UserScript(p("Scripts/b.yaml")))
        );

        let same = vault.insert(p("Scripts/b.yaml"), SHOUT);
        assert!(!loader.handle(&same).await);
        assert!(loader.registry().contains("whisper"));
    }

    #[tokio::test]
    async fn builtin_ids_cannot_be_shadowed() {
        let vault = MemoryVault::new();
        vault.insert(
            p("Scripts/x.yaml"),
            "id: remove-links\ninput: text\noutput: text\n",
        );
        let mut loader = loader(&vault);
        let report = loader.load_all().await;
        assert!(report.loaded.is_empty());
        assert_eq!(loader.registry().origin("remove-links"), Some(StepOrigin::Builtin));
    }

    #[tokio::test]
    async fn set_folder_swaps_scripts() {
        let vault = MemoryVault::new();
        vault.insert(p("Scripts/a.yaml"), SHOUT);
        vault.insert(p("Other/b.yaml"), WHISPER);
        let mut loader = loader(&vault);
        loader.load_all().await;

        let report = loader.set_folder(Some(p("Other"))).await;
        assert_eq!(report.loaded, vec!["whisper".to_string()]);
        assert!(!loader.registry().contains("shout"));
        assert!(!loader.tracks(&p("Scripts/a.yaml")));
    }

    #[tokio::test]
    async fn folder_delete_drops_everything() {
        let vault = MemoryVault::new();
        vault.insert(p("Scripts/a.yaml"), SHOUT);
        let mut loader = loader(&vault);
        loader.load_all().await;

        let deleted = vault.remove(&p("Scripts")).unwrap();
        assert!(loader.handle(&deleted).await);
        assert!(loader.registry().reader().resolve("shout").is_none());
    }
}
