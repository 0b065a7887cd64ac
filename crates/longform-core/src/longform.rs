//! The process-scoped application object
//!
//! [`Longform`] owns the synchronization engine, the script loader (and with
//! it the step registry), the workflows and the persisted settings. Every
//! mutation goes through `&mut self`, so one notification or edit is applied
//! at a time. Readers use [`ModelReader`] and [`RegistryReader`].

use crate::config::LongformConfig;
use crate::error::{LongformError, PersistenceError};
use crate::persist::{PersistenceStatus, Persister};
use crate::settings::{PersistedDraft, PersistedSettings, SettingsStore};
use longform_compile::{
    default_workflows, deserialize_workflow, execute, serialize_workflow, CompiledArtifact,
    LoadReport, RegistryReader, Step, StepOrigin, StepRegistry, UserScriptLoader, Workflow,
    WorkflowError, WorkflowValidation, DEFAULT_WORKFLOW, SINGLE_FILE_WORKFLOW,
};
use longform_model::{Draft, Scene, Vault, VaultEvent, VaultPath};
use longform_sync::{DraftSet, ModelReader, SceneCache, VaultSync};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Longform application object
#[derive(Debug)]
pub struct Longform<V: Vault, S: SettingsStore> {
    config: LongformConfig,
    sync: VaultSync<V>,
    scripts: UserScriptLoader<V>,
    workflows: BTreeMap<String, Workflow>,
    settings: PersistedSettings,
    store: Arc<S>,
    persister: Persister,
    initialized: bool,
}

impl<V: Vault, S: SettingsStore> Longform<V, S> {
    /// Load settings, scripts and drafts
    ///
    /// Changes made while loading are not persisted on their own; they are
    /// written with the first mutation after loading.
    ///
    /// # Errors
    /// Returns error if settings cannot be loaded or the vault cannot be
    /// walked
    pub async fn load(
        vault: Arc<V>,
        store: S,
        config: LongformConfig,
    ) -> Result<Self, LongformError> {
        let store = Arc::new(store);
        let settings = store.load().await?.unwrap_or_default();

        let mut workflows: BTreeMap<String, Workflow> = settings
            .workflows
            .iter()
            .map(|(name, serialized)| (name.clone(), deserialize_workflow(serialized)))
            .collect();
        if config.install_default_workflows {
            for (name, serialized) in default_workflows() {
                if !workflows.contains_key(&name) {
                    tracing::debug!(workflow = %name, "installing default workflow");
                    workflows.insert(name, deserialize_workflow(&serialized));
                }
            }
        }

        let folder = config
            .user_script_folder
            .as_deref()
            .or(settings.user_script_folder.as_deref())
            .and_then(parse_folder);
        let mut scripts =
            UserScriptLoader::new(Arc::clone(&vault), StepRegistry::with_builtins(), folder);
        log_report(&scripts.load_all().await);

        let mut sync = VaultSync::new(vault, SceneCache::new(config.cache_capacity));
        sync.discover_drafts().await?;

        let persister = Persister::spawn(Arc::clone(&store), config.debounce());
        let mut longform = Self {
            config,
            sync,
            scripts,
            workflows,
            settings,
            store,
            persister,
            initialized: false,
        };
        longform.retain_selection();
        longform.initialized = true;

        tracing::info!(
            drafts = longform.sync.drafts().len(),
            workflows = longform.workflows.len(),
            steps = longform.scripts.registry().len(),
            "longform loaded"
        );
        Ok(longform)
    }

    /// Route one vault notification
    ///
    /// Returns `true` if the draft model changed.
    ///
    /// # Errors
    /// Returns error if reconciliation fails
    pub async fn handle_event(&mut self, event: &VaultEvent) -> Result<bool, LongformError> {
        if self.scripts.handle(event).await {
            tracing::debug!(steps = self.scripts.registry().len(), "registry updated");
        }

        let changed = self.sync.handle(event).await?;
        if changed {
            if let VaultEvent::Renamed { from, to } = event {
                self.follow_rename(from, to);
            }
            self.retain_selection();
            self.mark_dirty();
        }
        Ok(changed)
    }

    /// Latest committed drafts
    #[must_use]
    pub fn drafts(&self) -> Arc<DraftSet> {
        self.sync.drafts()
    }

    /// Every draft ordered by index path
    #[must_use]
    pub fn list_drafts(&self) -> Vec<Draft> {
        self.sync.drafts().list().cloned().collect()
    }

    /// Draft owning a path, as index note or tracked scene
    #[must_use]
    pub fn draft_for_path(&self, path: &VaultPath) -> Option<Draft> {
        self.sync.drafts().draft_for_path(path).cloned()
    }

    /// Resolved scenes of a draft in order
    #[must_use]
    pub fn scenes_of(&self, index: &VaultPath) -> Option<Vec<Scene>> {
        self.sync.drafts().scenes_of(index)
    }

    /// Subscribe to draft model commits
    #[must_use]
    pub fn model_reader(&self) -> ModelReader {
        self.sync.reader()
    }

    /// Read-only handle to the step registry
    #[must_use]
    pub fn registry(&self) -> RegistryReader {
        self.scripts.reader()
    }

    /// Workflow names in order
    #[must_use]
    pub fn list_workflows(&self) -> Vec<&str> {
        self.workflows.keys().map(String::as_str).collect()
    }

    /// Workflow by name
    #[must_use]
    pub fn get_workflow(&self, name: &str) -> Option<&Workflow> {
        self.workflows.get(name)
    }

    /// Create or replace a workflow
    ///
    /// Adjacent kind mismatches and bad option values are rejected. Steps
    /// that do not resolve yet are accepted and reported in the returned
    /// validation.
    ///
    /// # Errors
    /// Returns the first structural error
    pub fn set_workflow(
        &mut self,
        name: &str,
        workflow: Workflow,
    ) -> Result<WorkflowValidation, WorkflowError> {
        let validation = workflow.validate(&self.scripts.registry().snapshot());
        if let Some(error) = validation.first_error() {
            tracing::warn!(workflow = %name, error = %error, "rejected workflow edit");
            return Err(error);
        }
        if !validation.is_resolved() {
            tracing::warn!(
                workflow = %name,
                unresolved = ?validation.unresolved_ids(),
                "workflow references unknown steps"
            );
        }
        self.workflows.insert(name.to_string(), workflow);
        self.mark_dirty();
        Ok(validation)
    }

    /// Delete a workflow
    ///
    /// # Errors
    /// Returns error if no workflow has this name
    pub fn remove_workflow(&mut self, name: &str) -> Result<Workflow, WorkflowError> {
        let removed = self
            .workflows
            .remove(name)
            .ok_or_else(|| WorkflowError::NotFound(name.to_string()))?;
        tracing::info!(workflow = %name, "workflow removed");
        self.mark_dirty();
        Ok(removed)
    }

    /// Step ids of a workflow that do not currently resolve
    ///
    /// # Errors
    /// Returns error if no workflow has this name
    pub fn unresolved_steps(&self, name: &str) -> Result<Vec<String>, WorkflowError> {
        let workflow = self
            .workflows
            .get(name)
            .ok_or_else(|| WorkflowError::NotFound(name.to_string()))?;
        let validation = workflow.validate(&self.scripts.registry().snapshot());
        Ok(validation
            .unresolved_ids()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Workflow a draft compiles with when none is named
    ///
    /// The draft's own selection wins; otherwise the shipped default for its
    /// format.
    #[must_use]
    pub fn workflow_name_for(&self, draft: &Draft) -> String {
        match &draft.workflow {
            Some(name) => name.clone(),
            None if draft.is_multi_file() => DEFAULT_WORKFLOW.to_string(),
            None => SINGLE_FILE_WORKFLOW.to_string(),
        }
    }

    /// Compile a draft with a named workflow
    ///
    /// The registry and the draft are snapshotted when the run starts; edits
    /// that arrive later do not affect it.
    ///
    /// # Errors
    /// Returns error if the workflow or draft is unknown or the run fails
    pub async fn run_workflow(
        &self,
        name: &str,
        draft: &VaultPath,
    ) -> Result<CompiledArtifact, LongformError> {
        let steps = self.scripts.registry().snapshot();
        let workflow = self
            .workflows
            .get(name)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound(name.to_string()))?;
        if !self.sync.drafts().contains(draft) {
            return Err(LongformError::UnknownDraft(draft.clone()));
        }
        let snapshot = Arc::new(self.sync.snapshot(draft).await?);

        tracing::info!(workflow = %name, draft = %draft, steps = workflow.len(), "compiling");
        match execute(name, &workflow, snapshot, &steps) {
            Ok(artifact) => Ok(artifact),
            Err(e) => {
                tracing::warn!(workflow = %name, draft = %draft, error = %e, "compile failed");
                Err(e.into())
            }
        }
    }

    /// Register a host-provided step
    ///
    /// Returns the step it replaced.
    pub fn register_builtin(&mut self, step: Arc<dyn Step>) -> Option<Arc<dyn Step>> {
        self.scripts
            .registry_mut()
            .register(step, StepOrigin::Builtin)
    }

    /// Change the user script folder and reload scripts
    pub async fn set_user_script_folder(&mut self, folder: Option<VaultPath>) -> LoadReport {
        self.settings.user_script_folder = folder.as_ref().map(ToString::to_string);
        let report = self.scripts.set_folder(folder).await;
        log_report(&report);
        self.mark_dirty();
        report
    }

    /// Folder scripts are loaded from
    #[must_use]
    pub fn user_script_folder(&self) -> Option<&VaultPath> {
        self.scripts.folder()
    }

    /// Select the draft the host works on
    ///
    /// # Errors
    /// Returns error if the path is not a draft's index note
    pub fn select_draft(&mut self, index: &VaultPath) -> Result<(), LongformError> {
        if !self.sync.drafts().contains(index) {
            return Err(LongformError::UnknownDraft(index.clone()));
        }
        self.settings.selected_draft_vault_path = Some(index.to_string());
        self.mark_dirty();
        Ok(())
    }

    /// Selected draft, if it still exists
    #[must_use]
    pub fn selected_draft(&self) -> Option<VaultPath> {
        self.settings
            .selected_draft_vault_path
            .as_deref()
            .and_then(|raw| VaultPath::new(raw).ok())
    }

    /// Write settings now
    ///
    /// # Errors
    /// Returns error if the store rejects the write
    pub async fn save(&self) -> Result<(), PersistenceError> {
        self.persister.flush(self.persisted()).await
    }

    /// State of settings persistence
    #[must_use]
    pub fn persistence_status(&self) -> PersistenceStatus {
        self.persister.status()
    }

    /// Settings as they would be written now
    #[must_use]
    pub fn persisted(&self) -> PersistedSettings {
        let mut settings = self.settings.clone();
        settings.user_script_folder = self.scripts.folder().map(ToString::to_string);
        settings.workflows = self
            .workflows
            .iter()
            .map(|(name, workflow)| (name.clone(), serialize_workflow(workflow)))
            .collect();
        settings.drafts = self
            .sync
            .drafts()
            .list()
            .map(|draft| {
                let order = draft
                    .scene_list()
                    .into_iter()
                    .map(|scene| scene.path.to_string())
                    .collect();
                (
                    draft.vault_path.to_string(),
                    PersistedDraft {
                        scene_order: order,
                        format: draft.format,
                    },
                )
            })
            .collect();
        settings
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LongformConfig {
        &self.config
    }

    /// Settings store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write pending settings and stop background work
    pub async fn shutdown(self) {
        self.persister.shutdown().await;
        tracing::info!("longform shut down");
    }

    fn mark_dirty(&self) {
        if self.initialized {
            self.persister.schedule(self.persisted());
        }
    }

    fn follow_rename(&mut self, from: &VaultPath, to: &VaultPath) {
        let Some(selected) = self.selected_draft() else {
            return;
        };
        if let Some(moved) = selected.rebase(from, to) {
            self.settings.selected_draft_vault_path = Some(moved.to_string());
        }
    }

    /// Drop a selection whose draft is gone
    fn retain_selection(&mut self) {
        if let Some(selected) = self.selected_draft() {
            if !self.sync.drafts().contains(&selected) {
                tracing::debug!(draft = %selected, "selected draft is gone");
                self.settings.selected_draft_vault_path = None;
            }
        }
    }
}

fn parse_folder(raw: &str) -> Option<VaultPath> {
    match VaultPath::new(raw) {
        Ok(path) if !path.is_root() => Some(path),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(folder = %raw, error = %e, "ignoring invalid script folder");
            None
        }
    }
}

fn log_report(report: &LoadReport) {
    for failure in &report.failed {
        tracing::warn!(error = %failure, "user script skipped");
    }
    if !report.loaded.is_empty() {
        tracing::info!(steps = ?report.loaded, "user scripts loaded");
    }
}
