//! Step registry
//!
//! [`StepRegistry`] is the single writer handle. It is deliberately not
//! `Clone`; other components observe it through [`RegistryReader`] clones
//! and run workflows against an immutable [`RegistrySnapshot`].

use crate::builtin;
use crate::error::RegistryError;
use crate::step::{Step, StepDescriptor, StepOrigin};
use longform_model::VaultPath;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct RegisteredStep {
    step: Arc<dyn Step>,
    origin: StepOrigin,
}

type StepMap = BTreeMap<String, RegisteredStep>;

/// Anything steps can be resolved from
pub trait StepLookup {
    /// Resolve a step by id
    fn lookup(&self, id: &str) -> Option<Arc<dyn Step>>;
}

/// Writer handle for the set of available steps
#[derive(Debug, Default)]
pub struct StepRegistry {
    steps: Arc<RwLock<Arc<StepMap>>>,
}

impl StepRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create registry with the built-in steps
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for step in builtin::builtin_steps() {
            registry.insert(step, StepOrigin::Builtin);
        }
        registry
    }

    /// Register a step, replacing any step with the same id
    ///
    /// Returns the replaced step.
    pub fn register(&mut self, step: Arc<dyn Step>, origin: StepOrigin) -> Option<Arc<dyn Step>> {
        self.insert(step, origin)
    }

    /// Register a step loaded from a user script
    ///
    /// # Errors
    /// Returns error if the id belongs to a built-in or to another script
    pub fn register_script(
        &mut self,
        step: Arc<dyn Step>,
        path: &VaultPath,
    ) -> Result<Option<Arc<dyn Step>>, RegistryError> {
        let id = step.id().to_string();
        match self.origin(&id) {
            Some(StepOrigin::Builtin) => return Err(RegistryError::ShadowsBuiltin(id)),
            Some(StepOrigin::UserScript(owner)) if &owner != path => {
                return Err(RegistryError::DuplicateId { id, owner });
            }
            _ => {}
        }
        Ok(self.insert(step, StepOrigin::UserScript(path.clone())))
    }

    fn insert(&self, step: Arc<dyn Step>, origin: StepOrigin) -> Option<Arc<dyn Step>> {
        let id = step.id().to_string();
        tracing::debug!(step = %id, %origin, "registering step");
        let mut guard = self.steps.write();
        Arc::make_mut(&mut *guard)
            .insert(id, RegisteredStep { step, origin })
            .map(|prev| prev.step)
    }

    /// Remove a step
    ///
    /// Workflows referencing it keep their configuration and report the id
    /// as unresolved.
    pub fn unregister(&mut self, id: &str) -> Option<Arc<dyn Step>> {
        let mut guard = self.steps.write();
        let removed = Arc::make_mut(&mut *guard).remove(id).map(|r| r.step);
        if removed.is_some() {
            tracing::debug!(step = %id, "unregistered step");
        }
        removed
    }

    /// Point a script step at a new path without re-registering it
    ///
    /// Returns `false` if `id` is not a script step.
    pub fn relocate(&mut self, id: &str, path: &VaultPath) -> bool {
        let mut guard = self.steps.write();
        match Arc::make_mut(&mut *guard).get_mut(id) {
            Some(entry) if matches!(entry.origin, StepOrigin::UserScript(_)) => {
                entry.origin = StepOrigin::UserScript(path.clone());
                true
            }
            _ => false,
        }
    }

    /// Resolve a step by id
    #[inline]
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<Arc<dyn Step>> {
        resolve_in(&self.steps, id)
    }

    /// Origin of a registered step
    #[must_use]
    pub fn origin(&self, id: &str) -> Option<StepOrigin> {
        self.steps.read().get(id).map(|r| r.origin.clone())
    }

    /// Check if a step is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.steps.read().contains_key(id)
    }

    /// Get number of registered steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.read().len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.read().is_empty()
    }

    /// Read-only handle sharing this registry
    #[must_use]
    pub fn reader(&self) -> RegistryReader {
        RegistryReader {
            steps: Arc::clone(&self.steps),
        }
    }

    /// Consistent view of the current steps
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        snapshot_of(&self.steps)
    }
}

/// Shared read-only view of a [`StepRegistry`]
#[derive(Debug, Clone)]
pub struct RegistryReader {
    steps: Arc<RwLock<Arc<StepMap>>>,
}

impl RegistryReader {
    /// Resolve a step by id
    #[inline]
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<Arc<dyn Step>> {
        resolve_in(&self.steps, id)
    }

    /// Check if a step is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.steps.read().contains_key(id)
    }

    /// Consistent view of the current steps
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        snapshot_of(&self.steps)
    }
}

/// Immutable set of steps captured at one moment
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    steps: Arc<StepMap>,
}

impl RegistrySnapshot {
    /// Resolve a step by id
    #[inline]
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<Arc<dyn Step>> {
        self.steps.get(id).map(|r| Arc::clone(&r.step))
    }

    /// Registered ids in order
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.steps.keys().map(String::as_str).collect()
    }

    /// Descriptors with their origins, ordered by id
    #[must_use]
    pub fn descriptors(&self) -> Vec<(&StepDescriptor, &StepOrigin)> {
        self.steps
            .values()
            .map(|r| (r.step.descriptor(), &r.origin))
            .collect()
    }

    /// Get number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if snapshot is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn resolve_in(steps: &RwLock<Arc<StepMap>>, id: &str) -> Option<Arc<dyn Step>> {
    steps.read().get(id).map(|r| Arc::clone(&r.step))
}

fn snapshot_of(steps: &RwLock<Arc<StepMap>>) -> RegistrySnapshot {
    RegistrySnapshot {
        steps: Arc::clone(&*steps.read()),
    }
}

impl StepLookup for StepRegistry {
    fn lookup(&self, id: &str) -> Option<Arc<dyn Step>> {
        self.resolve(id)
    }
}

impl StepLookup for RegistryReader {
    fn lookup(&self, id: &str) -> Option<Arc<dyn Step>> {
        self.resolve(id)
    }
}

impl StepLookup for RegistrySnapshot {
    fn lookup(&self, id: &str) -> Option<Arc<dyn Step>> {
        self.resolve(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StepError;
    use crate::step::{StepContext, StepOptions};
    use crate::value::{StepKind, StepValue};

    #[derive(Debug)]
    struct Named(StepDescriptor);

    impl Named {
        fn arc(id: &str) -> Arc<dyn Step> {
            Arc::new(Self(StepDescriptor::new(id, id, StepKind::Text, StepKind::Text)))
        }
    }

    impl Step for Named {
        fn descriptor(&self) -> &StepDescriptor {
            &self.0
        }

        fn execute(
            &self,
            input: StepValue,
            _options: &StepOptions,
            _context: &StepContext,
        ) -> Result<StepValue, StepError> {
            Ok(input)
        }
    }

    fn path(s: &str) -> VaultPath {
        VaultPath::new(s).unwrap()
    }

    #[test]
    fn registry_register_and_resolve() {
        let mut registry = StepRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.register(Named::arc("a"), StepOrigin::Builtin).is_none());
        assert!(registry.contains("a"));
        assert_eq!(registry.resolve("a").unwrap().id(), "a");
        assert!(registry.register(Named::arc("a"), StepOrigin::Builtin).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_unregister() {
        let mut registry = StepRegistry::new();
        registry.register(Named::arc("a"), StepOrigin::Builtin);
        assert!(registry.unregister("a").is_some());
        assert!(registry.resolve("a").is_none());
        assert!(registry.unregister("a").is_none());
    }

    #[test]
    fn registry_with_builtins() {
        let registry = StepRegistry::with_builtins();
        assert!(registry.contains("strip-frontmatter"));
        assert!(registry.contains("concatenate-text"));
        assert_eq!(registry.origin("write-heading"), Some(StepOrigin::Builtin));
    }

    #[test]
    fn script_cannot_shadow_builtin() {
        let mut registry = StepRegistry::with_builtins();
        let err = registry
            .register_script(Named::arc("remove-links"), &path("Scripts/x.yaml"))
            .unwrap_err();
        assert_eq!(err, RegistryError::ShadowsBuiltin("remove-links".into()));
    }

    #[test]
    fn script_duplicate_id_rejected() {
        let mut registry = StepRegistry::new();
        registry
            .register_script(Named::arc("shout"), &path("Scripts/a.yaml"))
            .unwrap();
        let err = registry
            .register_script(Named::arc("shout"), &path("Scripts/b.yaml"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId { .. }));
        // same file may re-register
        assert!(registry
            .register_script(Named::arc("shout"), &path("Scripts/a.yaml"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn relocate_rekeys_script_origin() {
        let mut registry = StepRegistry::new();
        registry
            .register_script(Named::arc("shout"), &path("Scripts/a.yaml"))
            .unwrap();
        assert!(registry.relocate("shout", &path("Scripts/b.yaml")));
        assert_eq!(
            registry.origin("shout"),
            Some(StepOrigin::UserScript(path("Scripts/b.yaml")))
        );
        registry.register(Named::arc("core"), StepOrigin::Builtin);
        assert!(!registry.relocate("core", &path("Scripts/c.yaml")));
    }

    #[test]
    fn reader_sees_writes() {
        let mut registry = StepRegistry::new();
        let reader = registry.reader();
        registry.register(Named::arc("a"), StepOrigin::Builtin);
        assert!(reader.contains("a"));
        registry.unregister("a");
        assert!(reader.resolve("a").is_none());
    }

    #[test]
    fn snapshot_is_stable() {
        let mut registry = StepRegistry::new();
        registry.register(Named::arc("a"), StepOrigin::Builtin);
        let snapshot = registry.snapshot();
        registry.unregister("a");
        registry.register(Named::arc("b"), StepOrigin::Builtin);
        assert_eq!(snapshot.ids(), vec!["a"]);
        assert!(snapshot.lookup("b").is_none());
    }
}
