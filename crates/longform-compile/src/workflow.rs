//! Workflow model and validation
//!
//! A [`Workflow`] only stores step ids and bound option values. Whether the
//! ids resolve, and whether adjacent kinds line up, is decided against a
//! [`StepLookup`] at the time of the check.

use crate::error::{OptionError, WorkflowError};
use crate::registry::StepLookup;
use crate::value::StepKind;
use serde_json::{Map, Value};

/// One step of a workflow with its bound options
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepInvocation {
    /// Step id
    pub id: String,
    /// Bound option values
    pub options: Map<String, Value>,
}

impl StepInvocation {
    /// Invocation with no bound options
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            options: Map::new(),
        }
    }

    /// Bind an option value
    #[inline]
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// Ordered sequence of step invocations
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workflow {
    /// Optional description
    pub description: Option<String>,
    /// Invocations in run order
    pub steps: Vec<StepInvocation>,
}

impl Workflow {
    /// Create empty workflow
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append an invocation
    #[inline]
    #[must_use]
    pub fn with_step(mut self, step: StepInvocation) -> Self {
        self.steps.push(step);
        self
    }

    /// Append an invocation in place
    pub fn push(&mut self, step: StepInvocation) {
        self.steps.push(step);
    }

    /// Insert an invocation at `index` (clamped to the end)
    pub fn insert(&mut self, index: usize, step: StepInvocation) {
        let index = index.min(self.steps.len());
        self.steps.insert(index, step);
    }

    /// Remove the invocation at `index`
    pub fn remove(&mut self, index: usize) -> Option<StepInvocation> {
        (index < self.steps.len()).then(|| self.steps.remove(index))
    }

    /// Move an invocation from one position to another
    ///
    /// Returns `false` if either position is out of range.
    pub fn move_step(&mut self, from: usize, to: usize) -> bool {
        if from >= self.steps.len() || to >= self.steps.len() {
            return false;
        }
        let step = self.steps.remove(from);
        self.steps.insert(to, step);
        true
    }

    /// Get number of invocations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if workflow has no invocations
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step ids in order
    #[must_use]
    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id.as_str()).collect()
    }

    /// Check the workflow against the currently available steps
    #[must_use]
    pub fn validate(&self, steps: &impl StepLookup) -> WorkflowValidation {
        let mut report = WorkflowValidation::default();
        let mut previous_output: Option<StepKind> = None;

        for (position, invocation) in self.steps.iter().enumerate() {
            let Some(step) = steps.lookup(&invocation.id) else {
                report.unresolved.push(UnresolvedStep {
                    position,
                    id: invocation.id.clone(),
                });
                previous_output = None;
                continue;
            };
            let descriptor = step.descriptor();

            if let Some(found) = previous_output {
                if found != descriptor.input {
                    report.mismatches.push(WorkflowError::KindMismatch {
                        id: invocation.id.clone(),
                        position,
                        expected: descriptor.input,
                        found,
                    });
                }
            }
            if let Err(source) = descriptor.check_options(&invocation.options) {
                report.invalid_options.push(InvalidOption {
                    position,
                    id: invocation.id.clone(),
                    source,
                });
            }
            previous_output = Some(descriptor.output);
        }

        report
    }
}

/// Invocation whose step id does not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedStep {
    /// Position in the workflow
    pub position: usize,
    /// Step id
    pub id: String,
}

/// Invocation whose bound options fail their specs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidOption {
    /// Position in the workflow
    pub position: usize,
    /// Step id
    pub id: String,
    /// Failure
    pub source: OptionError,
}

/// Result of [`Workflow::validate`]
///
/// Kind mismatches are only reported between adjacent resolved steps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkflowValidation {
    /// Ids that do not resolve
    pub unresolved: Vec<UnresolvedStep>,
    /// Adjacent kind disagreements
    pub mismatches: Vec<WorkflowError>,
    /// Option failures
    pub invalid_options: Vec<InvalidOption>,
}

impl WorkflowValidation {
    /// Check if every step resolves
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Check if nothing is wrong
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.unresolved.is_empty() && self.mismatches.is_empty() && self.invalid_options.is_empty()
    }

    /// First structural error an edit should be rejected for
    ///
    /// Unresolved ids are not errors here: they may be supplied by a script
    /// that has not loaded yet.
    #[must_use]
    pub fn first_error(&self) -> Option<WorkflowError> {
        if let Some(mismatch) = self.mismatches.first() {
            return Some(mismatch.clone());
        }
        self.invalid_options
            .first()
            .map(|invalid| WorkflowError::InvalidOption {
                id: invalid.id.clone(),
                position: invalid.position,
                source: invalid.source.clone(),
            })
    }

    /// Unresolved ids in order
    #[must_use]
    pub fn unresolved_ids(&self) -> Vec<&str> {
        self.unresolved.iter().map(|u| u.id.as_str()).collect()
    }
}
