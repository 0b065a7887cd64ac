//! Workflow execution

use crate::error::CompileError;
use crate::registry::StepLookup;
use crate::step::{Step, StepContext, StepOptions};
use crate::value::StepValue;
use crate::workflow::Workflow;
use longform_model::{DraftSnapshot, VaultPath};
use std::sync::Arc;

/// Output of a successful workflow run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    /// Index note of the compiled draft
    pub draft: VaultPath,
    /// Workflow name
    pub workflow: String,
    /// Final manuscript text
    pub text: String,
    /// Number of steps executed
    pub steps_run: usize,
}

/// Run a workflow over a draft snapshot
///
/// Every step id is resolved before anything runs. The first step's input
/// kind decides how the snapshot is presented to it; each later step receives
/// the previous step's output. The final value is rendered as text.
///
/// # Errors
/// Returns the first failure; partial output is discarded
pub fn execute(
    name: &str,
    workflow: &Workflow,
    draft: Arc<DraftSnapshot>,
    steps: &impl StepLookup,
) -> Result<CompiledArtifact, CompileError> {
    if workflow.is_empty() {
        return Err(CompileError::EmptyWorkflow(name.to_string()));
    }

    let resolved: Vec<Arc<dyn Step>> = workflow
        .steps
        .iter()
        .enumerate()
        .map(|(position, invocation)| {
            steps
                .lookup(&invocation.id)
                .ok_or_else(|| CompileError::UnresolvedStep {
                    id: invocation.id.clone(),
                    position,
                })
        })
        .collect::<Result<_, _>>()?;

    let first_input = resolved[0].descriptor().input;
    let mut value = StepValue::seed(first_input, &draft);

    for (position, (invocation, step)) in workflow.steps.iter().zip(&resolved).enumerate() {
        let descriptor = step.descriptor();
        let id = invocation.id.clone();

        if value.kind() != descriptor.input {
            return Err(CompileError::KindMismatch {
                id,
                position,
                expected: descriptor.input,
                found: value.kind(),
            });
        }

        let options = StepOptions::resolve(&descriptor.options, &invocation.options).map_err(
            |source| CompileError::InvalidOption {
                id: id.clone(),
                position,
                source,
            },
        )?;
        let context = StepContext {
            draft: Arc::clone(&draft),
            workflow: name.to_string(),
            position,
        };

        tracing::debug!(workflow = %name, step = %id, position, "running step");
        let output = step
            .execute(value, &options, &context)
            .map_err(|source| CompileError::StepFailed {
                id: id.clone(),
                position,
                source,
            })?;

        if output.kind() != descriptor.output {
            return Err(CompileError::KindMismatch {
                id,
                position,
                expected: descriptor.output,
                found: output.kind(),
            });
        }
        value = output;
    }

    let text = value.into_text();
    tracing::info!(
        workflow = %name,
        draft = %draft.draft.vault_path,
        steps = resolved.len(),
        bytes = text.len(),
        "compiled draft"
    );

    Ok(CompiledArtifact {
        draft: draft.draft.vault_path.clone(),
        workflow: name.to_string(),
        text,
        steps_run: resolved.len(),
    })
}
