//! Longform Compile
//!
//! Workflow compilation: steps, the step registry, workflow validation and
//! execution, and steps loaded from user scripts.
//!
//! # Core Concepts
//!
//! - [`Step`]: Immutable transformation between [`StepKind`]s
//! - [`StepRegistry`]: Single writer for the set of available steps
//! - [`Workflow`]: Ordered step invocations with bound options
//! - [`execute`]: Runs a workflow over a draft snapshot
//! - [`UserScriptLoader`]: Keeps script steps in step with a vault folder
//!
//! # Example
//!
//! ```rust,ignore
//! use longform_compile::{execute, default_workflows, deserialize_workflow, StepRegistry};
//!
//! let registry = StepRegistry::with_builtins();
//! let workflows = default_workflows();
//! let workflow = deserialize_workflow(&workflows["Default Workflow"]);
//! let artifact = execute("Default Workflow", &workflow, snapshot, &registry.snapshot())?;
//! ```

#![warn(unreachable_pub)]

mod builtin;
mod error;
mod execute;
mod loader;
mod registry;
mod serialization;
mod step;
mod value;
mod workflow;

pub mod script;
pub mod text;

pub use builtin::{
    builtin_steps, expand_scene_vars, ConcatenateText, PrependTitle, SceneFilter, WriteHeading,
};
pub use error::{
    CompileError, OptionError, RegistryError, ScriptLoadError, StepError, WorkflowError,
};
pub use execute::{execute, CompiledArtifact};
pub use loader::{LoadReport, UserScriptEntry, UserScriptLoader};
pub use registry::{RegistryReader, RegistrySnapshot, StepLookup, StepRegistry};
pub use serialization::{
    default_workflows, deserialize_workflow, serialize_workflow, SerializedStep,
    SerializedWorkflow, DEFAULT_WORKFLOW, SINGLE_FILE_WORKFLOW,
};
pub use step::{OptionSpec, OptionType, Step, StepContext, StepDescriptor, StepOptions, StepOrigin};
pub use value::{StepKind, StepValue};
pub use workflow::{InvalidOption, StepInvocation, UnresolvedStep, Workflow, WorkflowValidation};
