//! Error types for workflow compilation

use crate::value::StepKind;
use longform_model::{VaultError, VaultPath};
use thiserror::Error;

/// Failure inside a step's transformation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// Step received a value kind it cannot handle
    #[error("unsupported input: {0}")]
    UnsupportedInput(StepKind),

    /// Step-specific failure
    #[error("{0}")]
    Failed(String),
}

impl StepError {
    /// Create a step-specific failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Bound option value rejected by its spec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    /// Value has the wrong JSON type
    #[error("option '{option}' expects a {expected}")]
    TypeMismatch {
        /// Option id
        option: String,
        /// Expected type name
        expected: &'static str,
    },

    /// Number outside the declared range
    #[error("option '{option}' value {value} is outside {min}..={max}")]
    OutOfRange {
        /// Option id
        option: String,
        /// Offending value
        value: String,
        /// Lower bound (or `-inf`)
        min: String,
        /// Upper bound (or `inf`)
        max: String,
    },

    /// Text not among the declared choices
    #[error("option '{option}' value '{value}' is not one of {choices:?}")]
    NotAChoice {
        /// Option id
        option: String,
        /// Offending value
        value: String,
        /// Allowed values
        choices: Vec<String>,
    },
}

/// Workflow edit rejected by validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Adjacent steps disagree on value kind
    #[error("step '{id}' at position {position} expects {expected} but receives {found}")]
    KindMismatch {
        /// Step id
        id: String,
        /// Position in the workflow
        position: usize,
        /// Declared input kind
        expected: StepKind,
        /// Previous step's output kind
        found: StepKind,
    },

    /// Bound options do not satisfy the step's specs
    #[error("step '{id}' at position {position}: {source}")]
    InvalidOption {
        /// Step id
        id: String,
        /// Position in the workflow
        position: usize,
        /// Option failure
        #[source]
        source: OptionError,
    },

    /// Workflow with this name does not exist
    #[error("workflow not found: {0}")]
    NotFound(String),
}

/// Workflow run failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Workflow has no steps
    #[error("workflow '{0}' has no steps")]
    EmptyWorkflow(String),

    /// Step id does not resolve in the registry
    #[error("unresolved step '{id}' at position {position}")]
    UnresolvedStep {
        /// Step id
        id: String,
        /// Position in the workflow
        position: usize,
    },

    /// Value kind disagrees with a step's declaration
    #[error("step '{id}' at position {position} expected {expected} but found {found}")]
    KindMismatch {
        /// Step id
        id: String,
        /// Position in the workflow
        position: usize,
        /// Declared kind
        expected: StepKind,
        /// Actual kind
        found: StepKind,
    },

    /// Bound options do not satisfy the step's specs
    #[error("step '{id}' at position {position}: {source}")]
    InvalidOption {
        /// Step id
        id: String,
        /// Position in the workflow
        position: usize,
        /// Option failure
        #[source]
        source: OptionError,
    },

    /// Step returned an error
    #[error("step '{id}' at position {position} failed: {source}")]
    StepFailed {
        /// Step id
        id: String,
        /// Position in the workflow
        position: usize,
        /// Step failure
        #[source]
        source: StepError,
    },
}

impl CompileError {
    /// Position of the failing step, if any
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::EmptyWorkflow(_) => None,
            Self::UnresolvedStep { position, .. }
            | Self::KindMismatch { position, .. }
            | Self::InvalidOption { position, .. }
            | Self::StepFailed { position, .. } => Some(*position),
        }
    }
}

/// Registration refused by the step registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// User script tried to replace a built-in step
    #[error("step id '{0}' is reserved by a built-in step")]
    ShadowsBuiltin(String),

    /// Another script already registered this id
    #[error("step id '{id}' is already defined by {owner}")]
    DuplicateId {
        /// Step id
        id: String,
        /// Script that owns the id
        owner: VaultPath,
    },
}

/// Failure to load one user script
#[derive(Debug, Error)]
pub enum ScriptLoadError {
    /// Script could not be read
    #[error("failed to read script: {0}")]
    Read(#[from] VaultError),

    /// Script is not valid YAML/JSON or does not match the script format
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Script path
        path: VaultPath,
        /// Parser message
        message: String,
    },

    /// Script parsed but describes an invalid step
    #[error("invalid script {path}: {reason}")]
    Invalid {
        /// Script path
        path: VaultPath,
        /// What is wrong
        reason: String,
    },

    /// Step registry refused the script
    #[error("cannot register {path}: {source}")]
    Registration {
        /// Script path
        path: VaultPath,
        /// Registry failure
        #[source]
        source: RegistryError,
    },
}

impl ScriptLoadError {
    /// Create parse error
    pub fn parse(path: &VaultPath, message: impl ToString) -> Self {
        Self::Parse {
            path: path.clone(),
            message: message.to_string(),
        }
    }

    /// Create invalid-script error
    pub fn invalid(path: &VaultPath, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.clone(),
            reason: reason.into(),
        }
    }
}
