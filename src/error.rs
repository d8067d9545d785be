//! Error types for Baton

use crate::runner::{EntityKind, ValueKind};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Baton operations
pub type Result<T> = std::result::Result<T, BatonError>;

/// Main error type for Baton
#[derive(Error, Debug)]
pub enum BatonError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration parsing, validation and pipeline construction errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Task '{0}' is not defined")]
    TaskNotFound(String),

    #[error("Failed to include file '{path}': {error}")]
    IncludeFile { path: PathBuf, error: String },

    #[error("Failed to load env file '{path}': {error}")]
    EnvFile { path: PathBuf, error: String },

    #[error("Action '{action}' uses unknown step type '{step_type}'")]
    UnknownStepType { action: String, step_type: String },

    #[error("Action '{action}' does not accept parameter '{name}'")]
    UnknownParameter { action: String, name: String },

    #[error("Action '{action}': {source}")]
    Construction {
        action: String,
        #[source]
        source: ResolutionError,
    },

    #[error("Action '{action}' references {entity} '{target}', which is not defined")]
    UnknownReference {
        action: String,
        entity: EntityKind,
        target: String,
    },

    #[error("Action '{action}' references {entity} '{target}' before it has run")]
    ForwardReference {
        action: String,
        entity: EntityKind,
        target: String,
    },
}

/// Pipeline execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command failed with exit code {0:?}")]
    CommandFailed(Option<i32>),

    #[error("Failed to start command: {0}")]
    Spawn(String),

    #[error("Assertion failed: expected {expected}, got {actual}")]
    AssertionFailed { expected: String, actual: String },

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u64, last: String },

    #[error("Cancelled")]
    Cancelled,

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    #[error("action '{id}': {source}")]
    Action {
        id: String,
        #[source]
        source: Box<ExecutionError>,
    },
}

impl ExecutionError {
    /// Wrap this error with the id of the action that raised it
    pub fn in_action(self, id: impl Into<String>) -> Self {
        ExecutionError::Action {
            id: id.into(),
            source: Box::new(self),
        }
    }

    /// Kind of the underlying resolution failure, looking through action wrappers
    pub fn resolution_kind(&self) -> Option<ResolutionErrorKind> {
        match self {
            ExecutionError::Resolution(e) => Some(e.kind()),
            ExecutionError::Action { source, .. } => source.resolution_kind(),
            _ => None,
        }
    }

    /// Id of the innermost action this error was raised in
    pub fn action_id(&self) -> Option<&str> {
        match self {
            ExecutionError::Action { id, source } => source.action_id().or(Some(id.as_str())),
            _ => None,
        }
    }
}

/// Failure to turn a parameter into a value
///
/// The `Display` output is meant for operators: it names the semantic role of
/// the parameter (once a typed helper has attached one) and the proximate
/// cause.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("required parameter '{role}' was not provided")]
    NilParameter { role: String },

    #[error("{}", describe_missing_reference(*entity, id))]
    ReferenceNotFound { entity: EntityKind, id: String },

    #[error("output of {entity} '{id}' is a {actual}, not a mapping, so key '{key}' cannot be read")]
    OutputNotAddressable {
        entity: EntityKind,
        id: String,
        key: String,
        actual: ValueKind,
    },

    #[error("output of {entity} '{id}' has no key '{key}'")]
    KeyNotFound {
        entity: EntityKind,
        id: String,
        key: String,
    },

    #[error("{role}: expected {expected}, got {actual}")]
    TypeMismatch {
        role: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    #[error("unknown entity type '{0}' (expected 'action' or 'task')")]
    UnknownEntityType(String),

    #[error("{role}: {source}")]
    Role {
        role: String,
        #[source]
        source: Box<ResolutionError>,
    },
}

fn describe_missing_reference(entity: EntityKind, id: &str) -> String {
    if id.is_empty() {
        format!("no {} id given to read output from", entity)
    } else {
        format!("{} '{}' has not published any output", entity, id)
    }
}

/// Discriminant of a [`ResolutionError`], stable across role wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionErrorKind {
    NilParameter,
    ReferenceNotFound,
    OutputNotAddressable,
    KeyNotFound,
    TypeMismatch,
    UnknownEntityType,
}

impl ResolutionError {
    pub fn kind(&self) -> ResolutionErrorKind {
        match self {
            ResolutionError::NilParameter { .. } => ResolutionErrorKind::NilParameter,
            ResolutionError::ReferenceNotFound { .. } => ResolutionErrorKind::ReferenceNotFound,
            ResolutionError::OutputNotAddressable { .. } => {
                ResolutionErrorKind::OutputNotAddressable
            }
            ResolutionError::KeyNotFound { .. } => ResolutionErrorKind::KeyNotFound,
            ResolutionError::TypeMismatch { .. } => ResolutionErrorKind::TypeMismatch,
            ResolutionError::UnknownEntityType(_) => ResolutionErrorKind::UnknownEntityType,
            ResolutionError::Role { source, .. } => source.kind(),
        }
    }

    /// Semantic role attached to this error, if any
    pub fn role(&self) -> Option<&str> {
        match self {
            ResolutionError::NilParameter { role }
            | ResolutionError::TypeMismatch { role, .. }
            | ResolutionError::Role { role, .. } => Some(role),
            _ => None,
        }
    }

    /// Attach a semantic role. Errors that already carry one are left as is.
    pub fn with_role(self, role: &str) -> Self {
        if self.role().is_some() {
            return self;
        }
        ResolutionError::Role {
            role: role.to_string(),
            source: Box::new(self),
        }
    }
}

/// Variable interpolation errors
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("Recursive interpolation detected for '{0}'")]
    RecursiveInterpolation(String),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for parameter resolution
pub type ResolutionResult<T> = std::result::Result<T, ResolutionError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;
