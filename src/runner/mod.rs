//! Pipeline execution engine
//!
//! This module handles parameter resolution against published outputs, the
//! step wrapper, and sequential task execution.

pub mod action;
pub mod command;
pub mod context;
pub mod interpolate;
pub mod output;
pub mod parameter;
pub mod pipeline;
pub mod registry;
pub mod resolve;
pub mod run_context;
pub mod task;
pub mod value;

// Re-export main types
pub use action::{Action, ActionBuilder, DynAction, Step};
pub use command::*;
pub use context::*;
pub use interpolate::*;
pub use output::{Output, OutputBuilder, StepOutput};
pub use parameter::{EntityKind, Parameter};
pub use pipeline::*;
pub use registry::{StepFactory, StepParams, StepRegistry};
pub use resolve::*;
pub use run_context::{OutputLookup, RunContext};
pub use task::Task;
pub use value::{Value, ValueKind};
