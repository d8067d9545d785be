//! Baton - YAML pipelines whose steps hand outputs to each other
//!
//! Steps declare parameters that are either static values or references to
//! the output of an earlier action or task. References are resolved at run
//! time against the outputs published so far in the run.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod steps;
pub mod ui;

// Re-export commonly used types
pub use error::{BatonError, Result};

/// Current version of Baton
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
