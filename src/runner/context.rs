//! Execution context for pipeline runs
//!
//! The context carries everything a step may need while it executes: where
//! to run commands, which variables are visible for interpolation, and the
//! run context holding outputs published by earlier steps.

use crate::runner::run_context::{OutputLookup, RunContext};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Execution context that tracks state during a run
pub struct Context {
    /// Current working directory
    pub working_dir: PathBuf,

    /// Configuration file path
    pub config_path: Option<PathBuf>,

    /// Variables for `${var}` interpolation
    pub vars: HashMap<String, String>,

    /// Interpreter used for shell commands (e.g., ["bash", "-c"])
    pub interpreter: Vec<String>,

    /// Published outputs of this run, if any are being collected
    run_context: Option<RunContext>,

    /// Set from outside to stop the run
    cancelled: Arc<AtomicBool>,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Context {
    /// Create a new context with default settings and no run context
    pub fn new() -> Self {
        Context {
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_path: None,
            vars: HashMap::new(),
            interpreter: vec!["sh".to_string(), "-c".to_string()],
            run_context: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a context with a specific working directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    /// Set the configuration file path
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Set variables
    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    /// Set a single variable
    pub fn set_var(&mut self, key: String, value: String) {
        self.vars.insert(key, value);
    }

    /// Get a variable value
    pub fn get_var(&self, key: &str) -> Option<&String> {
        self.vars.get(key)
    }

    /// Set the interpreter
    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Attach the run context steps publish into and resolve from
    pub fn with_run_context(mut self, run_context: RunContext) -> Self {
        self.run_context = Some(run_context);
        self
    }

    /// Attach a fresh run context if none is attached yet, returning a handle to it
    pub fn ensure_run_context(&mut self) -> RunContext {
        self.run_context.get_or_insert_with(RunContext::new).clone()
    }

    pub fn run_context(&self) -> Option<&RunContext> {
        self.run_context.as_ref()
    }

    /// Published outputs, in the form parameter resolution takes them
    pub fn outputs(&self) -> Option<&dyn OutputLookup> {
        self.run_context.as_ref().map(|rc| rc as &dyn OutputLookup)
    }

    /// Handle that cancels the run when set to `true`
    ///
    /// May be set from any thread. Waiting steps and the pipeline driver poll it.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Get the directory for the config file (or current dir)
    pub fn config_dir(&self) -> PathBuf {
        self.config_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| self.working_dir.clone())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
