//! Step type registry
//!
//! Maps the `type` of an action in the pipeline file to a factory building
//! the concrete step from its declared parameters. Factories take their
//! parameters out of a [`StepParams`]; a required parameter that was not
//! declared fails right there, before anything runs.

use crate::config::ActionSpec;
use crate::error::{ConfigError, ConfigResult};
use crate::runner::action::{ActionBuilder, DynAction, Step};
use crate::runner::parameter::Parameter;
use crate::runner::resolve::require;
use std::collections::{BTreeMap, HashMap};

/// Builds a step from the parameters declared for one action
pub type StepFactory = fn(&mut StepParams) -> ConfigResult<Box<dyn Step>>;

/// Parameters declared for one action, handed out to its step factory
#[derive(Debug)]
pub struct StepParams {
    action: String,
    params: BTreeMap<String, Parameter>,
}

impl StepParams {
    pub fn new(action: impl Into<String>, params: BTreeMap<String, Parameter>) -> Self {
        StepParams {
            action: action.into(),
            params,
        }
    }

    pub fn action_id(&self) -> &str {
        &self.action
    }

    /// Take a parameter that must be declared
    pub fn required(&mut self, name: &str, role: &str) -> ConfigResult<Parameter> {
        require(self.params.remove(name), role).map_err(|source| ConfigError::Construction {
            action: self.action.clone(),
            source,
        })
    }

    pub fn optional(&mut self, name: &str) -> Option<Parameter> {
        self.params.remove(name)
    }

    /// Take every remaining parameter
    pub fn take_all(&mut self) -> BTreeMap<String, Parameter> {
        std::mem::take(&mut self.params)
    }

    /// Fail if the action declared parameters its step never asked for
    pub fn finish(self) -> ConfigResult<()> {
        match self.params.into_keys().next() {
            Some(name) => Err(ConfigError::UnknownParameter {
                action: self.action,
                name,
            }),
            None => Ok(()),
        }
    }
}

/// Registry of step types by name
pub struct StepRegistry {
    factories: HashMap<String, StepFactory>,
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl StepRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        StepRegistry {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in steps
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::steps::register_builtins(&mut registry);
        registry
    }

    /// Register a step type, replacing any factory under the same name
    pub fn register(&mut self, name: impl Into<String>, factory: StepFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn has_step(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered step type names, sorted
    pub fn step_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Build the action described by `spec`
    pub fn build(&self, spec: &ActionSpec) -> ConfigResult<DynAction> {
        let factory = self
            .factories
            .get(&spec.step_type)
            .ok_or_else(|| ConfigError::UnknownStepType {
                action: spec.id.clone(),
                step_type: spec.step_type.clone(),
            })?;

        let mut params = StepParams::new(spec.id.clone(), spec.params.clone());
        let step = factory(&mut params)?;
        params.finish()?;

        Ok(ActionBuilder::wrap(step, spec.display_name(), spec.id.as_str()))
    }
}
