//! Run-scoped store of published outputs
//!
//! A [`RunContext`] is created once per pipeline run and shared by every step
//! of that run. It holds two independent namespaces, one for action outputs
//! and one for task outputs, each keyed by producer id.
//!
//! Publishing is an unconditional overwrite. Writers to different ids never
//! interfere; two writers racing on the same id end with whichever stored
//! last, and the store does not try to detect that. Drivers that run steps in
//! parallel must keep producers of the same id sequential.

use crate::runner::output::Output;
use crate::runner::value::{Mapping, Value};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Read access to published outputs, all that parameter resolution needs
pub trait OutputLookup {
    fn action_output(&self, id: &str) -> Option<Output>;
    fn task_output(&self, id: &str) -> Option<Output>;
}

/// Shared key/value store of published outputs
///
/// Cloning is cheap and yields a handle onto the same store.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    actions: Arc<DashMap<String, Output>>,
    tasks: Arc<DashMap<String, Output>>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an action's output, replacing any earlier one for the same id
    pub fn store_action_output(&self, id: impl Into<String>, output: impl Into<Output>) {
        let id = id.into();
        debug!(action = %id, "publishing action output");
        self.actions.insert(id, output.into());
    }

    /// Publish a task's output, replacing any earlier one for the same id
    pub fn store_task_output(&self, id: impl Into<String>, output: impl Into<Output>) {
        let id = id.into();
        debug!(task = %id, "publishing task output");
        self.tasks.insert(id, output.into());
    }

    pub fn get_action_output(&self, id: &str) -> Option<Output> {
        self.actions.get(id).map(|entry| entry.value().clone())
    }

    pub fn get_task_output(&self, id: &str) -> Option<Output> {
        self.tasks.get(id).map(|entry| entry.value().clone())
    }

    /// Ids of all actions that have published, sorted
    pub fn action_ids(&self) -> Vec<String> {
        sorted_keys(&self.actions)
    }

    /// Ids of all tasks that have published, sorted
    pub fn task_ids(&self) -> Vec<String> {
        sorted_keys(&self.tasks)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.tasks.is_empty()
    }

    /// Render the whole store as `{actions: {...}, tasks: {...}}`
    pub fn to_value(&self) -> Value {
        let mut root = Mapping::new();
        root.insert(Value::from("actions"), namespace_value(&self.actions));
        root.insert(Value::from("tasks"), namespace_value(&self.tasks));
        Value::Mapping(root)
    }
}

impl OutputLookup for RunContext {
    fn action_output(&self, id: &str) -> Option<Output> {
        self.get_action_output(id)
    }

    fn task_output(&self, id: &str) -> Option<Output> {
        self.get_task_output(id)
    }
}

fn sorted_keys(map: &DashMap<String, Output>) -> Vec<String> {
    let mut keys: Vec<String> = map.iter().map(|entry| entry.key().clone()).collect();
    keys.sort();
    keys
}

fn namespace_value(map: &DashMap<String, Output>) -> Value {
    let mut out = Mapping::new();
    for id in sorted_keys(map) {
        if let Some(entry) = map.get(&id) {
            out.insert(Value::from(id.as_str()), entry.value().to_value());
        }
    }
    Value::Mapping(out)
}
