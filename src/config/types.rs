//! Core configuration types
//!
//! This module defines the data structures that represent a baton.yml pipeline file.

use crate::runner::parameter::Parameter;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Pipeline name (optional)
    #[serde(default)]
    pub name: Option<String>,

    /// Pipeline usage description (optional)
    #[serde(default)]
    pub usage: Option<String>,

    /// Global interpreter to use for commands (e.g., ["bash", "-c"])
    #[serde(default)]
    pub interpreter: Option<Vec<String>>,

    /// Variables for `${var}` interpolation
    #[serde(default)]
    pub vars: BTreeMap<String, String>,

    /// Dotenv file merged into `vars`, relative to the config file
    #[serde(default, rename = "env_file")]
    pub env_file: Option<String>,

    /// Tasks in run order
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl Config {
    pub fn task(&self, id: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

/// A task definition
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskSpec {
    /// Task id; an included body keeps the id of the task including it
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Longer description for `list`
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub actions: Vec<ActionSpec>,

    /// Finally block - always executes, even on error
    #[serde(default)]
    pub finally: Vec<ActionSpec>,

    /// Include another file as task body
    #[serde(default)]
    pub include: Option<String>,
}

impl TaskSpec {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.clone())
    }

    /// All actions in run order, finally block included
    pub fn all_actions(&self) -> impl Iterator<Item = &ActionSpec> {
        self.actions.iter().chain(self.finally.iter())
    }
}

/// A single step invocation
#[derive(Debug, Clone, Deserialize)]
pub struct ActionSpec {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Registered step type
    #[serde(rename = "type")]
    pub step_type: String,

    /// Declared parameters, static or referencing earlier outputs
    #[serde(default)]
    pub params: BTreeMap<String, Parameter>,
}

impl ActionSpec {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_simple_config() {
        let yaml = r#"
name: release
tasks:
  - id: build
    actions:
      - id: tag
        type: set
        params:
          image: app:v1
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name.as_deref(), Some("release"));
        assert_eq!(config.tasks.len(), 1);

        let action = &config.tasks[0].actions[0];
        assert_eq!(action.step_type, "set");
        assert_eq!(action.params["image"], Parameter::literal("app:v1"));
    }

    #[test]
    fn test_deserialize_reference_params() {
        let yaml = r#"
id: deploy
actions:
  - id: push
    type: shell
    params:
      command: {action: tag, key: image}
      dir: {entity: Task, id: build, key: workdir}
"#;
        let task: TaskSpec = serde_yaml::from_str(yaml).unwrap();
        let params = &task.actions[0].params;
        assert_eq!(params["command"], Parameter::action_output("tag", "image"));
        assert_eq!(
            params["dir"],
            Parameter::entity_output("Task", "build", "workdir")
        );
    }

    #[test]
    fn test_display_names_fall_back_to_id() {
        let task: TaskSpec = serde_yaml::from_str("{id: build, name: Build it}").unwrap();
        assert_eq!(task.display_name(), "Build it");

        let action: ActionSpec = serde_yaml::from_str("{id: tag, type: set}").unwrap();
        assert_eq!(action.display_name(), "tag");
    }

    #[test]
    fn test_task_order_preserved() {
        let yaml = r#"
tasks:
  - id: c
  - id: a
  - id: b
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let ids: Vec<&str> = config.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert!(config.task("a").is_some());
        assert!(config.task("z").is_none());
    }
}
