//! Configuration validation
//!
//! Checks a parsed pipeline before anything runs: ids must be present, every
//! output reference must name an action or task that runs earlier, and entity
//! types must be known. Duplicate ids are allowed; the later output replaces
//! the earlier one at run time, so they are only reported.

use crate::config::types::{ActionSpec, Config};
use crate::error::{ConfigError, ConfigResult};
use crate::runner::EntityKind;
use std::collections::HashSet;
use tracing::warn;

/// Validate a complete configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    let all_tasks: HashSet<&str> = config.tasks.iter().map(|t| t.id.as_str()).collect();
    let all_actions: HashSet<&str> = config
        .tasks
        .iter()
        .flat_map(|t| t.all_actions())
        .map(|a| a.id.as_str())
        .collect();

    let mut done_tasks = HashSet::new();
    let mut done_actions = HashSet::new();

    for task in &config.tasks {
        if task.id.trim().is_empty() {
            return Err(ConfigError::Invalid("task id must not be empty".to_string()));
        }
        if done_tasks.contains(task.id.as_str()) {
            warn!(task = %task.id, "duplicate task id, its output will be replaced");
        }

        for action in task.all_actions() {
            validate_action(action, &all_actions, &all_tasks, &done_actions, &done_tasks)?;

            if !done_actions.insert(action.id.as_str()) {
                warn!(action = %action.id, "duplicate action id, its output will be replaced");
            }
        }

        done_tasks.insert(task.id.as_str());
    }

    Ok(())
}

fn validate_action(
    action: &ActionSpec,
    all_actions: &HashSet<&str>,
    all_tasks: &HashSet<&str>,
    done_actions: &HashSet<&str>,
    done_tasks: &HashSet<&str>,
) -> ConfigResult<()> {
    if action.id.trim().is_empty() {
        return Err(ConfigError::Invalid(format!(
            "action of type '{}' has an empty id",
            action.step_type
        )));
    }

    for param in action.params.values() {
        let (entity, target) = match param.reference() {
            None => continue,
            Some(Ok(reference)) => reference,
            Some(Err(source)) => {
                return Err(ConfigError::Construction {
                    action: action.id.clone(),
                    source,
                })
            }
        };

        let (done, all) = match entity {
            EntityKind::Action => (done_actions, all_actions),
            EntityKind::Task => (done_tasks, all_tasks),
        };

        if done.contains(target) {
            continue;
        }

        let error = if all.contains(target) {
            ConfigError::ForwardReference {
                action: action.id.clone(),
                entity,
                target: target.to_string(),
            }
        } else {
            ConfigError::UnknownReference {
                action: action.id.clone(),
                entity,
                target: target.to_string(),
            }
        };
        return Err(error);
    }

    Ok(())
}
