//! Parameters and their resolution
//!
//! A [`Parameter`] says where a step input comes from: a literal fixed when
//! the pipeline is defined, or one key of an output some earlier action or
//! task has published. Resolution only reads from the run context.
//!
//! All reference variants fail in the same order:
//!
//! 1. `ReferenceNotFound` when the id is empty or nothing was published under
//!    it (including when there is no run context at all)
//! 2. `OutputNotAddressable` when the published output is not a mapping
//! 3. `KeyNotFound` when the mapping lacks the key

use crate::error::{ResolutionError, ResolutionResult};
use crate::runner::output::{Output, ProjectionError};
use crate::runner::run_context::OutputLookup;
use crate::runner::value::{Mapping, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Namespace an output reference points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Action,
    Task,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Action => "action",
            EntityKind::Task => "task",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "action" => Ok(EntityKind::Action),
            "task" => Ok(EntityKind::Task),
            _ => Err(ResolutionError::UnknownEntityType(s.to_string())),
        }
    }
}

/// Declarative source of a step input
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(try_from = "Value")]
pub enum Parameter {
    /// Literal value, returned as is
    Static(Value),

    /// One key of an action's published output
    ActionOutput { action_id: String, output_key: String },

    /// One key of a task's published output
    TaskOutput { task_id: String, output_key: String },

    /// One key of an action's or task's output, chosen by `entity_type`
    EntityOutput {
        entity_type: String,
        entity_id: String,
        output_key: String,
    },
}

impl Parameter {
    pub fn literal(value: impl Into<Value>) -> Self {
        Parameter::Static(value.into())
    }

    pub fn action_output(action_id: impl Into<String>, output_key: impl Into<String>) -> Self {
        Parameter::ActionOutput {
            action_id: action_id.into(),
            output_key: output_key.into(),
        }
    }

    pub fn task_output(task_id: impl Into<String>, output_key: impl Into<String>) -> Self {
        Parameter::TaskOutput {
            task_id: task_id.into(),
            output_key: output_key.into(),
        }
    }

    pub fn entity_output(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        output_key: impl Into<String>,
    ) -> Self {
        Parameter::EntityOutput {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            output_key: output_key.into(),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Parameter::Static(_))
    }

    /// The producer this parameter reads from, if it is a reference
    pub fn reference(&self) -> Option<ResolutionResult<(EntityKind, &str)>> {
        match self {
            Parameter::Static(_) => None,
            Parameter::ActionOutput { action_id, .. } => Some(Ok((EntityKind::Action, action_id.as_str()))),
            Parameter::TaskOutput { task_id, .. } => Some(Ok((EntityKind::Task, task_id.as_str()))),
            Parameter::EntityOutput {
                entity_type,
                entity_id,
                ..
            } => Some(entity_type.parse().map(|kind| (kind, entity_id.as_str()))),
        }
    }

    /// Resolve against the published outputs of the current run
    ///
    /// `outputs` is `None` when the step runs without a run context; every
    /// reference then fails with `ReferenceNotFound`.
    pub fn resolve(&self, outputs: Option<&dyn OutputLookup>) -> ResolutionResult<Value> {
        match self {
            Parameter::Static(value) => Ok(value.clone()),
            Parameter::ActionOutput {
                action_id,
                output_key,
            } => resolve_reference(EntityKind::Action, action_id, output_key, outputs),
            Parameter::TaskOutput {
                task_id,
                output_key,
            } => resolve_reference(EntityKind::Task, task_id, output_key, outputs),
            Parameter::EntityOutput {
                entity_type,
                entity_id,
                output_key,
            } => {
                let kind: EntityKind = entity_type.parse()?;
                resolve_reference(kind, entity_id, output_key, outputs)
            }
        }
    }
}

fn resolve_reference(
    entity: EntityKind,
    id: &str,
    key: &str,
    outputs: Option<&dyn OutputLookup>,
) -> ResolutionResult<Value> {
    let not_found = || ResolutionError::ReferenceNotFound {
        entity,
        id: id.to_string(),
    };

    if id.is_empty() {
        return Err(not_found());
    }

    let output: Output = outputs
        .and_then(|lookup| match entity {
            EntityKind::Action => lookup.action_output(id),
            EntityKind::Task => lookup.task_output(id),
        })
        .ok_or_else(not_found)?;

    let value = output.project(key).map_err(|e| match e {
        ProjectionError::NotAddressable(actual) => ResolutionError::OutputNotAddressable {
            entity,
            id: id.to_string(),
            key: key.to_string(),
            actual,
        },
        ProjectionError::MissingKey => ResolutionError::KeyNotFound {
            entity,
            id: id.to_string(),
            key: key.to_string(),
        },
    })?;

    debug!(%entity, id, key, "resolved output reference");
    Ok(value)
}

const REFERENCE_FIELDS: &[&str] = &["action", "task", "entity", "id", "key"];

impl TryFrom<Value> for Parameter {
    type Error = String;

    /// Read the YAML form of a parameter
    ///
    /// `{action: ID, key: K}`, `{task: ID, key: K}` and
    /// `{entity: TYPE, id: ID, key: K}` are references, `{value: X}` is the
    /// literal `X`, and anything else is taken literally.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let map = match value {
            Value::Mapping(map) => map,
            other => return Ok(Parameter::Static(other)),
        };

        if map.len() == 1 {
            if let Some(inner) = map.get("value") {
                return Ok(Parameter::Static(inner.clone()));
            }
        }

        if !looks_like_reference(&map) {
            return Ok(Parameter::Static(Value::Mapping(map)));
        }

        let key = string_field(&map, "key")?;
        match (map.get("action"), map.get("task"), map.get("entity")) {
            (Some(_), None, None) if !map.contains_key("id") => {
                Ok(Parameter::action_output(string_field(&map, "action")?, key))
            }
            (None, Some(_), None) if !map.contains_key("id") => {
                Ok(Parameter::task_output(string_field(&map, "task")?, key))
            }
            (None, None, Some(_)) => Ok(Parameter::entity_output(
                string_field(&map, "entity")?,
                string_field(&map, "id")?,
                key,
            )),
            _ => Err(
                "a reference needs exactly one of `action: ID`, `task: ID` or `entity: TYPE` with `id: ID`"
                    .to_string(),
            ),
        }
    }
}

fn looks_like_reference(map: &Mapping) -> bool {
    map.contains_key("key")
        && ["action", "task", "entity"].iter().any(|f| map.contains_key(*f))
        && map
            .keys()
            .all(|k| k.as_str().map_or(false, |k| REFERENCE_FIELDS.contains(&k)))
}

fn string_field(map: &Mapping, field: &str) -> Result<String, String> {
    match map.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(format!("reference field `{}` must be a string", field)),
        None => Err(format!("reference is missing `{}`", field)),
    }
}
