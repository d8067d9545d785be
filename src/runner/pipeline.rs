//! Sequential pipeline driver
//!
//! Runs tasks in definition order and stops at the first failing one. Since a
//! step's output is published before the next step starts, every reference to
//! an earlier step sees its output.

use crate::config::{Config, TaskSpec};
use crate::error::{ConfigResult, ExecutionError, ExecutionResult};
use crate::runner::registry::StepRegistry;
use crate::runner::task::Task;
use crate::runner::Context;
use tracing::{info, warn};

/// An ordered list of tasks ready to run
#[derive(Debug)]
pub struct Pipeline {
    pub name: String,
    pub tasks: Vec<Task>,
}

/// How far one task got in the last run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport {
    pub id: String,
    pub name: String,
    pub status: TaskStatus,
    /// Number of actions that ran
    pub executed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub pipeline: String,
    pub tasks: Vec<TaskReport>,
}

impl RunSummary {
    pub fn success(&self) -> bool {
        self.tasks.iter().all(|t| t.status == TaskStatus::Succeeded)
    }
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Pipeline {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Build every task and action of a configuration
    ///
    /// Fails on unknown step types and on steps missing a required parameter.
    pub fn from_config(config: &Config, registry: &StepRegistry) -> ConfigResult<Self> {
        let name = config.name.clone().unwrap_or_else(|| "pipeline".to_string());
        let mut pipeline = Pipeline::new(name);
        for spec in &config.tasks {
            pipeline.tasks.push(build_task(spec, registry)?);
        }
        Ok(pipeline)
    }

    /// Run all tasks in order, stopping at the first failure
    ///
    /// A run context is attached to `ctx` first if it has none. The cancel
    /// flag of `ctx` is checked before each task starts.
    pub fn run(&mut self, ctx: &mut Context) -> ExecutionResult<()> {
        ctx.ensure_run_context();
        info!(pipeline = %self.name, tasks = self.tasks.len(), "starting run");

        for task in &mut self.tasks {
            if ctx.is_cancelled() {
                warn!(pipeline = %self.name, task = %task.id, "run cancelled");
                return Err(ExecutionError::Cancelled);
            }
            task.execute(ctx)?;
        }

        info!(pipeline = %self.name, "run finished");
        Ok(())
    }

    /// Status of every task after the last run
    pub fn summary(&self) -> RunSummary {
        let tasks = self
            .tasks
            .iter()
            .map(|task| {
                let total = task.action_ids().count();
                let (status, executed) = match task.output() {
                    None => (TaskStatus::Pending, 0),
                    Some(output) => {
                        let executed = output
                            .project("count")
                            .ok()
                            .and_then(|v| v.as_u64())
                            .unwrap_or(0) as usize;
                        let status = if output.is_success() {
                            TaskStatus::Succeeded
                        } else {
                            TaskStatus::Failed
                        };
                        (status, executed)
                    }
                };
                TaskReport {
                    id: task.id.clone(),
                    name: task.name.clone(),
                    status,
                    executed,
                    total,
                }
            })
            .collect();

        RunSummary {
            pipeline: self.name.clone(),
            tasks,
        }
    }
}

fn build_task(spec: &TaskSpec, registry: &StepRegistry) -> ConfigResult<Task> {
    let mut task = Task::new(spec.id.clone(), spec.display_name());
    for action in &spec.actions {
        task.actions.push(registry.build(action)?);
    }
    for action in &spec.finally {
        task.finally.push(registry.build(action)?);
    }
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::error::{ConfigError, ResolutionErrorKind};
    use crate::runner::value::Value;
    use std::sync::atomic::Ordering;

    fn pipeline(yaml: &str) -> Pipeline {
        let config = parse_config(yaml, None).unwrap();
        Pipeline::from_config(&config, &StepRegistry::with_builtins()).unwrap()
    }

    #[test]
    fn test_outputs_flow_across_tasks() {
        let mut p = pipeline(
            r#"
tasks:
  - id: build
    actions:
      - id: tag
        type: set
        params:
          image: app:v1
  - id: deploy
    actions:
      - id: check
        type: assert
        params:
          actual: {action: tag, key: image}
          expected: app:v1
      - id: built
        type: assert
        params:
          actual: {task: build, key: success}
          expected: true
"#,
        );

        let mut ctx = Context::new();
        p.run(&mut ctx).unwrap();

        let store = ctx.run_context().unwrap();
        assert_eq!(
            store.get_action_output("check").unwrap().project("matched"),
            Ok(Value::Bool(true))
        );
        assert!(p.summary().success());
    }

    #[test]
    fn test_run_stops_at_first_failed_task() {
        let mut p = pipeline(
            r#"
tasks:
  - id: first
    actions:
      - id: broken
        type: set
        params:
          image: {action: missing, key: image}
  - id: second
    actions:
      - id: never
        type: set
        params:
          x: 1
"#,
        );

        let mut ctx = Context::new();
        let err = p.run(&mut ctx).unwrap_err();
        assert_eq!(err.resolution_kind(), Some(ResolutionErrorKind::ReferenceNotFound));

        let summary = p.summary();
        assert!(!summary.success());
        assert_eq!(summary.tasks[0].status, TaskStatus::Failed);
        assert_eq!(summary.tasks[0].executed, 1);
        assert_eq!(summary.tasks[1].status, TaskStatus::Pending);
        assert_eq!(summary.tasks[1].total, 1);
    }

    #[test]
    fn test_from_config_rejects_missing_parameter() {
        let config = parse_config(
            r#"
tasks:
  - id: t
    actions:
      - id: check
        type: assert
        params:
          actual: 1
"#,
            None,
        )
        .unwrap();

        let result = Pipeline::from_config(&config, &StepRegistry::with_builtins());
        assert!(matches!(result, Err(ConfigError::Construction { .. })));
    }

    #[test]
    fn test_run_reuses_attached_run_context() {
        let store = crate::runner::RunContext::new();
        store.store_action_output("seed", Value::from("raw string"));

        let mut p = pipeline(
            r#"
tasks:
  - id: t
    actions:
      - id: read
        type: set
        params:
          v: {action: seed, key: anything}
"#,
        );

        let mut ctx = Context::new().with_run_context(store);
        let err = p.run(&mut ctx).unwrap_err();
        assert_eq!(
            err.resolution_kind(),
            Some(ResolutionErrorKind::OutputNotAddressable)
        );
    }

    #[test]
    fn test_cancelled_run_starts_no_task() {
        let mut p = pipeline(
            r#"
tasks:
  - id: t
    actions:
      - id: a
        type: set
        params:
          x: 1
"#,
        );

        let mut ctx = Context::new();
        ctx.cancel_flag().store(true, Ordering::Relaxed);
        assert!(matches!(p.run(&mut ctx), Err(ExecutionError::Cancelled)));
        assert_eq!(p.summary().tasks[0].status, TaskStatus::Pending);
        assert!(ctx.run_context().unwrap().get_action_output("a").is_none());
    }

    #[test]
    fn test_duplicate_task_ids_both_run() {
        let mut p = pipeline(
            r#"
tasks:
  - id: t
    actions:
      - id: a
        type: set
        params:
          x: 1
  - id: t
    actions:
      - id: b
        type: set
        params:
          x: 2
      - id: c
        type: set
        params:
          x: 3
"#,
        );

        let mut ctx = Context::new();
        p.run(&mut ctx).unwrap();

        let store = ctx.run_context().unwrap();
        assert!(store.get_action_output("a").is_some());
        assert_eq!(
            store.get_task_output("t").unwrap().project("count"),
            Ok(Value::from(2u64))
        );
    }
}
