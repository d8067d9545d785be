//! Tasks: ordered groups of actions
//!
//! A task runs its actions one after another. Each action's output is
//! published under the action id as soon as the action returns, so the next
//! action can read it. `finally` actions always run, even when the main
//! actions failed. Once everything ran, the task publishes its own output
//! under the task id.

use crate::error::ExecutionResult;
use crate::runner::action::DynAction;
use crate::runner::output::{Output, OutputBuilder};
use crate::runner::value::Value;
use crate::runner::Context;
use tracing::{info, warn};

/// Runtime task representation
#[derive(Debug)]
pub struct Task {
    /// Task id, the key the task output is published under
    pub id: String,

    /// Display name
    pub name: String,

    /// Actions to execute
    pub actions: Vec<DynAction>,

    /// Finally block
    pub finally: Vec<DynAction>,

    output: Option<Output>,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            name: name.into(),
            actions: Vec::new(),
            finally: Vec::new(),
            output: None,
        }
    }

    pub fn with_action(mut self, action: DynAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_finally(mut self, action: DynAction) -> Self {
        self.finally.push(action);
        self
    }

    /// Ids of every action in run order, finally block included
    pub fn action_ids(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().chain(self.finally.iter()).map(|a| a.id())
    }

    /// Output published by the last execution, if the task has run
    pub fn output(&self) -> Option<&Output> {
        self.output.as_ref()
    }

    /// Execute the task in the given context
    pub fn execute(&mut self, ctx: &mut Context) -> ExecutionResult<()> {
        info!(task = %self.id, "running task");

        let mut executed = Vec::new();
        let mut failed = None;

        let mut result = run_actions(&mut self.actions, ctx, &mut executed, &mut failed);

        if !self.finally.is_empty() {
            let finally_result = run_actions(&mut self.finally, ctx, &mut executed, &mut failed);
            // A failing main block keeps its own error
            if result.is_ok() {
                result = finally_result;
            } else if let Err(e) = finally_result {
                warn!(task = %self.id, error = %e, "finally block failed");
            }
        }

        let mut builder = OutputBuilder::new(result.is_ok())
            .items("actions", executed)
            .field("name", self.name.as_str());
        if let Some(id) = failed {
            builder = builder.field("failed", Value::String(id));
        }
        let output = builder.build();

        if let Some(run_context) = ctx.run_context() {
            run_context.store_task_output(self.id.clone(), output.clone());
        }
        self.output = Some(output);

        match &result {
            Ok(()) => info!(task = %self.id, "task completed"),
            Err(e) => warn!(task = %self.id, error = %e, "task failed"),
        }

        result
    }
}

fn run_actions(
    actions: &mut [DynAction],
    ctx: &Context,
    executed: &mut Vec<String>,
    failed: &mut Option<String>,
) -> ExecutionResult<()> {
    for action in actions.iter_mut() {
        let result = action.execute(ctx);
        executed.push(action.id().to_string());

        if let Some(run_context) = ctx.run_context() {
            run_context.store_action_output(action.id(), action.output());
        }

        if let Err(e) = result {
            failed.get_or_insert_with(|| action.id().to_string());
            return Err(e);
        }
    }
    Ok(())
}
