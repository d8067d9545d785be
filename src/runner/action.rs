//! Steps and the action envelope around them
//!
//! A [`Step`] is the concrete unit of work: it resolves its parameters,
//! does something, and exposes an [`Output`]. An [`Action`] wraps a step with
//! the identity it is published under and a logging span.

use crate::error::ExecutionResult;
use crate::runner::context::Context;
use crate::runner::output::Output;
use std::fmt;
use tracing::{debug, info_span, Span};

/// A concrete unit of pipeline work
pub trait Step: fmt::Debug {
    /// Step type name, as used in the pipeline file
    fn kind(&self) -> &'static str;

    /// Resolve parameters and perform the work
    fn execute(&mut self, ctx: &Context) -> ExecutionResult<()>;

    /// Output to publish for this step
    ///
    /// Called after `execute`, whether it succeeded or not.
    fn output(&self) -> Output;
}

impl Step for Box<dyn Step> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn execute(&mut self, ctx: &Context) -> ExecutionResult<()> {
        (**self).execute(ctx)
    }

    fn output(&self) -> Output {
        (**self).output()
    }
}

/// A step with a stable identity and a logger
#[derive(Debug)]
pub struct Action<S> {
    id: String,
    name: String,
    span: Span,
    step: S,
}

/// Action holding any step type, as built from a pipeline file
pub type DynAction = Action<Box<dyn Step>>;

impl<S: Step> Action<S> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Span every log line of this action is recorded under
    pub fn logger(&self) -> &Span {
        &self.span
    }

    pub fn step(&self) -> &S {
        &self.step
    }

    pub fn step_mut(&mut self) -> &mut S {
        &mut self.step
    }

    /// Execute the wrapped step; errors are tagged with this action's id
    pub fn execute(&mut self, ctx: &Context) -> ExecutionResult<()> {
        let _entered = self.span.enter();
        debug!(kind = self.step.kind(), "executing");
        let id = &self.id;
        self.step.execute(ctx).map_err(|e| e.in_action(id.as_str()))
    }

    pub fn output(&self) -> Output {
        self.step.output()
    }
}

/// Builds [`Action`]s so step authors don't repeat the identity plumbing
pub struct ActionBuilder;

impl ActionBuilder {
    /// Wrap a step under the given display name and id
    pub fn wrap<S: Step>(step: S, name: impl Into<String>, id: impl Into<String>) -> Action<S> {
        let id = id.into();
        let name = name.into();
        let span = info_span!("action", id = %id, name = %name);
        Action {
            id,
            name,
            span,
            step,
        }
    }

    /// Same as [`ActionBuilder::wrap`], boxing the step
    pub fn wrap_dyn<S: Step + 'static>(
        step: S,
        name: impl Into<String>,
        id: impl Into<String>,
    ) -> DynAction {
        Self::wrap(Box::new(step) as Box<dyn Step>, name, id)
    }
}
