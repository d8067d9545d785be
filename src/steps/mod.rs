//! Built-in step types
//!
//! Generic steps that any pipeline can use. Each module exposes a `build`
//! factory taking the declared parameters.

pub mod assert;
pub mod probe;
pub mod set;
pub mod shell;
pub mod split;

use crate::error::ExecutionResult;
use crate::runner::registry::StepRegistry;
use crate::runner::{interpolate, resolve_string, Context, Parameter};

/// Register every built-in step under its pipeline-file name
pub fn register_builtins(registry: &mut StepRegistry) {
    registry.register("set", set::build);
    registry.register("shell", shell::build);
    registry.register("split", split::build);
    registry.register("assert", assert::build);
    registry.register("probe", probe::build);
}

/// Resolve a command parameter to the text to run
///
/// `${var}` expansion applies to commands written in the pipeline file only.
/// A command taken from another step's output runs exactly as published.
pub(crate) fn resolve_command(
    param: &Parameter,
    ctx: &Context,
    role: &str,
) -> ExecutionResult<String> {
    let command = resolve_string(param, ctx.outputs(), role)?;
    if param.is_static() {
        Ok(interpolate(&command, &ctx.vars)?)
    } else {
        Ok(command)
    }
}
