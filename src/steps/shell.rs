//! `shell`: run a command through the configured interpreter
//!
//! A literal `command` gets `${var}` expansion before it runs. A command
//! read from an earlier output is passed to the interpreter untouched.

use crate::error::{ConfigResult, ExecutionError, ExecutionResult};
use crate::runner::{
    resolve_optional_bool, resolve_optional_string, run_command, CommandOutput, Context, Output,
    OutputBuilder, Parameter, Step, StepParams, Value,
};
use crate::steps::resolve_command;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub struct Shell {
    command: Parameter,
    dir: Option<Parameter>,
    allow_failure: Option<Parameter>,
    result: Option<CommandOutput>,
}

pub fn build(params: &mut StepParams) -> ConfigResult<Box<dyn Step>> {
    Ok(Box::new(Shell {
        command: params.required("command", "command")?,
        dir: params.optional("dir"),
        allow_failure: params.optional("allow_failure"),
        result: None,
    }))
}

impl Step for Shell {
    fn kind(&self) -> &'static str {
        "shell"
    }

    fn execute(&mut self, ctx: &Context) -> ExecutionResult<()> {
        let outputs = ctx.outputs();
        let command = resolve_command(&self.command, ctx, "command")?;
        let dir = resolve_optional_string(self.dir.as_ref(), outputs, "working directory")?;
        let allow_failure =
            resolve_optional_bool(self.allow_failure.as_ref(), outputs, "allow failure")?
                .unwrap_or(false);

        info!(command = %command, "running command");

        let result = run_command(&command, dir.as_deref().map(Path::new), ctx)?;
        let exit_code = result.exit_code;
        let success = result.success();
        self.result = Some(result);

        if !success && !allow_failure {
            return Err(ExecutionError::CommandFailed(exit_code));
        }
        Ok(())
    }

    fn output(&self) -> Output {
        let Some(result) = &self.result else {
            return OutputBuilder::failure().build();
        };

        let exit_code = match result.exit_code {
            Some(code) => Value::from(code),
            None => Value::Null,
        };

        OutputBuilder::new(result.success())
            .field("stdout", result.stdout.trim_end_matches('\n'))
            .field("stderr", result.stderr.trim_end_matches('\n'))
            .field("exit_code", exit_code)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunContext;
    use std::collections::{BTreeMap, HashMap};

    fn shell(pairs: Vec<(&str, Parameter)>) -> Box<dyn Step> {
        let declared: BTreeMap<String, Parameter> = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        build(&mut StepParams::new("sh", declared)).unwrap()
    }

    #[test]
    fn test_publishes_stdout() {
        let mut step = shell(vec![("command", Parameter::literal("echo hello"))]);
        step.execute(&Context::new()).unwrap();

        let output = step.output();
        assert!(output.is_success());
        assert_eq!(output.project("stdout"), Ok(Value::from("hello")));
        assert_eq!(output.project("exit_code"), Ok(Value::from(0)));
    }

    #[test]
    fn test_failure_is_published_then_reported() {
        let mut step = shell(vec![("command", Parameter::literal("exit 4"))]);
        let err = step.execute(&Context::new()).unwrap_err();
        assert!(matches!(err, ExecutionError::CommandFailed(Some(4))));

        let output = step.output();
        assert!(!output.is_success());
        assert_eq!(output.project("exit_code"), Ok(Value::from(4)));
    }

    #[test]
    fn test_allow_failure() {
        let mut step = shell(vec![
            ("command", Parameter::literal("exit 1")),
            ("allow_failure", Parameter::literal(true)),
        ]);
        assert!(step.execute(&Context::new()).is_ok());
        assert!(!step.output().is_success());
    }

    #[test]
    fn test_interpolates_vars() {
        let mut vars = HashMap::new();
        vars.insert("tag".to_string(), "v7".to_string());
        let ctx = Context::new().with_vars(vars);

        let mut step = shell(vec![("command", Parameter::literal("echo app:${tag}"))]);
        step.execute(&ctx).unwrap();
        assert_eq!(step.output().project("stdout"), Ok(Value::from("app:v7")));
    }

    #[test]
    fn test_referenced_command_is_not_interpolated() {
        let store = RunContext::new();
        store.store_action_output(
            "gen",
            OutputBuilder::success()
                .field("cmd", "echo '${greeting}'")
                .build(),
        );
        let mut vars = HashMap::new();
        vars.insert("greeting".to_string(), "hello".to_string());
        let ctx = Context::new().with_vars(vars).with_run_context(store);

        let mut step = shell(vec![("command", Parameter::action_output("gen", "cmd"))]);
        step.execute(&ctx).unwrap();
        assert_eq!(
            step.output().project("stdout"),
            Ok(Value::from("${greeting}"))
        );
    }

    #[test]
    fn test_dir_type_mismatch_names_role() {
        let mut step = shell(vec![
            ("command", Parameter::literal("pwd")),
            ("dir", Parameter::literal(42)),
        ]);
        let err = step.execute(&Context::new()).unwrap_err();
        assert!(err.to_string().contains("working directory"));
    }
}
