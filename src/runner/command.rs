//! Shell command execution
//!
//! Commands run through the context's interpreter with the context variables
//! exported into their environment. Output is captured so steps can publish it.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::Context;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use tracing::debug;

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

fn build_command(exec: &str, dir: Option<&Path>, ctx: &Context) -> ExecutionResult<StdCommand> {
    let (program, interpreter_args) = ctx
        .interpreter
        .split_first()
        .ok_or_else(|| ExecutionError::Spawn("interpreter is empty".to_string()))?;

    let mut command = StdCommand::new(program);
    command.args(interpreter_args);
    command.arg(exec);

    let working_dir = match dir {
        Some(dir) => ctx.working_dir.join(dir),
        None => ctx.working_dir.clone(),
    };
    command.current_dir(working_dir);

    for (key, value) in &ctx.vars {
        command.env(key, value);
    }

    Ok(command)
}

/// Run a command to completion, capturing stdout and stderr
pub fn run_command(exec: &str, dir: Option<&Path>, ctx: &Context) -> ExecutionResult<CommandOutput> {
    debug!(command = exec, "running");

    let output = build_command(exec, dir, ctx)?
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ExecutionError::Spawn(e.to_string()))?;

    let result = CommandOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    debug!(command = exec, exit_code = ?result.exit_code, "finished");

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_run_captures_stdout() {
        let ctx = Context::new();
        let output = run_command("echo test", None, &ctx).unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "test");
    }

    #[test]
    fn test_run_exports_vars() {
        let mut vars = HashMap::new();
        vars.insert("BATON_TEST_NAME".to_string(), "world".to_string());

        let ctx = Context::new().with_vars(vars);
        let output = run_command("echo $BATON_TEST_NAME", None, &ctx).unwrap();
        assert_eq!(output.stdout.trim(), "world");
    }

    #[test]
    fn test_run_failing_command() {
        let ctx = Context::new();
        let output = run_command("echo oops >&2; exit 3", None, &ctx).unwrap();

        assert!(!output.success());
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[test]
    fn test_run_in_subdirectory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("sub")).unwrap();
        std::fs::write(temp_dir.path().join("sub").join("marker.txt"), "x").unwrap();

        let ctx = Context::new().with_working_dir(temp_dir.path().to_path_buf());
        let output = run_command("ls", Some(Path::new("sub")), &ctx).unwrap();
        assert!(output.stdout.contains("marker.txt"));
    }

    #[test]
    fn test_empty_interpreter() {
        let ctx = Context::new().with_interpreter(vec![]);
        let result = run_command("true", None, &ctx);
        assert!(matches!(result, Err(ExecutionError::Spawn(_))));
    }
}
