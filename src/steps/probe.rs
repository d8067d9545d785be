//! `probe`: retry a command until it succeeds
//!
//! Typical use is waiting for a service to come up before the next task.
//! The wait between attempts watches the context's cancel flag and stops
//! within [`CANCEL_POLL`] once it is set.

use crate::error::{ConfigResult, ExecutionError, ExecutionResult};
use crate::runner::{
    resolve_optional_integer, run_command, Context, Output, OutputBuilder, Parameter, Step,
    StepParams,
};
use crate::steps::resolve_command;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const DEFAULT_RETRIES: u64 = 3;
const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Longest stretch the probe sleeps without looking at the cancel flag
pub const CANCEL_POLL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub struct Probe {
    command: Parameter,
    retries: Option<Parameter>,
    interval_ms: Option<Parameter>,
    attempts: u64,
    succeeded: bool,
}

pub fn build(params: &mut StepParams) -> ConfigResult<Box<dyn Step>> {
    Ok(Box::new(Probe {
        command: params.required("command", "probe command")?,
        retries: params.optional("retries"),
        interval_ms: params.optional("interval_ms"),
        attempts: 0,
        succeeded: false,
    }))
}

impl Step for Probe {
    fn kind(&self) -> &'static str {
        "probe"
    }

    fn execute(&mut self, ctx: &Context) -> ExecutionResult<()> {
        let outputs = ctx.outputs();
        let command = resolve_command(&self.command, ctx, "probe command")?;
        let retries = resolve_optional_integer(self.retries.as_ref(), outputs, "retries")?
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);
        let interval = Duration::from_millis(
            resolve_optional_integer(self.interval_ms.as_ref(), outputs, "retry interval")?
                .unwrap_or(DEFAULT_INTERVAL_MS),
        );

        self.attempts = 0;
        self.succeeded = false;
        let mut last = String::new();

        while self.attempts < retries {
            if ctx.is_cancelled() {
                warn!(attempts = self.attempts, "probe cancelled");
                return Err(ExecutionError::Cancelled);
            }
            self.attempts += 1;
            let result = run_command(&command, None, ctx)?;
            if result.success() {
                self.succeeded = true;
                info!(attempts = self.attempts, "probe succeeded");
                return Ok(());
            }

            last = match result.stderr.trim() {
                "" => format!("exit code {:?}", result.exit_code),
                stderr => stderr.to_string(),
            };
            warn!(attempt = self.attempts, retries, reason = %last, "probe failed");

            if self.attempts < retries {
                wait(interval, ctx);
            }
        }

        Err(ExecutionError::RetriesExhausted {
            attempts: self.attempts,
            last,
        })
    }

    fn output(&self) -> Output {
        OutputBuilder::new(self.succeeded)
            .field("attempts", self.attempts)
            .build()
    }
}

/// Sleep for `interval`, returning early once the run is cancelled
fn wait(interval: Duration, ctx: &Context) {
    let deadline = Instant::now() + interval;
    loop {
        let now = Instant::now();
        if now >= deadline || ctx.is_cancelled() {
            return;
        }
        thread::sleep((deadline - now).min(CANCEL_POLL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{RunContext, Value};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::Ordering;

    fn probe(pairs: Vec<(&str, Parameter)>) -> Box<dyn Step> {
        let declared: BTreeMap<String, Parameter> = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        build(&mut StepParams::new("wait", declared)).unwrap()
    }

    #[test]
    fn test_succeeds_first_try() {
        let mut step = probe(vec![("command", Parameter::literal("true"))]);
        step.execute(&Context::new()).unwrap();

        let output = step.output();
        assert!(output.is_success());
        assert_eq!(output.project("attempts"), Ok(Value::from(1u64)));
    }

    #[test]
    fn test_retries_until_exhausted() {
        let mut step = probe(vec![
            ("command", Parameter::literal("echo down >&2; false")),
            ("retries", Parameter::literal(2)),
            ("interval_ms", Parameter::literal(1)),
        ]);

        match step.execute(&Context::new()) {
            Err(ExecutionError::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert_eq!(last, "down");
            }
            other => panic!("expected exhausted retries, got {:?}", other),
        }
        assert!(!step.output().is_success());
    }

    #[test]
    fn test_succeeds_after_retry() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let ctx = Context::new().with_working_dir(temp_dir.path().to_path_buf());

        // First attempt creates the marker and fails, the second finds it
        let mut step = probe(vec![
            (
                "command",
                Parameter::literal("test -f ready || { touch ready; false; }"),
            ),
            ("interval_ms", Parameter::literal(1)),
        ]);
        step.execute(&ctx).unwrap();
        assert_eq!(step.output().project("attempts"), Ok(Value::from(2u64)));
    }

    #[test]
    fn test_cancel_interrupts_wait() {
        let ctx = Context::new();
        let flag = ctx.cancel_flag();
        let mut step = probe(vec![
            ("command", Parameter::literal("false")),
            ("retries", Parameter::literal(5)),
            ("interval_ms", Parameter::literal(60_000)),
        ]);

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            flag.store(true, Ordering::Relaxed);
        });

        let started = Instant::now();
        let err = step.execute(&ctx).unwrap_err();
        canceller.join().unwrap();

        assert!(matches!(err, ExecutionError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(step.output().project("attempts"), Ok(Value::from(1u64)));
    }

    #[test]
    fn test_cancelled_before_first_attempt() {
        let ctx = Context::new();
        ctx.cancel_flag().store(true, Ordering::Relaxed);

        let mut step = probe(vec![("command", Parameter::literal("true"))]);
        assert!(matches!(step.execute(&ctx), Err(ExecutionError::Cancelled)));
        assert_eq!(step.output().project("attempts"), Ok(Value::from(0u64)));
    }

    #[test]
    fn test_referenced_command_skips_var_expansion() {
        // Expanding `${a}` here would hit the a -> b -> a cycle
        let mut vars = HashMap::new();
        vars.insert("a".to_string(), "${b}".to_string());
        vars.insert("b".to_string(), "${a}".to_string());
        let store = RunContext::new();
        store.store_action_output(
            "plan",
            OutputBuilder::success().field("check", "true # ${a}").build(),
        );
        let ctx = Context::new().with_vars(vars).with_run_context(store);

        let mut step = probe(vec![("command", Parameter::action_output("plan", "check"))]);
        step.execute(&ctx).unwrap();
        assert!(step.output().is_success());
    }
}
