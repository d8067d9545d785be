//! `assert`: fail the pipeline unless two values are equal

use crate::error::{ConfigResult, ExecutionError, ExecutionResult};
use crate::runner::value::render;
use crate::runner::{resolve_generic, Context, Output, OutputBuilder, Parameter, Step, StepParams};

#[derive(Debug)]
pub struct Assert {
    actual: Parameter,
    expected: Parameter,
    matched: Option<bool>,
}

pub fn build(params: &mut StepParams) -> ConfigResult<Box<dyn Step>> {
    Ok(Box::new(Assert {
        actual: params.required("actual", "actual value")?,
        expected: params.required("expected", "expected value")?,
        matched: None,
    }))
}

impl Step for Assert {
    fn kind(&self) -> &'static str {
        "assert"
    }

    fn execute(&mut self, ctx: &Context) -> ExecutionResult<()> {
        let actual = resolve_generic(&self.actual, ctx.outputs(), "actual value")?;
        let expected = resolve_generic(&self.expected, ctx.outputs(), "expected value")?;

        let matched = actual == expected;
        self.matched = Some(matched);

        if !matched {
            return Err(ExecutionError::AssertionFailed {
                expected: render(&expected),
                actual: render(&actual),
            });
        }
        Ok(())
    }

    fn output(&self) -> Output {
        match self.matched {
            Some(matched) => OutputBuilder::new(matched).field("matched", matched).build(),
            None => OutputBuilder::failure().build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{RunContext, Value};
    use std::collections::BTreeMap;

    fn assert_step(actual: Parameter, expected: Parameter) -> Box<dyn Step> {
        let mut declared = BTreeMap::new();
        declared.insert("actual".to_string(), actual);
        declared.insert("expected".to_string(), expected);
        build(&mut StepParams::new("check", declared)).unwrap()
    }

    #[test]
    fn test_matching_values() {
        let store = RunContext::new();
        store.store_action_output("count", OutputBuilder::success().count(2).build());
        let ctx = Context::new().with_run_context(store);

        let mut step = assert_step(
            Parameter::action_output("count", "count"),
            Parameter::literal(2),
        );
        step.execute(&ctx).unwrap();
        assert_eq!(step.output().project("matched"), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_mismatch_fails() {
        let mut step = assert_step(Parameter::literal("v1"), Parameter::literal("v2"));
        match step.execute(&Context::new()) {
            Err(ExecutionError::AssertionFailed { expected, actual }) => {
                assert_eq!(expected, "v2");
                assert_eq!(actual, "v1");
            }
            other => panic!("expected assertion failure, got {:?}", other),
        }

        let output = step.output();
        assert!(!output.is_success());
        assert_eq!(output.project("matched"), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_missing_expected_is_nil_parameter() {
        let mut declared = BTreeMap::new();
        declared.insert("actual".to_string(), Parameter::literal(1));
        let result = build(&mut StepParams::new("check", declared));
        match result {
            Err(crate::error::ConfigError::Construction { source, .. }) => {
                assert_eq!(source.role(), Some("expected value"));
            }
            other => panic!("expected construction error, got {:?}", other.map(|_| ())),
        }
    }
}
