//! `set`: publish resolved values under chosen keys

use crate::error::{ConfigError, ConfigResult, ExecutionResult};
use crate::runner::output::{COUNT_KEY, SUCCESS_KEY};
use crate::runner::{resolve_generic, Context, Output, OutputBuilder, Parameter, Step, StepParams, Value};
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct Set {
    params: BTreeMap<String, Parameter>,
    resolved: Option<BTreeMap<String, Value>>,
}

pub fn build(params: &mut StepParams) -> ConfigResult<Box<dyn Step>> {
    let params_map = params.take_all();
    if let Some(reserved) = params_map
        .keys()
        .find(|k| k.as_str() == SUCCESS_KEY || k.as_str() == COUNT_KEY)
    {
        return Err(ConfigError::Invalid(format!(
            "action '{}': '{}' is reserved and cannot be set",
            params.action_id(),
            reserved
        )));
    }

    Ok(Box::new(Set {
        params: params_map,
        resolved: None,
    }))
}

impl Step for Set {
    fn kind(&self) -> &'static str {
        "set"
    }

    fn execute(&mut self, ctx: &Context) -> ExecutionResult<()> {
        let mut resolved = BTreeMap::new();
        for (name, param) in &self.params {
            resolved.insert(name.clone(), resolve_generic(param, ctx.outputs(), name)?);
        }
        self.resolved = Some(resolved);
        Ok(())
    }

    fn output(&self) -> Output {
        match &self.resolved {
            Some(values) => values
                .iter()
                .fold(OutputBuilder::success(), |b, (k, v)| b.field(k.as_str(), v.clone()))
                .build(),
            None => OutputBuilder::failure().build(),
        }
    }
}
