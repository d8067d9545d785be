//! `split`: turn a delimited string or list into a counted list

use crate::error::{ConfigResult, ExecutionResult};
use crate::runner::{
    resolve_optional_string, resolve_string_list, Context, Output, OutputBuilder, Parameter, Step,
    StepParams,
};

const DEFAULT_SEPARATOR: &str = ",";

#[derive(Debug)]
pub struct Split {
    items: Parameter,
    separator: Option<Parameter>,
    result: Option<Vec<String>>,
}

pub fn build(params: &mut StepParams) -> ConfigResult<Box<dyn Step>> {
    Ok(Box::new(Split {
        items: params.required("items", "items")?,
        separator: params.optional("separator"),
        result: None,
    }))
}

impl Step for Split {
    fn kind(&self) -> &'static str {
        "split"
    }

    fn execute(&mut self, ctx: &Context) -> ExecutionResult<()> {
        let separator = resolve_optional_string(self.separator.as_ref(), ctx.outputs(), "separator")?
            .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string());
        self.result = Some(resolve_string_list(
            &self.items,
            ctx.outputs(),
            "items",
            &separator,
        )?);
        Ok(())
    }

    fn output(&self) -> Output {
        match &self.result {
            Some(items) => OutputBuilder::success()
                .items("items", items.iter().map(String::as_str))
                .build(),
            None => OutputBuilder::failure().build(),
        }
    }
}
