//! Published step outputs
//!
//! Every step publishes an [`Output`] into the run context once it has
//! executed. Later parameters read single keys out of it. Steps are expected
//! to build their output through [`OutputBuilder`], which always sets the
//! `success` flag and, for steps that produce a list, a matching `count`.

use crate::runner::value::{Value, ValueKind};
use serde::Serialize;
use std::collections::BTreeMap;

pub const SUCCESS_KEY: &str = "success";
pub const COUNT_KEY: &str = "count";

/// A value published by a step or task
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Output built through the shared contract
    Structured(StepOutput),

    /// Arbitrary data supplied by a producer that bypassed the contract
    Raw(Value),
}

/// The contract shape: a success flag, an optional item count and free fields
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepOutput {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

/// Why a key could not be read out of an output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionError {
    NotAddressable(ValueKind),
    MissingKey,
}

impl StepOutput {
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            SUCCESS_KEY => Some(Value::Bool(self.success)),
            COUNT_KEY => self.count.map(|n| Value::Number((n as u64).into())),
            _ => self.fields.get(key).cloned(),
        }
    }

    /// The output as one mapping, contract keys first
    pub fn to_value(&self) -> Value {
        // Serializing string keys and YAML values cannot fail
        serde_yaml::to_value(self).unwrap_or_default()
    }
}

impl Output {
    /// Read a single key. No coercion is applied to the stored value.
    pub fn project(&self, key: &str) -> Result<Value, ProjectionError> {
        match self {
            Output::Structured(out) => out.get(key).ok_or(ProjectionError::MissingKey),
            Output::Raw(Value::Mapping(map)) => {
                map.get(key).cloned().ok_or(ProjectionError::MissingKey)
            }
            Output::Raw(other) => Err(ProjectionError::NotAddressable(ValueKind::of(other))),
        }
    }

    /// Whether the producer reported success
    ///
    /// Raw outputs count as successful only if they are a mapping with a
    /// `success: true` entry.
    pub fn is_success(&self) -> bool {
        match self {
            Output::Structured(out) => out.success,
            Output::Raw(Value::Mapping(map)) => {
                matches!(map.get(SUCCESS_KEY), Some(Value::Bool(true)))
            }
            Output::Raw(_) => false,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Output::Structured(out) => out.to_value(),
            Output::Raw(value) => value.clone(),
        }
    }
}

impl From<StepOutput> for Output {
    fn from(out: StepOutput) -> Self {
        Output::Structured(out)
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Output::Raw(value)
    }
}

/// Shared helper for building contract-conforming outputs
#[derive(Debug, Clone, Default)]
pub struct OutputBuilder {
    output: StepOutput,
}

impl OutputBuilder {
    pub fn new(success: bool) -> Self {
        OutputBuilder {
            output: StepOutput {
                success,
                ..StepOutput::default()
            },
        }
    }

    pub fn success() -> Self {
        Self::new(true)
    }

    pub fn failure() -> Self {
        Self::new(false)
    }

    pub fn count(mut self, count: usize) -> Self {
        self.output.count = Some(count);
        self
    }

    /// Add a field. `success` and `count` are reserved and set via their own methods.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != SUCCESS_KEY && key != COUNT_KEY {
            self.output.fields.insert(key, value.into());
        }
        self
    }

    /// Add a list field and set `count` to its length
    pub fn items<I, T>(self, key: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        let count = items.len();
        self.field(key, Value::Sequence(items)).count(count)
    }

    pub fn build(self) -> Output {
        Output::Structured(self.output)
    }
}
