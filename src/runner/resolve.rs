//! Typed parameter resolution
//!
//! Thin adapters over [`Parameter::resolve`] that check the shape of the
//! resolved value. Every error leaving these helpers names the role the
//! parameter plays for the step ("working directory", "image tag", ...),
//! since the message goes straight to whoever wired the pipeline. The error
//! kind underneath is never changed, so a missing reference stays a
//! `ReferenceNotFound` and is not reported as a type problem.

use crate::error::{ResolutionError, ResolutionResult};
use crate::runner::parameter::Parameter;
use crate::runner::run_context::OutputLookup;
use crate::runner::value::{Value, ValueKind};

/// Turn an absent parameter into a construction-time `NilParameter` error
///
/// A parameter written as a bare YAML null (`command:` or `command: ~`)
/// counts as absent.
pub fn require(param: Option<Parameter>, role: &str) -> ResolutionResult<Parameter> {
    match param {
        Some(Parameter::Static(Value::Null)) | None => Err(ResolutionError::NilParameter {
            role: role.to_string(),
        }),
        Some(param) => Ok(param),
    }
}

/// Resolve without any shape check; the caller validates the value itself
pub fn resolve_generic(
    param: &Parameter,
    outputs: Option<&dyn OutputLookup>,
    role: &str,
) -> ResolutionResult<Value> {
    param.resolve(outputs).map_err(|e| e.with_role(role))
}

pub fn resolve_string(
    param: &Parameter,
    outputs: Option<&dyn OutputLookup>,
    role: &str,
) -> ResolutionResult<String> {
    match resolve_generic(param, outputs, role)? {
        Value::String(s) => Ok(s),
        other => Err(mismatch(role, ValueKind::String, &other)),
    }
}

pub fn resolve_bool(
    param: &Parameter,
    outputs: Option<&dyn OutputLookup>,
    role: &str,
) -> ResolutionResult<bool> {
    match resolve_generic(param, outputs, role)? {
        Value::Bool(b) => Ok(b),
        other => Err(mismatch(role, ValueKind::Bool, &other)),
    }
}

/// Resolve to a non-negative integer
pub fn resolve_integer(
    param: &Parameter,
    outputs: Option<&dyn OutputLookup>,
    role: &str,
) -> ResolutionResult<u64> {
    let value = resolve_generic(param, outputs, role)?;
    value
        .as_u64()
        .ok_or_else(|| mismatch(role, ValueKind::Number, &value))
}

/// Resolve to a list of strings
///
/// Accepts either a sequence of strings or a single string split on
/// `separator` (an empty separator keeps the string whole). Items are trimmed
/// and empty items dropped.
pub fn resolve_string_list(
    param: &Parameter,
    outputs: Option<&dyn OutputLookup>,
    role: &str,
    separator: &str,
) -> ResolutionResult<Vec<String>> {
    let value = resolve_generic(param, outputs, role)?;
    let items: Vec<String> = match value {
        Value::String(s) if separator.is_empty() => vec![s],
        Value::String(s) => s.split(separator).map(str::to_string).collect(),
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(mismatch(role, ValueKind::String, &other)),
            })
            .collect::<ResolutionResult<_>>()?,
        other => return Err(mismatch(role, ValueKind::Sequence, &other)),
    };

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

pub fn resolve_optional_string(
    param: Option<&Parameter>,
    outputs: Option<&dyn OutputLookup>,
    role: &str,
) -> ResolutionResult<Option<String>> {
    param
        .map(|p| resolve_string(p, outputs, role))
        .transpose()
}

pub fn resolve_optional_bool(
    param: Option<&Parameter>,
    outputs: Option<&dyn OutputLookup>,
    role: &str,
) -> ResolutionResult<Option<bool>> {
    param.map(|p| resolve_bool(p, outputs, role)).transpose()
}

pub fn resolve_optional_integer(
    param: Option<&Parameter>,
    outputs: Option<&dyn OutputLookup>,
    role: &str,
) -> ResolutionResult<Option<u64>> {
    param
        .map(|p| resolve_integer(p, outputs, role))
        .transpose()
}

fn mismatch(role: &str, expected: ValueKind, actual: &Value) -> ResolutionError {
    ResolutionError::TypeMismatch {
        role: role.to_string(),
        expected,
        actual: ValueKind::of(actual),
    }
}
