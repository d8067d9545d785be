//! `${var}` expansion for command strings
//!
//! Variables come from the execution context first and the process
//! environment second. Values may themselves contain `${...}`; expansion
//! follows them, failing on cycles.

use crate::error::{InterpolationError, InterpolationResult};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;

const MAX_DEPTH: usize = 32;

fn var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_.-]*)\}").expect("static pattern"))
}

fn lookup(name: &str, vars: &HashMap<String, String>) -> Option<String> {
    vars.get(name).cloned().or_else(|| env::var(name).ok())
}

fn expand(s: &str, vars: &HashMap<String, String>, stack: &mut Vec<String>) -> InterpolationResult<String> {
    let mut failure = None;

    let result = var_pattern().replace_all(s, |caps: &Captures| {
        let name = &caps[1];
        if failure.is_some() {
            return caps[0].to_string();
        }
        if stack.iter().any(|n| n == name) || stack.len() >= MAX_DEPTH {
            failure = Some(InterpolationError::RecursiveInterpolation(name.to_string()));
            return caps[0].to_string();
        }
        match lookup(name, vars) {
            Some(value) => {
                stack.push(name.to_string());
                let expanded = expand(&value, vars, stack);
                stack.pop();
                match expanded {
                    Ok(v) => v,
                    Err(e) => {
                        failure = Some(e);
                        caps[0].to_string()
                    }
                }
            }
            None => caps[0].to_string(),
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(result.into_owned()),
    }
}

/// Expand variables, leaving unknown ones untouched for the shell
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> InterpolationResult<String> {
    expand(s, vars, &mut Vec::new())
}
