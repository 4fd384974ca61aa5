//! Variable interpolation runtime.
//!
//! Substitutes `{{name}}` tokens against the execution context. A token
//! resolves in this order:
//!
//! 1. the whole trimmed name as a flat `variables` key;
//! 2. a dotted path whose first segment names a context slot
//!    (`variables`, `steps`, `execution`, `webhook`, `user`);
//! 3. a dotted path rooted at a `variables` entry.
//!
//! Unresolved tokens are left literal so a graph author can see exactly
//! which reference missed.

use crate::context::ExecutionContext;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

static VAR_PATTERN: OnceLock<Regex> = OnceLock::new();

fn var_pattern() -> &'static Regex {
    VAR_PATTERN.get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").expect("valid token pattern"))
}

/// Canonical string rendering of a context value.
///
/// Bare strings stay bare; numbers and booleans use their display form;
/// everything else renders as JSON text.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Replace every `{{name}}` token in `input` against the context.
pub fn interpolate_str(input: &str, ctx: &ExecutionContext) -> String {
    var_pattern()
        .replace_all(input, |caps: &Captures<'_>| {
            let name = caps[1].trim();
            match resolve_name(name, ctx) {
                Some(value) => value_to_string(&value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Recursively interpolate a structured value: strings are substituted,
/// objects and arrays traversed element-wise, other scalars untouched.
pub fn interpolate_value(value: &Value, ctx: &ExecutionContext) -> Value {
    match value {
        Value::String(s) => Value::String(interpolate_str(s, ctx)),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), interpolate_value(v, ctx)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| interpolate_value(v, ctx)).collect())
        }
        other => other.clone(),
    }
}

/// Interpolate every value of a string map (request headers).
pub fn interpolate_map(map: &HashMap<String, String>, ctx: &ExecutionContext) -> HashMap<String, String> {
    map.iter()
        .map(|(k, v)| (k.clone(), interpolate_str(v, ctx)))
        .collect()
}

/// Operand resolution for the math node, distinct from plain interpolation:
/// a string containing `{{…}}` is interpolated; otherwise a bare string
/// matching a variable name yields that variable's value; anything else is
/// used as-is.
pub fn resolve_operand(value: &Value, ctx: &ExecutionContext) -> Value {
    if let Value::String(s) = value {
        if s.contains("{{") {
            return Value::String(interpolate_str(s, ctx));
        }
        if let Some(found) = ctx.variables.get(s.as_str()) {
            return found.clone();
        }
    }
    value.clone()
}

fn resolve_name(name: &str, ctx: &ExecutionContext) -> Option<Value> {
    if let Some(value) = ctx.variables.get(name) {
        return Some(value.clone());
    }
    if !name.contains('.') {
        return None;
    }

    let mut segments = name.split('.');
    let root = segments.next()?;
    let rest: Vec<&str> = segments.collect();

    let base = match root {
        "variables" => {
            let (first, tail) = rest.split_first()?;
            return tail
                .iter()
                .try_fold(ctx.variables.get(*first)?.clone(), |acc, seg| {
                    descend(&acc, seg)
                });
        }
        "steps" => serde_json::to_value(&ctx.steps).ok()?,
        "execution" => Value::Object(ctx.execution.clone()),
        "user" => Value::Object(ctx.user.clone()),
        "webhook" => ctx.webhook.clone()?,
        first => ctx.variables.get(first)?.clone(),
    };

    rest.iter().try_fold(base, |acc, seg| descend(&acc, seg))
}

fn descend(value: &Value, segment: &str) -> Option<Value> {
    match value {
        Value::Object(map) => map.get(segment).cloned(),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i).cloned()),
        _ => None,
    }
}
