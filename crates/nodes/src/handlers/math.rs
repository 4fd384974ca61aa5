//! Math node: one arithmetic operation over two operands.

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::interpolate::resolve_operand;
use crate::node::Node;
use crate::registry::NodeHandler;
use crate::result::{output_map, NodeResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct MathConfig {
    #[serde(default)]
    operation: String,
    #[serde(default)]
    operand1: Value,
    #[serde(default)]
    operand2: Value,
    #[serde(default)]
    result_variable: String,
}

pub struct MathHandler;

#[async_trait]
impl NodeHandler for MathHandler {
    async fn execute(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
        _default_next: Option<&str>,
    ) -> Result<NodeResult, NodeError> {
        let config: MathConfig = match serde_json::from_value(node.data.config.clone()) {
            Ok(config) => config,
            Err(err) => {
                return Ok(NodeResult::failed(format!("failed to parse math config: {err}")))
            }
        };

        let operand1 = resolve_operand(&config.operand1, ctx);
        let operand2 = resolve_operand(&config.operand2, ctx);

        let left = match to_f64(&operand1) {
            Ok(value) => value,
            Err(err) => return Ok(NodeResult::failed(format!("invalid operand1: {err}"))),
        };
        let right = match to_f64(&operand2) {
            Ok(value) => value,
            Err(err) => return Ok(NodeResult::failed(format!("invalid operand2: {err}"))),
        };

        let result = match config.operation.as_str() {
            "add" => left + right,
            "subtract" => left - right,
            "multiply" => left * right,
            "divide" => {
                if right == 0.0 {
                    return Ok(NodeResult::failed("division by zero"));
                }
                left / right
            }
            other => {
                return Ok(NodeResult::failed(format!("unknown operation: {other}")))
            }
        };

        let result_value = number_value(result);
        if !config.result_variable.is_empty() {
            ctx.set_variable(&config.result_variable, result_value.clone());
        }

        Ok(NodeResult::success(output_map([
            ("result", result_value),
            ("operation", json!(config.operation)),
            ("operand1", number_value(left)),
            ("operand2", number_value(right)),
        ])))
    }
}

/// Coerce an operand to a double. Accepts JSON numbers and numeric-looking
/// strings.
fn to_f64(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("number out of range: {n}")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("cannot convert string '{s}' to number")),
        other => Err(format!("cannot convert {other} to number")),
    }
}

/// Render a computed double as a JSON number, collapsing whole values to
/// integers so `10 + 5` persists as `15` rather than `15.0`.
fn number_value(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        json!(value as i64)
    } else {
        json!(value)
    }
}
