//! Condition node: evaluates a small comparison/boolean expression and
//! routes through the `true` or `false` exit handle.

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::interpolate::interpolate_str;
use crate::node::Node;
use crate::registry::NodeHandler;
use crate::result::{output_map, NodeResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct ConditionConfig {
    #[serde(default)]
    expression: String,
}

pub struct ConditionHandler;

#[async_trait]
impl NodeHandler for ConditionHandler {
    async fn execute(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
        _default_next: Option<&str>,
    ) -> Result<NodeResult, NodeError> {
        let config: ConditionConfig = match serde_json::from_value(node.data.config.clone()) {
            Ok(config) => config,
            Err(err) => {
                return Ok(NodeResult::failed(format!(
                    "failed to parse condition config: {err}"
                ))
                .with_exit_handle("error"))
            }
        };

        if config.expression.is_empty() {
            return Ok(NodeResult::failed("expression is required").with_exit_handle("error"));
        }

        let interpolated = interpolate_str(&config.expression, ctx);

        let result = match evaluate_expression(&interpolated) {
            Ok(result) => result,
            Err(err) => {
                return Ok(NodeResult::failed(format!(
                    "failed to evaluate expression '{interpolated}': {err}"
                ))
                .with_exit_handle("error"))
            }
        };

        let exit_handle = if result { "true" } else { "false" };

        Ok(NodeResult::success(output_map([
            ("expression", json!(config.expression)),
            ("interpolated", json!(interpolated)),
            ("result", json!(result)),
        ]))
        .with_exit_handle(exit_handle))
    }
}

/// Comparators in match order; the first one contained in the expression
/// wins and splits it at its first occurrence.
const COMPARATORS: [&str; 6] = [">=", "<=", "==", "!=", ">", "<"];

/// Evaluate the condition grammar: `||` splits first, then `&&`, then a
/// single comparison, then a bare boolean literal. Left to right, no
/// parentheses.
fn evaluate_expression(expr: &str) -> Result<bool, String> {
    let expr = expr.trim();

    if expr.contains("||") {
        for part in expr.split("||") {
            if evaluate_expression(part.trim())? {
                return Ok(true);
            }
        }
        return Ok(false);
    }

    if expr.contains("&&") {
        for part in expr.split("&&") {
            if !evaluate_expression(part.trim())? {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    for op in COMPARATORS {
        if let Some(pos) = expr.find(op) {
            let left = &expr[..pos];
            let right = &expr[pos + op.len()..];
            return Ok(compare_values(left, right, op));
        }
    }

    parse_boolean(expr)
}

fn compare_values(left: &str, right: &str, op: &str) -> bool {
    if let (Some(l), Some(r)) = (parse_number(left), parse_number(right)) {
        return compare_numbers(l, r, op);
    }
    compare_strings(left, right, op)
}

fn parse_number(s: &str) -> Option<f64> {
    trim_quotes(s).parse::<f64>().ok()
}

fn compare_numbers(left: f64, right: f64, op: &str) -> bool {
    match op {
        ">" => left > right,
        "<" => left < right,
        ">=" => left >= right,
        "<=" => left <= right,
        "==" => left == right,
        "!=" => left != right,
        _ => false,
    }
}

fn compare_strings(left: &str, right: &str, op: &str) -> bool {
    let left = trim_quotes(left);
    let right = trim_quotes(right);
    match op {
        "==" => left == right,
        "!=" => left != right,
        ">" => left > right,
        "<" => left < right,
        ">=" => left >= right,
        "<=" => left <= right,
        _ => false,
    }
}

fn parse_boolean(s: &str) -> Result<bool, String> {
    match trim_quotes(s).to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(format!("cannot parse '{other}' as boolean")),
    }
}

fn trim_quotes(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '"' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_comparisons() {
        assert!(evaluate_expression("7 > 5").unwrap());
        assert!(!evaluate_expression("3 > 5").unwrap());
        assert!(evaluate_expression("5 >= 5").unwrap());
        assert!(evaluate_expression("4 <= 5").unwrap());
        assert!(evaluate_expression("5 == 5.0").unwrap());
        assert!(evaluate_expression("5 != 6").unwrap());
        assert!(evaluate_expression("2 < 10").unwrap());
    }

    #[test]
    fn string_comparisons() {
        assert!(evaluate_expression("abc == abc").unwrap());
        assert!(evaluate_expression("'abc' == \"abc\"").unwrap());
        assert!(evaluate_expression("abc != abd").unwrap());
        assert!(evaluate_expression("b > a").unwrap());
    }

    #[test]
    fn mixed_operands_compare_as_strings() {
        assert!(!evaluate_expression("abc == 5").unwrap());
        assert!(evaluate_expression("abc != 5").unwrap());
    }

    #[test]
    fn or_splits_first() {
        assert!(evaluate_expression("1 > 2 || 3 > 2").unwrap());
        assert!(!evaluate_expression("1 > 2 || 2 > 3").unwrap());
    }

    #[test]
    fn and_requires_all_sides() {
        assert!(evaluate_expression("2 > 1 && 3 > 2").unwrap());
        assert!(!evaluate_expression("2 > 1 && 2 > 3").unwrap());
    }

    #[test]
    fn or_binds_looser_than_and() {
        // "a && b || c" splits on || first: (a && b) || (c)
        assert!(evaluate_expression("1 > 2 && 1 > 2 || true").unwrap());
        assert!(!evaluate_expression("true && false || false").unwrap());
    }

    #[test]
    fn boolean_literals() {
        assert!(evaluate_expression("true").unwrap());
        assert!(evaluate_expression("1").unwrap());
        assert!(evaluate_expression("yes").unwrap());
        assert!(!evaluate_expression("false").unwrap());
        assert!(!evaluate_expression("0").unwrap());
        assert!(!evaluate_expression("no").unwrap());
        assert!(!evaluate_expression("''").unwrap());
        assert!(evaluate_expression("TRUE").unwrap());
    }

    #[test]
    fn unparseable_expression_errors() {
        assert!(evaluate_expression("definitely not a bool").is_err());
    }

    #[test]
    fn comparator_order_first_match_wins() {
        // ">=" is tried before ">", so "5 >= 5" never splits on ">".
        assert!(evaluate_expression("5 >= 5").unwrap());
        assert!(evaluate_expression("a == a").unwrap());
    }

    #[test]
    fn evaluation_is_deterministic() {
        for _ in 0..3 {
            assert!(evaluate_expression("7 > 5 && yes").unwrap());
        }
    }

    #[tokio::test]
    async fn routes_true_handle() {
        let node = Node::new("c", "condition", json!({"expression": "{{n}} > 5"}));
        let mut ctx = ExecutionContext::default();
        ctx.set_variable("n", json!(7));

        let result = ConditionHandler.execute(&node, &mut ctx, None).await.unwrap();

        assert!(result.status.is_success());
        assert_eq!(result.exit_handle.as_deref(), Some("true"));
        assert_eq!(result.output["expression"], json!("{{n}} > 5"));
        assert_eq!(result.output["interpolated"], json!("7 > 5"));
        assert_eq!(result.output["result"], json!(true));
    }

    #[tokio::test]
    async fn routes_false_handle() {
        let node = Node::new("c", "condition", json!({"expression": "{{n}} > 5"}));
        let mut ctx = ExecutionContext::default();
        ctx.set_variable("n", json!(3));

        let result = ConditionHandler.execute(&node, &mut ctx, None).await.unwrap();
        assert_eq!(result.exit_handle.as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn evaluation_error_routes_error_handle() {
        let node = Node::new("c", "condition", json!({"expression": "{{missing}}"}));
        let mut ctx = ExecutionContext::default();

        let result = ConditionHandler.execute(&node, &mut ctx, None).await.unwrap();
        assert!(result.status.is_failed());
        assert_eq!(result.exit_handle.as_deref(), Some("error"));
    }

    #[tokio::test]
    async fn empty_expression_fails() {
        let node = Node::new("c", "condition", json!({}));
        let mut ctx = ExecutionContext::default();

        let result = ConditionHandler.execute(&node, &mut ctx, None).await.unwrap();
        assert!(result.status.is_failed());
        assert_eq!(result.error.as_deref(), Some("expression is required"));
    }
}
