//! Variable-set node: assigns a value into `context.variables`.

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::node::Node;
use crate::registry::NodeHandler;
use crate::result::{output_map, NodeResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct VariableSetConfig {
    #[serde(default)]
    variable: String,
    #[serde(default)]
    value: Value,
}

pub struct VariableSetHandler;

#[async_trait]
impl NodeHandler for VariableSetHandler {
    async fn execute(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
        _default_next: Option<&str>,
    ) -> Result<NodeResult, NodeError> {
        let config: VariableSetConfig = match serde_json::from_value(node.data.config.clone()) {
            Ok(config) => config,
            Err(err) => {
                return Ok(NodeResult::failed(format!(
                    "failed to parse variable_set config: {err}"
                )))
            }
        };

        if config.variable.is_empty() {
            return Ok(NodeResult::failed("variable is required"));
        }

        ctx.set_variable(&config.variable, config.value.clone());

        Ok(NodeResult::success(output_map([
            ("variable", json!(config.variable)),
            ("value", config.value),
        ])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn assigns_variable() {
        let node = Node::new("v", "variable_set", json!({"variable": "x", "value": 10}));
        let mut ctx = ExecutionContext::default();

        let result = VariableSetHandler
            .execute(&node, &mut ctx, None)
            .await
            .unwrap();

        assert!(result.status.is_success());
        assert_eq!(ctx.get_variable("x"), Some(&json!(10)));
        assert_eq!(result.output["variable"], json!("x"));
        assert_eq!(result.output["value"], json!(10));
    }

    #[tokio::test]
    async fn missing_variable_name_fails() {
        let node = Node::new("v", "variable_set", json!({"value": 10}));
        let mut ctx = ExecutionContext::default();

        let result = VariableSetHandler
            .execute(&node, &mut ctx, None)
            .await
            .unwrap();

        assert!(result.status.is_failed());
        assert_eq!(result.error.as_deref(), Some("variable is required"));
        assert!(ctx.variables.is_empty());
    }

    #[tokio::test]
    async fn overwrites_existing_variable() {
        let node = Node::new("v", "variable_set", json!({"variable": "x", "value": "new"}));
        let mut ctx = ExecutionContext::default();
        ctx.set_variable("x", json!("old"));

        VariableSetHandler
            .execute(&node, &mut ctx, None)
            .await
            .unwrap();

        assert_eq!(ctx.get_variable("x"), Some(&json!("new")));
    }
}
