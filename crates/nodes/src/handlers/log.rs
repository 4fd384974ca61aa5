//! Log node: emits a record into the worker's log stream.

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
struct LogConfig {
    #[serde(default)]
    message: String,
    #[serde(default)]
    level: String,
}

pub struct LogHandler;

#[async_trait]
impl NodeHandler for LogHandler {
    async fn execute(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
        _default_next: Option<&str>,
    ) -> Result<NodeResult, NodeError> {
        let config: LogConfig = match serde_json::from_value(node.data.config.clone()) {
            Ok(config) => config,
            Err(err) => return Ok(NodeResult::failed(format!("failed to parse log config: {err}"))),
        };

        let message = interpolate_str(&config.message, ctx);
        let level = effective_level(&config.level);

        match level {
            "debug" => tracing::debug!(node_id = %node.id, "{message}"),
            "warn" => tracing::warn!(node_id = %node.id, "{message}"),
            "error" => tracing::error!(node_id = %node.id, "{message}"),
            _ => tracing::info!(node_id = %node.id, "{message}"),
        }

        Ok(NodeResult::success(output_map([
            ("message", json!(message)),
            ("level", json!(level)),
        ])))
    }
}

/// Unknown or absent levels fall back to info.
fn effective_level(level: &str) -> &'static str {
    match level {
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn interpolates_message() {
        let node = Node::new("l", "log", json!({"message": "hello {{who}}", "level": "info"}));
        let mut ctx = ExecutionContext::default();
        ctx.set_variable("who", json!("world"));

        let result = LogHandler.execute(&node, &mut ctx, None).await.unwrap();
        assert!(result.status.is_success());
        assert_eq!(result.output["message"], json!("hello world"));
        assert_eq!(result.output["level"], json!("info"));
    }

    #[tokio::test]
    async fn unknown_level_reports_info() {
        let node = Node::new("l", "log", json!({"message": "hi", "level": "verbose"}));
        let mut ctx = ExecutionContext::default();

        let result = LogHandler.execute(&node, &mut ctx, None).await.unwrap();
        assert_eq!(result.output["level"], json!("info"));
    }

    #[tokio::test]
    async fn absent_level_reports_info() {
        let node = Node::new("l", "log", json!({"message": "hi"}));
        let mut ctx = ExecutionContext::default();

        let result = LogHandler.execute(&node, &mut ctx, None).await.unwrap();
        assert_eq!(result.output["message"], json!("hi"));
        assert_eq!(result.output["level"], json!("info"));
    }

    #[test]
    fn level_table() {
        assert_eq!(effective_level("debug"), "debug");
        assert_eq!(effective_level("warn"), "warn");
        assert_eq!(effective_level("error"), "error");
        assert_eq!(effective_level("info"), "info");
        assert_eq!(effective_level(""), "info");
        assert_eq!(effective_level("trace"), "info");
    }
}
