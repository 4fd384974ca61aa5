//! Start node: the entry marker of a schema.

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::node::Node;
use crate::registry::NodeHandler;
use crate::result::{output_map, NodeResult};
use async_trait::async_trait;
use serde_json::json;

/// Carries no config; succeeds and lets the execution move on.
pub struct StartHandler;

#[async_trait]
impl NodeHandler for StartHandler {
    async fn execute(
        &self,
        _node: &Node,
        _ctx: &mut ExecutionContext,
        _default_next: Option<&str>,
    ) -> Result<NodeResult, NodeError> {
        Ok(NodeResult::success(output_map([("started", json!(true))])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_started_output() {
        let node = Node::new("s", "start", json!(null));
        let mut ctx = ExecutionContext::default();

        let result = StartHandler.execute(&node, &mut ctx, None).await.unwrap();
        assert!(result.status.is_success());
        assert_eq!(result.output["started"], json!(true));
    }
}
