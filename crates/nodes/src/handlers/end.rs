//! End node: the terminal marker of a schema.
//!
//! The engine recognizes the `end` type itself and never resolves a
//! successor for it; the handler only records completion.

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::node::Node;
use crate::registry::NodeHandler;
use crate::result::{output_map, NodeResult};
use async_trait::async_trait;
use serde_json::json;

pub struct EndHandler;

#[async_trait]
impl NodeHandler for EndHandler {
    async fn execute(
        &self,
        _node: &Node,
        _ctx: &mut ExecutionContext,
        _default_next: Option<&str>,
    ) -> Result<NodeResult, NodeError> {
        Ok(NodeResult::success(output_map([("completed", json!(true))])))
    }
}
