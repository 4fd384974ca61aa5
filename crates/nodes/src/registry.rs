//! Node handler trait and dispatch registry.

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::handlers::{
    ConditionHandler, EndHandler, HttpRequestHandler, LogHandler, MathHandler, SleepHandler,
    StartHandler, VariableSetHandler,
};
use crate::node::{node_type, Node};
use crate::result::NodeResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Contract every node handler honors.
///
/// `ctx` is exclusively owned by the engine for the duration of the call;
/// handlers may mutate `ctx.variables` and must not touch the other slots.
/// `default_next` is the precomputed default successor, consumed only by
/// the sleep handler to build its resume callback.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    async fn execute(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
        default_next: Option<&str>,
    ) -> Result<NodeResult, NodeError>;
}

/// Process-local mapping from node-type string to handler.
///
/// Populated once at boot and immutable afterwards.
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn NodeHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under a node-type name.
    pub fn register<H: NodeHandler + 'static>(&mut self, node_type: impl Into<String>, handler: H) {
        self.handlers.insert(node_type.into(), Arc::new(handler));
    }

    /// Look up the handler for a node type.
    pub fn get(&self, node_type: &str) -> Option<Arc<dyn NodeHandler>> {
        self.handlers.get(node_type).cloned()
    }

    pub fn has(&self, node_type: &str) -> bool {
        self.handlers.contains_key(node_type)
    }

    /// Registered node-type names.
    pub fn list(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Settings the sleep handler needs to talk to the external timer service.
#[derive(Debug, Clone)]
pub struct SleepSettings {
    /// Timer Service base URL (`AT_SCHEDULER_URL`).
    pub scheduler_url: String,

    /// Base URL the Timer Service will call back (`URL_EXECUTION`).
    pub execution_base_url: String,

    /// Shared secret appended to resume-callback URLs, verified by the
    /// continue endpoint. Unset disables the check.
    pub continue_token: Option<String>,
}

/// Build the registry with every built-in node handler.
pub fn default_registry(sleep: SleepSettings) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(node_type::START, StartHandler);
    registry.register(node_type::END, EndHandler);
    registry.register(node_type::LOG, LogHandler);
    registry.register(node_type::VARIABLE_SET, VariableSetHandler);
    registry.register(node_type::MATH, MathHandler);
    registry.register(node_type::CONDITION, ConditionHandler);
    registry.register(node_type::HTTP_REQUEST, HttpRequestHandler::new());
    registry.register(node_type::SLEEP, SleepHandler::new(sleep));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::output_map;
    use serde_json::json;

    struct EchoHandler;

    #[async_trait]
    impl NodeHandler for EchoHandler {
        async fn execute(
            &self,
            node: &Node,
            _ctx: &mut ExecutionContext,
            _default_next: Option<&str>,
        ) -> Result<NodeResult, NodeError> {
            Ok(NodeResult::success(output_map([(
                "node_id",
                json!(node.id),
            )])))
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = HandlerRegistry::new();
        registry.register("echo", EchoHandler);

        assert!(registry.has("echo"));
        assert!(!registry.has("missing"));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn default_registry_covers_all_node_types() {
        let registry = default_registry(SleepSettings {
            scheduler_url: "http://scheduler".into(),
            execution_base_url: "http://api".into(),
            continue_token: None,
        });

        for node_type in [
            node_type::START,
            node_type::END,
            node_type::LOG,
            node_type::VARIABLE_SET,
            node_type::MATH,
            node_type::CONDITION,
            node_type::HTTP_REQUEST,
            node_type::SLEEP,
        ] {
            assert!(registry.has(node_type), "missing handler for {node_type}");
        }
        assert_eq!(registry.list().len(), 8);
    }

    #[tokio::test]
    async fn dispatches_through_registry() {
        let mut registry = HandlerRegistry::new();
        registry.register("echo", EchoHandler);

        let node = Node::new("n1", "echo", json!({}));
        let mut ctx = ExecutionContext::default();
        let handler = registry.get("echo").unwrap();
        let result = handler.execute(&node, &mut ctx, None).await.unwrap();

        assert_eq!(result.output["node_id"], json!("n1"));
    }
}
