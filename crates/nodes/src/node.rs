//! Graph-node types as stored in a schema definition.

use serde::{Deserialize, Serialize};

/// Registered node-type names.
///
/// The authoritative type of a node is `data.type`; the outer `type` field
/// is a UI concern and only consulted when locating the start node.
pub mod node_type {
    pub const START: &str = "start";
    pub const END: &str = "end";
    pub const LOG: &str = "log";
    pub const VARIABLE_SET: &str = "variable_set";
    pub const MATH: &str = "math";
    pub const CONDITION: &str = "condition";
    pub const HTTP_REQUEST: &str = "http_request";
    pub const SLEEP: &str = "sleep";
}

/// One vertex of a schema graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Opaque identifier, unique within the schema.
    pub id: String,

    /// UI-level node type.
    #[serde(rename = "type", default)]
    pub ui_type: String,

    /// Authoritative payload: type, label and handler-specific config.
    pub data: NodeData,
}

/// The `data` object carried by every graph node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    /// Authoritative node type, resolved against the handler registry.
    #[serde(rename = "type")]
    pub node_type: String,

    /// Display label.
    #[serde(default)]
    pub label: String,

    /// Opaque handler-specific configuration blob.
    #[serde(default)]
    pub config: serde_json::Value,
}

impl Node {
    /// Build a node with the given id, authoritative type and config.
    pub fn new(
        id: impl Into<String>,
        node_type: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        let node_type = node_type.into();
        Self {
            id: id.into(),
            ui_type: node_type.clone(),
            data: NodeData {
                node_type,
                label: String::new(),
                config,
            },
        }
    }
}
