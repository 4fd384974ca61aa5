//! Schema-definition graph and edge resolution.

use schemaflow_nodes::Node;
use serde::{Deserialize, Serialize};

/// Handle value React Flow emits for the default exit.
const DEFAULT_HANDLE: &str = "output";

/// A directed connection between two nodes, with an optional named exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,

    /// Empty or `"output"` denotes the default/unconditional path; any
    /// other value is a named exit (`success`, `error`, `true`, `false`).
    #[serde(rename = "sourceHandle", default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
}

impl Edge {
    fn is_default(&self) -> bool {
        matches!(self.source_handle.as_deref(), None | Some("") | Some(DEFAULT_HANDLE))
    }
}

/// The deserialized `definition` JSON of a schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl SchemaDefinition {
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Node by id.
    pub fn find_node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// The start node of the graph, located by the outer UI `type`.
    pub fn find_start_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.ui_type == "start")
    }

    /// Resolve the successor of `current` for the given exit handle.
    ///
    /// A single pass over the edge list: an edge whose named handle equals
    /// `exit_handle` wins immediately; otherwise the first default edge
    /// encountered is the fallback. Duplicate default edges beyond the
    /// first are ignored.
    pub fn resolve_next(&self, current: &str, exit_handle: &str) -> Option<String> {
        let mut default_target = None;

        for edge in &self.edges {
            if edge.source != current {
                continue;
            }

            if let Some(handle) = edge.source_handle.as_deref() {
                if !handle.is_empty() && handle != DEFAULT_HANDLE && handle == exit_handle {
                    return Some(edge.target.clone());
                }
            }

            if edge.is_default() && default_target.is_none() {
                default_target = Some(edge.target.clone());
            }
        }

        default_target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn edge(source: &str, target: &str, handle: Option<&str>) -> Edge {
        Edge {
            source: source.to_string(),
            target: target.to_string(),
            source_handle: handle.map(str::to_string),
        }
    }

    fn graph(edges: Vec<Edge>) -> SchemaDefinition {
        SchemaDefinition {
            nodes: vec![],
            edges,
        }
    }

    #[test]
    fn deserializes_definition() {
        let definition = SchemaDefinition::from_value(json!({
            "nodes": [
                {"id": "s", "type": "start", "data": {"type": "start"}},
                {"id": "e", "type": "end", "data": {"type": "end"}}
            ],
            "edges": [
                {"source": "s", "target": "e"}
            ]
        }))
        .unwrap();

        assert_eq!(definition.nodes.len(), 2);
        assert_eq!(definition.edges.len(), 1);
        assert!(definition.edges[0].is_default());
    }

    #[test]
    fn named_handle_wins_over_default() {
        let schema = graph(vec![
            edge("c", "fallback", None),
            edge("c", "on-true", Some("true")),
        ]);

        assert_eq!(schema.resolve_next("c", "true"), Some("on-true".to_string()));
    }

    #[test]
    fn named_handle_wins_even_when_listed_after_default() {
        let schema = graph(vec![
            edge("c", "fallback", Some("output")),
            edge("c", "on-error", Some("error")),
        ]);

        assert_eq!(schema.resolve_next("c", "error"), Some("on-error".to_string()));
    }

    #[test]
    fn falls_back_to_default_when_handle_unmatched() {
        let schema = graph(vec![
            edge("c", "on-true", Some("true")),
            edge("c", "fallback", Some("")),
        ]);

        assert_eq!(schema.resolve_next("c", "false"), Some("fallback".to_string()));
    }

    #[test]
    fn first_default_edge_wins() {
        let schema = graph(vec![
            edge("n", "first", None),
            edge("n", "second", Some("output")),
        ]);

        assert_eq!(schema.resolve_next("n", "success"), Some("first".to_string()));
    }

    #[test]
    fn no_matching_edge_yields_none() {
        let schema = graph(vec![edge("other", "x", None)]);
        assert_eq!(schema.resolve_next("n", "success"), None);
    }

    #[test]
    fn output_handle_is_default_not_named() {
        // An edge labeled "output" must not match an exit handle literally
        // named "output"; it is the default path.
        let schema = graph(vec![edge("n", "d", Some("output"))]);
        assert_eq!(schema.resolve_next("n", "output"), Some("d".to_string()));
        assert_eq!(schema.resolve_next("n", "success"), Some("d".to_string()));
    }

    #[test]
    fn finds_start_node_by_outer_type() {
        let definition = SchemaDefinition::from_value(json!({
            "nodes": [
                {"id": "l", "type": "custom", "data": {"type": "log"}},
                {"id": "s", "type": "start", "data": {"type": "start"}}
            ],
            "edges": []
        }))
        .unwrap();

        assert_eq!(definition.find_start_node().unwrap().id, "s");
    }

    #[test]
    fn find_node_by_id() {
        let definition = SchemaDefinition::from_value(json!({
            "nodes": [{"id": "a", "type": "start", "data": {"type": "start"}}],
            "edges": []
        }))
        .unwrap();

        assert!(definition.find_node("a").is_some());
        assert!(definition.find_node("b").is_none());
    }
}
