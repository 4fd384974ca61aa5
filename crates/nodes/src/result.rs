//! Node execution result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status of a node invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Node executed successfully.
    Success,
    /// Node execution failed; the execution transitions to failed.
    Failed,
    /// Node deferred continuation to the external timer service.
    Sleep,
}

impl NodeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, NodeStatus::Success)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, NodeStatus::Failed)
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeStatus::Success => write!(f, "success"),
            NodeStatus::Failed => write!(f, "failed"),
            NodeStatus::Sleep => write!(f, "sleep"),
        }
    }
}

/// Result returned by a node handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResult {
    /// Handler-specific output, persisted on the step row and recorded
    /// under `steps.<node_id>.output` in the context.
    #[serde(default)]
    pub output: Map<String, Value>,

    /// Invocation status.
    pub status: NodeStatus,

    /// Named exit the engine should follow. Empty means the default for
    /// the status (`success` or `error`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_handle: Option<String>,

    /// Error message when status is failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wake-up instant for sleep results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_until: Option<DateTime<Utc>>,
}

impl NodeResult {
    /// Successful result with the given output.
    pub fn success(output: Map<String, Value>) -> Self {
        Self {
            output,
            status: NodeStatus::Success,
            exit_handle: None,
            error: None,
            sleep_until: None,
        }
    }

    /// Failed result with an error message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            output: Map::new(),
            status: NodeStatus::Failed,
            exit_handle: None,
            error: Some(message.into()),
            sleep_until: None,
        }
    }

    /// Sleep result pausing the execution until `sleep_until`.
    pub fn sleep(output: Map<String, Value>, sleep_until: DateTime<Utc>) -> Self {
        Self {
            output,
            status: NodeStatus::Sleep,
            exit_handle: None,
            error: None,
            sleep_until: Some(sleep_until),
        }
    }

    /// Attach a named exit handle.
    pub fn with_exit_handle(mut self, handle: impl Into<String>) -> Self {
        self.exit_handle = Some(handle.into());
        self
    }

    /// Attach output to a failed result.
    pub fn with_output(mut self, output: Map<String, Value>) -> Self {
        self.output = output;
        self
    }
}

/// Convenience for building output maps from `(key, value)` pairs.
pub(crate) fn output_map<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_result() {
        let result = NodeResult::success(output_map([("started", json!(true))]));
        assert!(result.status.is_success());
        assert_eq!(result.output["started"], json!(true));
        assert!(result.error.is_none());
    }

    #[test]
    fn failed_result_carries_message() {
        let result = NodeResult::failed("division by zero").with_exit_handle("error");
        assert!(result.status.is_failed());
        assert_eq!(result.error.as_deref(), Some("division by zero"));
        assert_eq!(result.exit_handle.as_deref(), Some("error"));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&NodeStatus::Sleep).unwrap(), "\"sleep\"");
        assert_eq!(NodeStatus::Failed.to_string(), "failed");
    }
}
