//! Execution context shared between node handlers within one run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Output recorded for a completed step, keyed by node id in the context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepOutput {
    #[serde(default)]
    pub output: Map<String, Value>,
}

/// The live interpreter state of one execution.
///
/// Persisted as the `context` JSON column of `execution_state` and handed
/// to every handler invocation. Handlers may mutate `variables`; all other
/// slots are owned by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Inbound trigger payload, when the execution was started externally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<Value>,

    /// Owner metadata.
    #[serde(default)]
    pub user: Map<String, Value>,

    /// Execution metadata; carries at minimum `{id}`.
    #[serde(default)]
    pub execution: Map<String, Value>,

    /// Outputs of previously executed nodes, keyed by node id.
    #[serde(default)]
    pub steps: HashMap<String, StepOutput>,

    /// User-visible mutable variables.
    #[serde(default)]
    pub variables: HashMap<String, Value>,
}

impl ExecutionContext {
    /// Initial context for a freshly started execution.
    pub fn for_execution(execution_id: impl Into<String>) -> Self {
        let mut execution = Map::new();
        execution.insert("id".to_string(), Value::String(execution_id.into()));
        Self {
            execution,
            ..Self::default()
        }
    }

    /// Set a variable value.
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Get a variable value.
    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Get a variable rendered as a string.
    pub fn get_variable_str(&self, name: &str) -> Option<String> {
        self.variables.get(name).map(|v| match v {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => v.to_string(),
        })
    }

    /// Execution id as recorded in the `execution` slot.
    pub fn execution_id(&self) -> Option<&str> {
        self.execution.get("id").and_then(Value::as_str)
    }

    /// Record a node's output under `steps.<node_id>`.
    pub fn record_step(&mut self, node_id: impl Into<String>, output: Map<String, Value>) {
        self.steps.insert(node_id.into(), StepOutput { output });
    }
}
