//! Execution-state row model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The volatile interpreter state of one execution. Exactly one row per
/// execution, upserted on every step.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExecutionStateRow {
    pub execution_id: Uuid,

    /// The node to execute next, or the last one executed on terminal
    /// transitions.
    pub current_node_id: String,

    /// Serialized [`schemaflow_nodes::ExecutionContext`].
    pub context: serde_json::Value,

    pub updated_at: DateTime<Utc>,
}
