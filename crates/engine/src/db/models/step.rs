//! Execution-step row model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Outcome of a step, stored as a small integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Success),
            2 => Some(Self::Failed),
            3 => Some(Self::Skipped),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> i16 {
        match self {
            Self::Success => 1,
            Self::Failed => 2,
            Self::Skipped => 3,
        }
    }
}

/// One node invocation, append-only.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub id: i64,
    pub execution_id: Uuid,
    pub node_id: String,
    pub node_type: String,
    pub prev_node_id: Option<String>,
    pub next_node_id: Option<String>,
    pub input: Option<serde_json::Value>,
    pub output: Option<serde_json::Value>,
    pub id_status: i16,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for status in [StepStatus::Success, StepStatus::Failed, StepStatus::Skipped] {
            assert_eq!(StepStatus::from_i16(status.as_i16()), Some(status));
        }
        assert_eq!(StepStatus::from_i16(4), None);
    }
}
