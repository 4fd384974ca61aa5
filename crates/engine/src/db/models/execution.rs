//! Execution row model and status/trigger enumerations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle status of an execution, stored as a small integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Stopped,
}

impl ExecutionStatus {
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Pending),
            2 => Some(Self::Running),
            3 => Some(Self::Paused),
            4 => Some(Self::Completed),
            5 => Some(Self::Failed),
            6 => Some(Self::Stopped),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> i16 {
        match self {
            Self::Pending => 1,
            Self::Running => 2,
            Self::Paused => 3,
            Self::Completed => 4,
            Self::Failed => 5,
            Self::Stopped => 6,
        }
    }

    /// Terminal executions accept no further steps.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Stopped)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

/// How an execution was started, stored as a small integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Manual,
    Webhook,
    Scheduler,
    Api,
}

impl TriggerType {
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Manual),
            2 => Some(Self::Webhook),
            3 => Some(Self::Scheduler),
            4 => Some(Self::Api),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> i16 {
        match self {
            Self::Manual => 1,
            Self::Webhook => 2,
            Self::Scheduler => 3,
            Self::Api => 4,
        }
    }
}

impl std::str::FromStr for TriggerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "webhook" => Ok(Self::Webhook),
            "scheduler" => Ok(Self::Scheduler),
            "api" => Ok(Self::Api),
            other => Err(format!("unknown trigger type: {other}")),
        }
    }
}

/// One workflow run.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    pub schema_id: i64,
    pub id_status: i16,
    pub trigger_type: i16,
    pub trigger_payload: Option<serde_json::Value>,
    /// Node most recently scheduled.
    pub current_step_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: i64,
    pub cnt_executed_steps: i64,
    pub error: Option<String>,
}

impl Execution {
    pub fn status(&self) -> Option<ExecutionStatus> {
        ExecutionStatus::from_i16(self.id_status)
    }

    /// Wall-clock duration in milliseconds, when both endpoints are known.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}

/// The subset of the execution row the engine locks per step.
#[derive(Debug, Clone, FromRow)]
pub struct ExecutionGuard {
    pub id_status: i16,
    pub trigger_payload: Option<serde_json::Value>,
    pub created_by: i64,
    pub cnt_executed_steps: i64,
}
