//! Engine error type.

use crate::db::models::ExecutionStatus;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("execution not found: {0}")]
    ExecutionNotFound(Uuid),

    /// The terminal guard: completed/failed/stopped executions accept no
    /// further steps, so late or duplicate deliveries are dropped.
    #[error("execution {execution_id} already finished with status {status}")]
    ExecutionFinished {
        execution_id: Uuid,
        status: ExecutionStatus,
    },

    #[error("execution {execution_id} has unknown status {status}")]
    UnknownStatus { execution_id: Uuid, status: i16 },

    #[error("schema not found: {0}")]
    SchemaNotFound(i64),

    #[error("invalid schema definition: {0}")]
    InvalidDefinition(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("handler not found for node type: {0}")]
    HandlerNotFound(String),

    #[error("corrupt execution context: {0}")]
    CorruptContext(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("step transaction exceeded {0:?}")]
    Timeout(Duration),
}

impl EngineError {
    /// Transient errors warrant a redelivery; everything else is permanent
    /// and the message should be dropped after logging.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(EngineError::Timeout(Duration::from_secs(30)).is_transient());
        assert!(EngineError::Database(sqlx::Error::PoolTimedOut).is_transient());

        assert!(!EngineError::NodeNotFound("x".into()).is_transient());
        assert!(!EngineError::HandlerNotFound("y".into()).is_transient());
        assert!(!EngineError::SchemaNotFound(1).is_transient());
        assert!(!EngineError::ExecutionFinished {
            execution_id: Uuid::nil(),
            status: ExecutionStatus::Completed,
        }
        .is_transient());
    }

    #[test]
    fn display_messages() {
        let err = EngineError::NodeNotFound("node-9".into());
        assert_eq!(err.to_string(), "node not found: node-9");

        let err = EngineError::HandlerNotFound("teleport".into());
        assert_eq!(err.to_string(), "handler not found for node type: teleport");
    }
}
