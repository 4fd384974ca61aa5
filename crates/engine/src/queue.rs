//! Work-queue message and JetStream publisher.
//!
//! The durable work queue is a JetStream stream with work-queue retention:
//! messages survive broker restarts and are removed once acknowledged.
//! Each message schedules exactly one node invocation.

use async_nats::jetstream::{self, Context};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stream backing the work queue.
pub const DEFAULT_STREAM: &str = "schema_execution_queue";

/// Subject execution messages are published to.
pub const DEFAULT_SUBJECT: &str = "schemaflow.executions";

/// Errors from queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue connection error: {0}")]
    Connection(String),

    #[error("jetstream error: {0}")]
    JetStream(String),

    #[error("publish error: {0}")]
    Publish(String),
}

/// One work item: execute `current_node_id` of `schema_id` within the
/// given execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionMessage {
    pub execution_id: Uuid,
    pub schema_id: i64,
    pub current_node_id: String,
    #[serde(default)]
    pub debug_mode: bool,
}

impl ExecutionMessage {
    /// The follow-up message for the next node of the same execution.
    pub fn successor(&self, next_node_id: impl Into<String>) -> Self {
        Self {
            execution_id: self.execution_id,
            schema_id: self.schema_id,
            current_node_id: next_node_id.into(),
            debug_mode: self.debug_mode,
        }
    }
}

/// Ensure the work-queue stream exists.
pub async fn ensure_stream(js: &Context, stream: &str, subject: &str) -> Result<(), QueueError> {
    match js.get_stream(stream).await {
        Ok(_) => {
            tracing::debug!(stream = %stream, "using existing work-queue stream");
            Ok(())
        }
        Err(_) => {
            let config = jetstream::stream::Config {
                name: stream.to_string(),
                subjects: vec![subject.to_string()],
                retention: jetstream::stream::RetentionPolicy::WorkQueue,
                storage: jetstream::stream::StorageType::File,
                ..Default::default()
            };

            js.create_stream(config)
                .await
                .map_err(|e| QueueError::JetStream(e.to_string()))?;

            tracing::info!(stream = %stream, subject = %subject, "created work-queue stream");
            Ok(())
        }
    }
}

/// JetStream publisher for execution messages.
#[derive(Clone)]
pub struct QueuePublisher {
    js: Context,
    subject: String,
}

impl QueuePublisher {
    /// Connect to NATS and ensure the stream exists.
    pub async fn connect(
        nats_url: &str,
        stream: Option<&str>,
        subject: Option<&str>,
    ) -> Result<Self, QueueError> {
        let client = async_nats::connect(nats_url)
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;

        Self::new(client, stream, subject).await
    }

    /// Build a publisher on an existing client.
    pub async fn new(
        client: async_nats::Client,
        stream: Option<&str>,
        subject: Option<&str>,
    ) -> Result<Self, QueueError> {
        let stream = stream.unwrap_or(DEFAULT_STREAM);
        let subject = subject.unwrap_or(DEFAULT_SUBJECT).to_string();

        let js = jetstream::new(client);
        ensure_stream(&js, stream, &subject).await?;

        Ok(Self { js, subject })
    }

    /// Publish an execution message, awaiting broker acknowledgement.
    pub async fn publish(&self, message: &ExecutionMessage) -> Result<(), QueueError> {
        let payload =
            serde_json::to_vec(message).map_err(|e| QueueError::Publish(e.to_string()))?;

        self.js
            .publish(self.subject.clone(), payload.into())
            .await
            .map_err(|e| QueueError::Publish(e.to_string()))?
            .await
            .map_err(|e| QueueError::Publish(e.to_string()))?;

        tracing::debug!(
            execution_id = %message.execution_id,
            node_id = %message.current_node_id,
            "published execution message"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_round_trip() {
        let message = ExecutionMessage {
            execution_id: Uuid::new_v4(),
            schema_id: 42,
            current_node_id: "node-1".to_string(),
            debug_mode: true,
        };

        let json = serde_json::to_string(&message).unwrap();
        let parsed: ExecutionMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn execution_id_serializes_as_string() {
        let message = ExecutionMessage {
            execution_id: Uuid::nil(),
            schema_id: 1,
            current_node_id: "n".to_string(),
            debug_mode: false,
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["execution_id"], "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn debug_mode_defaults_to_false() {
        let json = r#"{
            "execution_id": "00000000-0000-0000-0000-000000000001",
            "schema_id": 7,
            "current_node_id": "start"
        }"#;

        let message: ExecutionMessage = serde_json::from_str(json).unwrap();
        assert!(!message.debug_mode);
    }

    #[test]
    fn successor_keeps_execution_and_debug_flag() {
        let message = ExecutionMessage {
            execution_id: Uuid::new_v4(),
            schema_id: 3,
            current_node_id: "a".to_string(),
            debug_mode: true,
        };

        let next = message.successor("b");
        assert_eq!(next.execution_id, message.execution_id);
        assert_eq!(next.schema_id, 3);
        assert_eq!(next.current_node_id, "b");
        assert!(next.debug_mode);
    }

    #[test]
    fn default_constants() {
        assert_eq!(DEFAULT_STREAM, "schema_execution_queue");
        assert_eq!(DEFAULT_SUBJECT, "schemaflow.executions");
    }
}
