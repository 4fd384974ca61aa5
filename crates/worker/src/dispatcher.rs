//! Step dispatcher: the per-message contract of the worker.

use crate::subscriber::QueueSubscriber;
use anyhow::Result;
use schemaflow_engine::{Engine, ExecutionMessage, QueuePublisher};
use std::time::Duration;

/// Idle poll interval when the queue is empty.
const IDLE_WAIT: Duration = Duration::from_millis(100);

/// Backoff after a subscriber error.
const ERROR_WAIT: Duration = Duration::from_secs(1);

pub struct Dispatcher {
    subscriber: QueueSubscriber,
    publisher: QueuePublisher,
    engine: Engine,
}

impl Dispatcher {
    pub fn new(subscriber: QueueSubscriber, publisher: QueuePublisher, engine: Engine) -> Self {
        Self {
            subscriber,
            publisher,
            engine,
        }
    }

    /// Run the dispatch loop. Deliveries are handled strictly one at a
    /// time; the next fetch happens only after the current step committed
    /// and its successor was published.
    pub async fn run(&self) -> Result<()> {
        tracing::info!("worker started, waiting for messages");

        loop {
            match self.subscriber.receive().await {
                Ok(Some(message)) => self.handle_delivery(message).await,
                Ok(None) => tokio::time::sleep(IDLE_WAIT).await,
                Err(err) => {
                    tracing::warn!(error = %err, "queue receive failed");
                    tokio::time::sleep(ERROR_WAIT).await;
                }
            }
        }
    }

    async fn handle_delivery(&self, message: async_nats::jetstream::Message) {
        let msg: ExecutionMessage = match serde_json::from_slice(&message.payload) {
            Ok(msg) => msg,
            Err(err) => {
                tracing::error!(error = %err, "malformed execution message, dropping");
                self.finalize(&message, Disposition::Drop).await;
                return;
            }
        };

        match self.engine.execute(&msg).await {
            Ok(outcome) => {
                if outcome.should_continue {
                    if let Some(next_node_id) = &outcome.next_node_id {
                        let next = msg.successor(next_node_id.clone());
                        if let Err(err) = self.publisher.publish(&next).await {
                            // Without the successor the chain stalls;
                            // redeliver and let the replayed step publish it.
                            tracing::error!(
                                execution_id = %msg.execution_id,
                                next_node_id = %next_node_id,
                                error = %err,
                                "failed to publish successor, requeueing"
                            );
                            self.finalize(&message, Disposition::Retry).await;
                            return;
                        }
                    }
                }
                self.finalize(&message, Disposition::Ack).await;
            }
            Err(err) if err.is_transient() => {
                tracing::warn!(
                    execution_id = %msg.execution_id,
                    node_id = %msg.current_node_id,
                    error = %err,
                    "transient engine error, requeueing"
                );
                self.finalize(&message, Disposition::Retry).await;
            }
            Err(err) => {
                tracing::error!(
                    execution_id = %msg.execution_id,
                    node_id = %msg.current_node_id,
                    error = %err,
                    "permanent engine error, dropping message"
                );
                self.finalize(&message, Disposition::Drop).await;
            }
        }
    }

    async fn finalize(&self, message: &async_nats::jetstream::Message, disposition: Disposition) {
        let result = match disposition {
            Disposition::Ack => self.subscriber.ack(message).await,
            Disposition::Retry => self.subscriber.nack(message).await,
            Disposition::Drop => self.subscriber.term(message).await,
        };

        if let Err(err) = result {
            // The broker will redeliver after the ack deadline; replayed
            // steps are tolerated.
            tracing::warn!(error = %err, "message acknowledgement failed");
        }
    }
}

enum Disposition {
    Ack,
    Retry,
    Drop,
}
