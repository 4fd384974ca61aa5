//! JetStream subscriber for the work queue.
//!
//! Fetches one message at a time on a durable consumer so work spreads
//! evenly across worker replicas and at most one step per worker is in
//! flight.

use anyhow::Result;
use async_nats::jetstream::{
    self, consumer::pull::Config as ConsumerConfig, consumer::Consumer, AckKind, Context, Message,
};
use futures::StreamExt;
use schemaflow_engine::queue;

pub struct QueueSubscriber {
    js: Context,
    stream: String,
    consumer: String,
    subject: String,
}

impl QueueSubscriber {
    /// Connect to NATS and ensure the work-queue stream exists.
    pub async fn connect(nats_url: &str, stream: &str, consumer: &str) -> Result<Self> {
        let client = async_nats::connect(nats_url).await?;
        let js = jetstream::new(client);

        queue::ensure_stream(&js, stream, queue::DEFAULT_SUBJECT).await?;

        Ok(Self {
            js,
            stream: stream.to_string(),
            consumer: consumer.to_string(),
            subject: queue::DEFAULT_SUBJECT.to_string(),
        })
    }

    /// Create or get the durable consumer.
    async fn ensure_consumer(&self) -> Result<Consumer<ConsumerConfig>> {
        let stream = self.js.get_stream(&self.stream).await?;

        match stream.get_consumer(&self.consumer).await {
            Ok(consumer) => Ok(consumer),
            Err(_) => {
                let config = ConsumerConfig {
                    durable_name: Some(self.consumer.clone()),
                    filter_subject: self.subject.clone(),
                    max_ack_pending: 1,
                    ..Default::default()
                };
                let consumer = stream.create_consumer(config).await?;
                tracing::info!(consumer = %self.consumer, "created work-queue consumer");
                Ok(consumer)
            }
        }
    }

    /// Receive the next execution message, or `None` when the queue is
    /// idle.
    pub async fn receive(&self) -> Result<Option<Message>> {
        let consumer = self.ensure_consumer().await?;

        let mut messages = consumer.fetch().max_messages(1).messages().await?;
        if let Some(message) = messages.next().await {
            let message =
                message.map_err(|e| anyhow::anyhow!("failed to receive message: {e}"))?;
            return Ok(Some(message));
        }

        Ok(None)
    }

    /// Acknowledge a processed message.
    pub async fn ack(&self, message: &Message) -> Result<()> {
        message
            .ack()
            .await
            .map_err(|e| anyhow::anyhow!("failed to ack message: {e}"))
    }

    /// Negative acknowledgement: the message will be redelivered.
    pub async fn nack(&self, message: &Message) -> Result<()> {
        message
            .ack_with(AckKind::Nak(None))
            .await
            .map_err(|e| anyhow::anyhow!("failed to nack message: {e}"))
    }

    /// Terminate a message: dropped without redelivery.
    pub async fn term(&self, message: &Message) -> Result<()> {
        message
            .ack_with(AckKind::Term)
            .await
            .map_err(|e| anyhow::anyhow!("failed to terminate message: {e}"))
    }
}
