//! Worker configuration.

use anyhow::{Context, Result};
use schemaflow_engine::queue;

/// Default per-execution step budget.
const DEFAULT_MAX_STEPS: i64 = 10_000;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Postgres DSN.
    pub database_url: String,

    /// NATS server URL.
    pub nats_url: String,

    /// Work-queue stream name.
    pub nats_stream: String,

    /// Durable consumer name.
    pub nats_consumer: String,

    /// Timer Service base URL.
    pub at_scheduler_url: String,

    /// Base URL the Timer Service calls back into.
    pub url_execution: String,

    /// Shared secret for resume callbacks, when configured.
    pub continue_token: Option<String>,

    /// Per-execution step budget.
    pub max_steps: i64,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;

        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let nats_stream = std::env::var("NATS_STREAM")
            .unwrap_or_else(|_| queue::DEFAULT_STREAM.to_string());

        let nats_consumer = std::env::var("NATS_CONSUMER")
            .unwrap_or_else(|_| "schemaflow-worker".to_string());

        let at_scheduler_url = std::env::var("AT_SCHEDULER_URL")
            .unwrap_or_else(|_| "http://localhost:8090".to_string());

        let url_execution = std::env::var("URL_EXECUTION")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let continue_token = std::env::var("CONTINUE_TOKEN").ok().filter(|t| !t.is_empty());

        let max_steps: i64 = std::env::var("MAX_EXECUTED_STEPS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_STEPS);

        Ok(Self {
            database_url,
            nats_url,
            nats_stream,
            nats_consumer,
            at_scheduler_url,
            url_execution,
            continue_token,
            max_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_step_budget() {
        assert_eq!(DEFAULT_MAX_STEPS, 10_000);
    }
}
