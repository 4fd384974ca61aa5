//! Sleep node: pauses the execution by scheduling a delayed HTTP callback
//! with the external timer service.
//!
//! The handler computes the wake-up instant, posts an `http_callback` task
//! pointing at the resume endpoint for the node's default successor, and
//! returns a sleep result. The engine then marks the execution paused and
//! the dispatcher publishes nothing; the chain resumes when the timer
//! service fires the callback.

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::node::Node;
use crate::registry::{NodeHandler, SleepSettings};
use crate::result::{output_map, NodeResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const SCHEDULER_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
const CALLBACK_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Deserialize)]
struct SleepConfig {
    #[serde(default)]
    duration: i64,
    #[serde(default)]
    unit: String,
}

/// Task request accepted by the timer service.
#[derive(Debug, Serialize)]
struct SchedulerTask {
    execute_at: String,
    task_type: &'static str,
    payload: SchedulerPayload,
    max_attempts: u32,
}

#[derive(Debug, Serialize)]
struct SchedulerPayload {
    url: String,
    method: &'static str,
    data: Value,
}

pub struct SleepHandler {
    settings: SleepSettings,
    client: reqwest::Client,
}

impl SleepHandler {
    pub fn new(settings: SleepSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SCHEDULER_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { settings, client }
    }

    /// Resume endpoint the timer service will call when it fires.
    fn callback_url(&self, execution_id: &str, next_node_id: &str) -> String {
        let mut url = format!(
            "{}/api/executions/{}/{}/continue",
            self.settings.execution_base_url, execution_id, next_node_id
        );
        if let Some(token) = &self.settings.continue_token {
            url.push_str("?token=");
            url.push_str(token);
        }
        url
    }

    fn task_for(&self, sleep_until: DateTime<Utc>, callback_url: String) -> SchedulerTask {
        SchedulerTask {
            execute_at: sleep_until.to_rfc3339(),
            task_type: "http_callback",
            payload: SchedulerPayload {
                url: callback_url,
                method: "POST",
                data: json!({}),
            },
            max_attempts: CALLBACK_MAX_ATTEMPTS,
        }
    }

    async fn schedule_wake_up(
        &self,
        sleep_until: DateTime<Utc>,
        execution_id: &str,
        next_node_id: &str,
    ) -> Result<(), String> {
        let callback_url = self.callback_url(execution_id, next_node_id);
        let task = self.task_for(sleep_until, callback_url.clone());
        let scheduler_url = format!("{}/api/v1/tasks", self.settings.scheduler_url);

        tracing::debug!(
            scheduler_url = %scheduler_url,
            callback_url = %callback_url,
            execute_at = %task.execute_at,
            "scheduling wake-up task"
        );

        let response = self
            .client
            .post(&scheduler_url)
            .json(&task)
            .send()
            .await
            .map_err(|err| format!("failed to reach scheduler: {err}"))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("scheduler returned status {status}: {body}"));
        }

        Ok(())
    }
}

#[async_trait]
impl NodeHandler for SleepHandler {
    async fn execute(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
        default_next: Option<&str>,
    ) -> Result<NodeResult, NodeError> {
        let config: SleepConfig = match serde_json::from_value(node.data.config.clone()) {
            Ok(config) => config,
            Err(err) => {
                return Ok(NodeResult::failed(format!("failed to parse sleep config: {err}")))
            }
        };

        let duration = match sleep_duration(config.duration, &config.unit) {
            Some(duration) => duration,
            None => return Ok(NodeResult::failed(format!("invalid unit: {}", config.unit))),
        };

        let next_node_id = default_next.ok_or(NodeError::MissingSuccessor)?;
        let execution_id = match ctx.execution_id() {
            Some(id) => id.to_string(),
            None => return Ok(NodeResult::failed("execution id not found in context")),
        };

        let sleep_until = Utc::now() + duration;

        if let Err(err) = self
            .schedule_wake_up(sleep_until, &execution_id, next_node_id)
            .await
        {
            return Ok(NodeResult::failed(format!(
                "failed to schedule wake up: {err}"
            )));
        }

        Ok(NodeResult::sleep(
            output_map([
                ("sleep_until", json!(sleep_until.to_rfc3339())),
                ("duration", json!(duration.num_seconds())),
            ]),
            sleep_until,
        ))
    }
}

/// Duration from config; empty unit defaults to seconds, unknown units are
/// rejected.
fn sleep_duration(duration: i64, unit: &str) -> Option<Duration> {
    match unit {
        "seconds" | "" => Some(Duration::seconds(duration)),
        "minutes" => Some(Duration::minutes(duration)),
        "hours" => Some(Duration::hours(duration)),
        _ => None,
    }
}
