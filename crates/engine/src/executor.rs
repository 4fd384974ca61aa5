//! The step-at-a-time workflow interpreter.
//!
//! One invocation executes exactly one node: load state and schema,
//! resolve the handler, invoke it, then persist the step row, the state
//! upsert and the execution-row update in a single transaction. The
//! dispatcher publishes the returned successor only after the commit, so
//! steps of one execution are strictly sequential.

use crate::db::models::{ExecutionGuard, ExecutionStatus, StepStatus};
use crate::db::queries;
use crate::error::EngineError;
use crate::graph::SchemaDefinition;
use crate::queue::ExecutionMessage;
use chrono::Utc;
use schemaflow_nodes::{node_type, ExecutionContext, HandlerRegistry, NodeResult, NodeStatus};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Deadline for one step: transaction, handler and outbound HTTP included.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(30);

/// What the dispatcher does after a committed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Successor to publish, or none when the workflow terminated.
    pub next_node_id: Option<String>,

    /// False when continuation was deferred to the timer service (sleep)
    /// or the execution terminated with this step.
    pub should_continue: bool,
}

pub struct Engine {
    pool: PgPool,
    registry: Arc<HandlerRegistry>,

    /// Per-execution step budget; cyclic graphs fail instead of looping
    /// forever.
    max_steps: i64,
}

impl Engine {
    pub fn new(pool: PgPool, registry: Arc<HandlerRegistry>, max_steps: i64) -> Self {
        Self {
            pool,
            registry,
            max_steps,
        }
    }

    /// Execute one node under the step deadline.
    pub async fn execute(&self, msg: &ExecutionMessage) -> Result<StepOutcome, EngineError> {
        match tokio::time::timeout(STEP_TIMEOUT, self.execute_step(msg)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(STEP_TIMEOUT)),
        }
    }

    async fn execute_step(&self, msg: &ExecutionMessage) -> Result<StepOutcome, EngineError> {
        tracing::info!(
            execution_id = %msg.execution_id,
            node_id = %msg.current_node_id,
            "executing node"
        );

        let mut tx = self.pool.begin().await?;

        let guard = queries::execution::lock_execution(&mut *tx, msg.execution_id)
            .await?
            .ok_or(EngineError::ExecutionNotFound(msg.execution_id))?;

        let status = ExecutionStatus::from_i16(guard.id_status).ok_or(
            EngineError::UnknownStatus {
                execution_id: msg.execution_id,
                status: guard.id_status,
            },
        )?;
        if status.is_terminal() {
            return Err(EngineError::ExecutionFinished {
                execution_id: msg.execution_id,
                status,
            });
        }

        if guard.cnt_executed_steps >= self.max_steps {
            queries::execution::update_progress(
                &mut *tx,
                msg.execution_id,
                ExecutionStatus::Failed.as_i16(),
                &msg.current_node_id,
                Some(Utc::now()),
                Some("step budget exhausted"),
                guard.cnt_executed_steps,
            )
            .await?;
            tx.commit().await?;

            tracing::warn!(
                execution_id = %msg.execution_id,
                max_steps = self.max_steps,
                "step budget exhausted, execution failed"
            );
            return Ok(StepOutcome {
                next_node_id: None,
                should_continue: false,
            });
        }

        let (mut context, state_node_id) =
            match queries::state::get_state(&mut *tx, msg.execution_id).await? {
                Some(state) => {
                    let context: ExecutionContext = serde_json::from_value(state.context)
                        .map_err(|e| EngineError::CorruptContext(e.to_string()))?;
                    (context, state.current_node_id)
                }
                None => (initial_context(msg, &guard), String::new()),
            };

        let definition = queries::schema::get_definition(&mut *tx, msg.schema_id)
            .await?
            .ok_or(EngineError::SchemaNotFound(msg.schema_id))?;
        let schema = SchemaDefinition::from_value(definition)
            .map_err(|e| EngineError::InvalidDefinition(e.to_string()))?;

        let node = schema
            .find_node(&msg.current_node_id)
            .ok_or_else(|| EngineError::NodeNotFound(msg.current_node_id.clone()))?;

        let handler = self
            .registry
            .get(&node.data.node_type)
            .ok_or_else(|| EngineError::HandlerNotFound(node.data.node_type.clone()))?;

        // The default successor is precomputed so the sleep handler can
        // embed it into the timer-service callback URL.
        let pre_next = schema.resolve_next(&msg.current_node_id, "success");

        let started_at = Utc::now();
        let result = match handler
            .execute(node, &mut context, pre_next.as_deref())
            .await
        {
            Ok(result) => result,
            Err(err) => NodeResult::failed(err.to_string()).with_exit_handle("error"),
        };
        let finished_at = Utc::now();

        // Sleep defers continuation to the timer service; a failed node
        // terminates its execution. Neither publishes a successor.
        let should_continue =
            node.data.node_type != node_type::SLEEP && !result.status.is_failed();

        let prev_node_id = (!state_node_id.is_empty() && state_node_id != msg.current_node_id)
            .then(|| state_node_id.clone());

        context.record_step(&msg.current_node_id, result.output.clone());

        let next_node_id = if node.data.node_type == node_type::END {
            None
        } else {
            schema.resolve_next(&msg.current_node_id, effective_exit_handle(&result))
        };

        let step_status = if result.status.is_failed() {
            StepStatus::Failed
        } else {
            StepStatus::Success
        };
        queries::step::insert_step(
            &mut *tx,
            msg.execution_id,
            &node.id,
            &node.data.node_type,
            prev_node_id.as_deref(),
            next_node_id.as_deref(),
            Some(&node.data.config),
            &Value::Object(result.output.clone()),
            step_status.as_i16(),
            result.error.as_deref(),
            started_at,
            finished_at,
        )
        .await?;

        let state_node = next_node_id
            .clone()
            .unwrap_or_else(|| msg.current_node_id.clone());
        let context_json = serde_json::to_value(&context)?;
        queries::state::upsert_state(
            &mut *tx,
            msg.execution_id,
            &state_node,
            &context_json,
            Utc::now(),
        )
        .await?;

        let (new_status, finishes) = transition(result.status, next_node_id.as_deref());
        queries::execution::update_progress(
            &mut *tx,
            msg.execution_id,
            new_status.as_i16(),
            &msg.current_node_id,
            finishes.then(Utc::now),
            result.error.as_deref(),
            guard.cnt_executed_steps + 1,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            execution_id = %msg.execution_id,
            node_id = %msg.current_node_id,
            status = %result.status,
            next_node_id = next_node_id.as_deref().unwrap_or(""),
            "node executed"
        );

        Ok(StepOutcome {
            next_node_id,
            should_continue,
        })
    }
}

/// Initial context for the first step of an execution: empty variables and
/// steps, execution id, owner id, and the trigger payload in the webhook
/// slot.
fn initial_context(msg: &ExecutionMessage, guard: &ExecutionGuard) -> ExecutionContext {
    let mut context = ExecutionContext::for_execution(msg.execution_id.to_string());
    context
        .user
        .insert("id".to_string(), Value::from(guard.created_by));
    context.webhook = guard.trigger_payload.clone();
    context
}

/// Exit handle to route by: the handler's choice, or the default for its
/// status.
fn effective_exit_handle(result: &NodeResult) -> &str {
    match result.exit_handle.as_deref() {
        Some(handle) if !handle.is_empty() => handle,
        _ => {
            if result.status.is_failed() {
                "error"
            } else {
                "success"
            }
        }
    }
}

/// The execution status transition table, computed from the node result
/// and the presence of a successor. The bool says whether `finished_at`
/// should be stamped.
fn transition(status: NodeStatus, next_node_id: Option<&str>) -> (ExecutionStatus, bool) {
    match status {
        NodeStatus::Failed => (ExecutionStatus::Failed, true),
        NodeStatus::Sleep => (ExecutionStatus::Paused, false),
        NodeStatus::Success => match next_node_id {
            Some(_) => (ExecutionStatus::Running, false),
            None => (ExecutionStatus::Completed, true),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use uuid::Uuid;

    fn message() -> ExecutionMessage {
        ExecutionMessage {
            execution_id: Uuid::new_v4(),
            schema_id: 1,
            current_node_id: "start".to_string(),
            debug_mode: false,
        }
    }

    #[test]
    fn transition_table() {
        assert_eq!(
            transition(NodeStatus::Success, Some("next")),
            (ExecutionStatus::Running, false)
        );
        assert_eq!(
            transition(NodeStatus::Success, None),
            (ExecutionStatus::Completed, true)
        );
        assert_eq!(
            transition(NodeStatus::Failed, Some("next")),
            (ExecutionStatus::Failed, true)
        );
        assert_eq!(
            transition(NodeStatus::Failed, None),
            (ExecutionStatus::Failed, true)
        );
        assert_eq!(
            transition(NodeStatus::Sleep, Some("next")),
            (ExecutionStatus::Paused, false)
        );
    }

    #[test]
    fn exit_handle_defaults_by_status() {
        let success = NodeResult::success(Map::new());
        assert_eq!(effective_exit_handle(&success), "success");

        let failed = NodeResult::failed("boom");
        assert_eq!(effective_exit_handle(&failed), "error");

        let routed = NodeResult::success(Map::new()).with_exit_handle("true");
        assert_eq!(effective_exit_handle(&routed), "true");

        let empty_handle = NodeResult::success(Map::new()).with_exit_handle("");
        assert_eq!(effective_exit_handle(&empty_handle), "success");
    }

    #[test]
    fn initial_context_seeds_all_slots() {
        let msg = message();
        let guard = ExecutionGuard {
            id_status: ExecutionStatus::Pending.as_i16(),
            trigger_payload: Some(json!({"order": 7})),
            created_by: 42,
            cnt_executed_steps: 0,
        };

        let context = initial_context(&msg, &guard);

        assert_eq!(
            context.execution_id(),
            Some(msg.execution_id.to_string().as_str())
        );
        assert_eq!(context.user["id"], json!(42));
        assert_eq!(context.webhook, Some(json!({"order": 7})));
        assert!(context.variables.is_empty());
        assert!(context.steps.is_empty());
    }

    #[test]
    fn initial_context_without_payload() {
        let msg = message();
        let guard = ExecutionGuard {
            id_status: 1,
            trigger_payload: None,
            created_by: 0,
            cnt_executed_steps: 0,
        };

        let context = initial_context(&msg, &guard);
        assert!(context.webhook.is_none());
    }
}
