//! Execution-step queries.

use crate::db::models::ExecutionStep;
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Append one step to the execution log.
#[allow(clippy::too_many_arguments)]
pub async fn insert_step(
    executor: impl PgExecutor<'_>,
    execution_id: Uuid,
    node_id: &str,
    node_type: &str,
    prev_node_id: Option<&str>,
    next_node_id: Option<&str>,
    input: Option<&serde_json::Value>,
    output: &serde_json::Value,
    status: i16,
    error: Option<&str>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO schemaflow.execution_steps (
            execution_id, node_id, node_type,
            prev_node_id, next_node_id,
            input, output, id_status, error,
            started_at, finished_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(execution_id)
    .bind(node_id)
    .bind(node_type)
    .bind(prev_node_id)
    .bind(next_node_id)
    .bind(input)
    .bind(output)
    .bind(status)
    .bind(error)
    .bind(started_at)
    .bind(finished_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// All steps of an execution in invocation order.
pub async fn list_steps(
    executor: impl PgExecutor<'_>,
    execution_id: Uuid,
) -> Result<Vec<ExecutionStep>, sqlx::Error> {
    sqlx::query_as::<_, ExecutionStep>(
        r#"
        SELECT id, execution_id, node_id, node_type, prev_node_id, next_node_id,
               input, output, id_status, error, started_at, finished_at
        FROM schemaflow.execution_steps
        WHERE execution_id = $1
        ORDER BY started_at ASC, id ASC
        "#,
    )
    .bind(execution_id)
    .fetch_all(executor)
    .await
}
