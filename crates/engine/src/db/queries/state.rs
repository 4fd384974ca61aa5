//! Execution-state queries.

use crate::db::models::ExecutionStateRow;
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Load the state row for an execution. Absent on the first step.
pub async fn get_state(
    executor: impl PgExecutor<'_>,
    execution_id: Uuid,
) -> Result<Option<ExecutionStateRow>, sqlx::Error> {
    sqlx::query_as::<_, ExecutionStateRow>(
        r#"
        SELECT execution_id, current_node_id, context, updated_at
        FROM schemaflow.execution_state
        WHERE execution_id = $1
        "#,
    )
    .bind(execution_id)
    .fetch_optional(executor)
    .await
}

/// Upsert the state row for an execution.
pub async fn upsert_state(
    executor: impl PgExecutor<'_>,
    execution_id: Uuid,
    current_node_id: &str,
    context: &serde_json::Value,
    updated_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO schemaflow.execution_state (execution_id, current_node_id, context, updated_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (execution_id) DO UPDATE SET
            current_node_id = EXCLUDED.current_node_id,
            context = EXCLUDED.context,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(execution_id)
    .bind(current_node_id)
    .bind(context)
    .bind(updated_at)
    .execute(executor)
    .await?;

    Ok(())
}
