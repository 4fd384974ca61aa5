//! Execution-table queries.

use crate::db::models::{Execution, ExecutionGuard};
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Insert a freshly triggered execution (status pending).
#[allow(clippy::too_many_arguments)]
pub async fn insert_execution(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    schema_id: i64,
    trigger_type: i16,
    trigger_payload: Option<&serde_json::Value>,
    created_by: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO schemaflow.executions (
            id, schema_id, id_status, trigger_type, trigger_payload,
            started_at, created_at, created_by, cnt_executed_steps
        )
        VALUES ($1, $2, 1, $3, $4, $5, $5, $6, 0)
        "#,
    )
    .bind(id)
    .bind(schema_id)
    .bind(trigger_type)
    .bind(trigger_payload)
    .bind(Utc::now())
    .bind(created_by)
    .execute(executor)
    .await?;

    Ok(())
}

/// Get an execution by id.
pub async fn get_execution(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<Execution>, sqlx::Error> {
    sqlx::query_as::<_, Execution>(
        r#"
        SELECT id, schema_id, id_status, trigger_type, trigger_payload,
               current_step_id, started_at, finished_at, created_at,
               created_by, cnt_executed_steps, error
        FROM schemaflow.executions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// List recent executions, newest first.
pub async fn list_executions(
    executor: impl PgExecutor<'_>,
    limit: i64,
) -> Result<Vec<Execution>, sqlx::Error> {
    sqlx::query_as::<_, Execution>(
        r#"
        SELECT id, schema_id, id_status, trigger_type, trigger_payload,
               current_step_id, started_at, finished_at, created_at,
               created_by, cnt_executed_steps, error
        FROM schemaflow.executions
        ORDER BY created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(executor)
    .await
}

/// Lock the execution row for the duration of the step transaction and
/// return the fields the engine needs.
pub async fn lock_execution(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<ExecutionGuard>, sqlx::Error> {
    sqlx::query_as::<_, ExecutionGuard>(
        r#"
        SELECT id_status, trigger_payload, created_by, cnt_executed_steps
        FROM schemaflow.executions
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Apply the per-step execution-row update: status, current step, step
/// counter, and the error/finished columns. `finished_at` only ever moves
/// from null to a value.
pub async fn update_progress(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    status: i16,
    current_step_id: &str,
    finished_at: Option<DateTime<Utc>>,
    error: Option<&str>,
    cnt_executed_steps: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE schemaflow.executions
        SET id_status = $2,
            current_step_id = $3,
            finished_at = COALESCE($4, finished_at),
            error = $5,
            cnt_executed_steps = $6
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(current_step_id)
    .bind(finished_at)
    .bind(error)
    .bind(cnt_executed_steps)
    .execute(executor)
    .await?;

    Ok(())
}

/// Stop a non-terminal execution. Returns true if a row was updated.
pub async fn stop_execution(executor: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE schemaflow.executions
        SET id_status = 6, finished_at = $2
        WHERE id = $1 AND id_status NOT IN (4, 5, 6)
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
