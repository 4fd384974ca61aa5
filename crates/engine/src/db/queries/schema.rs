//! Schema-table queries. The engine only reads schemas.

use crate::db::models::Schema;
use sqlx::PgExecutor;

/// Get a schema by id.
pub async fn get_schema(
    executor: impl PgExecutor<'_>,
    id: i64,
) -> Result<Option<Schema>, sqlx::Error> {
    sqlx::query_as::<_, Schema>(
        r#"
        SELECT id, name, description, definition, id_status,
               created_by, created_at, updated_at
        FROM schemaflow.schemas
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Get only the definition JSON of a schema.
pub async fn get_definition(
    executor: impl PgExecutor<'_>,
    id: i64,
) -> Result<Option<serde_json::Value>, sqlx::Error> {
    let row: Option<(serde_json::Value,)> = sqlx::query_as(
        r#"
        SELECT definition FROM schemaflow.schemas WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|(definition,)| definition))
}
