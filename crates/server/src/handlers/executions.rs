//! Execution endpoints: trigger, status, steps, resume callback, stop.

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use schemaflow_engine::db::models::{Execution, ExecutionStep, TriggerType};
use schemaflow_engine::db::queries;
use schemaflow_engine::{ExecutionMessage, SchemaDefinition};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const LIST_LIMIT: i64 = 100;

/// Request body for `POST /api/executions`.
#[derive(Debug, Deserialize)]
pub struct CreateExecutionRequest {
    pub schema_id: i64,
    #[serde(default)]
    pub trigger_payload: Option<serde_json::Value>,
    /// manual, webhook, scheduler or api; defaults to api.
    #[serde(default)]
    pub trigger_type: Option<String>,
    #[serde(default)]
    pub debug_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateExecutionResponse {
    pub execution_id: Uuid,
}

/// Execution as reported by the API, with duration and step count.
#[derive(Debug, Serialize)]
pub struct ExecutionResponse {
    pub id: Uuid,
    pub schema_id: i64,
    pub status: String,
    pub current_step_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub cnt_executed_steps: i64,
    pub error: Option<String>,
}

impl From<Execution> for ExecutionResponse {
    fn from(execution: Execution) -> Self {
        let duration_ms = execution.duration_ms();
        let status = execution
            .status()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Self {
            id: execution.id,
            schema_id: execution.schema_id,
            status,
            current_step_id: execution.current_step_id,
            started_at: execution.started_at,
            finished_at: execution.finished_at,
            duration_ms,
            cnt_executed_steps: execution.cnt_executed_steps,
            error: execution.error,
        }
    }
}

/// `POST /api/executions`: trigger a new execution.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateExecutionRequest>,
) -> AppResult<(StatusCode, Json<CreateExecutionResponse>)> {
    let schema = queries::schema::get_schema(&state.pool, request.schema_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("schema {}", request.schema_id)))?;

    if !schema.is_active() {
        return Err(AppError::Validation(format!(
            "schema {} is not active",
            schema.id
        )));
    }

    let definition = SchemaDefinition::from_value(schema.definition)
        .map_err(|e| AppError::Validation(format!("invalid schema definition: {e}")))?;
    let start_node = definition
        .find_start_node()
        .ok_or_else(|| AppError::Validation("schema has no start node".to_string()))?;

    let trigger_type = match request.trigger_type.as_deref() {
        Some(value) => value
            .parse::<TriggerType>()
            .map_err(AppError::Validation)?,
        None => TriggerType::Api,
    };

    let execution_id = Uuid::new_v4();
    queries::execution::insert_execution(
        &state.pool,
        execution_id,
        schema.id,
        trigger_type.as_i16(),
        request.trigger_payload.as_ref(),
        schema.created_by,
    )
    .await?;

    state
        .publisher
        .publish(&ExecutionMessage {
            execution_id,
            schema_id: schema.id,
            current_node_id: start_node.id.clone(),
            debug_mode: request.debug_mode,
        })
        .await?;

    tracing::info!(
        execution_id = %execution_id,
        schema_id = schema.id,
        start_node = %start_node.id,
        "execution triggered"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateExecutionResponse { execution_id }),
    ))
}

/// `GET /api/executions`: recent executions.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<ExecutionResponse>>> {
    let executions = queries::execution::list_executions(&state.pool, LIST_LIMIT).await?;
    Ok(Json(executions.into_iter().map(Into::into).collect()))
}

/// `GET /api/executions/:id`.
pub async fn get(
    State(state): State<AppState>,
    Path(execution_id): Path<Uuid>,
) -> AppResult<Json<ExecutionResponse>> {
    let execution = queries::execution::get_execution(&state.pool, execution_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("execution {execution_id}")))?;

    Ok(Json(execution.into()))
}

/// `GET /api/executions/:id/steps`.
pub async fn steps(
    State(state): State<AppState>,
    Path(execution_id): Path<Uuid>,
) -> AppResult<Json<Vec<ExecutionStep>>> {
    queries::execution::get_execution(&state.pool, execution_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("execution {execution_id}")))?;

    let steps = queries::step::list_steps(&state.pool, execution_id).await?;
    Ok(Json(steps))
}

#[derive(Debug, Deserialize)]
pub struct ContinueQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// `POST /api/executions/:id/:node_id/continue`: the Timer Service's
/// resume callback. Publishes a message re-entering the engine at the
/// given node.
pub async fn continue_execution(
    State(state): State<AppState>,
    Path((execution_id, node_id)): Path<(Uuid, String)>,
    Query(query): Query<ContinueQuery>,
) -> AppResult<StatusCode> {
    if let Some(expected) = &state.continue_token {
        if query.token.as_deref() != Some(expected.as_str()) {
            return Err(AppError::Unauthorized("invalid continue token".to_string()));
        }
    }

    let execution = queries::execution::get_execution(&state.pool, execution_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("execution {execution_id}")))?;

    if let Some(status) = execution.status() {
        if status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "execution {execution_id} already {status}"
            )));
        }
    }

    state
        .publisher
        .publish(&ExecutionMessage {
            execution_id,
            schema_id: execution.schema_id,
            current_node_id: node_id.clone(),
            debug_mode: false,
        })
        .await?;

    tracing::info!(
        execution_id = %execution_id,
        node_id = %node_id,
        "execution resumed"
    );

    Ok(StatusCode::ACCEPTED)
}

/// `POST /api/executions/:id/stop`: stop a non-terminal execution.
/// Late queue deliveries are rejected by the engine's terminal guard.
pub async fn stop(
    State(state): State<AppState>,
    Path(execution_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let stopped = queries::execution::stop_execution(&state.pool, execution_id).await?;

    if !stopped {
        let execution = queries::execution::get_execution(&state.pool, execution_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("execution {execution_id}")))?;

        let status = execution
            .status()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        return Err(AppError::Conflict(format!(
            "execution {execution_id} already {status}"
        )));
    }

    tracing::info!(execution_id = %execution_id, "execution stopped");
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemaflow_engine::db::models::ExecutionStatus;
    use serde_json::json;

    #[test]
    fn create_request_defaults() {
        let request: CreateExecutionRequest =
            serde_json::from_value(json!({"schema_id": 7})).unwrap();

        assert_eq!(request.schema_id, 7);
        assert!(request.trigger_payload.is_none());
        assert!(request.trigger_type.is_none());
        assert!(!request.debug_mode);
    }

    #[test]
    fn create_request_with_payload() {
        let request: CreateExecutionRequest = serde_json::from_value(json!({
            "schema_id": 7,
            "trigger_payload": {"order": 1},
            "trigger_type": "webhook",
            "debug_mode": true
        }))
        .unwrap();

        assert_eq!(request.trigger_payload, Some(json!({"order": 1})));
        assert_eq!(request.trigger_type.as_deref(), Some("webhook"));
        assert!(request.debug_mode);
    }

    #[test]
    fn execution_response_reports_duration() {
        let started = Utc::now();
        let execution = Execution {
            id: Uuid::new_v4(),
            schema_id: 1,
            id_status: ExecutionStatus::Completed.as_i16(),
            trigger_type: TriggerType::Api.as_i16(),
            trigger_payload: None,
            current_step_id: Some("end".to_string()),
            started_at: Some(started),
            finished_at: Some(started + chrono::Duration::milliseconds(1500)),
            created_at: started,
            created_by: 1,
            cnt_executed_steps: 3,
            error: None,
        };

        let response = ExecutionResponse::from(execution);
        assert_eq!(response.status, "completed");
        assert_eq!(response.duration_ms, Some(1500));
        assert_eq!(response.cnt_executed_steps, 3);
    }
}
