//! Health check handler.

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use schemaflow_engine::db;
use serde_json::{json, Value};

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = if db::health_check(&state.pool).await {
        "up"
    } else {
        "down"
    };

    Json(json!({
        "status": "ok",
        "database": database,
    }))
}
