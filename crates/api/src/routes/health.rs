use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

/// Liveness and health routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status))
}

/// Full health check — verifies database connectivity and reports the
/// gateway and session state.
async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    sqlx::query("SELECT 1")
        .execute(state.store().pool())
        .await
        .map_err(|e| {
            crate::error::ApiError::Internal(format!("database health check failed: {e}"))
        })?;

    Ok(Json(json!({
        "status": "ok",
        "database": "connected",
        "connections": state.gateway().connection_count(),
        "subscribers": state.bus().event_subscriber_count(),
        "session": state.session().status(),
    })))
}

/// Lightweight liveness probe for overlay clients.
async fn status() -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "running",
        "timestamp": Utc::now(),
    }))
}
