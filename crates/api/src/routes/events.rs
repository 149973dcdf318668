use std::collections::HashSet;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use integron_core::events::pipeline::IncomingEvent;
use integron_core::events::testing::{sample_payload, sample_user};
use integron_core::events::types::{EventPayload, EventType};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 200;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events))
        .route("/test/event", post(fire_test_event))
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    limit: Option<usize>,
    /// Comma-separated event type filter. Unknown names match nothing.
    #[serde(rename = "type")]
    type_filter: Option<String>,
}

/// Recent events straight from the ring buffer, no database round trip.
async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Json<Value>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let mut events = state.buffer().recent(limit);

    if let Some(filter) = &query.type_filter {
        let wanted: HashSet<&str> = filter.split(',').map(str::trim).collect();
        events.retain(|event| wanted.contains(event.kind().as_str()));
    }

    Ok(Json(json!({
        "success": true,
        "data": {
            "count": events.len(),
            "events": events,
        }
    })))
}

#[derive(Debug, Deserialize)]
struct TestEventBody {
    #[serde(rename = "type")]
    kind: EventType,
    data: Option<Value>,
}

/// Fabricate an event and run it through the full pipeline, for overlay
/// testing without a live stream.
async fn fire_test_event(
    State(state): State<AppState>,
    Json(body): Json<TestEventBody>,
) -> ApiResult<Json<Value>> {
    let payload: EventPayload = match body.data {
        Some(data) => serde_json::from_value(json!({ "type": body.kind, "data": data }))
            .map_err(|e| ApiError::BadRequest(format!("payload does not match type: {e}")))?,
        None => sample_payload(body.kind),
    };

    state
        .ingest()
        .send(IncomingEvent {
            user: sample_user(),
            payload,
        })
        .await;

    Ok(Json(json!({ "success": true })))
}
