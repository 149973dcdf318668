use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use integron_core::users::{SortDir, UserSortKey};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
}

#[derive(Debug, Deserialize)]
struct UsersQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
) -> ApiResult<Json<Value>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    let users = state
        .store()
        .list_users(limit, offset, UserSortKey::LastSeen, SortDir::Desc)
        .await?;
    let total = state.store().count_users().await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "count": users.len(),
            "total": total,
            "offset": offset,
            "users": users,
        }
    })))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    match state.store().get_user(&id).await? {
        Some(user) => Ok(Json(json!({
            "success": true,
            "data": { "user": user }
        }))),
        None => Err(ApiError::NotFound(format!("user `{id}` not found"))),
    }
}
