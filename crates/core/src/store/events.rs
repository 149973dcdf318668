use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::events::types::EventType;

/// One row of the durable event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub user_id: Option<String>,
    pub data: Option<Value>,
    pub created_at: DateTime<Utc>,
}

pub(super) async fn insert<'e, E>(
    executor: E,
    kind: EventType,
    user_id: Option<&str>,
    data: &Value,
    now: DateTime<Utc>,
) -> sqlx::Result<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query("INSERT INTO events (type, user_id, data, created_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(kind)
        .bind(user_id)
        .bind(Json(data))
        .bind(now)
        .execute(executor)
        .await?;
    Ok(())
}

pub(super) async fn query(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
    types: &[EventType],
) -> sqlx::Result<Vec<EventRecord>> {
    if types.is_empty() {
        return sqlx::query_as::<_, EventRecord>(
            "SELECT * FROM events ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )
        .bind(limit)
        .bind(offset.max(0))
        .fetch_all(pool)
        .await;
    }

    let sql = format!(
        "SELECT * FROM events WHERE type IN ({}) ORDER BY created_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
        placeholders(types.len()),
        types.len() + 1,
        types.len() + 2,
    );
    let mut query = sqlx::query_as::<_, EventRecord>(&sql);
    for kind in types {
        query = query.bind(*kind);
    }
    query
        .bind(limit)
        .bind(offset.max(0))
        .fetch_all(pool)
        .await
}

pub(super) async fn count(pool: &SqlitePool, types: &[EventType]) -> sqlx::Result<i64> {
    let (count,): (i64,) = if types.is_empty() {
        sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(pool)
            .await?
    } else {
        let sql = format!(
            "SELECT COUNT(*) FROM events WHERE type IN ({})",
            placeholders(types.len())
        );
        let mut query = sqlx::query_as(&sql);
        for kind in types {
            query = query.bind(*kind);
        }
        query.fetch_one(pool).await?
    };
    Ok(count)
}

fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}
