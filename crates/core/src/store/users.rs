use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::events::types::{EventPayload, EventUser};
use crate::users::{SortDir, User, UserSortKey};

pub(super) async fn upsert<'e, E>(
    executor: E,
    user: &EventUser,
    profile_image_url: Option<&str>,
    now: DateTime<Utc>,
) -> sqlx::Result<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO users (id, username, display_name, profile_image_url, first_seen, last_seen)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        ON CONFLICT(id) DO UPDATE SET
            username = excluded.username,
            display_name = excluded.display_name,
            last_seen = excluded.last_seen,
            profile_image_url = COALESCE(excluded.profile_image_url, users.profile_image_url)
        "#,
    )
    .bind(&user.user_id)
    .bind(&user.username)
    .bind(&user.display_name)
    .bind(profile_image_url)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// Counter increments happen in SQL so they are atomic per user even when
/// events for the same user land back to back.
pub(super) async fn apply_stats<'e, E>(
    executor: E,
    user_id: &str,
    payload: &EventPayload,
) -> sqlx::Result<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    match payload {
        EventPayload::Chat(_) => {
            sqlx::query("UPDATE users SET message_count = message_count + 1 WHERE id = ?1")
                .bind(user_id)
                .execute(executor)
                .await?;
        }
        EventPayload::Bits(data) => {
            sqlx::query("UPDATE users SET bits_total = bits_total + ?2 WHERE id = ?1")
                .bind(user_id)
                .bind(data.amount)
                .execute(executor)
                .await?;
        }
        EventPayload::Sub(_) | EventPayload::Resub(_) => {
            sqlx::query("UPDATE users SET sub_months = sub_months + 1 WHERE id = ?1")
                .bind(user_id)
                .execute(executor)
                .await?;
        }
        EventPayload::GiftSub(data) => {
            sqlx::query("UPDATE users SET sub_months = sub_months + ?2 WHERE id = ?1")
                .bind(user_id)
                .bind(data.amount)
                .execute(executor)
                .await?;
        }
        _ => {}
    }
    Ok(())
}

pub(super) async fn profile_image(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT profile_image_url FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(url,)| url))
}

pub(super) async fn set_profile_image(
    pool: &SqlitePool,
    user_id: &str,
    url: &str,
) -> sqlx::Result<bool> {
    let result = sqlx::query("UPDATE users SET profile_image_url = ?2 WHERE id = ?1")
        .bind(user_id)
        .bind(url)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(super) async fn get(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub(super) async fn list(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
    sort: UserSortKey,
    dir: SortDir,
) -> sqlx::Result<Vec<User>> {
    // Sort column and direction come from closed enums, not user input.
    let sql = format!(
        "SELECT * FROM users ORDER BY {} {} LIMIT ?1 OFFSET ?2",
        sort.column(),
        dir.sql()
    );
    sqlx::query_as::<_, User>(&sql)
        .bind(limit)
        .bind(offset.max(0))
        .fetch_all(pool)
        .await
}

pub(super) async fn count(pool: &SqlitePool) -> sqlx::Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
