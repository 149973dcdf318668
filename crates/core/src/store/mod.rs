//! Persistence gateway over SQLite. The rest of the system only sees the
//! insert/update/query contract here; schema lives in `/migrations`.

pub mod backup;
mod events;
mod settings;
mod users;

pub use events::EventRecord;

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::events::types::{EventPayload, EventType, EventUser};
use crate::users::{SortDir, User, UserSortKey};

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone)]
pub struct EventStore {
    pool: SqlitePool,
}

impl EventStore {
    /// Wrap an already-connected pool. Migrations are the caller's concern.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) a database file in WAL mode and bring the
    /// schema up to date.
    pub async fn open(path: &Path, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        MIGRATOR.run(&pool).await?;
        Ok(Self { pool })
    }

    /// Fresh in-memory database, for tests. Single connection: every
    /// connection of an in-memory pool would otherwise get its own empty
    /// database.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        MIGRATOR.run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// All per-event writes in one transaction: user upsert, counter
    /// increments, and (for persistent kinds) the durable log insert.
    /// Either the whole event lands or none of it does.
    pub async fn record_event(
        &self,
        user: &EventUser,
        payload: &EventPayload,
        profile_image_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> sqlx::Result<()> {
        let mut tx = self.pool.begin().await?;
        users::upsert(&mut *tx, user, profile_image_url, now).await?;
        users::apply_stats(&mut *tx, &user.user_id, payload).await?;
        let kind = payload.kind();
        if kind.is_persistent() {
            events::insert(&mut *tx, kind, Some(&user.user_id), &payload.data_value(), now).await?;
        }
        tx.commit().await
    }

    /// Insert-or-update a user row. Idempotent: concurrent first events for
    /// the same user yield exactly one row. An already-cached profile image
    /// is never overwritten with nothing.
    pub async fn upsert_user(
        &self,
        user: &EventUser,
        profile_image_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> sqlx::Result<()> {
        users::upsert(&self.pool, user, profile_image_url, now).await
    }

    pub async fn apply_stats(&self, user_id: &str, payload: &EventPayload) -> sqlx::Result<()> {
        users::apply_stats(&self.pool, user_id, payload).await
    }

    pub async fn profile_image(&self, user_id: &str) -> sqlx::Result<Option<String>> {
        users::profile_image(&self.pool, user_id).await
    }

    pub async fn set_profile_image(&self, user_id: &str, url: &str) -> sqlx::Result<bool> {
        users::set_profile_image(&self.pool, user_id, url).await
    }

    pub async fn get_user(&self, user_id: &str) -> sqlx::Result<Option<User>> {
        users::get(&self.pool, user_id).await
    }

    /// Operator action: remove a user and their durable events.
    pub async fn delete_user(&self, user_id: &str) -> sqlx::Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM events WHERE user_id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;
        tx.commit().await?;
        Ok(deleted)
    }

    pub async fn list_users(
        &self,
        limit: i64,
        offset: i64,
        sort: UserSortKey,
        dir: SortDir,
    ) -> sqlx::Result<Vec<User>> {
        users::list(&self.pool, limit, offset, sort, dir).await
    }

    pub async fn count_users(&self) -> sqlx::Result<i64> {
        users::count(&self.pool).await
    }

    /// Page-based user listing. Pages are 1-indexed.
    pub async fn query_users(
        &self,
        page: i64,
        limit: i64,
        sort: UserSortKey,
        dir: SortDir,
    ) -> sqlx::Result<(Vec<User>, i64)> {
        let offset = (page.max(1) - 1) * limit;
        let rows = users::list(&self.pool, limit, offset, sort, dir).await?;
        let total = users::count(&self.pool).await?;
        Ok((rows, total))
    }

    pub async fn insert_event(
        &self,
        kind: EventType,
        user_id: Option<&str>,
        data: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> sqlx::Result<()> {
        events::insert(&self.pool, kind, user_id, data, now).await
    }

    /// Page-based durable event listing, newest first, optionally filtered
    /// by kind. Pages are 1-indexed.
    pub async fn query_events(
        &self,
        page: i64,
        limit: i64,
        types: &[EventType],
    ) -> sqlx::Result<(Vec<EventRecord>, i64)> {
        let offset = (page.max(1) - 1) * limit;
        let rows = events::query(&self.pool, limit, offset, types).await?;
        let total = events::count(&self.pool, types).await?;
        Ok((rows, total))
    }

    pub async fn get_setting(&self, key: &str) -> sqlx::Result<Option<String>> {
        settings::get(&self.pool, key).await
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> sqlx::Result<()> {
        settings::set(&self.pool, key, value).await
    }
}
