//! SQLite implementation of [`MessageStore`].
//!
//! The `messages` table is created by the embedded migration in
//! `migrations/` when the store connects. Rows carry an autoincrement `seq`
//! so pages come back in insertion order. Runtime-checked `sqlx::query` forms
//! are used so no `DATABASE_URL` is needed at compile time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;

use super::MessageStore;
use crate::error::RelayError;
use crate::message::{Message, NewMessage, Page};

type MessageRow = (String, String, String, String, Option<String>);

/// sqlx-backed store; cloning shares the pool.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `url` and run pending migrations.
    ///
    /// `url` is a sqlx SQLite URL such as `"sqlite://relay.db"`. With
    /// `"sqlite::memory:"` all pooled connections share one database, which
    /// is gone once the last connection closes (including idle reaping).
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, RelayError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

fn push_user_filter<'a>(qb: &mut QueryBuilder<'a, Sqlite>, user_ids: &'a [String]) {
    if user_ids.is_empty() {
        return;
    }
    qb.push(" WHERE user_id IN (");
    let mut ids = qb.separated(", ");
    for id in user_ids {
        ids.push_bind(id.as_str());
    }
    ids.push_unseparated(")");
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RelayError> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| RelayError::Persistence(format!("invalid stored timestamp {}: {}", raw, e)))
}

fn row_to_message((id, user_id, message, created_at, updated_at): MessageRow) -> Result<Message, RelayError> {
    Ok(Message {
        id,
        created_at: parse_timestamp(&created_at)?,
        updated_at: updated_at.as_deref().map(parse_timestamp).transpose()?,
        user_id,
        message,
    })
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn insert(&self, msg: NewMessage) -> Result<Message, RelayError> {
        let stored = msg.into_message(uuid::Uuid::new_v4().to_string(), Utc::now());
        sqlx::query(
            "INSERT INTO messages (id, user_id, message, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, NULL)",
        )
        .bind(&stored.id)
        .bind(&stored.user_id)
        .bind(&stored.message)
        .bind(stored.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn find_by_user(
        &self,
        offset: u64,
        limit: u64,
        user_ids: &[String],
    ) -> Result<Page, RelayError> {
        // One read transaction so the count and the page see the same rows.
        let mut tx = self.pool.begin().await?;

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM messages");
        push_user_filter(&mut count, user_ids);
        let total: i64 = count.build_query_scalar().fetch_one(&mut *tx).await?;

        let mut select = QueryBuilder::<Sqlite>::new(
            "SELECT id, user_id, message, created_at, updated_at FROM messages",
        );
        push_user_filter(&mut select, user_ids);
        select.push(" ORDER BY seq ASC LIMIT ");
        select.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        select.push(" OFFSET ");
        select.push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
        let rows: Vec<MessageRow> = select.build_query_as().fetch_all(&mut *tx).await?;
        tx.commit().await?;

        let messages = rows
            .into_iter()
            .map(row_to_message)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            messages,
            total_count: u64::try_from(total).unwrap_or(0),
        })
    }
}
