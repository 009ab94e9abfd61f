use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

use super::LinkStore;
use crate::{
    error::StoreError,
    models::{Click, Link},
};

const LINK_COLUMNS: &str =
    "id, long_url, short_code, custom_alias, created_at, click_count, analytics_token";

/// [`LinkStore`] backed by a SQLite pool. Schema comes from `migrations/`.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `database_url` and apply migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// A private in-memory database. A single connection that is never
    /// recycled, since each SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
        Ok(Self { pool })
    }
}

#[async_trait]
impl LinkStore for SqliteStore {
    async fn insert(&self, link: &Link) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO urls
                 (id, long_url, short_code, custom_alias, created_at, click_count, analytics_token)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&link.id)
        .bind(&link.long_url)
        .bind(&link.short_code)
        .bind(&link.custom_alias)
        .bind(link.created_at)
        .bind(link.click_count)
        .bind(&link.analytics_token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_short_code(&self, short_code: &str) -> Result<Option<Link>, StoreError> {
        let link: Option<Link> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM urls WHERE short_code = ?1"
        ))
        .bind(short_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    async fn get_by_analytics_token(&self, token: &str) -> Result<Option<Link>, StoreError> {
        let link: Option<Link> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM urls WHERE analytics_token = ?1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    async fn increment_click_count(&self, short_code: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE urls SET click_count = click_count + 1 WHERE short_code = ?1")
            .bind(short_code)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn record_click(&self, click: &Click) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO clicks (short_code, created_at, referrer, user_agent, ip)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&click.short_code)
        .bind(click.created_at)
        .bind(&click.referrer)
        .bind(&click.user_agent)
        .bind(&click.ip)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_clicks(&self, short_code: &str, limit: u32) -> Result<Vec<Click>, StoreError> {
        let clicks: Vec<Click> = sqlx::query_as(
            "SELECT short_code, created_at, referrer, user_agent, ip
             FROM clicks
             WHERE short_code = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2",
        )
        .bind(short_code)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(clicks)
    }
}
