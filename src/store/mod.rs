//! Persistence for link records and click events.
//!
//! Handlers never talk to a database directly; they receive an
//! `Arc<dyn LinkStore>` through [`AppState`](crate::AppState), so tests can
//! swap in [`MemoryStore`].

use async_trait::async_trait;

use crate::{
    error::StoreError,
    models::{Click, Link},
};

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait LinkStore: Send + Sync + 'static {
    /// Insert a new link. Fails with `DuplicateKey` if the short code (or
    /// analytics token) is already taken; this is the uniqueness arbiter.
    async fn insert(&self, link: &Link) -> Result<(), StoreError>;

    async fn get_by_short_code(&self, short_code: &str) -> Result<Option<Link>, StoreError>;

    async fn get_by_analytics_token(&self, token: &str) -> Result<Option<Link>, StoreError>;

    /// Atomically add one to the link's `click_count`. Unknown codes are a no-op.
    async fn increment_click_count(&self, short_code: &str) -> Result<(), StoreError>;

    async fn record_click(&self, click: &Click) -> Result<(), StoreError>;

    /// Most recent click events for `short_code`, newest first, at most `limit`.
    async fn recent_clicks(&self, short_code: &str, limit: u32) -> Result<Vec<Click>, StoreError>;
}
