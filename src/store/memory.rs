use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard,
    },
};

use async_trait::async_trait;

use super::LinkStore;
use crate::{
    error::StoreError,
    models::{Click, Link},
};

#[derive(Default)]
struct Tables {
    /// short_code → link
    links: HashMap<String, Link>,
    clicks: Vec<Click>,
}

/// In-process [`LinkStore`] with the same uniqueness rules as the SQLite
/// schema. Individual operations can be made to fail, which lets tests
/// exercise the redirect and analytics degradation paths.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_click_writes: AtomicBool,
    fail_increments: AtomicBool,
    fail_click_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `record_click` return `Unavailable`.
    pub fn fail_click_writes(&self, fail: bool) {
        self.fail_click_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `increment_click_count` return `Unavailable`.
    pub fn fail_increments(&self, fail: bool) {
        self.fail_increments.store(fail, Ordering::SeqCst);
    }

    /// Make `recent_clicks` return `Unavailable`.
    pub fn fail_click_reads(&self, fail: bool) {
        self.fail_click_reads.store(fail, Ordering::SeqCst);
    }

    pub fn link_count(&self) -> usize {
        self.lock().links.len()
    }

    pub fn click_event_count(&self, short_code: &str) -> usize {
        self.lock()
            .clicks
            .iter()
            .filter(|c| c.short_code == short_code)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // A panic while holding the lock cannot leave the maps half-written.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(flag: &AtomicBool, op: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{op} disabled")));
        }
        Ok(())
    }
}

#[async_trait]
impl LinkStore for MemoryStore {
    async fn insert(&self, link: &Link) -> Result<(), StoreError> {
        let mut tables = self.lock();

        if tables.links.contains_key(&link.short_code) {
            return Err(StoreError::DuplicateKey(link.short_code.clone()));
        }
        if let Some(token) = &link.analytics_token {
            if tables
                .links
                .values()
                .any(|l| l.analytics_token.as_ref() == Some(token))
            {
                return Err(StoreError::DuplicateKey(token.clone()));
            }
        }

        tables.links.insert(link.short_code.clone(), link.clone());
        Ok(())
    }

    async fn get_by_short_code(&self, short_code: &str) -> Result<Option<Link>, StoreError> {
        Ok(self.lock().links.get(short_code).cloned())
    }

    async fn get_by_analytics_token(&self, token: &str) -> Result<Option<Link>, StoreError> {
        Ok(self
            .lock()
            .links
            .values()
            .find(|l| l.analytics_token.as_deref() == Some(token))
            .cloned())
    }

    async fn increment_click_count(&self, short_code: &str) -> Result<(), StoreError> {
        Self::check(&self.fail_increments, "increment_click_count")?;
        if let Some(link) = self.lock().links.get_mut(short_code) {
            link.click_count += 1;
        }
        Ok(())
    }

    async fn record_click(&self, click: &Click) -> Result<(), StoreError> {
        Self::check(&self.fail_click_writes, "record_click")?;
        self.lock().clicks.push(click.clone());
        Ok(())
    }

    async fn recent_clicks(&self, short_code: &str, limit: u32) -> Result<Vec<Click>, StoreError> {
        Self::check(&self.fail_click_reads, "recent_clicks")?;

        let tables = self.lock();
        let mut clicks: Vec<Click> = tables
            .clicks
            .iter()
            .filter(|c| c.short_code == short_code)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps; reverse it
        // first so later inserts win ties, matching `rowid DESC`.
        clicks.reverse();
        clicks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        clicks.truncate(limit as usize);
        Ok(clicks)
    }
}
