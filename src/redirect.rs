use std::{future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::{error::AppError, models::Click, store::LinkStore};

/// Request metadata captured for a click event.
#[derive(Debug, Clone, Default)]
pub struct Visit {
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

/// Look up `short_code` and return its destination.
///
/// On a hit the click is recorded by a detached task (see [`track_visit`]);
/// the destination is returned without waiting for it.
pub async fn resolve(
    store: &Arc<dyn LinkStore>,
    short_code: &str,
    visit: Visit,
    record_timeout: Duration,
) -> Result<String, AppError> {
    let link = store
        .get_by_short_code(short_code)
        .await?
        .ok_or(AppError::NotFound("Short link not found"))?;

    track_visit(Arc::clone(store), link.short_code, visit, record_timeout);

    Ok(link.long_url)
}

/// Spawn the click bookkeeping for one visit: append a click event and bump
/// the link's counter. The two writes run concurrently, each under its own
/// timeout, and neither failure affects the other. Errors are logged and
/// dropped.
pub fn track_visit(
    store: Arc<dyn LinkStore>,
    short_code: String,
    visit: Visit,
    record_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let click = Click {
            short_code: short_code.clone(),
            created_at: Utc::now(),
            referrer: visit.referrer,
            user_agent: visit.user_agent,
            ip: visit.ip,
        };

        tokio::join!(
            bounded(
                "record click",
                &short_code,
                record_timeout,
                store.record_click(&click)
            ),
            bounded(
                "increment click count",
                &short_code,
                record_timeout,
                store.increment_click_count(&short_code)
            ),
        );
    })
}

async fn bounded<F, E>(what: &str, short_code: &str, limit: Duration, op: F)
where
    F: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(limit, op).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Failed to {} for '{}': {}", what, short_code, e),
        Err(_) => tracing::warn!(
            "Gave up trying to {} for '{}' after {:?}",
            what,
            short_code,
            limit
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Link, store::MemoryStore};

    async fn store_with(code: &str, url: &str) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(&Link {
                id: "id-1".into(),
                long_url: url.into(),
                short_code: code.into(),
                custom_alias: None,
                created_at: Utc::now(),
                click_count: 0,
                analytics_token: None,
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let store: Arc<dyn LinkStore> = Arc::new(MemoryStore::new());
        let err = resolve(&store, "nope", Visit::default(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn tracking_writes_event_and_counter() {
        let memory = store_with("C1", "https://example.com/x").await;
        let store: Arc<dyn LinkStore> = memory.clone();

        let visit = Visit {
            referrer: Some("https://news.example".into()),
            user_agent: Some("curl/8.0".into()),
            ip: Some("203.0.113.7".into()),
        };
        track_visit(store.clone(), "C1".into(), visit, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(memory.click_event_count("C1"), 1);
        let link = store.get_by_short_code("C1").await.unwrap().unwrap();
        assert_eq!(link.click_count, 1);
        let clicks = store.recent_clicks("C1", 10).await.unwrap();
        assert_eq!(clicks[0].ip.as_deref(), Some("203.0.113.7"));
    }

    #[tokio::test]
    async fn failed_event_write_still_counts_the_click() {
        let memory = store_with("C2", "https://example.com/y").await;
        memory.fail_click_writes(true);
        let store: Arc<dyn LinkStore> = memory.clone();

        track_visit(store.clone(), "C2".into(), Visit::default(), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(memory.click_event_count("C2"), 0);
        let link = store.get_by_short_code("C2").await.unwrap().unwrap();
        assert_eq!(link.click_count, 1);
    }
}
