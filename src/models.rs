use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shortened link record from the `urls` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Link {
    pub id: String,
    pub long_url: String,
    pub short_code: String,
    /// Equal to `short_code` when the caller picked the code, `None` when generated.
    pub custom_alias: Option<String>,
    pub created_at: DateTime<Utc>,
    pub click_count: i64,
    pub analytics_token: Option<String>,
}

/// A single visit from the `clicks` table. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Click {
    pub short_code: String,
    pub created_at: DateTime<Utc>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

// ── API payloads ───────────────────────────────────────────────────────────

/// Body of `POST /shorten`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    #[serde(default, alias = "url")]
    pub long_url: String,
    pub custom_alias: Option<String>,
    #[serde(default)]
    pub enable_analytics: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub short_url: String,
    pub short_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub token: Option<String>,
}

/// Stats returned to whoever holds a link's analytics token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub short_code: String,
    pub long_url: String,
    /// Lifetime counter from the link row, not recomputed from click events.
    pub total_clicks: i64,
    pub created_at: DateTime<Utc>,
    /// `YYYY-MM-DD` → clicks, only days that saw at least one click.
    pub clicks_by_day: BTreeMap<String, i64>,
    pub recent_clicks: Vec<RecentClick>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentClick {
    pub date: DateTime<Utc>,
    pub referrer: String,
    pub user_agent: String,
}
