//! Per-link stats for holders of an analytics token.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::{
    error::AppError,
    models::{AnalyticsReport, Click, Link, RecentClick},
    store::LinkStore,
};

/// Click events fetched per report, newest first.
pub const CLICK_FETCH_LIMIT: u32 = 100;

/// Calendar days (UTC, including today) covered by `clicks_by_day`.
pub const WINDOW_DAYS: i64 = 30;

/// Entries kept in `recent_clicks`.
pub const RECENT_CLICKS_SHOWN: usize = 20;

/// Build the report for the link owning `token`.
///
/// A missing link is `NotFound`. A failure while loading click events only
/// degrades the report to an empty histogram and click list.
pub async fn report_for_token(
    store: &dyn LinkStore,
    token: &str,
    now: DateTime<Utc>,
) -> Result<AnalyticsReport, AppError> {
    let link = store
        .get_by_analytics_token(token)
        .await?
        .ok_or(AppError::NotFound("Analytics not found"))?;

    let clicks = match store
        .recent_clicks(&link.short_code, CLICK_FETCH_LIMIT)
        .await
    {
        Ok(clicks) => clicks,
        Err(e) => {
            tracing::warn!(
                "Failed to load clicks for '{}', returning empty analytics: {}",
                link.short_code,
                e
            );
            Vec::new()
        }
    };

    Ok(summarize(link, &clicks, now))
}

/// Earliest instant inside the reporting window.
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let first_day = now.date_naive() - Duration::days(WINDOW_DAYS - 1);
    first_day.and_time(NaiveTime::MIN).and_utc()
}

/// Aggregate `clicks` (newest first) into a report for `link`.
///
/// `total_clicks` is the link's stored counter; the histogram and recent
/// list only reflect the events passed in, so the numbers need not agree.
pub fn summarize(link: Link, clicks: &[Click], now: DateTime<Utc>) -> AnalyticsReport {
    let cutoff = window_start(now);
    let in_window: Vec<&Click> = clicks.iter().filter(|c| c.created_at >= cutoff).collect();

    let mut clicks_by_day = BTreeMap::new();
    for click in &in_window {
        let day = click.created_at.format("%Y-%m-%d").to_string();
        *clicks_by_day.entry(day).or_insert(0) += 1;
    }

    let recent_clicks = in_window
        .iter()
        .take(RECENT_CLICKS_SHOWN)
        .map(|c| RecentClick {
            date: c.created_at,
            referrer: c.referrer.clone().unwrap_or_else(|| "Direct".into()),
            user_agent: c.user_agent.clone().unwrap_or_else(|| "Unknown".into()),
        })
        .collect();

    AnalyticsReport {
        short_code: link.short_code,
        long_url: link.long_url,
        total_clicks: link.click_count,
        created_at: link.created_at,
        clicks_by_day,
        recent_clicks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn link(click_count: i64) -> Link {
        Link {
            id: "id".into(),
            long_url: "https://example.com".into(),
            short_code: "abc123".into(),
            custom_alias: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            click_count,
            analytics_token: Some("tok".into()),
        }
    }

    fn click_at(at: DateTime<Utc>) -> Click {
        Click {
            short_code: "abc123".into(),
            created_at: at,
            referrer: None,
            user_agent: None,
            ip: None,
        }
    }

    #[test]
    fn window_starts_at_midnight_29_days_back() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 15, 30, 0).unwrap();
        assert_eq!(
            window_start(now),
            Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn old_clicks_are_left_out_of_histogram() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let clicks = vec![
            click_at(now - Duration::hours(1)),
            click_at(now - Duration::hours(2)),
            click_at(now - Duration::days(3)),
            click_at(now - Duration::days(29)),
            click_at(now - Duration::days(31)),
            click_at(now - Duration::days(90)),
        ];

        let report = summarize(link(42), &clicks, now);

        assert_eq!(report.total_clicks, 42);
        assert_eq!(report.clicks_by_day.get("2024-03-31"), Some(&2));
        assert_eq!(report.clicks_by_day.get("2024-03-28"), Some(&1));
        assert_eq!(report.clicks_by_day.get("2024-03-02"), Some(&1));
        assert_eq!(report.clicks_by_day.values().sum::<i64>(), 4);
        assert_eq!(report.recent_clicks.len(), 4);
    }

    #[test]
    fn recent_clicks_capped_and_defaulted() {
        let now = Utc::now();
        let mut clicks: Vec<Click> = (0..50)
            .map(|i| click_at(now - Duration::minutes(i)))
            .collect();
        clicks[0].referrer = Some("https://t.co/x".into());
        clicks[0].user_agent = Some("Mozilla/5.0".into());

        let report = summarize(link(50), &clicks, now);

        assert_eq!(report.recent_clicks.len(), RECENT_CLICKS_SHOWN);
        assert_eq!(report.recent_clicks[0].referrer, "https://t.co/x");
        assert_eq!(report.recent_clicks[0].user_agent, "Mozilla/5.0");
        assert_eq!(report.recent_clicks[1].referrer, "Direct");
        assert_eq!(report.recent_clicks[1].user_agent, "Unknown");
    }

    #[test]
    fn no_clicks_gives_empty_report() {
        let report = summarize(link(7), &[], Utc::now());
        assert_eq!(report.total_clicks, 7);
        assert!(report.clicks_by_day.is_empty());
        assert!(report.recent_clicks.is_empty());
    }
}
