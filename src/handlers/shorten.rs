use crate::{
    error::AppError,
    models::{ShortenRequest, ShortenResponse},
    shortcode::{self, NewLink},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// POST /shorten
///
/// Validates the long URL, allocates a short code (the caller's alias or a
/// generated one) and stores the link. Alias content is the caller's
/// responsibility; only availability is checked here.
pub async fn shorten(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    let Json(req) = body.map_err(|rejection| {
        tracing::debug!("rejected shorten body: {}", rejection);
        AppError::BadRequest("Invalid request body")
    })?;

    let long_url = validate_long_url(&req.long_url)?;
    let custom_alias = requested_alias(req.custom_alias);

    let link = shortcode::allocate(
        state.store.as_ref(),
        NewLink {
            long_url,
            custom_alias,
            enable_analytics: req.enable_analytics,
        },
        state.config.code_max_attempts,
    )
    .await?;

    tracing::info!("Created short link '{}' -> {}", link.short_code, link.long_url);

    let response = ShortenResponse {
        short_url: state.config.short_url(&link.short_code),
        analytics_url: link
            .analytics_token
            .as_deref()
            .map(|token| state.config.analytics_url(token)),
        short_code: link.short_code,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Accept only absolute `http`/`https` URLs. Returns the normalized,
/// percent-encoded form so it can go straight into a `Location` header.
pub fn validate_long_url(raw: &str) -> Result<String, AppError> {
    match url::Url::parse(raw.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
            Ok(parsed.into())
        }
        _ => Err(AppError::InvalidUrl),
    }
}

/// A blank alias means "generate one"; anything else is used byte for byte.
fn requested_alias(alias: Option<String>) -> Option<String> {
    alias.filter(|a| !a.trim().is_empty())
}
