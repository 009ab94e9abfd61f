use crate::{
    analytics,
    error::AppError,
    models::{AnalyticsQuery, AnalyticsReport},
    AppState,
};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

/// GET /analytics?token=...
pub async fn analytics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let token = query
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(AppError::BadRequest("Analytics token required"))?;

    let report = analytics::report_for_token(state.store.as_ref(), token, Utc::now()).await?;
    Ok(Json(report))
}
