use crate::{
    error::AppError,
    redirect::{self, Visit},
    AppState,
};
use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use std::{net::SocketAddr, sync::Arc};

/// GET /:code
///
/// 1. Look the short code up in the store.
/// 2. Hand click recording to a background task so the redirect never
///    waits on the analytics writes.
/// 3. Return a 307 redirect to the long URL.
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let visit = Visit {
        referrer: header_str(&headers, "referer"),
        user_agent: header_str(&headers, "user-agent"),
        ip: extract_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr)),
    };

    match redirect::resolve(
        &state.store,
        &code,
        visit,
        state.config.click_record_timeout,
    )
    .await
    {
        Ok(long_url) => Redirect::temporary(&long_url).into_response(),
        Err(AppError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg).into_response(),
        Err(e) => {
            tracing::error!("Store error looking up short code '{}': {}", code, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Determine the real client IP, preferring common proxy headers.
fn extract_ip(headers: &HeaderMap, addr: Option<SocketAddr>) -> Option<String> {
    // X-Forwarded-For can be a comma-separated list; take the first entry.
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(ip) = xff.split(',').next().map(str::trim) {
            if !ip.is_empty() {
                return Some(ip.to_owned());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if !real_ip.is_empty() {
            return Some(real_ip.to_owned());
        }
    }

    addr.map(|a| a.ip().to_string())
}
