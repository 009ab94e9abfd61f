//! A small URL shortener: short code allocation, redirects with click
//! tracking, and token-gated per-link analytics.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod analytics;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod redirect;
pub mod shortcode;
pub mod store;

use config::AppConfig;
use store::LinkStore;

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    pub store: Arc<dyn LinkStore>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn LinkStore>, config: AppConfig) -> Arc<Self> {
        Arc::new(Self { store, config })
    }
}

// ── Router ─────────────────────────────────────────────────────────────────

/// First path segments claimed by fixed routes. A short code equal to one of
/// these could never reach the redirect handler.
pub const RESERVED_CODES: &[&str] = &["health", "shorten", "analytics", "api"];

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(|| async { axum::http::StatusCode::OK }))
        .route("/shorten", post(handlers::shorten::shorten))
        .route("/analytics", get(handlers::analytics::analytics))
        // Paths used by the web frontend
        .route("/api/shorten", post(handlers::shorten::shorten))
        .route("/api/analytics-data", get(handlers::analytics::analytics))
        // Short-link redirect; registered last so the fixed paths take priority
        .route("/:code", get(handlers::redirect::redirect))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
