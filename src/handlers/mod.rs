pub mod analytics;
pub mod redirect;
pub mod shorten;

use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

/// GET /
/// Send root visitors to ROOT_REDIRECT_URL (e.g. the public marketing page).
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    match &state.config.root_redirect_url {
        Some(url) => Redirect::to(url).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
