use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures reported by a [`LinkStore`](crate::store::LinkStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row with this key is already present (unique constraint).
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicateKey(db.message().to_owned())
            }
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid URL provided")]
    InvalidUrl,

    #[error("Custom alias already exists")]
    AliasTaken(String),

    #[error("could not allocate a free short code after {0} attempts")]
    GenerationExhausted(u32),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidUrl | AppError::AliasTaken(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::GenerationExhausted(_) | AppError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::GenerationExhausted(_) | AppError::Store(_) => {
                tracing::error!("request failed: {}", self);
                "Internal server error".to_owned()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(AppError::InvalidUrl.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::AliasTaken("promo".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("Analytics not found").status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn store_and_exhaustion_map_to_500() {
        assert_eq!(
            AppError::GenerationExhausted(10).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let err: AppError = StoreError::Unavailable("connection reset".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
