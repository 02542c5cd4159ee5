//! HTTP error mapping for the JSON routes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use content_feed::FeedError;
use serde_json::json;

/// Errors a route handler can answer with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unavailable(String),

    #[error(transparent)]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn database_busy() -> ApiError {
    ApiError::Unavailable("database is busy, try again".to_string())
}

impl From<FeedError> for ApiError {
    fn from(error: FeedError) -> Self {
        match error {
            FeedError::NotFound { .. } => ApiError::NotFound(error.to_string()),
            FeedError::InvalidInput { reason } => ApiError::BadRequest(reason),
            FeedError::ConflictRetryExhausted { .. } => ApiError::Conflict(error.to_string()),
            // Stores wrap sqlx errors as transient; a drained pool is still a 503.
            FeedError::TransientFetch(ref source)
                if matches!(
                    source.downcast_ref::<sqlx::Error>(),
                    Some(sqlx::Error::PoolTimedOut)
                ) =>
            {
                database_busy()
            }
            other => ApiError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast_ref::<sqlx::Error>() {
            Some(sqlx::Error::PoolTimedOut) => database_busy(),
            Some(e)
                if e.as_database_error()
                    .is_some_and(|db| db.is_unique_violation()) =>
            {
                ApiError::Conflict("an item with this slug already exists".to_string())
            }
            _ => ApiError::Internal(error),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(e) => {
                tracing::error!(error = ?e, "Request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
