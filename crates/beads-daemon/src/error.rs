//! Daemon-side error taxonomy and its mapping onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Matches the spec's stable substring so callers can distinguish
    /// "no issue found" from transport failures.
    #[error("no issue found matching '{0}'")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("write attempted against a read-only daemon")]
    ReadOnly,

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Storage(#[from] beads_storage::StorageError),

    #[error(transparent)]
    Router(#[from] beads_query::RouterError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::ReadOnly => StatusCode::FORBIDDEN,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Storage(beads_storage::StorageError::NotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Router(beads_query::RouterError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Router(beads_query::RouterError::Ambiguous { .. })
            | ApiError::Router(beads_query::RouterError::InvalidInput) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Router(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "Success": false,
            "Error": self.to_string(),
            "Data": serde_json::Value::Null,
        }));
        (status, body).into_response()
    }
}
