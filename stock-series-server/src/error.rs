use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use stock_series::SeriesError;
use thiserror::Error;
use tracing::warn;

/// All errors returned by the HTTP handlers.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ApiError {
    /// Malformed or out of range query parameters.
    #[error("{0}")]
    Validation(String),

    /// Unregistered ticker, or no data in the requested window.
    #[error("{0}")]
    NotFound(String),

    /// Store failure no read path produces today, only reachable through
    /// `SeriesError::OutOfOrder`.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SeriesError> for ApiError {
    fn from(value: SeriesError) -> Self {
        match value {
            SeriesError::UnknownSymbol(_) => Self::NotFound(value.to_string()),
            SeriesError::OutOfOrder { .. } => Self::Internal(value.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        warn!(status = status.as_u16(), error = %self, "rejected request");

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
