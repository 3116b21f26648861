use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use odb_core::{Error, ResolutionError};
use serde_json::json;
use tracing::{error, warn};

/// An error as the client sees it: a status and a `{"detail": ...}` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    /// Client mistakes become 4xx. Upstream faults become 500 prefixed with
    /// `context`, since the caller cannot fix them.
    pub fn from_service(err: Error, context: &str) -> Self {
        match &err {
            Error::Resolution(ResolutionError::InvalidDateFormat(_))
            | Error::Resolution(ResolutionError::InvalidSlug(_)) => ApiError::BadRequest(err.to_string()),
            Error::Resolution(ResolutionError::NotFound(_)) => ApiError::NotFound(err.to_string()),
            Error::Fetch(_) | Error::Extraction(_) => ApiError::Internal(format!("{}: {}", context, err)),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            ApiError::BadRequest(detail) | ApiError::NotFound(detail) | ApiError::Internal(detail) => detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, detail = self.detail(), "request failed");
        } else {
            warn!(%status, detail = self.detail(), "request rejected");
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
