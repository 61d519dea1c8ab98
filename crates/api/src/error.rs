//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::ErrorKind;
use serde::Serialize;
use workflow::WorkflowError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Path segment that is not a vehicle id.
    #[error("invalid vehicle id: {0}")]
    InvalidId(#[from] uuid::Error),

    /// Request body that could not be decoded.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Handler panic or other failure outside the workshop's error kinds.
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    kind: &'a str,
}

impl ApiError {
    /// The error kind, or `None` for internal failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApiError::InvalidId(_) | ApiError::InvalidBody(_) => Some(ErrorKind::Validation),
            ApiError::Workflow(e) => Some(e.kind()),
            ApiError::Internal(_) => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            Some(ErrorKind::Validation) => StatusCode::BAD_REQUEST,
            Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
            Some(ErrorKind::Conflict | ErrorKind::State) => StatusCode::CONFLICT,
            Some(ErrorKind::Dependency) => StatusCode::BAD_GATEWAY,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind().map_or("internal", |k| k.as_str());

        metrics::counter!("api_errors_total", "kind" => kind).increment(1);
        if status.is_server_error() {
            tracing::error!(error = %self, kind, "request failed");
        } else {
            tracing::debug!(error = %self, kind, "request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
            kind,
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}
