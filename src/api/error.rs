//! JSON error bodies for the HTTP API.
//!
//! The scan endpoints answer `{ "message": ..., "error": ... }`, the search
//! endpoint answers `{ "error": ... }`; clients already depend on both shapes.

use crate::utils::error::GlanceError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorShape {
    Message,
    Error,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    detail: Option<String>,
    shape: ErrorShape,
}

impl ApiError {
    fn message(status: StatusCode, message: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail,
            shape: ErrorShape::Message,
        }
    }

    fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
            shape: ErrorShape::Error,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn method_not_allowed() -> Self {
        Self::message(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed", None)
    }

    /// Body could not be read as JSON (or was too large).
    pub fn bad_body(rejection: JsonRejection) -> Self {
        Self::message(rejection.status(), rejection.body_text(), None)
    }

    /// Query string could not be parsed; answered in the search shape.
    pub fn bad_query(rejection: QueryRejection) -> Self {
        Self::error(rejection.status(), rejection.body_text())
    }

    /// Bad uploads become 400 with the reason, anything else 500 with `summary`.
    pub fn scan_failure(summary: &str, err: GlanceError) -> Self {
        match err {
            GlanceError::InvalidImage { reason } => {
                Self::message(StatusCode::BAD_REQUEST, reason, None)
            }
            other => {
                log_failure(summary, &other);
                Self::message(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    summary,
                    Some(other.to_string()),
                )
            }
        }
    }

    pub fn search_failure(err: GlanceError) -> Self {
        match err {
            GlanceError::ValidationError { message } => {
                Self::error(StatusCode::BAD_REQUEST, message)
            }
            other => {
                log_failure("Search API error", &other);
                Self::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to perform search")
            }
        }
    }
}

fn log_failure(summary: &str, err: &GlanceError) {
    tracing::error!(
        "{}: {} (Category: {:?}, Severity: {:?})",
        summary,
        err,
        err.category(),
        err.severity()
    );
    tracing::debug!("Recovery suggestion: {}", err.recovery_suggestion());
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match (self.shape, self.detail) {
            (ErrorShape::Message, Some(detail)) => {
                json!({ "message": self.message, "error": detail })
            }
            (ErrorShape::Message, None) => json!({ "message": self.message }),
            (ErrorShape::Error, _) => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}
