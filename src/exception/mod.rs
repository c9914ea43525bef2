use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// A structured HTTP error: status code, stable error tag, human message.
///
/// Handlers and middleware return these (inside `anyhow::Error`) to produce
/// a deliberate error response; the terminal error renderer recognizes the
/// type by downcast and echoes its fields verbatim. Anything else becomes a
/// generic 500 whose cause is only logged server-side.
#[derive(Debug, Clone, Error)]
#[error("{error}: {message}")]
pub struct HttpError {
    pub status: StatusCode,
    pub error: String,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "UNPROCESSABLE_ENTITY",
            message,
        )
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "status": self.status.as_u16(),
                "error": self.error,
                "message": self.message,
            })),
        )
            .into_response()
    }
}
