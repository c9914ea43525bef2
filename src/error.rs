use axum::Json;
use axum::http::StatusCode;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StanzaError>;

/// Errors raised by the engine itself.
///
/// Everything except `DowncastFailed` is a configuration error: it surfaces
/// at attach time and is expected to crash startup rather than be caught.
#[derive(Debug, Error)]
pub enum StanzaError {
    #[error("no injector found for `{type_name}`; register it with `Store::define_injectable` first")]
    MissingInjector { type_name: String },

    #[error("missing dependency `{dependency}` for `{owner}` (constructor slot {index})")]
    MissingDependency {
        owner: String,
        dependency: String,
        index: usize,
    },

    #[error("circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("failed to downcast `{type_name}`")]
    DowncastFailed { type_name: String },

    #[error("no api descriptor found for `{type_name}`; register it with `Api::register` first")]
    MissingApiDescriptor { type_name: String },

    #[error("no route descriptor found for `{type_name}`; register it with `RouteGroup::register` first")]
    MissingRouteDescriptor { type_name: String },

    #[error("member `{member}` on `{type_name}` declares no HTTP route")]
    MissingMethodDescriptor { type_name: String, member: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for StanzaError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        (
            status,
            Json(json!({
                "status": status.as_u16(),
                "error": "INTERNAL_SERVER_ERROR",
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
