use crate::exception::HttpError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// The request slice handed to a validation schema.
#[derive(Debug, Clone)]
pub struct ValidationPayload {
    pub body: Value,
    pub query: Value,
    pub params: Value,
}

/// One validation failure, addressed by its path into the payload
/// (e.g. `["query", "name"]`).
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub path: Vec<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        path: impl IntoIterator<Item = impl Into<String>>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }
}

/// The boundary to the externally-defined validation library.
///
/// The engine only ever calls `parse` with the `{ body, query, params }`
/// triple and, on rejection, reads the issue list to shape a 422 response.
/// What actually performs the validation is entirely up to the
/// implementation.
#[async_trait]
pub trait Schema: Send + Sync + 'static {
    async fn parse(&self, payload: ValidationPayload) -> Result<(), Vec<ValidationIssue>>;
}

struct FnSchema<F>(F);

#[async_trait]
impl<F> Schema for FnSchema<F>
where
    F: Fn(ValidationPayload) -> Result<(), Vec<ValidationIssue>> + Send + Sync + 'static,
{
    async fn parse(&self, payload: ValidationPayload) -> Result<(), Vec<ValidationIssue>> {
        (self.0)(payload)
    }
}

/// Adapt a plain closure into a [`Schema`].
pub fn schema_fn<F>(func: F) -> Arc<dyn Schema>
where
    F: Fn(ValidationPayload) -> Result<(), Vec<ValidationIssue>> + Send + Sync + 'static,
{
    Arc::new(FnSchema(func))
}

/// Shape the 422 response for a rejected request: the offending field (the
/// second path segment, the first being the payload section) plus the first
/// issue's message, with a generic fallback.
pub(crate) fn unprocessable_response(issues: &[ValidationIssue]) -> HttpError {
    let message = issues
        .first()
        .map(|issue| match issue.path.get(1).or_else(|| issue.path.first()) {
            Some(field) => format!("{field}: {}", issue.message),
            None => issue.message.clone(),
        })
        .unwrap_or_else(|| "Validation error.".to_string());
    HttpError::unprocessable(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn names_the_offending_field() {
        let issues = [ValidationIssue::new(
            ["query", "name"],
            "must be at most 5 characters",
        )];
        let err = unprocessable_response(&issues);

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error, "UNPROCESSABLE_ENTITY");
        assert_eq!(err.message, "name: must be at most 5 characters");
    }

    #[test]
    fn falls_back_to_the_first_segment_or_the_bare_message() {
        let issues = [ValidationIssue::new(["body"], "is required")];
        assert_eq!(unprocessable_response(&issues).message, "body: is required");

        let pathless = [ValidationIssue {
            path: Vec::new(),
            message: "malformed payload".to_string(),
        }];
        assert_eq!(unprocessable_response(&pathless).message, "malformed payload");
    }

    #[test]
    fn no_issues_yields_the_generic_message() {
        assert_eq!(unprocessable_response(&[]).message, "Validation error.");
    }

    #[tokio::test]
    async fn schema_fn_adapts_a_closure() {
        let schema = schema_fn(|payload| {
            if payload.query.get("name").is_some() {
                Ok(())
            } else {
                Err(vec![ValidationIssue::new(["query", "name"], "is required")])
            }
        });

        let ok = ValidationPayload {
            body: Value::Null,
            query: serde_json::json!({ "name": "ada" }),
            params: Value::Null,
        };
        assert!(schema.parse(ok).await.is_ok());

        let missing = ValidationPayload {
            body: Value::Null,
            query: serde_json::json!({}),
            params: Value::Null,
        };
        assert!(schema.parse(missing).await.is_err());
    }
}
