mod compiler;
mod context;
mod extract;
mod middleware;
mod reply;
mod validation;

pub use compiler::Router;
pub use context::{Next, RequestCtx, ResponseHandle};
pub use extract::{Arg, Args, ParamBinding, ParamSource, extract_args};
pub use middleware::{Middleware, MiddlewareFuture};
pub use reply::Reply;
pub use validation::{Schema, ValidationIssue, ValidationPayload, schema_fn};

use axum::routing::MethodFilter;
use strum_macros::Display;

/// The HTTP verbs a controller member can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub(crate) fn filter(self) -> MethodFilter {
        match self {
            Self::Get => MethodFilter::GET,
            Self::Post => MethodFilter::POST,
            Self::Put => MethodFilter::PUT,
            Self::Patch => MethodFilter::PATCH,
            Self::Delete => MethodFilter::DELETE,
        }
    }
}
