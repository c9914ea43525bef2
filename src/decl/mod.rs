//! The declarative registration surface.
//!
//! Where the source of this design would use decorators, callers here
//! populate explicit builders ([`Api`], [`Member`], [`RouteGroup`]) whose
//! `register` methods write the descriptor shapes below into the metadata
//! container. The route compiler consumes exactly these shapes and nothing
//! else.

mod api;
mod route;

pub use api::{Api, Member};
pub use route::RouteGroup;

use crate::di::Instance;
use crate::metadata::Target;
use crate::router::{Args, HttpMethod, Reply};
use axum::http::StatusCode;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Reply, anyhow::Error>> + Send>>;

/// Type-erased controller method: invoked with the controller singleton and
/// the extracted positional arguments.
pub type HandlerFn = Arc<dyn Fn(Instance, Args) -> HandlerFuture + Send + Sync>;

/// Controller descriptor: one per api class.
#[derive(Debug, Clone)]
pub struct ApiDescriptor {
    pub url: String,
}

/// One verb/url/status registration of a controller member. A member may be
/// registered several times; the container accumulates them as an ordered
/// list under the member's name.
#[derive(Clone)]
pub struct MethodDescriptor {
    pub method: HttpMethod,
    pub url: String,
    pub status: StatusCode,
    pub member: String,
    pub handler: HandlerFn,
}

/// Route-group descriptor: the ordered controller list.
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    pub apis: Vec<Target>,
}
