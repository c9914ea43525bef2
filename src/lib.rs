//! # Stanza
//!
//! Declarative routing and dependency injection over axum for Rust.
//!
//! Stanza separates *describing* an HTTP application from *wiring* it:
//! controllers, route groups and injectable services are declared through
//! registration builders, the declarations accumulate as metadata facts,
//! and a one-shot compiler turns those facts into live axum handlers at
//! startup.
//!
//! ## Features
//!
//! - **Metadata container**: every declarative fact lives in one store,
//!   keyed by type identity, with own-vs-inherited lookup
//! - **Dependency injection**: lazily resolved singleton graphs with
//!   positional auto-wiring, per-slot overrides and fail-fast cycle
//!   detection
//! - **Route compiler**: url composition, middleware ordering, parameter
//!   extraction and validation handled once, at attach time
//! - **Structured errors**: one stable `{ status, error, message }` shape
//!   for every error the engine emits
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stanza::prelude::*;
//!
//! // 1. Define your service
//! pub struct GreetingService;
//!
//! impl Injectable for GreetingService {
//!     fn construct(_deps: &Deps<'_>) -> stanza::Result<Self> {
//!         Ok(Self)
//!     }
//! }
//!
//! impl GreetingService {
//!     pub fn greet(&self, name: &str) -> String {
//!         format!("hello-{name}")
//!     }
//! }
//!
//! // 2. Define your controller
//! pub struct GreetingApi {
//!     service: Arc<GreetingService>,
//! }
//!
//! impl Injectable for GreetingApi {
//!     fn dependencies() -> Vec<Target> {
//!         vec![Target::of::<GreetingService>()]
//!     }
//!
//!     fn construct(deps: &Deps<'_>) -> stanza::Result<Self> {
//!         Ok(Self { service: deps.get(0)? })
//!     }
//! }
//!
//! // 3. A route group bundling the controller
//! pub struct AppRoute;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(Store::new());
//!     store.define_injectable::<GreetingService>();
//!
//!     Api::<GreetingApi>::new("/greetings")
//!         .member(
//!             Member::new("greet", |api: Arc<GreetingApi>, args: Args| async move {
//!                 let name = args.string(0).unwrap_or_default();
//!                 Ok(Reply::from(api.service.greet(&name)))
//!             })
//!             .get("/{name}")
//!             .param(0, ParamSource::PathParams, Some("name")),
//!         )
//!         .register(&store);
//!
//!     RouteGroup::<AppRoute>::new().api::<GreetingApi>().register(&store);
//!
//!     // 4. Compile and serve
//!     let mut router = Router::new(store);
//!     router.attach("/api/v1", &[Target::of::<AppRoute>()])?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:4000").await?;
//!     axum::serve(listener, router.finish()).await?;
//!     Ok(())
//! }
//! ```

pub mod decl;
pub mod di;
pub mod error;
pub mod exception;
pub mod metadata;
pub mod router;

// Re-export core types
pub use decl::{Api, ApiDescriptor, Member, MethodDescriptor, RouteDescriptor, RouteGroup};
pub use di::{Deps, Injectable, InjectableKey, Store, Token};
pub use error::{Result, StanzaError};
pub use exception::HttpError;
pub use metadata::{Container, MetadataKey, Target};
pub use router::{
    Args, HttpMethod, Middleware, ParamBinding, ParamSource, Reply, Router, Schema,
};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use stanza::prelude::*;
/// ```
pub mod prelude {
    pub use crate::decl::{Api, Member, RouteGroup};
    pub use crate::di::{Deps, Injectable, InjectableKey, InjectorInfo, Store, Token};
    pub use crate::error::{Result, StanzaError};
    pub use crate::exception::HttpError;
    pub use crate::metadata::{Container, MetadataKey, Target};
    pub use crate::router::{
        Arg, Args, HttpMethod, Middleware, Next, ParamBinding, ParamSource, Reply, RequestCtx,
        ResponseHandle, Router, Schema, ValidationIssue, ValidationPayload, schema_fn,
    };
    pub use async_trait::async_trait;
    pub use axum::http::StatusCode;
    pub use std::sync::Arc;
}
