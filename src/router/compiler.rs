use crate::decl::{ApiDescriptor, HandlerFn, MethodDescriptor, RouteDescriptor};
use crate::di::{Instance, Store};
use crate::error::{Result, StanzaError};
use crate::exception::HttpError;
use crate::metadata::{MetadataKey, Target};
use crate::router::context::{Next, RequestCtx, ResponseHandle};
use crate::router::extract::{ParamBinding, extract_args};
use crate::router::middleware::{Middleware, dedup};
use crate::router::reply::dispatch;
use crate::router::validation::{Schema, ValidationPayload, unprocessable_response};
use axum::extract::{Path, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::on;
use std::collections::HashMap;
use std::sync::Arc;

/// The route compiler.
///
/// Walks registered route groups, obtains controller singletons from the
/// injector registry, reads every declarative fact off the metadata
/// container and registers compiled request closures with the underlying
/// axum router. Compilation runs once; everything it produces is immutable
/// afterwards and shared freely across in-flight requests.
pub struct Router {
    app: axum::Router,
    store: Arc<Store>,
}

impl Router {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            app: axum::Router::new(),
            store,
        }
    }

    /// Attach and register every route group in `groups` under `prefix`.
    ///
    /// Duplicate groups (and duplicate controllers within a group) compile
    /// once, first occurrence winning. Path templates use the router's
    /// `{name}` syntax.
    ///
    /// # Errors
    /// Fails fast on any missing descriptor or injector registration; these
    /// are startup configuration errors and are meant to crash startup.
    pub fn attach(&mut self, prefix: &str, groups: &[Target]) -> Result<()> {
        let container = self.store.container();
        for group in dedup_targets(groups) {
            let descriptor = container
                .get::<RouteDescriptor>(group, MetadataKey::Route, None)
                .ok_or_else(|| StanzaError::MissingRouteDescriptor {
                    type_name: group.name().to_string(),
                })?;
            let route_mids = container
                .get::<Vec<Middleware>>(group, MetadataKey::RouteMiddleware, None)
                .map(|mids| dedup(&mids))
                .unwrap_or_default();

            let mut sub = axum::Router::new();
            for api in dedup_targets(&descriptor.apis) {
                sub = self.compile_api(sub, api, &route_mids)?;
            }

            let prefix = normalize(prefix);
            let app = std::mem::take(&mut self.app);
            self.app = if prefix.is_empty() {
                app.merge(sub)
            } else {
                app.nest(&prefix, sub)
            };
            tracing::info!(group = group.short_name(), prefix = %prefix, "attached route group");
        }
        Ok(())
    }

    fn compile_api(
        &self,
        mut sub: axum::Router,
        api: Target,
        route_mids: &[Middleware],
    ) -> Result<axum::Router> {
        let container = self.store.container();
        self.store.define_injector(api, None)?;
        let instance = self.store.get_instance(api)?;
        let descriptor = container
            .get::<ApiDescriptor>(api, MetadataKey::Api, None)
            .ok_or_else(|| StanzaError::MissingApiDescriptor {
                type_name: api.name().to_string(),
            })?;
        let base = normalize(&descriptor.url);

        let members = container
            .get_own::<Vec<String>>(api, MetadataKey::ApiMembers, None)
            .map(|names| (*names).clone())
            .unwrap_or_default();
        for member in &members {
            let methods = container
                .get_own::<Vec<MethodDescriptor>>(api, MetadataKey::ApiMethod, Some(member))
                .ok_or_else(|| StanzaError::MissingMethodDescriptor {
                    type_name: api.name().to_string(),
                    member: member.clone(),
                })?;
            let bindings = container
                .get_own::<Vec<ParamBinding>>(api, MetadataKey::ApiMethodParams, Some(member))
                .map(|params| (*params).clone());
            let method_mids = container
                .get_own::<Vec<Middleware>>(api, MetadataKey::ApiMethodMiddleware, Some(member))
                .map(|mids| dedup(&mids))
                .unwrap_or_default();
            let validation = container
                .get_own::<Arc<dyn Schema>>(api, MetadataKey::ApiMethodValidation, Some(member))
                .map(|schema| (*schema).clone());

            for descriptor in methods.iter() {
                let path = join_paths(&base, &descriptor.url);
                let compiled = Arc::new(CompiledRoute {
                    instance: instance.clone(),
                    handler: descriptor.handler.clone(),
                    status: descriptor.status,
                    bindings: bindings.clone(),
                    validation: validation.clone(),
                    route_mids: route_mids.to_vec(),
                    method_mids: method_mids.clone(),
                });
                let handler = move |Path(params): Path<HashMap<String, String>>,
                                    request: Request| {
                    let compiled = Arc::clone(&compiled);
                    async move { compiled.run(params, request).await }
                };
                tracing::debug!(method = %descriptor.method, path = %path, api = api.short_name(), "registering route");
                sub = sub.route(&path, on(descriptor.method.filter(), handler));
            }
        }
        Ok(sub)
    }

    /// Finalize the route table: install the terminal not-found responder
    /// and hand back the underlying router.
    pub fn finish(self) -> axum::Router {
        self.app.fallback(not_found)
    }
}

struct CompiledRoute {
    instance: Instance,
    handler: HandlerFn,
    status: StatusCode,
    bindings: Option<Vec<ParamBinding>>,
    validation: Option<Arc<dyn Schema>>,
    route_mids: Vec<Middleware>,
    method_mids: Vec<Middleware>,
}

impl CompiledRoute {
    async fn run(&self, params: HashMap<String, String>, request: Request) -> Response {
        let ctx = match RequestCtx::read(params, request).await {
            Ok(ctx) => Arc::new(ctx),
            Err(err) => return render_error(&err),
        };

        if let Some(schema) = &self.validation {
            let payload = ValidationPayload {
                body: ctx.body_value(),
                query: ctx.query_value(),
                params: ctx.params_value(),
            };
            if let Err(issues) = schema.parse(payload).await {
                return unprocessable_response(&issues).into_response();
            }
        }

        let res = ResponseHandle::new();
        let next = Next::new();
        for mw in self.route_mids.iter().chain(self.method_mids.iter()) {
            if let Err(err) = mw.call(Arc::clone(&ctx), res.clone()).await {
                return render_error(&err);
            }
            if res.sent() {
                return res.render();
            }
        }

        let args = extract_args(&ctx, &res, &next, self.bindings.as_deref());
        let outcome = (self.handler)(self.instance.clone(), args).await;
        if !res.sent() {
            res.set_status(self.status);
        }
        match outcome {
            Err(err) => render_error(&err),
            Ok(reply) => {
                if let Some(err) = next.take() {
                    return render_error(&err);
                }
                dispatch(reply, &res)
            }
        }
    }
}

/// The terminal error responder: structured errors echo their fields
/// verbatim, everything else is logged server-side and answered with the
/// fixed 500 body.
pub(crate) fn render_error(err: &anyhow::Error) -> Response {
    if let Some(http) = err.downcast_ref::<HttpError>() {
        return http.clone().into_response();
    }
    tracing::error!(error = ?err, "unhandled error while serving request");
    HttpError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_SERVER_ERROR",
        "Something bad just happened!",
    )
    .into_response()
}

async fn not_found() -> Response {
    HttpError::not_found("The route you were looking for does not exist or has been removed.")
        .into_response()
}

/// Strip trailing slashes and make the path absolute; `/` collapses to the
/// empty string so joins never produce a double slash.
fn normalize(path: &str) -> String {
    let stripped = path.trim_end_matches('/');
    if stripped.is_empty() {
        String::new()
    } else if stripped.starts_with('/') {
        stripped.to_string()
    } else {
        format!("/{stripped}")
    }
}

fn join_paths(base: &str, url: &str) -> String {
    let joined = format!("{base}{}", normalize(url));
    if joined.is_empty() { "/".to_string() } else { joined }
}

fn dedup_targets(targets: &[Target]) -> Vec<Target> {
    let mut unique: Vec<Target> = Vec::with_capacity(targets.len());
    for target in targets {
        if !unique.contains(target) {
            unique.push(*target);
        }
    }
    unique
}
