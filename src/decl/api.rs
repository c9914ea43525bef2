use crate::decl::{ApiDescriptor, HandlerFn, HandlerFuture, MethodDescriptor};
use crate::di::{Injectable, Instance, Store};
use crate::error::StanzaError;
use crate::metadata::{MetadataKey, Target};
use crate::router::{Args, HttpMethod, Middleware, ParamBinding, ParamSource, Reply, Schema};
use axum::http::StatusCode;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Declarative registration of a controller class.
///
/// Collects everything the route compiler needs to know about `T` (url
/// prefix, members, their routes, parameter bindings, middleware and
/// validation) and writes it into the metadata container on `register`.
///
/// # Example
/// ```
/// use stanza::prelude::*;
///
/// struct HealthApi;
///
/// impl Injectable for HealthApi {
///     fn construct(_deps: &Deps<'_>) -> stanza::Result<Self> {
///         Ok(Self)
///     }
/// }
///
/// let store = Store::new();
/// Api::<HealthApi>::new("/health")
///     .member(
///         Member::new("check", |_api: Arc<HealthApi>, _args: Args| async move {
///             Ok(Reply::from("ok"))
///         })
///         .get("/"),
///     )
///     .register(&store);
/// ```
pub struct Api<T: Injectable> {
    url: String,
    members: Vec<Member<T>>,
}

impl<T: Injectable> Api<T> {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            members: Vec::new(),
        }
    }

    /// Declare a controller member.
    pub fn member(mut self, member: Member<T>) -> Self {
        self.members.push(member);
        self
    }

    /// Write the accumulated facts into the store's container and register
    /// `T` as injectable so the compiler can construct it.
    pub fn register(self, store: &Store) {
        let target = Target::of::<T>();
        store.define_injectable::<T>();

        let container = store.container();
        container.define(target, ApiDescriptor { url: self.url }, MetadataKey::Api, None);

        let names: Vec<String> = self.members.iter().map(|m| m.name.clone()).collect();
        container.define(target, names, MetadataKey::ApiMembers, None);

        for member in self.members {
            let name = member.name;
            let descriptors: Vec<MethodDescriptor> = member
                .routes
                .into_iter()
                .map(|(method, url, status)| MethodDescriptor {
                    method,
                    url,
                    status,
                    member: name.clone(),
                    handler: member.handler.clone(),
                })
                .collect();
            // A member with no routes stays visible through the member list
            // only; the compiler turns that into a configuration error.
            if !descriptors.is_empty() {
                container.define(target, descriptors, MetadataKey::ApiMethod, Some(&name));
            }
            if let Some(params) = member.params {
                container.define(target, params, MetadataKey::ApiMethodParams, Some(&name));
            }
            if !member.middleware.is_empty() {
                container.define(
                    target,
                    member.middleware,
                    MetadataKey::ApiMethodMiddleware,
                    Some(&name),
                );
            }
            if let Some(schema) = member.validation {
                container.define(target, schema, MetadataKey::ApiMethodValidation, Some(&name));
            }
        }
    }
}

/// One controller member: its handler plus everything declared on it.
pub struct Member<T> {
    name: String,
    handler: HandlerFn,
    routes: Vec<(HttpMethod, String, StatusCode)>,
    params: Option<Vec<ParamBinding>>,
    middleware: Vec<Middleware>,
    validation: Option<Arc<dyn Schema>>,
    _marker: PhantomData<fn(T)>,
}

impl<T: Send + Sync + 'static> Member<T> {
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<T>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, anyhow::Error>> + Send + 'static,
    {
        let erased: HandlerFn = Arc::new(move |instance: Instance, args: Args| -> HandlerFuture {
            match instance.downcast::<T>() {
                Ok(this) => Box::pin(handler(this, args)),
                Err(_) => Box::pin(std::future::ready(Err(StanzaError::DowncastFailed {
                    type_name: std::any::type_name::<T>().to_string(),
                }
                .into()))),
            }
        });
        Self {
            name: name.into(),
            handler: erased,
            routes: Vec::new(),
            params: None,
            middleware: Vec::new(),
            validation: None,
            _marker: PhantomData,
        }
    }

    /// Register this member under a verb, url and response status.
    pub fn route(mut self, method: HttpMethod, url: impl Into<String>, status: StatusCode) -> Self {
        self.routes.push((method, url.into(), status));
        self
    }

    pub fn get(self, url: impl Into<String>) -> Self {
        self.route(HttpMethod::Get, url, StatusCode::OK)
    }

    pub fn post(self, url: impl Into<String>) -> Self {
        self.route(HttpMethod::Post, url, StatusCode::OK)
    }

    pub fn put(self, url: impl Into<String>) -> Self {
        self.route(HttpMethod::Put, url, StatusCode::OK)
    }

    pub fn patch(self, url: impl Into<String>) -> Self {
        self.route(HttpMethod::Patch, url, StatusCode::OK)
    }

    pub fn delete(self, url: impl Into<String>) -> Self {
        self.route(HttpMethod::Delete, url, StatusCode::OK)
    }

    /// Bind the handler argument at `index` to a request source, optionally
    /// narrowed to a named sub-key.
    pub fn param(mut self, index: usize, source: ParamSource, name: Option<&str>) -> Self {
        let member = self.name.clone();
        self.params.get_or_insert_with(Vec::new).push(ParamBinding {
            source,
            name: name.map(str::to_owned),
            index,
            member,
        });
        self
    }

    /// Attach member-level middleware; runs after route-group middleware.
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Attach a validation schema; runs before any middleware.
    pub fn validation(mut self, schema: Arc<dyn Schema>) -> Self {
        self.validation = Some(schema);
        self
    }
}
