use crate::decl::RouteDescriptor;
use crate::di::Store;
use crate::metadata::{MetadataKey, Target};
use crate::router::Middleware;
use std::marker::PhantomData;

/// Declarative registration of a route group: a class bundling one or more
/// controllers, plus middleware applied to every route in the group.
///
/// The group type itself is just an identity; a unit struct is enough:
///
/// ```
/// use stanza::prelude::*;
///
/// struct AppRoute;
///
/// let store = Store::new();
/// RouteGroup::<AppRoute>::new().register(&store);
/// ```
pub struct RouteGroup<G> {
    apis: Vec<Target>,
    middleware: Vec<Middleware>,
    _marker: PhantomData<fn(G)>,
}

impl<G: 'static> RouteGroup<G> {
    pub fn new() -> Self {
        Self {
            apis: Vec::new(),
            middleware: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Add a controller to the group. Order is preserved; duplicates are
    /// dropped at compile time, first occurrence winning.
    pub fn api<T: 'static>(mut self) -> Self {
        self.apis.push(Target::of::<T>());
        self
    }

    /// Attach group-level middleware; runs before any member middleware on
    /// every route of every controller in the group.
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn register(self, store: &Store) {
        let target = Target::of::<G>();
        let container = store.container();
        container.define(target, RouteDescriptor { apis: self.apis }, MetadataKey::Route, None);
        if !self.middleware.is_empty() {
            container.define(target, self.middleware, MetadataKey::RouteMiddleware, None);
        }
    }
}

impl<G: 'static> Default for RouteGroup<G> {
    fn default() -> Self {
        Self::new()
    }
}
