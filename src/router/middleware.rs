use crate::router::context::{RequestCtx, ResponseHandle};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>;

type MiddlewareFn = dyn Fn(Arc<RequestCtx>, ResponseHandle) -> MiddlewareFuture + Send + Sync;

/// A request-handling function run before the controller method.
///
/// Returning an error forwards it to the terminal error responder; writing
/// the response through the handle ends the chain early. Middleware identity
/// is the function pointer itself: cloning a `Middleware` yields the same
/// identity, which is what list deduplication keys on.
#[derive(Clone)]
pub struct Middleware {
    func: Arc<MiddlewareFn>,
}

impl Middleware {
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(Arc<RequestCtx>, ResponseHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        Self {
            func: Arc::new(move |ctx, res| Box::pin(func(ctx, res))),
        }
    }

    pub(crate) fn call(&self, ctx: Arc<RequestCtx>, res: ResponseHandle) -> MiddlewareFuture {
        (self.func)(ctx, res)
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.func) as *const ()
    }
}

impl std::fmt::Debug for Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Middleware")
            .field("addr", &self.addr())
            .finish()
    }
}

impl PartialEq for Middleware {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl Eq for Middleware {}

/// Drop repeated middleware, keeping the first occurrence of each identity.
pub(crate) fn dedup(middleware: &[Middleware]) -> Vec<Middleware> {
    let mut unique: Vec<Middleware> = Vec::with_capacity(middleware.len());
    for mw in middleware {
        if !unique.contains(mw) {
            unique.push(mw.clone());
        }
    }
    unique
}
