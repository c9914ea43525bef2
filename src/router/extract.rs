use crate::router::context::{Next, RequestCtx, ResponseHandle};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Where a handler argument is pulled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    Request,
    Response,
    Next,
    PathParams,
    Query,
    Body,
    Cookies,
    Headers,
    Context,
}

/// One declared handler argument: the source kind, an optional sub-key into
/// it, and the positional slot it fills.
#[derive(Debug, Clone)]
pub struct ParamBinding {
    pub source: ParamSource,
    pub name: Option<String>,
    pub index: usize,
    pub member: String,
}

/// A single extracted handler argument.
#[derive(Clone)]
pub enum Arg {
    Request(Arc<RequestCtx>),
    Response(ResponseHandle),
    Next(Next),
    Value(Value),
    Unset,
}

/// The positional argument array a handler is invoked with.
pub struct Args(Vec<Arg>);

impl Args {
    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.0.get(index)
    }

    /// The data value at `index`, if the slot holds one.
    pub fn value(&self, index: usize) -> Option<&Value> {
        match self.0.get(index) {
            Some(Arg::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// The string value at `index`; `None` for non-string slots.
    pub fn string(&self, index: usize) -> Option<String> {
        match self.value(index) {
            Some(Value::String(text)) => Some(text.clone()),
            _ => None,
        }
    }

    /// Deserialize the value at `index` into a concrete type.
    pub fn json<T: DeserializeOwned>(&self, index: usize) -> Option<T> {
        self.value(index)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn request(&self, index: usize) -> Option<Arc<RequestCtx>> {
        match self.0.get(index) {
            Some(Arg::Request(ctx)) => Some(Arc::clone(ctx)),
            _ => None,
        }
    }

    pub fn response(&self, index: usize) -> Option<ResponseHandle> {
        match self.0.get(index) {
            Some(Arg::Response(res)) => Some(res.clone()),
            _ => None,
        }
    }

    pub fn next(&self, index: usize) -> Option<Next> {
        match self.0.get(index) {
            Some(Arg::Next(next)) => Some(next.clone()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Build the positional argument array for a handler invocation.
///
/// With no binding metadata at all the handler receives the three ambient
/// objects `[request, response, next]`. An empty binding list is not the
/// same thing: it yields an empty argument array. Bindings are applied in
/// declaration order, so a later binding for the same slot wins; slots no
/// binding covers stay [`Arg::Unset`].
pub fn extract_args(
    ctx: &Arc<RequestCtx>,
    res: &ResponseHandle,
    next: &Next,
    bindings: Option<&[ParamBinding]>,
) -> Args {
    let Some(bindings) = bindings else {
        return Args(vec![
            Arg::Request(Arc::clone(ctx)),
            Arg::Response(res.clone()),
            Arg::Next(next.clone()),
        ]);
    };

    let mut slots: Vec<Arg> = Vec::new();
    for binding in bindings {
        if slots.len() <= binding.index {
            slots.resize_with(binding.index + 1, || Arg::Unset);
        }
        slots[binding.index] = match binding.source {
            ParamSource::Request | ParamSource::Context => match &binding.name {
                Some(name) => Arg::Value(ctx.lookup(name)),
                None => Arg::Request(Arc::clone(ctx)),
            },
            ParamSource::Response => Arg::Response(res.clone()),
            ParamSource::Next => Arg::Next(next.clone()),
            ParamSource::PathParams => named_or_all(ctx.params_value(), binding.name.as_deref()),
            ParamSource::Query => named_or_all(ctx.query_value(), binding.name.as_deref()),
            ParamSource::Body => named_or_all(ctx.body_value(), binding.name.as_deref()),
            ParamSource::Cookies => named_or_all(ctx.cookies_value(), binding.name.as_deref()),
            ParamSource::Headers => named_or_all(ctx.headers_value(), binding.name.as_deref()),
        };
    }
    Args(slots)
}

fn named_or_all(source: Value, name: Option<&str>) -> Arg {
    match name {
        Some(name) => Arg::Value(source.get(name).cloned().unwrap_or(Value::Null)),
        None => Arg::Value(source),
    }
}
