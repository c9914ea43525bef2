use crate::router::context::ResponseHandle;
use axum::body::Body;
use axum::response::Response;
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// What a handler hands back to the engine.
///
/// An explicit tagged result instead of probing the return value's runtime
/// shape: the author picks the kind, the engine dispatches on it.
pub enum Reply {
    /// An immediate value. Strings are sent as plain text, everything else
    /// as JSON.
    Value(Value),
    /// A pre-built response, sent as-is.
    Response(Response),
    /// A lazy byte source, piped straight into the response body.
    Stream(Box<dyn AsyncRead + Send + Unpin + 'static>),
    /// Nothing: the handler already wrote the response itself (or chose to
    /// send no body at all).
    Empty,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Value(Value::String(text.into()))
    }

    /// Serialize a value to be sent as JSON.
    pub fn json<T: Serialize>(value: &T) -> anyhow::Result<Self> {
        Ok(Self::Value(serde_json::to_value(value)?))
    }

    pub fn stream(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Stream(Box::new(reader))
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self::Value(Value::String(text))
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Self::Value(Value::String(text.to_string()))
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

/// Turn a handler's reply into the final response.
///
/// A response the handler already sent through the handle always wins; the
/// reply is only dispatched when nothing has been written yet.
pub(crate) fn dispatch(reply: Reply, res: &ResponseHandle) -> Response {
    if res.sent() {
        return res.render();
    }
    match reply {
        Reply::Response(response) => response,
        Reply::Value(value) => res.render_value(value),
        Reply::Stream(reader) => res.render_body(Body::from_stream(ReaderStream::new(reader))),
        Reply::Empty => res.render(),
    }
}
