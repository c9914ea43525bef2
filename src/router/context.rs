use axum::body::{Body, Bytes, to_bytes};
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Request bodies larger than this abort the request.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Immutable per-request view handed to middleware and handler arguments.
pub struct RequestCtx {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    cookies: HashMap<String, String>,
    body: Bytes,
    body_json: Option<Value>,
}

impl RequestCtx {
    pub(crate) async fn read(
        params: HashMap<String, String>,
        request: Request,
    ) -> anyhow::Result<Self> {
        let (parts, body) = request.into_parts();
        // Query strings that fail to parse behave as if absent.
        let query = parts
            .uri
            .query()
            .and_then(|raw| serde_urlencoded::from_str::<HashMap<String, String>>(raw).ok())
            .unwrap_or_default();
        let cookies = parse_cookies(&parts.headers);
        let body = to_bytes(body, BODY_LIMIT).await?;
        let body_json = if is_json(&parts.headers) && !body.is_empty() {
            Some(serde_json::from_slice(&body)?)
        } else {
            None
        };

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            params,
            query,
            cookies,
            body,
            body_json,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn url(&self) -> String {
        self.uri.to_string()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn body_json(&self) -> Option<&Value> {
        self.body_json.as_ref()
    }

    pub(crate) fn params_value(&self) -> Value {
        string_map_value(&self.params)
    }

    pub(crate) fn query_value(&self) -> Value {
        string_map_value(&self.query)
    }

    pub(crate) fn cookies_value(&self) -> Value {
        string_map_value(&self.cookies)
    }

    pub(crate) fn headers_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.headers {
            if let Ok(text) = value.to_str() {
                map.insert(name.as_str().to_string(), Value::String(text.to_string()));
            }
        }
        Value::Object(map)
    }

    pub(crate) fn body_value(&self) -> Value {
        self.body_json.clone().unwrap_or(Value::Null)
    }

    /// Named lookup on the request itself; only a few well-known fields
    /// exist, everything else is null.
    pub(crate) fn lookup(&self, name: &str) -> Value {
        match name {
            "method" => Value::String(self.method.as_str().to_string()),
            "path" => Value::String(self.path().to_string()),
            "url" => Value::String(self.url()),
            _ => Value::Null,
        }
    }
}

fn string_map_value(map: &HashMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect(),
    )
}

fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    let Some(raw) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) else {
        return cookies;
    };
    for pair in raw.split(';') {
        if let Some((name, value)) = pair.split_once('=') {
            cookies.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    cookies
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"))
}

struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
    sent: bool,
}

/// Shared mutable response state, the `res` ambient object.
///
/// Middleware and handlers may set the status, add headers, or write the
/// body outright; `send_*` marks the response as written, which makes the
/// engine skip its own reply dispatch.
#[derive(Clone)]
pub struct ResponseHandle {
    state: Arc<Mutex<ResponseState>>,
}

impl ResponseHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ResponseState {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: None,
                sent: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ResponseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_status(&self, status: StatusCode) {
        self.lock().status = status;
    }

    pub fn status(&self) -> StatusCode {
        self.lock().status
    }

    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.lock().headers.insert(name, value);
    }

    /// Write a plain-text body and mark the response as sent.
    pub fn send_text(&self, text: impl Into<String>) {
        let mut state = self.lock();
        state
            .headers
            .entry(header::CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("text/plain; charset=utf-8"));
        state.body = Some(Bytes::from(text.into()));
        state.sent = true;
    }

    /// Write a JSON body and mark the response as sent.
    pub fn send_json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let encoded = serde_json::to_vec(value)?;
        let mut state = self.lock();
        state
            .headers
            .entry(header::CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));
        state.body = Some(Bytes::from(encoded));
        state.sent = true;
        Ok(())
    }

    /// Whether something already wrote this response.
    pub fn sent(&self) -> bool {
        self.lock().sent
    }

    /// Build the response from the accumulated state.
    pub(crate) fn render(&self) -> Response {
        let state = self.lock();
        let body = state.body.clone().map(Body::from).unwrap_or_else(Body::empty);
        (state.status, state.headers.clone(), body).into_response()
    }

    /// Build a response around `body`, keeping the accumulated status and
    /// headers.
    pub(crate) fn render_body(&self, body: Body) -> Response {
        let state = self.lock();
        (state.status, state.headers.clone(), body).into_response()
    }

    /// Send a handler return value: strings go out as plain text, anything
    /// else as JSON. Headers already set on the handle win.
    pub(crate) fn render_value(&self, value: Value) -> Response {
        let state = self.lock();
        match value {
            Value::String(text) => (state.status, state.headers.clone(), text).into_response(),
            other => {
                (state.status, state.headers.clone(), axum::Json(other)).into_response()
            }
        }
    }
}

impl Default for ResponseHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// The next-equivalent ambient object.
///
/// A handler that wants the terminal error responder to take over deposits
/// the error here instead of returning it; the compiled route checks the
/// slot after the handler completes.
#[derive(Clone, Default)]
pub struct Next {
    error: Arc<Mutex<Option<anyhow::Error>>>,
}

impl Next {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forward(&self, err: impl Into<anyhow::Error>) {
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = Some(err.into());
    }

    pub fn forwarded(&self) -> bool {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub(crate) fn take(&self) -> Option<anyhow::Error> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
