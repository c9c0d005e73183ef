//! Outgoing HTTP response handle.
//!
//! Every handler in a request's pipeline receives a clone of the same
//! [`Response`]. Chainable helpers (`status`, `header`) shape it; a terminal
//! helper (`send`, `json`, `end`) finalizes it, after which the pipeline
//! stops and the response is written to the client.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::Error;

/// Body type of every response spur produces.
pub type ResponseBody = UnsyncBoxBody<Bytes, std::io::Error>;

const HTML: &str = "text/html";
const JSON: &str = "application/json";

// ── Payload ───────────────────────────────────────────────────────────────────

/// A body passed to [`Response::send`].
///
/// Text is sent as `text/html`; structured data is serialized and sent as
/// `application/json`. A JSON string value counts as text.
#[derive(Debug)]
pub enum Payload {
    Text(String),
    Data(Value),
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for Payload {
    fn from(s: String) -> Self { Self::Text(s) }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => Self::Text(s),
            other => Self::Data(other),
        }
    }
}

// ── Response ──────────────────────────────────────────────────────────────────

struct State {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<ResponseBody>,
}

/// The response under construction for one request.
///
/// ```rust
/// use spur::{Error, Request, Response, StatusCode};
///
/// async fn create(_req: Request, res: Response) -> Result<(), Error> {
///     res.status(StatusCode::CREATED)
///         .header("location", "/data/1")
///         .send("Data received")
/// }
/// ```
#[derive(Clone)]
pub struct Response {
    state: Arc<Mutex<State>>,
}

impl Response {
    pub(crate) fn new() -> Self {
        let state = State { status: StatusCode::OK, headers: HeaderMap::new(), body: None };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the status code. Defaults to `200 OK`.
    pub fn status(&self, code: StatusCode) -> &Self {
        self.state().status = code;
        self
    }

    /// Sets a header, replacing any previous value. Invalid names or values
    /// are dropped with a warning.
    pub fn header(&self, name: &str, value: &str) -> &Self {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.state().headers.insert(name, value);
            }
            _ => warn!(header = name, "dropping invalid response header"),
        }
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.state().status
    }

    /// `true` once a terminal helper has been called.
    pub fn is_sent(&self) -> bool {
        self.state().body.is_some()
    }

    /// Finalizes the response with `body`, inferring the content type from
    /// its kind (see [`Payload`]).
    pub fn send(&self, body: impl Into<Payload>) -> Result<(), Error> {
        match body.into() {
            Payload::Text(text) => self.finish(HTML, Bytes::from(text)),
            Payload::Data(value) => self.json(&value),
        }
    }

    /// Finalizes the response with `body` serialized as JSON, whatever its type.
    pub fn json<T: Serialize + ?Sized>(&self, body: &T) -> Result<(), Error> {
        let bytes = serde_json::to_vec(body).map_err(Error::Json)?;
        self.finish(JSON, Bytes::from(bytes))
    }

    /// Finalizes the response with an empty body.
    pub fn end(&self) -> Result<(), Error> {
        self.finish_with(None, Empty::new().map_err(|never| match never {}).boxed_unsync())
    }

    fn finish(&self, content_type: &'static str, bytes: Bytes) -> Result<(), Error> {
        let body = Full::new(bytes).map_err(|never| match never {}).boxed_unsync();
        self.finish_with(Some(content_type), body)
    }

    /// Finalizes the response with a streaming body.
    pub(crate) fn finish_with(
        &self,
        content_type: Option<&'static str>,
        body: ResponseBody,
    ) -> Result<(), Error> {
        let mut state = self.state();
        if state.body.is_some() {
            return Err(Error::AlreadySent);
        }
        if let Some(ct) = content_type {
            state.headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
        }
        state.body = Some(body);
        Ok(())
    }

    /// Discards everything set so far and finalizes with `code` and a short
    /// text body. Used by the dispatcher for framework-generated errors.
    pub(crate) fn replace(&self, code: StatusCode, message: &'static str) {
        let mut state = self.state();
        state.status = code;
        state.headers.clear();
        state.headers.insert(CONTENT_TYPE, HeaderValue::from_static(HTML));
        state.body = Some(Full::new(Bytes::from_static(message.as_bytes()))
            .map_err(|never| match never {})
            .boxed_unsync());
    }

    /// Converts into the transport response. A response nobody finalized is
    /// sent with its current status and an empty body.
    pub(crate) fn into_http(self) -> http::Response<ResponseBody> {
        let mut state = self.state();
        let body = state
            .body
            .take()
            .unwrap_or_else(|| Empty::new().map_err(|never| match never {}).boxed_unsync());

        let mut response = http::Response::new(body);
        *response.status_mut() = state.status;
        *response.headers_mut() = std::mem::take(&mut state.headers);
        response
    }
}
