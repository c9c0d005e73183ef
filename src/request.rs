//! Incoming HTTP request view.
//!
//! A [`Request`] is built once per request from the transport parts and is
//! then read-only. Cloning it is cheap: handlers receive clones that share
//! the same parts.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Uri};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;
use crate::method::Method;
use crate::pattern::Params;

/// A query-string value. Repeated keys (`?tag=a&tag=b`) collect into
/// [`QueryValue::Many`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Many(Vec<String>),
}

impl QueryValue {
    /// The first value given for the key.
    pub fn first(&self) -> &str {
        match self {
            Self::Single(v) => v,
            Self::Many(vs) => vs.first().map_or("", String::as_str),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::Single(v) => std::slice::from_ref(v),
            Self::Many(vs) => vs,
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::Single(first) => *self = Self::Many(vec![std::mem::take(first), value]),
            Self::Many(vs) => vs.push(value),
        }
    }
}

#[derive(Clone)]
struct Parts {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path: String,
    query: HashMap<String, QueryValue>,
    body: Option<Value>,
    raw_body: Bytes,
}

/// An incoming HTTP request.
#[derive(Clone)]
pub struct Request {
    parts: Arc<Parts>,
    params: Arc<Params>,
}

impl Request {
    pub(crate) fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        let path = decode_path(uri.path());
        let query = uri.query().map(parse_query).unwrap_or_default();
        let parts = Parts {
            method,
            uri,
            headers,
            path,
            query,
            body: None,
            raw_body: Bytes::new(),
        };
        Self { parts: Arc::new(parts), params: Arc::default() }
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self::new(Method::Get, Uri::from_static("/"), HeaderMap::new())
    }

    /// Stores the decoded body. Only called before the request is shared.
    pub(crate) fn set_body(&mut self, raw: Bytes, value: Value) {
        let parts = Arc::make_mut(&mut self.parts);
        parts.raw_body = raw;
        parts.body = Some(value);
    }

    pub(crate) fn with_params(&self, params: Params) -> Self {
        Self { parts: Arc::clone(&self.parts), params: Arc::new(params) }
    }

    pub fn method(&self) -> Method { self.parts.method }
    pub fn uri(&self) -> &Uri { &self.parts.uri }
    pub fn headers(&self) -> &HeaderMap { &self.parts.headers }

    /// The percent-decoded path, without the query string.
    pub fn path(&self) -> &str { &self.parts.path }

    /// The path as it arrived on the wire, still percent-encoded.
    pub fn raw_path(&self) -> &str { self.parts.uri.path() }

    /// Case-insensitive header lookup. Non-UTF-8 values are reported as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// First value of a query parameter.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.parts.query.get(key).map(QueryValue::first)
    }

    /// Every value of a query parameter, in the order given.
    pub fn query_all(&self, key: &str) -> &[String] {
        self.parts.query.get(key).map_or(&[], QueryValue::as_slice)
    }

    pub fn queries(&self) -> &HashMap<String, QueryValue> { &self.parts.query }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `req.param("id")` on `/users/42` returns
    /// `Some("42")`. Params are empty until a parameterized route matched, so
    /// middleware never sees them.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &Params { &self.params }

    /// The decoded JSON body. `None` for methods without a body (GET, DELETE,
    /// …); an empty POST/PUT/PATCH body decodes to `{}`.
    pub fn body(&self) -> Option<&Value> { self.parts.body.as_ref() }

    /// The body bytes exactly as received.
    pub fn raw_body(&self) -> &[u8] { &self.parts.raw_body }

    /// Deserializes the body into `T`. A request without a body is treated
    /// as JSON `null`.
    pub fn parse_body<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let value = self.parts.body.as_ref().unwrap_or(&Value::Null);
        T::deserialize(value).map_err(Error::BadRequest)
    }
}

fn decode_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn parse_query(query: &str) -> HashMap<String, QueryValue> {
    let mut map = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match map.entry(key.into_owned()) {
            Entry::Vacant(e) => {
                e.insert(QueryValue::Single(value.into_owned()));
            }
            Entry::Occupied(mut e) => e.get_mut().push(value.into_owned()),
        }
    }
    map
}
