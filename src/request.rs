//! Incoming HTTP request type and the transport-agnostic request seam.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};

/// A request as the dispatch cycle sees it, independent of transport.
///
/// The framework's dispatch machinery is written against this trait rather
/// than against [`Request`] directly, so a dispatch target can refuse
/// requests it does not understand. [`MiddlewareController`] only speaks
/// HTTP: it calls [`as_http`](DispatchRequest::as_http) and fails with
/// [`Error::UnexpectedRequest`](crate::Error::UnexpectedRequest) when the
/// downcast comes back empty.
///
/// [`MiddlewareController`]: crate::MiddlewareController
pub trait DispatchRequest: fmt::Debug {
    /// Short transport name used in error messages, e.g. `"http"`.
    fn kind(&self) -> &'static str;

    /// The HTTP view of this request, when it has one.
    fn as_http(&self) -> Option<&Request> {
        None
    }
}

/// An incoming HTTP request.
///
/// Built from hyper parts at the server edge, or synthetically via
/// [`Request::new`] for tests and in-process dispatch.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
}

impl Request {
    /// A synthetic request with no headers and an empty body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: HashMap::new(),
        }
    }

    pub(crate) fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params: HashMap::new(),
        }
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header lookup; `None` for absent headers and non-UTF-8 values.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns
    /// `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

impl DispatchRequest for Request {
    fn kind(&self) -> &'static str {
        "http"
    }

    fn as_http(&self) -> Option<&Request> {
        Some(self)
    }
}
