//! The inbound request as seen by interceptors and handlers.
//!
//! A [`Request`] is created once per HTTP exchange by the transport adapter and
//! shared by reference with every interceptor and the route handler. It owns two
//! extension maps:
//!
//! - **extensions**: attached by the server before dispatch (component lookup,
//!   connection info). Immutable once dispatch starts.
//! - **attributes**: request-scoped scratch space that interceptors write during
//!   `pre_handle` and read back in `after_completion` (start times, flags).

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri, header};
use parking_lot::Mutex;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An inbound request.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
    principal: Option<String>,
    extensions: Extensions,
    attributes: Mutex<Extensions>,
}

impl Request {
    /// Create a request from a method and a request target (`/path?query`).
    ///
    /// # Example
    ///
    /// ```rust
    /// use graft_core::Request;
    /// use http::Method;
    ///
    /// let request = Request::new(Method::GET, "/evilcontroller?cmd=echo+hi");
    /// assert_eq!(request.path(), "/evilcontroller");
    /// assert_eq!(request.param("cmd"), Some("echo hi"));
    /// ```
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        Self {
            method,
            path: normalize_path(path),
            query: parse_pairs(query.as_bytes()),
            form: Vec::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            principal: None,
            extensions: Extensions::new(),
            attributes: Mutex::new(Extensions::new()),
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    /// Build a request from transport-level parts.
    ///
    /// Form parameters are decoded from the body when the content type is
    /// `application/x-www-form-urlencoded`.
    pub fn from_parts(method: Method, uri: &Uri, headers: HeaderMap, body: Bytes) -> Self {
        let mut request = Self::new(method, uri.path());
        if let Some(query) = uri.query() {
            request.query = parse_pairs(query.as_bytes());
        }
        request.headers = headers;
        request.with_body(body)
    }

    /// Attach a body; form-encoded bodies are parsed into parameters.
    pub fn with_body(mut self, body: Bytes) -> Self {
        let is_form = self
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE));
        if is_form {
            self.form = parse_pairs(&body);
        }
        self.body = body;
        self
    }

    /// Attach a form-encoded body and set the matching content type.
    pub fn with_form(mut self, form: &str) -> Self {
        self.headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static(FORM_CONTENT_TYPE),
        );
        self.with_body(Bytes::copy_from_slice(form.as_bytes()))
    }

    /// Set the authenticated principal, as resolved by an upstream auth layer.
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The normalized request path, always starting with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Look up a request parameter. Query parameters take precedence over form
    /// parameters; the first occurrence wins.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .chain(self.form.iter())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the request headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The raw request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The principal identity, if an upstream layer authenticated the caller.
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Server-provided extensions.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable server-provided extensions. Only the server writes these, before
    /// dispatch starts.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Store a request-scoped attribute, replacing any previous value of the
    /// same type.
    pub fn set_attribute<T: Clone + Send + Sync + 'static>(&self, value: T) {
        self.attributes.lock().insert(value);
    }

    /// Read back a request-scoped attribute.
    pub fn attribute<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.attributes.lock().get::<T>().cloned()
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

fn parse_pairs(input: &[u8]) -> Vec<(String, String)> {
    form_urlencoded::parse(input).into_owned().collect()
}
