//! The outbound response and conversions into it.

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

/// A response under construction.
///
/// Interceptors and handlers write into the same `Response` in turn. Nothing
/// is sent until dispatch finishes, so a post-hook can still rewrite headers.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// An empty `200 OK` response.
    pub fn new() -> Self {
        Self::with_status(StatusCode::OK)
    }

    /// An empty response with the given status.
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    /// The current status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Replace the status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Set a header, replacing existing values.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Append a header value, keeping existing ones.
    pub fn add_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    /// Append bytes to the body verbatim.
    pub fn write(&mut self, data: impl AsRef<[u8]>) {
        self.body.extend_from_slice(data.as_ref());
    }

    /// Append a line of text followed by `\n`.
    pub fn write_line(&mut self, line: impl AsRef<str>) {
        self.write(line.as_ref());
        self.write("\n");
    }

    /// The body written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Replace status and body with a plain diagnostic message.
    pub fn fail(&mut self, status: StatusCode, message: impl AsRef<str>) {
        self.status = status;
        self.body.clear();
        self.write(message.as_ref());
    }

    /// Split into status, headers and the frozen body.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body.freeze())
    }
}

/// Trait for values a handler can write into a [`Response`].
///
/// # Default Implementations
///
/// - `()` → Leave the response untouched
/// - `&'static str`, `String` → Append to the body
/// - `(StatusCode, T)` → Set the status, then write `T`
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `IntoResponse`",
    label = "missing `IntoResponse` implementation",
    note = "IntoResponse must implement the `into_response` method."
)]
pub trait IntoResponse {
    /// Write `self` into the response.
    fn into_response(self, response: &mut Response);
}

impl IntoResponse for () {
    fn into_response(self, _response: &mut Response) {}
}

impl IntoResponse for &'static str {
    fn into_response(self, response: &mut Response) {
        response.write(self);
    }
}

impl IntoResponse for String {
    fn into_response(self, response: &mut Response) {
        response.write(self);
    }
}

impl<T: IntoResponse> IntoResponse for (StatusCode, T) {
    fn into_response(self, response: &mut Response) {
        response.set_status(self.0);
        self.1.into_response(response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_appends_verbatim() {
        let mut response = Response::new();
        response.write(b"hi\n");
        response.write_line("there");
        assert_eq!(response.body(), b"hi\nthere\n");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_fail_replaces_body_keeps_headers() {
        let mut response = Response::new();
        response.set_header(
            HeaderName::from_static("x-test"),
            HeaderValue::from_static("1"),
        );
        response.write("partial");
        response.fail(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(response.body(), b"boom");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key("x-test"));
    }

    #[test]
    fn test_into_response_tuple() {
        let mut response = Response::new();
        (StatusCode::CREATED, "made").into_response(&mut response);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body(), b"made");
    }
}
