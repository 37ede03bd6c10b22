use super::request::HeaderVec;
use http::StatusCode;
use std::sync::Arc;

pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// The single response produced for one dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A response with no headers and an empty body.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_body(status: StatusCode, content_type: &str, body: Vec<u8>) -> Self {
        let mut response = Self::new(status);
        response.set_header("content-type", content_type.to_string());
        response.body = body;
        response
    }

    /// A `text/plain` response carrying `message`.
    #[must_use]
    pub fn text(status: StatusCode, message: &str) -> Self {
        Self::with_body(status, TEXT_PLAIN_UTF8, message.as_bytes().to_vec())
    }

    /// Get a header by name
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Body as UTF-8, if it is valid UTF-8
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Status line reason phrase
    #[must_use]
    pub fn reason(&self) -> &'static str {
        status_reason(self.status)
    }
}

pub fn status_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// Outbound response channel provided by the host.
pub trait ResponseSink {
    /// Called exactly once per dispatched request.
    fn send(&mut self, response: HttpResponse);
}

impl ResponseSink for Option<HttpResponse> {
    fn send(&mut self, response: HttpResponse) {
        *self = Some(response);
    }
}

impl ResponseSink for Vec<HttpResponse> {
    fn send(&mut self, response: HttpResponse) {
        self.push(response);
    }
}
