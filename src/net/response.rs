//! Minimal HTTP response model.
//!
//! This struct represents a **fully buffered** HTTP response returned by a
//! [`Transport`](crate::net::Transport). It contains the final URL (after
//! redirects), status code + reason, response headers, and the raw body bytes.
//!
//! ## Notes
//! - Any status code is a completed request. A `404` still carries a body and is
//!   returned as success; callers that care check `status`.
//! - For text, use [`Response::text`], which honors the declared charset and then
//!   falls back through the usual encodings.
//! - `headers` is an `http::HeaderMap`, which is **case-insensitive** for
//!   header names.

use http::HeaderMap;

use crate::errors::NetError;
use crate::net::text::decode_response_body;

#[derive(Debug, Clone)]
pub struct Response {
    /// Final URL of the response (after redirects, if any).
    pub url: url::Url,

    /// Numeric HTTP status code (e.g., `200`, `404`).
    pub status: u16,

    /// Human-readable reason phrase (e.g., `"OK"`, `"Not Found"`).
    ///
    /// May be `"Unknown"` for non-standard codes.
    pub status_text: String,

    /// Response headers as a case-insensitive map.
    pub headers: HeaderMap,

    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl Response {
    /// Builds a `200 OK` response with no headers.
    pub fn ok(url: url::Url, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url,
            status: 200,
            status_text: "OK".to_string(),
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as text.
    pub fn text(&self) -> Result<String, NetError> {
        decode_response_body(&self.headers, &self.body)
    }
}
