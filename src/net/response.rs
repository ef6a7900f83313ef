//! Streaming HTTP response model.
//!
//! This struct represents an HTTP response as soon as its headers have been
//! received. It contains the final URL (after redirects, if the client
//! follows them), status code + reason, response headers, and the body as a
//! stream of byte chunks.
//!
//! ## Notes
//! - The body can be taken **once** with [`Response::take_body`]. Dropping
//!   the stream releases the underlying connection.
//! - `headers` is an `http::HeaderMap`, which is **case-insensitive** for
//!   header names and keeps repeated headers as separate values.
//! - `status_text` is typically derived from the status code’s canonical
//!   reason phrase and may be `"Unknown"` for non-standard codes.
//!
use crate::errors::NetError;
use futures::stream::LocalBoxStream;
use http::HeaderMap;

/// Body of a response, delivered chunk by chunk.
pub type BodyStream = LocalBoxStream<'static, Result<Vec<u8>, NetError>>;

/// Simple structure for HTTP responses.
///
/// All fields reflect the **received** response as-is; no additional parsing
/// or transformation is performed by this type.
pub struct Response {
    /// Final URL of the response (after redirects, if any).
    pub url: url::Url,

    /// Numeric HTTP status code (e.g., `200`, `404`).
    pub status: u16,

    /// Human-readable reason phrase (e.g., `"OK"`, `"Not Found"`).
    pub status_text: String,

    /// Response headers as a case-insensitive map.
    pub headers: HeaderMap,

    /// Body stream, `None` when the response has no body at all.
    pub body: Option<BodyStream>,
}

impl Response {
    /// Takes the body stream out of the response. Subsequent calls return `None`.
    pub fn take_body(&mut self) -> Option<BodyStream> {
        self.body.take()
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("url", &self.url.as_str())
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
