//! Raw inbound webhook request as handed to a provider for decoding.

use axum::body::Bytes;
use axum::http::HeaderMap;

/// Headers and untouched body of a webhook POST. Signature checks need the exact bytes.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(headers: HeaderMap, body: Bytes) -> Self {
        Self { headers, body }
    }

    /// Header value as UTF-8, if present and valid.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
