// SPDX-License-Identifier: MIT OR Apache-2.0

//! Correlation ids.

use std::fmt::Display;

use http::HeaderMap;
use uuid::Uuid;

use super::TRACE_ID_HEADER;

/// A request's correlation id.
///
/// Either taken verbatim from an inbound [`TRACE_ID_HEADER`], or generated as
/// 32 lowercase hex characters.
///
/// ```rust
/// use http::HeaderMap;
/// use tracewise::TraceId;
///
/// let generated = TraceId::generate();
/// assert_eq!(generated.as_str().len(), 32);
///
/// let mut headers = HeaderMap::new();
/// assert_eq!(TraceId::from_headers(&headers), None);
/// headers.insert("x-trace-id", "abc123".parse().unwrap());
/// assert_eq!(TraceId::from_headers(&headers).unwrap().as_str(), "abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceId(String);

impl TraceId {
    /// A fresh id from a random v4 UUID, without separators.
    pub fn generate() -> Self {
        TraceId(Uuid::new_v4().simple().to_string())
    }

    /// The inbound id, when the header is present, valid UTF-8 and not blank.
    ///
    /// Whitespace-only values count as blank. Non-blank values are kept as
    /// they are, surrounding whitespace included.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.trim().is_empty())
            .map(|s| TraceId(s.to_string()))
    }

    /// The inbound id if there is a usable one, otherwise a fresh one.
    pub fn from_headers_or_generate(headers: &HeaderMap) -> Self {
        Self::from_headers(headers).unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TraceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<TraceId> for String {
    fn from(id: TraceId) -> Self {
        id.0
    }
}
