//! Per-request context handed to auth gates and the pipeline.

use std::convert::Infallible;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use uuid::Uuid;

/// Header used to echo or mint a request identifier.
pub const REQUEST_ID_HEADER: &str = "request-id";

/// Maximum length accepted for an inbound request id.
const MAX_REQUEST_ID_LENGTH: usize = 64;

/// Request ID for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub Arc<str>);

impl RequestId {
    /// Generate a new random request ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Echo the inbound header when it is usable, otherwise mint a fresh id.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.len() <= MAX_REQUEST_ID_LENGTH)
            .map(|s| Self(s.into()))
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the pipeline knows about the inbound request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub path: String,
    pub headers: HeaderMap,
    pub request_id: RequestId,
}

impl RequestContext {
    pub fn new(path: impl Into<String>, headers: HeaderMap) -> Self {
        let request_id = RequestId::from_headers(&headers);
        Self {
            path: path.into(),
            headers,
            request_id,
        }
    }

    /// Bearer token from the Authorization header, if any
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestContext::new(parts.uri.path(), parts.headers.clone()))
    }
}
