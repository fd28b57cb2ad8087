use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use std::convert::Infallible;

pub const HX_REQUEST: &str = "hx-request";

/// Whether the request was issued by htmx (`HX-Request: true`).
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// Extractor for the htmx request marker; never rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmxRequest(pub bool);

impl HtmxRequest {
    pub fn is_htmx(&self) -> bool {
        self.0
    }
}

impl<S> FromRequestParts<S> for HtmxRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(is_htmx(&parts.headers)))
    }
}
