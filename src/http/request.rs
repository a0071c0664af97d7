//! Request inspection and request IDs.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Extract the host used for admission (Host header, or the URI
//!   authority for HTTP/2)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A Host header that is present but unreadable is not replaced by the
//!   URI authority; it fails admission

use axum::http::header::HOST;
use axum::http::{HeaderName, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        id.parse().ok().map(RequestId::new)
    }
}

/// The host value a request is admitted by.
pub fn request_host<B>(request: &Request<B>) -> Option<&str> {
    match request.headers().get(HOST) {
        Some(value) => crate::security::hosts::host_str(value),
        None => request.uri().authority().map(|a| a.as_str()),
    }
}

/// The request ID assigned by the request-id layer, for log fields.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
