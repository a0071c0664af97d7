//! Response construction helpers.
//!
//! # Responsibilities
//! - Build the fixed forbidden, redirect and method-not-allowed responses
//! - Build absolute URLs on the current host
//!
//! # Design Decisions
//! - Redirect bodies are empty
//! - A location that cannot be a header value is a 400, never a panic

use axum::http::header::{ALLOW, LOCATION};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};

/// `403 Forbidden` for hosts outside the allow-list.
pub fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, "Forbidden").into_response()
}

/// Redirect with an empty body.
pub fn redirect(status: StatusCode, location: &str) -> Response {
    match HeaderValue::try_from(location) {
        Ok(value) => {
            let mut response = status.into_response();
            response.headers_mut().insert(LOCATION, value);
            response
        }
        Err(_) => {
            tracing::warn!(location = %location, "Refusing to redirect to invalid location");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

/// `405` listing the methods the path does accept.
pub fn method_not_allowed(allowed: &[Method]) -> Response {
    let mut response = StatusCode::METHOD_NOT_ALLOWED.into_response();
    let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
    if let Ok(value) = HeaderValue::try_from(allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

/// `scheme://host` followed by `path` (which starts with `/`).
pub fn absolute_url(scheme: &str, host: &str, path: &str) -> String {
    format!("{scheme}://{host}{path}")
}
