//! Response header policy for admitted hosts.
//!
//! # Responsibilities
//! - Stamp `Vary`, `Cache-Control` and `Strict-Transport-Security` on every
//!   response served for an admitted host
//! - Strip hop-by-hop headers from requests forwarded upstream
//!
//! # Design Decisions
//! - Applied after the handler runs so no handler can drop them
//! - Overwrites handler-provided values
//! - Never applied to forbidden-host responses

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

pub const VARY_VALUE: &str = "Accept-Encoding";
pub const CACHE_CONTROL_VALUE: &str = "public, max-age=7776000";
pub const HSTS_VALUE: &str = "max-age=15768000; includeSubDomains";

/// Headers that describe a single hop and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Apply the fixed policy headers.
pub fn apply_policy_headers(headers: &mut HeaderMap) {
    headers.insert(header::VARY, HeaderValue::from_static(VARY_VALUE));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
    headers.insert(header::STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS_VALUE));
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}
