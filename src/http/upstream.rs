//! Forwarding to HTTP upstreams.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the upstream authority
//! - Strip hop-by-hop headers, add X-Forwarded-Host / X-Forwarded-Proto
//! - Relay the upstream response body without buffering
//!
//! # Design Decisions
//! - Upstreams are plain HTTP/1.1 regardless of the inbound protocol
//! - Upstream failures map to 502; the request deadline comes from the
//!   server's timeout layer

use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderName, HeaderValue, Request, StatusCode, Uri, Version};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::security::headers::strip_hop_by_hop;

pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Pooled client shared by all proxy routes.
pub type UpstreamClient = Client<HttpConnector, Body>;

pub fn build_client() -> UpstreamClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// Forward `request` to `upstream` and relay the response.
pub async fn forward(
    client: &UpstreamClient,
    upstream: &Authority,
    scheme: &str,
    host: &str,
    request: Request<Body>,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));

    parts.uri = match Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(upstream.clone())
        .path_and_query(path_and_query)
        .build()
    {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(upstream = %upstream, error = %e, "Failed to build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);
    if let Ok(value) = HeaderValue::from_str(host) {
        parts.headers.insert(X_FORWARDED_HOST, value);
    }
    if let Ok(value) = HeaderValue::from_str(scheme) {
        parts.headers.insert(X_FORWARDED_PROTO, value);
    }

    match client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::warn!(upstream = %upstream, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
