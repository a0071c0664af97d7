//! File responses.
//!
//! # Responsibilities
//! - Stream file bytes with content type, length and conditional/range support
//! - Serve the fixed 404 page for anything that cannot be served
//! - Run the hotlink guard in front of static assets
//!
//! # Design Decisions
//! - File bodies are streamed by `tower-http`'s `ServeFile`; the file handle
//!   lives in the response body and is released when the body is dropped
//! - Filesystem errors never propagate to the client; they become the 404 page

use std::path::Path;

use axum::body::Body;
use axum::http::header::{CONNECTION, REFERER};
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::files::guard::FileKind;
use crate::files::StaticSite;
use crate::http::response::{absolute_url, redirect};
use crate::observability::metrics;
use crate::security::hosts::ReferrerAllowList;
use crate::security::hotlink::{check_referer, RefererVerdict};

const FALLBACK_NOT_FOUND: &str = "404 page not found";

/// Serve one file, honouring the request's method and conditional headers.
pub async fn serve_file(path: &Path, request: Request<Body>) -> Response {
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

/// Serve a file, falling back to the 404 page if it vanished.
pub async fn serve_or_not_found(path: &Path, request: Request<Body>, not_found_page: &Path) -> Response {
    let method = request.method().clone();
    let response = serve_file(path, request).await;
    if response.status() == StatusCode::NOT_FOUND {
        not_found(not_found_page, &method).await
    } else {
        response
    }
}

/// The fixed 404 page, with status 404. Falls back to plain text if the page
/// itself is missing.
pub async fn not_found(page: &Path, method: &Method) -> Response {
    let mut request = Request::new(Body::empty());
    if method == Method::HEAD {
        *request.method_mut() = Method::HEAD;
    }

    let mut response = serve_file(page, request).await;
    if response.status().is_success() {
        *response.status_mut() = StatusCode::NOT_FOUND;
        response
    } else {
        tracing::debug!(page = %page.display(), "404 page unavailable, using fallback");
        (StatusCode::NOT_FOUND, FALLBACK_NOT_FOUND).into_response()
    }
}

/// The static sub-handler: traversal guard, existence/directory checks,
/// hotlink guard, then the file bytes.
pub async fn serve_static(
    site: &StaticSite,
    referrers: &ReferrerAllowList,
    scheme: &str,
    host: &str,
    sub_path: &str,
    request: Request<Body>,
) -> Response {
    let resolved = match site.root.resolve(sub_path).await {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::warn!(host = %host, path = %sub_path, error = %e, "Static path rejected");
            return not_found(&site.not_found_page, request.method()).await;
        }
    };

    if resolved.kind != FileKind::File {
        tracing::debug!(host = %host, path = %sub_path, kind = ?resolved.kind, "Static path not servable");
        return not_found(&site.not_found_page, request.method()).await;
    }

    match check_referer(referrers, request.headers().get(REFERER), site.allow_missing_referer) {
        RefererVerdict::Permitted => {
            tracing::debug!(host = %host, path = %sub_path, "Serving static file");
            serve_or_not_found(&resolved.path, request, &site.not_found_page).await
        }
        RefererVerdict::Rejected(reason) => {
            tracing::info!(
                host = %host,
                path = %sub_path,
                reason = reason.as_str(),
                "Hotlink rejected"
            );
            metrics::record_hotlink_rejected(reason.as_str());

            let location = absolute_url(scheme, host, &site.rejected_path);
            let mut response = redirect(StatusCode::MOVED_PERMANENTLY, &location);
            response
                .headers_mut()
                .insert(CONNECTION, HeaderValue::from_static("close"));
            response
        }
    }
}
