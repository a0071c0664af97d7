//! Plain-HTTP listener: upgrade to HTTPS, answer ACME challenges.
//!
//! # Responsibilities
//! - Redirect requests for allowed hostnames to the HTTPS origin
//! - Serve `/.well-known/acme-challenge/*` without redirecting
//!
//! # Design Decisions
//! - Admission here ignores the port: clients reach this listener on a
//!   different port than the allow-list entries name
//! - Unknown hosts get 403, never a redirect

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::files::serve::serve_file;
use crate::http::request::request_host;
use crate::http::response::{absolute_url, forbidden, redirect};
use crate::http::snapshot::SharedSnapshot;
use crate::security::hosts::strip_port;

pub const ACME_CHALLENGE_PREFIX: &str = "/.well-known/acme-challenge/";

const DEFAULT_HTTPS_PORT: u16 = 443;

/// State for the redirect handler.
#[derive(Clone)]
pub struct RedirectState {
    pub snapshot: SharedSnapshot,
    /// Port clients use to reach the secure listener.
    pub https_port: u16,
}

/// Router for the plain listener when TLS is configured.
pub fn redirect_router(state: RedirectState) -> Router {
    Router::new()
        .route("/", any(redirect_handler))
        .route("/{*path}", any(redirect_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn redirect_handler(State(state): State<RedirectState>, request: Request<Body>) -> Response {
    let snapshot = state.snapshot.load_full();

    if let Some(token) = request.uri().path().strip_prefix(ACME_CHALLENGE_PREFIX) {
        let Some(root) = &snapshot.challenge_root else {
            return StatusCode::NOT_FOUND.into_response();
        };
        return match root.open(token).await {
            Ok(file) => {
                tracing::info!(token = %token, "Serving ACME challenge");
                serve_file(&file, request).await
            }
            Err(e) => {
                tracing::debug!(token = %token, error = %e, "ACME challenge not found");
                StatusCode::NOT_FOUND.into_response()
            }
        };
    }

    let Some(hostname) = request_host(&request).map(strip_port) else {
        return forbidden();
    };
    if !snapshot.policy.allowed().admits_hostname(hostname) {
        tracing::info!(host = %hostname, "Plain request for unknown host refused");
        return forbidden();
    }

    let authority = if state.https_port == DEFAULT_HTTPS_PORT {
        hostname.to_string()
    } else {
        format!("{hostname}:{}", state.https_port)
    };
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    redirect(
        StatusCode::MOVED_PERMANENTLY,
        &absolute_url("https", &authority, path_and_query),
    )
}
