//! HTTP server setup and the muxer entry point.
//!
//! # Responsibilities
//! - Create Axum Routers for the muxer and the plain-HTTP redirector
//! - Wire up middleware (tracing, request ID)
//! - Admit requests by host, stamp the header policy, dispatch
//! - Run both listeners until shutdown, applying config reloads

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::files::serve::{not_found, serve_or_not_found, serve_static};
use crate::http::request::{request_host, request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::{absolute_url, forbidden, method_not_allowed, redirect};
use crate::http::snapshot::{self, MuxSnapshot, SharedSnapshot};
use crate::http::upstream::{self, UpstreamClient};
use crate::net::listener::{BoundListeners, ListenerSet};
use crate::net::redirect::{redirect_router, RedirectState};
use crate::observability::metrics;
use crate::routing::{Handler, Lookup};
use crate::security::headers::apply_policy_headers;
use crate::security::Admission;

/// Error type for running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid route table: {0}")]
    Routes(#[from] crate::routing::RouteError),

    #[error("listener failed: {0}")]
    Listener(#[from] crate::net::listener::ListenerError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub snapshot: SharedSnapshot,
    pub client: UpstreamClient,
    /// Scheme clients used to reach the muxer.
    pub scheme: &'static str,
    /// Deadline for producing a response once a request is admitted.
    pub request_timeout: Duration,
}

/// HTTP server for the muxer.
pub struct HttpServer {
    config: ServerConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let snapshot = snapshot::shared(MuxSnapshot::from_config(&config)?);
        let scheme = if config.listener.tls.is_some() { "https" } else { "http" };

        let state = AppState {
            snapshot,
            client: upstream::build_client(),
            scheme,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        Ok(Self { config, state })
    }

    /// The muxer application with all middleware layers.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", any(mux_handler))
            .route("/{*path}", any(mux_handler))
            .with_state(self.state.clone())
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Handle to the live snapshot, for reloads and inspection.
    pub fn snapshot(&self) -> SharedSnapshot {
        self.state.snapshot.clone()
    }

    /// Run the server on the given listeners until `shutdown` fires.
    ///
    /// With TLS the secure listener serves the muxer and the plain listener
    /// redirects; without TLS the plain listener serves the muxer directly.
    pub async fn run(
        self,
        listeners: BoundListeners,
        config_updates: mpsc::UnboundedReceiver<ServerConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        let app = self.router();

        let mut set = ListenerSet::new();
        let BoundListeners { secure, plain } = listeners;
        match secure {
            Some((listener, tls)) => {
                let https_port = self
                    .config
                    .listener
                    .public_https_port
                    .unwrap_or_else(|| listener.local_addr().map(|a| a.port()).unwrap_or(443));
                let redirector = redirect_router(RedirectState {
                    snapshot: self.snapshot(),
                    https_port,
                });
                set.spawn_tls("https", listener, tls, app);
                set.spawn_plain("http", plain, redirector);
            }
            None => {
                tracing::warn!("No TLS configured; serving the muxer over plain HTTP");
                tracing::warn!(
                    "Static assets require an https Referer; pages served over plain HTTP cannot embed them"
                );
                set.spawn_plain("http", plain, app);
            }
        }

        tokio::spawn(snapshot::apply_updates(
            self.snapshot(),
            self.config.listener.clone(),
            config_updates,
        ));

        set.run_until_shutdown(shutdown, grace).await?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Entry point for every request: admission, header policy, dispatch.
async fn mux_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let snapshot = state.snapshot.load_full();

    let host = match snapshot.policy.admit(request_host(&request)) {
        Admission::Admitted(host) => host.to_string(),
        Admission::Forbidden => {
            tracing::info!(
                request_id = %request_id(&request),
                host = ?request_host(&request),
                path = %request.uri().path(),
                decision = "forbidden",
                "Request refused"
            );
            metrics::record_request("forbidden", StatusCode::FORBIDDEN.as_u16(), start_time);
            return forbidden();
        }
    };

    let id = request_id(&request).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let handled = async {
        match snapshot.dev_redirect_for(&host) {
            Some(target) => {
                tracing::debug!(host = %host, target = %target, "Development redirect");
                redirect(StatusCode::FOUND, &absolute_url(state.scheme, &host, target))
            }
            None => dispatch(&state, &snapshot, &host, request).await,
        }
    };

    // The deadline lives here rather than in a layer so a 408 still gets
    // the header policy below.
    let mut response = match tokio::time::timeout(state.request_timeout, handled).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(request_id = %id, host = %host, path = %path, "Request deadline exceeded");
            StatusCode::REQUEST_TIMEOUT.into_response()
        }
    };

    apply_policy_headers(response.headers_mut());

    tracing::info!(
        request_id = %id,
        host = %host,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        decision = "admitted",
        "Request served"
    );
    metrics::record_request("admitted", response.status().as_u16(), start_time);
    response
}

/// Route-table dispatch for an admitted request.
async fn dispatch(state: &AppState, snapshot: &MuxSnapshot, host: &str, request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();

    let matched = match snapshot.routes.lookup(request.method(), &path) {
        Lookup::Matched(matched) => matched,
        Lookup::MethodNotAllowed(allowed) => return method_not_allowed(&allowed),
        Lookup::NotFound => {
            tracing::debug!(host = %host, path = %path, "No route matched");
            return not_found(&snapshot.site.not_found_page, request.method()).await;
        }
    };
    let capture = matched.capture.unwrap_or("/");

    match &matched.route.handler {
        Handler::Static => {
            serve_static(
                &snapshot.site,
                snapshot.policy.referrers(),
                state.scheme,
                host,
                capture,
                request,
            )
            .await
        }
        Handler::Directory(root) => match root.open(capture).await {
            Ok(file) => serve_or_not_found(&file, request, &snapshot.site.not_found_page).await,
            Err(e) => {
                tracing::debug!(route = %matched.route.name, path = %capture, error = %e, "Directory route miss");
                not_found(&snapshot.site.not_found_page, request.method()).await
            }
        },
        Handler::File(file) => serve_or_not_found(file, request, &snapshot.site.not_found_page).await,
        Handler::Redirect { location, status } => redirect(*status, location),
        Handler::Proxy(upstream) => {
            upstream::forward(&state.client, upstream, state.scheme, host, request).await
        }
    }
}
