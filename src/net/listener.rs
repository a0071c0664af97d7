//! Listener binding and the concurrent listener set.
//!
//! # Responsibilities
//! - Bind the plain and secure addresses before any traffic is served
//! - Serve each listener on its own task with its own shutdown handle
//! - Drain all listeners together under one grace period
//!
//! # Design Decisions
//! - Binding is separate from serving so tests can hand in ephemeral ports
//! - A listener that stops on its own takes the whole set down

use std::io;
use std::net::{AddrParseError, SocketAddr, TcpListener};
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinSet};

use crate::config::ListenerConfig;
use crate::net::tls::{load_tls_config, TlsError};

/// Slack on top of the grace period before remaining tasks are abandoned.
const DRAIN_MARGIN: Duration = Duration::from_secs(1);

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("invalid address {address}: {source}")]
    Address { address: String, source: AddrParseError },

    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("{name} listener failed: {source}")]
    Serve { name: &'static str, source: io::Error },

    #[error("{0} listener exited before shutdown")]
    Exited(&'static str),

    #[error("listener task failed: {0}")]
    Join(#[from] JoinError),
}

/// Listeners bound at startup.
pub struct BoundListeners {
    /// Secure listener and its certificate, absent when TLS is not configured.
    pub secure: Option<(TcpListener, RustlsConfig)>,
    pub plain: TcpListener,
}

impl BoundListeners {
    /// Bind both configured addresses and load the certificate.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let secure = match &config.tls {
            Some(tls) => {
                let rustls = load_tls_config(&tls.cert_path, &tls.key_path).await?;
                Some((bind(&config.https_address).await?, rustls))
            }
            None => None,
        };
        let plain = bind(&config.http_address).await?;

        Ok(Self { secure, plain })
    }

    /// Wrap listeners that are already bound.
    pub fn from_std(plain: TcpListener, secure: Option<(TcpListener, RustlsConfig)>) -> Result<Self, ListenerError> {
        for listener in std::iter::once(&plain).chain(secure.as_ref().map(|(l, _)| l)) {
            listener.set_nonblocking(true).map_err(|source| ListenerError::Bind {
                address: addr_string(listener),
                source,
            })?;
        }
        Ok(Self { secure, plain })
    }
}

async fn bind(address: &str) -> Result<TcpListener, ListenerError> {
    let addr: SocketAddr = address.parse().map_err(|source| ListenerError::Address {
        address: address.to_string(),
        source,
    })?;

    let bind_err = |source| ListenerError::Bind { address: address.to_string(), source };
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(bind_err)?;
    let listener = listener.into_std().map_err(bind_err)?;

    tracing::info!(address = %addr_string(&listener), "Listener bound");
    Ok(listener)
}

fn addr_string(listener: &TcpListener) -> String {
    listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

type ListenerTask = (&'static str, io::Result<()>);

/// Running listeners, each with its own shutdown handle.
pub struct ListenerSet {
    tasks: JoinSet<ListenerTask>,
    handles: Vec<(&'static str, Handle)>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            handles: Vec::new(),
        }
    }

    /// Serve `app` over plain HTTP.
    pub fn spawn_plain(&mut self, name: &'static str, listener: TcpListener, app: Router) {
        let handle = self.register(name, &listener);
        let server = axum_server::from_tcp(listener).handle(handle);
        self.tasks.spawn(async move { (name, server.serve(app.into_make_service()).await) });
    }

    /// Serve `app` over TLS.
    pub fn spawn_tls(
        &mut self,
        name: &'static str,
        listener: TcpListener,
        tls: RustlsConfig,
        app: Router,
    ) {
        let handle = self.register(name, &listener);
        let server = axum_server::from_tcp_rustls(listener, tls).handle(handle);
        self.tasks.spawn(async move { (name, server.serve(app.into_make_service()).await) });
    }

    fn register(&mut self, name: &'static str, listener: &TcpListener) -> Handle {
        let handle = Handle::new();
        self.handles.push((name, handle.clone()));
        tracing::info!(listener = name, address = %addr_string(listener), "Serving");
        handle
    }

    /// Serve until `shutdown` fires or a listener stops on its own, then
    /// drain every listener with `grace` to finish in-flight requests.
    pub async fn run_until_shutdown(
        mut self,
        mut shutdown: broadcast::Receiver<()>,
        grace: Duration,
    ) -> Result<(), ListenerError> {
        let early = tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Shutdown signal received, draining listeners");
                None
            }
            Some(joined) = self.tasks.join_next() => Some(early_exit(joined)),
        };
        if let Some(e) = &early {
            tracing::error!(error = %e, "Listener stopped unexpectedly, shutting down the rest");
        }

        for (name, handle) in &self.handles {
            tracing::debug!(
                listener = name,
                connections = handle.connection_count(),
                "Graceful shutdown started"
            );
            handle.graceful_shutdown(Some(grace));
        }

        let drained = match tokio::time::timeout(grace + DRAIN_MARGIN, drain(&mut self.tasks)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    remaining = self.tasks.len(),
                    grace_secs = grace.as_secs(),
                    "Listeners did not close in time, abandoning them"
                );
                self.tasks.abort_all();
                Ok(())
            }
        };

        match early {
            Some(e) => Err(e),
            None => drained,
        }
    }
}

impl Default for ListenerSet {
    fn default() -> Self {
        Self::new()
    }
}

fn early_exit(joined: Result<ListenerTask, JoinError>) -> ListenerError {
    match joined {
        Ok((name, Ok(()))) => ListenerError::Exited(name),
        Ok((name, Err(source))) => ListenerError::Serve { name, source },
        Err(e) => ListenerError::Join(e),
    }
}

async fn drain(tasks: &mut JoinSet<ListenerTask>) -> Result<(), ListenerError> {
    let mut result = Ok(());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, Ok(()))) => tracing::info!(listener = name, "Listener closed"),
            Ok((name, Err(source))) => {
                tracing::error!(listener = name, error = %source, "Listener failed while draining");
                result = Err(ListenerError::Serve { name, source });
            }
            Err(e) => {
                tracing::error!(error = %e, "Listener task failed while draining");
                result = Err(ListenerError::Join(e));
            }
        }
    }
    result
}
