//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and the optional metrics exporter
//! - Bind listeners, then serve until a termination signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners are bound before the signal handler is installed

use std::net::SocketAddr;
use std::path::Path;

use tokio::sync::mpsc;

use crate::config::{load_config, ConfigError, ConfigWatcher};
use crate::http::server::{HttpServer, ServerError};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_handler;
use crate::net::listener::{BoundListeners, ListenerError};
use crate::observability::{logging, metrics};

/// Errors that stop the process before or while serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to watch config file: {0}")]
    Watch(#[from] notify::Error),
}

/// Run the server described by the config file at `config_path`.
pub async fn run(config_path: &Path, watch: bool) -> Result<(), StartupError> {
    let config = load_config(config_path)?;
    logging::init_logging(&config.observability);

    tracing::info!(
        config = %config_path.display(),
        environment = ?config.environment,
        https_address = %config.listener.https_address,
        http_address = %config.listener.http_address,
        tls = config.listener.tls.is_some(),
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listeners = BoundListeners::bind(&config.listener).await?;
    let server = HttpServer::new(config)?;

    // The watcher must outlive the server for reloads to keep flowing.
    let (_watcher, config_updates) = if watch {
        let (watcher, updates) = ConfigWatcher::new(config_path);
        (Some(watcher.run()?), updates)
    } else {
        let (_, updates) = mpsc::unbounded_channel();
        (None, updates)
    };

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    server.run(listeners, config_updates, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
