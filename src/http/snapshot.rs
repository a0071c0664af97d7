//! Immutable muxer configuration, published atomically.
//!
//! Readers call [`ArcSwap::load_full`] once per request and keep that
//! snapshot for admission and dispatch. A reload builds a complete new
//! snapshot and publishes it with a single store; no request ever sees a
//! half-applied configuration and no lock is held while serving.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::mpsc;

use crate::config::{Environment, ListenerConfig, ServerConfig};
use crate::files::{GuardedRoot, StaticSite};
use crate::observability::metrics;
use crate::routing::{RouteError, RouteTable};
use crate::security::HostPolicy;

/// Shared handle to the current snapshot.
pub type SharedSnapshot = Arc<ArcSwap<MuxSnapshot>>;

/// Development-only redirect of one host to a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevRedirect {
    pub host: String,
    pub path: String,
}

/// Everything a request needs, frozen.
#[derive(Debug, Clone)]
pub struct MuxSnapshot {
    pub environment: Environment,
    pub policy: HostPolicy,
    pub routes: RouteTable,
    pub site: StaticSite,
    pub dev_redirect: Option<DevRedirect>,
    pub challenge_root: Option<GuardedRoot>,
}

impl MuxSnapshot {
    pub fn from_config(config: &ServerConfig) -> Result<Self, RouteError> {
        let routes = RouteTable::compile(&config.routes)?;

        let dev_redirect = match (&config.environment, &config.development.redirect_host) {
            (Environment::Development, Some(host)) => Some(DevRedirect {
                host: host.clone(),
                path: config.development.redirect_path.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            environment: config.environment,
            policy: HostPolicy::from_config(&config.hosts),
            routes,
            site: StaticSite::from_config(&config.static_files),
            dev_redirect,
            challenge_root: config.acme.challenge_root.clone().map(GuardedRoot::new),
        })
    }

    /// Path to redirect this host to, if the development redirect applies.
    pub fn dev_redirect_for(&self, host: &str) -> Option<&str> {
        self.dev_redirect
            .as_ref()
            .filter(|redirect| redirect.host == host)
            .map(|redirect| redirect.path.as_str())
    }
}

/// Wrap a snapshot for sharing.
pub fn shared(snapshot: MuxSnapshot) -> SharedSnapshot {
    Arc::new(ArcSwap::from_pointee(snapshot))
}

/// Build a snapshot from `config` and publish it. On error the current
/// snapshot stays in place.
pub fn publish(current: &SharedSnapshot, config: &ServerConfig) -> Result<(), RouteError> {
    let snapshot = MuxSnapshot::from_config(config)?;
    tracing::info!(
        allowed_hosts = snapshot.policy.allowed().len(),
        routes = snapshot.routes.len(),
        environment = ?snapshot.environment,
        "Configuration snapshot published"
    );
    current.store(Arc::new(snapshot));
    Ok(())
}

/// Apply configuration updates until the sender side closes.
///
/// Listener settings are bound at startup; a change to them is reported but
/// only takes effect after a restart.
pub async fn apply_updates(
    current: SharedSnapshot,
    listener: ListenerConfig,
    mut updates: mpsc::UnboundedReceiver<ServerConfig>,
) {
    while let Some(config) = updates.recv().await {
        if config.listener != listener {
            tracing::warn!("Listener or TLS settings changed; restart to apply them");
        }
        match publish(&current, &config) {
            Ok(()) => metrics::record_config_reload("applied"),
            Err(e) => {
                metrics::record_config_reload("rejected");
                tracing::error!(error = %e, "Rejected configuration update. Keeping current snapshot.");
            }
        }
    }
    tracing::debug!("Configuration update channel closed");
}
