//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the muxer.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the muxer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Production or development mode.
    pub environment: Environment,

    /// Listener configuration (bind addresses, TLS).
    pub listener: ListenerConfig,

    /// Host allow-list and referrer allow-list.
    pub hosts: HostsConfig,

    /// Static asset root and hotlink policy.
    pub static_files: StaticFilesConfig,

    /// Route table, in configuration order.
    pub routes: Vec<RouteConfig>,

    /// Development-only affordances.
    pub development: DevelopmentConfig,

    /// Certificate challenge pass-through on the plain listener.
    pub acme: AcmeConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            listener: ListenerConfig::default(),
            hosts: HostsConfig::default(),
            static_files: StaticFilesConfig::default(),
            routes: default_routes(),
            development: DevelopmentConfig::default(),
            acme: AcmeConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Runtime mode. Unknown environments fail to parse rather than silently
/// falling back to development behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Secure listener bind address (e.g., "0.0.0.0:443").
    pub https_address: String,

    /// Plain listener bind address (e.g., "0.0.0.0:80").
    pub http_address: String,

    /// Port advertised in plain→secure redirects. Defaults to the port of
    /// `https_address`.
    pub public_https_port: Option<u16>,

    /// TLS certificate source. Without it the plain listener serves the
    /// muxer directly.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            https_address: "0.0.0.0:10443".to_string(),
            http_address: "0.0.0.0:10080".to_string(),
            public_https_port: None,
            tls: None,
        }
    }
}

/// TLS configuration for the secure listener.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate chain file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

/// Host admission policy.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HostsConfig {
    /// Host header value → enabled. Matching is exact and case-sensitive.
    pub allowed: BTreeMap<String, bool>,

    /// Additional hostnames accepted as asset referrers.
    pub referrers: Vec<String>,
}

/// Static asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory served by `static` route targets.
    pub root: PathBuf,

    /// Page served (with status 404) for missing files and directories.
    pub not_found_page: PathBuf,

    /// Path on the current host that hotlinkers are redirected to.
    pub rejected_path: String,

    /// Serve assets to requests that carry no `Referer` at all.
    pub allow_missing_referer: bool,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("static"),
            not_found_page: PathBuf::from("public/404.html"),
            rejected_path: "/ahahah".to_string(),
            allow_missing_referer: false,
        }
    }
}

/// A single route table entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: String,

    /// HTTP method, or `*` for any method.
    #[serde(default = "default_method")]
    pub method: String,

    /// Exact path, or a prefix ending in a `/*name` wildcard.
    pub path: String,

    /// What serves the matched request.
    pub target: RouteTarget,
}

/// Handler kinds a route can dispatch to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteTarget {
    /// Hotlink-guarded files under `static_files.root`.
    Static,
    /// Guarded directory; directories resolve to their `index.html`.
    Directory { root: PathBuf },
    /// One fixed file.
    File { path: PathBuf },
    /// Fixed redirect.
    Redirect {
        location: String,
        #[serde(default)]
        permanent: bool,
    },
    /// Forward to an HTTP upstream (`host:port`).
    Proxy { upstream: String },
}

fn default_method() -> String {
    "GET".to_string()
}

/// The route table used when a config file does not define one.
pub fn default_routes() -> Vec<RouteConfig> {
    vec![RouteConfig {
        name: "static".to_string(),
        method: default_method(),
        path: "/static/*filepath".to_string(),
        target: RouteTarget::Static,
    }]
}

/// Development-mode redirect. Ignored in production.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DevelopmentConfig {
    /// Exact host value that triggers the redirect.
    pub redirect_host: Option<String>,

    /// Path on the same host to redirect to.
    pub redirect_path: String,
}

impl Default for DevelopmentConfig {
    fn default() -> Self {
        Self {
            redirect_host: None,
            redirect_path: "/".to_string(),
        }
    }
}

/// Certificate-validation challenge handling.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AcmeConfig {
    /// Webroot holding `.well-known/acme-challenge` tokens, relative to
    /// which challenge paths are resolved.
    pub challenge_root: Option<PathBuf>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-request deadline in seconds.
    pub request_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].target, RouteTarget::Static);
        assert!(config.hosts.allowed.is_empty());
    }

    #[test]
    fn parses_full_document() {
        let config: ServerConfig = toml::from_str(
            r#"
            environment = "development"

            [listener]
            https_address = "127.0.0.1:8443"
            http_address = "127.0.0.1:8080"
            [listener.tls]
            cert_path = "certs/cert.pem"
            key_path = "certs/key.pem"

            [hosts]
            allowed = { "example.com" = true, "old.example.com" = false }
            referrers = ["www.google.com"]

            [[routes]]
            name = "home"
            path = "/"
            target = { kind = "file", path = "public/index.html" }

            [[routes]]
            name = "api"
            method = "*"
            path = "/api/*rest"
            target = { kind = "proxy", upstream = "127.0.0.1:3000" }

            [development]
            redirect_host = "blog.localhost:8443"
            redirect_path = "/ethos"
            "#,
        )
        .unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert!(config.listener.tls.is_some());
        assert_eq!(config.hosts.allowed.get("old.example.com"), Some(&false));
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[0].method, "GET");
        assert_eq!(
            config.routes[1].target,
            RouteTarget::Proxy { upstream: "127.0.0.1:3000".to_string() }
        );
        assert_eq!(config.development.redirect_path, "/ethos");
    }

    #[test]
    fn rejects_unknown_environment() {
        assert!(toml::from_str::<ServerConfig>(r#"environment = "staging""#).is_err());
    }
}
