//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate listener addresses and TLS paths
//! - Check host entries are bare host values
//! - Compile the route table to surface pattern/method/target errors
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ServerConfig;
use crate::routing::RouteTable;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let https = check_address(&mut errors, "listener.https_address", &config.listener.https_address);
    let http = check_address(&mut errors, "listener.http_address", &config.listener.http_address);
    if let (Some(https), Some(http)) = (https, http) {
        if https == http {
            errors.push(ValidationError::new(
                "listener",
                "https_address and http_address must differ",
            ));
        }
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.as_os_str().is_empty() {
            errors.push(ValidationError::new("listener.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.as_os_str().is_empty() {
            errors.push(ValidationError::new("listener.tls.key_path", "must not be empty"));
        }
    }

    for host in config.hosts.allowed.keys() {
        check_host(&mut errors, "hosts.allowed", host);
    }
    for host in &config.hosts.referrers {
        check_host(&mut errors, "hosts.referrers", host);
    }

    if let Err(e) = RouteTable::compile(&config.routes) {
        errors.push(ValidationError::new("routes", e.to_string()));
    }

    if !config.static_files.rejected_path.starts_with('/') {
        errors.push(ValidationError::new("static_files.rejected_path", "must start with '/'"));
    }

    if !config.development.redirect_path.starts_with('/') {
        errors.push(ValidationError::new("development.redirect_path", "must start with '/'"));
    }
    if let Some(host) = &config.development.redirect_host {
        check_host(&mut errors, "development.redirect_host", host);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.timeouts.shutdown_grace_secs == 0 {
        errors.push(ValidationError::new("timeouts.shutdown_grace_secs", "must be greater than 0"));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("expected one of {}", LOG_LEVELS.join(", ")),
        ));
    }
    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &str, value: &str) -> Option<SocketAddr> {
    match value.parse::<SocketAddr>() {
        Ok(addr) => Some(addr),
        Err(_) => {
            errors.push(ValidationError::new(field, format!("{value:?} is not a socket address")));
            None
        }
    }
}

fn check_host(errors: &mut Vec<ValidationError>, field: &str, host: &str) {
    if host.is_empty() {
        errors.push(ValidationError::new(field, "host must not be empty"));
    } else if host.contains("://") || host.contains('/') || host.chars().any(char::is_whitespace) {
        errors.push(ValidationError::new(
            field,
            format!("{host:?} must be a bare host, optionally with a port"),
        ));
    }
}
