//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Compile route configs into typed handlers
//! - Look up the most specific route for a method and path
//! - Distinguish "no such path" from "path exists, wrong method"
//!
//! # Design Decisions
//! - Immutable after construction (shared through the snapshot)
//! - O(n) scan over pre-sorted routes (acceptable for typical route counts)
//! - Explicit NoMatch rather than silent default

use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

use axum::http::uri::Authority;
use axum::http::{Method, StatusCode};

use crate::config::{RouteConfig, RouteTarget};
use crate::files::GuardedRoot;
use crate::routing::matcher::{MethodFilter, PathPattern};

/// Error compiling a route table.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("invalid method {0:?}")]
    InvalidMethod(String),

    #[error("invalid path pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid upstream {0:?}: expected host:port")]
    InvalidUpstream(String),

    #[error("invalid redirect location {0:?}")]
    InvalidLocation(String),

    #[error("duplicate route name {0:?}")]
    DuplicateName(String),
}

/// What serves a matched request.
#[derive(Debug, Clone)]
pub enum Handler {
    Static,
    Directory(GuardedRoot),
    File(PathBuf),
    Redirect { location: String, status: StatusCode },
    Proxy(Authority),
}

/// A compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    pub method: MethodFilter,
    pub pattern: PathPattern,
    pub handler: Handler,
}

/// Successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'r, 'p> {
    pub route: &'r Route,
    /// Wildcard remainder, with its leading `/`.
    pub capture: Option<&'p str>,
}

/// Result of a route table lookup.
#[derive(Debug)]
pub enum Lookup<'r, 'p> {
    Matched(RouteMatch<'r, 'p>),
    /// The path matched at least one route, but no route accepts the method.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// Ordered, immutable route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile route configs. Routes are ordered most specific first; equal
    /// specificity keeps configuration order.
    pub fn compile(configs: &[RouteConfig]) -> Result<Self, RouteError> {
        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(configs.len());

        for config in configs {
            if !seen.insert(config.name.as_str()) {
                return Err(RouteError::DuplicateName(config.name.clone()));
            }
            routes.push(Route {
                name: config.name.clone(),
                method: MethodFilter::parse(&config.method)?,
                pattern: PathPattern::parse(&config.path)?,
                handler: compile_handler(&config.target)?,
            });
        }

        // Stable sort: most specific first.
        routes.sort_by(|a, b| b.pattern.specificity().cmp(&a.pattern.specificity()));

        tracing::debug!(routes = routes.len(), "Route table compiled");
        Ok(Self { routes })
    }

    /// Find the route for a request.
    pub fn lookup<'r, 'p>(&'r self, method: &Method, path: &'p str) -> Lookup<'r, 'p> {
        let mut allowed: Vec<Method> = Vec::new();
        let mut path_matched = false;

        for route in &self.routes {
            let Some(capture) = route.pattern.matches(path) else {
                continue;
            };
            if route.method.matches(method) {
                return Lookup::Matched(RouteMatch { route, capture });
            }
            path_matched = true;
            if let Some(m) = route.method.allow_value() {
                if !allowed.contains(m) {
                    allowed.push(m.clone());
                }
            }
        }

        if path_matched {
            Lookup::MethodNotAllowed(allowed)
        } else {
            Lookup::NotFound
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn compile_handler(target: &RouteTarget) -> Result<Handler, RouteError> {
    Ok(match target {
        RouteTarget::Static => Handler::Static,
        RouteTarget::Directory { root } => Handler::Directory(GuardedRoot::new(root.clone())),
        RouteTarget::File { path } => Handler::File(path.clone()),
        RouteTarget::Redirect { location, permanent } => {
            if location.is_empty() || location.chars().any(|c| c.is_ascii_control() || c == ' ') {
                return Err(RouteError::InvalidLocation(location.clone()));
            }
            let status = if *permanent {
                StatusCode::MOVED_PERMANENTLY
            } else {
                StatusCode::FOUND
            };
            Handler::Redirect { location: location.clone(), status }
        }
        RouteTarget::Proxy { upstream } => {
            let authority = Authority::from_str(upstream)
                .map_err(|_| RouteError::InvalidUpstream(upstream.clone()))?;
            if authority.port_u16().is_none() {
                return Err(RouteError::InvalidUpstream(upstream.clone()));
            }
            Handler::Proxy(authority)
        }
    })
}
