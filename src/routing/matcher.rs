//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request method (exact, `*`, or GET-implies-HEAD)
//! - Match the request path (exact, or prefix with trailing wildcard)
//! - Capture the wildcard remainder for the handler
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Wildcards are only allowed as the final segment
//! - No regex to guarantee O(n) matching

use axum::http::Method;

use crate::routing::router::RouteError;

/// Method condition of a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    /// `*` in configuration.
    Any,
    Only(Method),
}

impl MethodFilter {
    /// Parse a configured method. Methods are upper-cased; `*` matches all.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let raw = raw.trim();
        if raw == "*" {
            return Ok(MethodFilter::Any);
        }
        Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
            .map(MethodFilter::Only)
            .map_err(|_| RouteError::InvalidMethod(raw.to_string()))
    }

    /// Returns true if the request method satisfies this filter.
    /// GET routes also answer HEAD.
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(expected) => {
                expected == method || (*expected == Method::GET && *method == Method::HEAD)
            }
        }
    }

    /// The method to advertise in an `Allow` header.
    pub fn allow_value(&self) -> Option<&Method> {
        match self {
            MethodFilter::Any => None,
            MethodFilter::Only(method) => Some(method),
        }
    }
}

/// Path condition of a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches exactly one path.
    Exact(String),
    /// `/static/*filepath`: matches everything under `prefix`.
    Wildcard { prefix: String, name: String },
}

impl PathPattern {
    /// Parse a configured path pattern.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        if !raw.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        match raw.find('*') {
            None => Ok(PathPattern::Exact(raw.to_string())),
            Some(star) => {
                let (prefix, name) = (&raw[..star], &raw[star + 1..]);
                if !prefix.ends_with('/') {
                    return Err(invalid("wildcard must follow a '/'"));
                }
                if name.is_empty() {
                    return Err(invalid("wildcard needs a name"));
                }
                if name.contains('/') || name.contains('*') {
                    return Err(invalid("wildcard must be the final segment"));
                }
                Ok(PathPattern::Wildcard {
                    prefix: prefix.to_string(),
                    name: name.to_string(),
                })
            }
        }
    }

    /// Match a request path. On success returns the wildcard capture, which
    /// keeps its leading `/` (`/static/*p` on `/static/a/b` captures `/a/b`).
    pub fn matches<'p>(&self, path: &'p str) -> Option<Option<&'p str>> {
        match self {
            PathPattern::Exact(expected) => (expected == path).then_some(None),
            PathPattern::Wildcard { prefix, .. } => path
                .starts_with(prefix.as_str())
                .then(|| Some(&path[prefix.len() - 1..])),
        }
    }

    /// Ordering key: exact patterns first, then longer prefixes.
    pub(crate) fn specificity(&self) -> (u8, usize) {
        match self {
            PathPattern::Exact(_) => (1, usize::MAX),
            PathPattern::Wildcard { prefix, .. } => (0, prefix.len()),
        }
    }
}
