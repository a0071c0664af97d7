//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Admitted request (method, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (method filter + path pattern)
//!     → Return: matched Route + wildcard capture, 405, or NotFound
//!
//! Route Compilation (at startup and on reload):
//!     RouteConfig[]
//!     → Parse methods, patterns, handler targets
//!     → Sort by specificity
//!     → Freeze as immutable RouteTable inside the snapshot
//! ```
//!
//! # Design Decisions
//! - Routes compiled ahead of time, immutable at runtime
//! - Exact paths beat wildcards; longer wildcard prefixes beat shorter ones
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use router::{Handler, Lookup, Route, RouteError, RouteMatch, RouteTable};
