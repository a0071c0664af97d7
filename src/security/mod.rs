//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → hosts.rs (admit by exact host, else 403)
//!     → [routing + handler]
//!     → hotlink.rs (static assets only: validate Referer)
//!     → headers.rs (stamp HSTS / caching policy on the response)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: host filter, traversal guard, hotlink guard
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod headers;
pub mod hosts;
pub mod hotlink;

pub use hosts::{Admission, AllowList, HostPolicy, ReferrerAllowList};
