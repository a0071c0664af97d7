//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → listener.rs (bind both addresses, load TLS)
//!     → tls.rs (PEM validation, rustls config)
//!
//! Serving
//!     → secure listener: muxer application
//!     → plain listener: redirect.rs (HTTPS upgrade, ACME pass-through)
//!
//! Shutdown
//!     → ListenerSet drains every listener concurrently under one grace period
//! ```
//!
//! # Design Decisions
//! - Each listener has its own axum-server handle and shuts down independently
//! - Without TLS the plain listener serves the muxer itself

pub mod listener;
pub mod redirect;
pub mod tls;
