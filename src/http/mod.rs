//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, admission host)
//!     → snapshot.rs (one snapshot per request)
//!     → [host admission, route lookup, handler]
//!     → upstream.rs (proxy routes only)
//!     → response.rs (fixed responses), policy headers
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod snapshot;
pub mod upstream;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};
pub use snapshot::{MuxSnapshot, SharedSnapshot};
