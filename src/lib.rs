//! Host-filtering HTTPS request muxer.
//!
//! Admits requests by exact `Host`, stamps an HSTS/caching header policy on
//! every admitted response, and dispatches through a route table to static
//! files, redirects or HTTP upstreams. A plain listener upgrades clients to
//! HTTPS.

pub mod config;
pub mod files;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
