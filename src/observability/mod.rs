//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Admission, dispatch, hotlink guard, reloads produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log event for a request
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
