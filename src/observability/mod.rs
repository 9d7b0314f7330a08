//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, registry, health monitor produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through logs and upstream headers
//! - Metrics are cheap when no exporter is installed

pub mod logging;
pub mod metrics;
