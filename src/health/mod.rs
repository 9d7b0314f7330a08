//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each registered endpoint
//!     → Update state.rs counters
//!     → On transition: ServiceDiscovery::on_health_change
//!
//! State machine (state.rs):
//!     Healthy ←→ Unhealthy
//!     With thresholds to prevent flapping
//! ```
//!
//! # Design Decisions
//! - The registry holds the health flag; the monitor only holds counters
//! - State transitions require consecutive successes/failures
//! - Health state is per-endpoint, not per-service

pub mod active;
pub mod state;

pub use active::HealthMonitor;
