//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → table.rs (ordered scan)
//!     → matcher.rs (segment-aligned prefix check)
//!     → Return: matched RoutePattern (service name) or NoMatch
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Resolve lb:// targets to service names
//!     → Normalise path patterns
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)

pub mod matcher;
pub mod table;

pub use matcher::PathPrefixMatcher;
pub use table::{RoutePattern, RouteSummary, RouteTable};
