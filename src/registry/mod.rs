//! Endpoint registry subsystem.
//!
//! # Data Flow
//! ```text
//! Discovery sources (static config, admin API, health monitor)
//!     → discovery.rs (ServiceDiscovery events)
//!     → store.rs (copy-on-write service map)
//!     → RegistryEvent broadcast to subscribers
//!
//! Load balancer
//!     → store.rs resolve(service) → healthy endpoint snapshot
//! ```
//!
//! # Design Decisions
//! - Registry owns endpoints; callers only get copies
//! - Lookups are in-memory and never wait on I/O
//! - An instance belongs to one service at a time

pub mod discovery;
pub mod endpoint;
pub mod store;

pub use discovery::{seed_static, ServiceDiscovery};
pub use endpoint::Endpoint;
pub use store::{EndpointRegistry, RegistryEvent, ServiceEndpoints};
