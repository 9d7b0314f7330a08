//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → service name identified
//!     → registry resolve(service) (healthy endpoint snapshot)
//!     → Apply selection strategy:
//!         - round_robin.rs (rotate through endpoints, per-service cursor)
//!         - random.rs (uniform pick)
//!     → Return endpoint or NoEndpointAvailable
//! ```
//!
//! # Design Decisions
//! - Holds no endpoint state; every selection reads a fresh snapshot
//! - Strategy selected once from configuration
//! - Unhealthy endpoints never reach the strategy

pub mod random;
pub mod round_robin;

use std::sync::Arc;

use crate::config::LoadBalancePolicy;
use crate::error::GatewayError;
use crate::registry::{Endpoint, EndpointRegistry};

pub use random::Random;
pub use round_robin::RoundRobin;

/// Picks one endpoint out of a non-empty candidate list.
pub trait Strategy: Send + Sync + std::fmt::Debug {
    fn next_endpoint(&self, service: &str, endpoints: &[Endpoint]) -> Option<Endpoint>;
}

/// Resolves a service name to a single endpoint.
#[derive(Debug)]
pub struct LoadBalancer {
    registry: Arc<EndpointRegistry>,
    strategy: Box<dyn Strategy>,
}

impl LoadBalancer {
    pub fn new(registry: Arc<EndpointRegistry>, policy: LoadBalancePolicy) -> Self {
        let strategy: Box<dyn Strategy> = match policy {
            LoadBalancePolicy::RoundRobin => Box::new(RoundRobin::new()),
            LoadBalancePolicy::Random => Box::new(Random::new()),
        };
        Self { registry, strategy }
    }

    /// Select an endpoint for `service`.
    pub fn select(&self, service: &str) -> Result<Endpoint, GatewayError> {
        let endpoints = self.registry.resolve(service);
        self.pick(service, &endpoints)
    }

    /// Select an endpoint for `service`, avoiding `failed` when another is available.
    pub fn select_excluding(
        &self,
        service: &str,
        failed: &Endpoint,
    ) -> Result<Endpoint, GatewayError> {
        let mut endpoints = self.registry.resolve(service);
        if endpoints.iter().any(|e| !e.same_instance(failed)) {
            endpoints.retain(|e| !e.same_instance(failed));
        }
        self.pick(service, &endpoints)
    }

    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    fn pick(&self, service: &str, endpoints: &[Endpoint]) -> Result<Endpoint, GatewayError> {
        match self.strategy.next_endpoint(service, endpoints) {
            Some(endpoint) => {
                tracing::debug!(service = %service, endpoint = %endpoint, candidates = endpoints.len(), "Selected endpoint");
                Ok(endpoint)
            }
            None => {
                tracing::debug!(service = %service, "No healthy endpoints for service");
                Err(GatewayError::NoEndpointAvailable(service.to_string()))
            }
        }
    }
}
