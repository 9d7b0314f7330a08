//! Random load balancing strategy.

use crate::load_balancer::Strategy;
use crate::registry::Endpoint;

/// Uniform random selector. Stateless.
#[derive(Debug, Default)]
pub struct Random;

impl Random {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for Random {
    fn next_endpoint(&self, _service: &str, endpoints: &[Endpoint]) -> Option<Endpoint> {
        if endpoints.is_empty() {
            return None;
        }
        endpoints.get(fastrand::usize(..endpoints.len())).cloned()
    }
}
