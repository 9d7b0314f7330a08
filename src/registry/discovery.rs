//! Service discovery interface.
//!
//! Whatever learns about instances (static config, the admin API, the
//! active health monitor) reports through this trait; the registry is the
//! only implementation.

use crate::config::InstanceConfig;
use crate::registry::endpoint::Endpoint;
use crate::registry::store::EndpointRegistry;

/// Events a discovery source reports about service instances.
///
/// Each call returns whether it changed anything; repeated reports are no-ops.
pub trait ServiceDiscovery: Send + Sync {
    fn on_instance_up(&self, service: &str, endpoint: Endpoint) -> bool;
    fn on_instance_down(&self, service: &str, endpoint: &Endpoint) -> bool;
    fn on_health_change(&self, endpoint: &Endpoint, healthy: bool) -> bool;
}

impl ServiceDiscovery for EndpointRegistry {
    fn on_instance_up(&self, service: &str, endpoint: Endpoint) -> bool {
        self.register(service, endpoint)
    }

    fn on_instance_down(&self, service: &str, endpoint: &Endpoint) -> bool {
        self.deregister(service, endpoint)
    }

    fn on_health_change(&self, endpoint: &Endpoint, healthy: bool) -> bool {
        self.mark_health(endpoint, healthy)
    }
}

/// Report statically configured instances. Returns how many were accepted.
pub fn seed_static(discovery: &dyn ServiceDiscovery, instances: &[InstanceConfig]) -> usize {
    let mut accepted = 0;
    for instance in instances {
        match Endpoint::parse(&instance.address) {
            Ok(endpoint) => {
                discovery.on_instance_up(&instance.service, endpoint);
                accepted += 1;
            }
            Err(reason) => {
                tracing::warn!(
                    service = %instance.service,
                    address = %instance.address,
                    %reason,
                    "Invalid instance address"
                );
            }
        }
    }
    accepted
}
