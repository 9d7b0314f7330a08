//! In-memory endpoint registry.
//!
//! # Responsibilities
//! - Map logical service names to their ordered endpoint lists
//! - Apply instance up/down and health transitions
//! - Publish a change event for every effective mutation
//!
//! # Design Decisions
//! - Copy-on-write: readers load an `Arc` snapshot and never block
//! - Writers are serialised by a mutex and swap in a new map
//! - Every mutation is idempotent; no-op mutations emit no event

use arc_swap::ArcSwap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

use crate::registry::endpoint::Endpoint;

/// Capacity of the change-notification channel. Slow subscribers lag, writers never block.
const EVENT_CAPACITY: usize = 256;

type ServiceMap = HashMap<String, Arc<Vec<Endpoint>>>;

/// A change applied to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    InstanceUp { service: String, endpoint: Endpoint },
    InstanceDown { service: String, endpoint: Endpoint },
    HealthChanged { service: String, endpoint: Endpoint },
}

/// All endpoints of one service, healthy or not.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceEndpoints {
    pub service: String,
    pub endpoints: Vec<Endpoint>,
}

/// Live endpoint sets for every known service.
#[derive(Debug)]
pub struct EndpointRegistry {
    services: ArcSwap<ServiceMap>,
    write_lock: Mutex<()>,
    events: broadcast::Sender<RegistryEvent>,
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            services: ArcSwap::from_pointee(HashMap::new()),
            write_lock: Mutex::new(()),
            events,
        }
    }

    /// Healthy endpoints of `service`, in registration order.
    ///
    /// Reads a single snapshot, so the result is never a partial update.
    pub fn resolve(&self, service: &str) -> Vec<Endpoint> {
        let services = self.services.load();
        services
            .get(service)
            .map(|endpoints| endpoints.iter().filter(|e| e.healthy).cloned().collect())
            .unwrap_or_default()
    }

    /// Every service with all of its endpoints, sorted by service name.
    pub fn snapshot(&self) -> Vec<ServiceEndpoints> {
        let services = self.services.load();
        let mut listing: Vec<ServiceEndpoints> = services
            .iter()
            .map(|(service, endpoints)| ServiceEndpoints {
                service: service.clone(),
                endpoints: endpoints.as_ref().clone(),
            })
            .collect();
        listing.sort_by(|a, b| a.service.cmp(&b.service));
        listing
    }

    /// Subscribe to registry change events.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Add `endpoint` to `service`. Returns false if it was already registered there.
    ///
    /// An endpoint owned by another service is moved, since an instance
    /// serves exactly one service.
    pub fn register(&self, service: &str, endpoint: Endpoint) -> bool {
        let changed = self.mutate(|services, events| {
            if services
                .get(service)
                .is_some_and(|list| list.iter().any(|e| e.same_instance(&endpoint)))
            {
                return false;
            }

            let owners: Vec<String> = services
                .iter()
                .filter(|(_, list)| list.iter().any(|e| e.same_instance(&endpoint)))
                .map(|(name, _)| name.clone())
                .collect();
            for owner in owners {
                if let Some(removed) = remove_from(services, &owner, &endpoint) {
                    tracing::info!(
                        endpoint = %removed,
                        from = %owner,
                        to = %service,
                        "Endpoint moved between services"
                    );
                    events.push(RegistryEvent::InstanceDown {
                        service: owner,
                        endpoint: removed,
                    });
                }
            }

            let mut list = services
                .get(service)
                .map(|list| list.as_ref().clone())
                .unwrap_or_default();
            list.push(endpoint.clone());
            services.insert(service.to_string(), Arc::new(list));
            events.push(RegistryEvent::InstanceUp {
                service: service.to_string(),
                endpoint: endpoint.clone(),
            });
            true
        });

        if changed {
            tracing::info!(service = %service, endpoint = %endpoint, healthy = endpoint.healthy, "Endpoint registered");
        }
        changed
    }

    /// Remove `endpoint` from `service`. Returns false if it was not registered there.
    pub fn deregister(&self, service: &str, endpoint: &Endpoint) -> bool {
        let changed = self.mutate(|services, events| match remove_from(services, service, endpoint) {
            Some(removed) => {
                events.push(RegistryEvent::InstanceDown {
                    service: service.to_string(),
                    endpoint: removed,
                });
                true
            }
            None => false,
        });

        if changed {
            tracing::info!(service = %service, endpoint = %endpoint, "Endpoint deregistered");
        }
        changed
    }

    /// Set the health flag of `endpoint` wherever it is registered.
    /// Returns false if the endpoint is unknown or already in that state.
    pub fn mark_health(&self, endpoint: &Endpoint, healthy: bool) -> bool {
        let changed = self.mutate(|services, events| {
            let owner = services.iter().find_map(|(name, list)| {
                list.iter()
                    .position(|e| e.same_instance(endpoint))
                    .map(|index| (name.clone(), index))
            });
            let Some((service, index)) = owner else {
                return false;
            };

            let Some(current) = services.get(&service) else {
                return false;
            };
            if current[index].healthy == healthy {
                return false;
            }

            let mut list = current.as_ref().clone();
            list[index].healthy = healthy;
            let updated = list[index].clone();
            services.insert(service.clone(), Arc::new(list));
            events.push(RegistryEvent::HealthChanged {
                service,
                endpoint: updated,
            });
            true
        });

        if changed {
            tracing::info!(endpoint = %endpoint, healthy, "Endpoint health changed");
        }
        changed
    }

    /// Apply `f` to a private copy of the map and publish it if `f` reports a change.
    ///
    /// Events are sent before the write lock is released, so subscribers see
    /// them in the same order the changes were stored.
    fn mutate<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut ServiceMap, &mut Vec<RegistryEvent>) -> bool,
    {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = ServiceMap::clone(&self.services.load());
        let mut events = Vec::new();
        let changed = f(&mut next, &mut events);
        if changed {
            self.services.store(Arc::new(next));
            for event in events {
                // No subscribers is fine
                let _ = self.events.send(event);
            }
        }
        changed
    }
}

/// Remove `endpoint` from `service`'s list, dropping the service when it empties.
fn remove_from(services: &mut ServiceMap, service: &str, endpoint: &Endpoint) -> Option<Endpoint> {
    let list = services.get(service)?;
    let index = list.iter().position(|e| e.same_instance(endpoint))?;

    let mut list = list.as_ref().clone();
    let removed = list.remove(index);
    if list.is_empty() {
        services.remove(service);
    } else {
        services.insert(service.to_string(), Arc::new(list));
    }
    Some(removed)
}
