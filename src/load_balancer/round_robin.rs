//! Round-robin load balancing strategy.

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::load_balancer::Strategy;
use crate::registry::Endpoint;

/// Round-robin selector.
/// Keeps one cursor per service to rotate through its endpoints.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursors: DashMap<String, AtomicUsize>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next cursor value for `service`.
    fn advance(&self, service: &str) -> usize {
        if let Some(cursor) = self.cursors.get(service) {
            return cursor.fetch_add(1, Ordering::Relaxed);
        }
        self.cursors
            .entry(service.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed)
    }
}

impl Strategy for RoundRobin {
    fn next_endpoint(&self, service: &str, endpoints: &[Endpoint]) -> Option<Endpoint> {
        if endpoints.is_empty() {
            return None;
        }

        // A shrunken set wraps modulo the new length
        let cursor = self.advance(service);
        endpoints.get(cursor % endpoints.len()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn endpoints(n: usize) -> Vec<Endpoint> {
        (1..=n)
            .map(|i| Endpoint::new(format!("10.0.0.{i}"), 8080))
            .collect()
    }

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let backends = endpoints(3);

        for round in 0..2 {
            for expected in &backends {
                let selected = lb.next_endpoint("user-service", &backends).unwrap();
                assert_eq!(&selected, expected, "round {round}");
            }
        }
    }

    #[test]
    fn cursors_are_per_service() {
        let lb = RoundRobin::new();
        let backends = endpoints(2);

        assert_eq!(lb.next_endpoint("a", &backends).unwrap(), backends[0]);
        assert_eq!(lb.next_endpoint("b", &backends).unwrap(), backends[0]);
        assert_eq!(lb.next_endpoint("a", &backends).unwrap(), backends[1]);
    }

    #[test]
    fn empty_set() {
        let lb = RoundRobin::new();
        assert!(lb.next_endpoint("a", &[]).is_none());
    }

    #[test]
    fn shrinking_set_wraps() {
        let lb = RoundRobin::new();
        let backends = endpoints(3);
        lb.next_endpoint("a", &backends);
        lb.next_endpoint("a", &backends);

        // cursor is now 2; with one endpoint left it must still be selected
        let remaining = vec![backends[1].clone()];
        assert_eq!(lb.next_endpoint("a", &remaining).unwrap(), backends[1]);
    }

    #[test]
    fn concurrent_callers_get_distinct_endpoints() {
        let lb = Arc::new(RoundRobin::new());
        let backends = Arc::new(endpoints(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lb = lb.clone();
                let backends = backends.clone();
                thread::spawn(move || lb.next_endpoint("user-service", &backends).unwrap())
            })
            .collect();

        let chosen: HashSet<Endpoint> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(chosen.len(), 8);
    }
}
