//! Endpoint health state machine.
//!
//! # State Transitions
//! ```text
//! Healthy → Unhealthy: consecutive failures >= unhealthy_threshold
//! Unhealthy → Healthy: consecutive successes >= healthy_threshold
//! ```
//!
//! Hysteresis prevents flapping; counters reset on the opposite outcome.

/// Probe outcome counters for one endpoint.
#[derive(Debug, Clone)]
pub struct HealthTracker {
    healthy: bool,
    consecutive_failures: u32,
    consecutive_successes: u32,
}

impl HealthTracker {
    /// Start tracking from the registry's current view of the endpoint.
    pub fn new(healthy: bool) -> Self {
        Self {
            healthy,
            consecutive_failures: 0,
            consecutive_successes: 0,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// Record a successful probe. Returns true on an Unhealthy → Healthy transition.
    pub fn mark_success(&mut self, healthy_threshold: u32) -> bool {
        self.consecutive_failures = 0;
        if self.healthy {
            return false;
        }

        self.consecutive_successes += 1;
        if self.consecutive_successes >= healthy_threshold {
            self.healthy = true;
            self.consecutive_successes = 0;
            return true;
        }
        false
    }

    /// Record a failed probe. Returns true on a Healthy → Unhealthy transition.
    pub fn mark_failure(&mut self, unhealthy_threshold: u32) -> bool {
        self.consecutive_successes = 0;
        if !self.healthy {
            return false;
        }

        self.consecutive_failures += 1;
        if self.consecutive_failures >= unhealthy_threshold {
            self.healthy = false;
            self.consecutive_failures = 0;
            return true;
        }
        false
    }
}
