//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every registered endpoint
//! - Report health transitions through the discovery interface

use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::state::HealthTracker;
use crate::registry::{Endpoint, EndpointRegistry, ServiceDiscovery};

pub struct HealthMonitor {
    registry: Arc<EndpointRegistry>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
    trackers: HashMap<String, HealthTracker>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<EndpointRegistry>, config: HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            registry,
            config,
            client,
            trackers: HashMap::new(),
        }
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            path = %self.config.path,
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every endpoint once and apply threshold transitions.
    pub async fn check_all(&mut self) {
        let endpoints: Vec<Endpoint> = self
            .registry
            .snapshot()
            .into_iter()
            .flat_map(|service| service.endpoints)
            .collect();

        // forget endpoints that left the registry
        self.trackers
            .retain(|address, _| endpoints.iter().any(|e| &e.address() == address));

        // One slow endpoint must not delay the others
        let mut probes = JoinSet::new();
        for endpoint in endpoints {
            let client = self.client.clone();
            let path = self.config.path.clone();
            let timeout = Duration::from_secs(self.config.timeout_secs);
            probes.spawn(async move {
                let ok = probe(&client, &endpoint, &path, timeout).await;
                (endpoint, ok)
            });
        }

        while let Some(joined) = probes.join_next().await {
            let (endpoint, probe_ok) = match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, "Health probe task failed");
                    continue;
                }
            };

            let tracker = self
                .trackers
                .entry(endpoint.address())
                .or_insert_with(|| HealthTracker::new(endpoint.healthy));
            // another discovery source may have flipped the flag since the last round
            if tracker.is_healthy() != endpoint.healthy {
                *tracker = HealthTracker::new(endpoint.healthy);
            }

            let transitioned = if probe_ok {
                tracker.mark_success(self.config.healthy_threshold)
            } else {
                tracker.mark_failure(self.config.unhealthy_threshold)
            };

            if transitioned {
                let healthy = tracker.is_healthy();
                tracing::info!(endpoint = %endpoint, healthy, "Health state transition");
                self.registry.on_health_change(&endpoint, healthy);
            }
        }
    }
}

/// GET the health path of `endpoint`; true on a 2xx within `timeout`.
async fn probe(
    client: &Client<HttpConnector, Body>,
    endpoint: &Endpoint,
    path: &str,
    timeout: Duration,
) -> bool {
    let uri = format!("http://{}{}", endpoint.address(), path);

    let request = match Request::builder()
        .method("GET")
        .uri(uri)
        .header("user-agent", "service-gateway-health-check")
        .body(Body::empty())
    {
        Ok(req) => req,
        Err(e) => {
            tracing::error!("Failed to build health check request: {}", e);
            return false;
        }
    };

    match time::timeout(timeout, client.request(request)).await {
        Ok(Ok(response)) => {
            let success = response.status().is_success();
            if !success {
                tracing::warn!(endpoint = %endpoint, status = %response.status(), "Health check failed: non-success status");
            }
            success
        }
        Ok(Err(e)) => {
            tracing::warn!(endpoint = %endpoint, error = %e, "Health check failed: connection error");
            false
        }
        Err(_) => {
            tracing::warn!(endpoint = %endpoint, "Health check failed: timeout");
            false
        }
    }
}
