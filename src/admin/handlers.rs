use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::registry::{Endpoint, ServiceDiscovery, ServiceEndpoints};
use crate::routing::RouteSummary;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub routes: usize,
    pub services: usize,
    pub endpoints: usize,
    pub healthy_endpoints: usize,
}

#[derive(Debug, Deserialize)]
pub struct RegisterInstance {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct HealthUpdate {
    pub healthy: bool,
}

#[derive(Serialize)]
pub struct InstanceResponse {
    pub service: String,
    pub endpoint: Endpoint,
    pub changed: bool,
}

fn bad_request(reason: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": reason }))).into_response()
}

fn not_found(what: String) -> Response {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": what }))).into_response()
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let services = state.registry.snapshot();
    let endpoints = services.iter().map(|s| s.endpoints.len()).sum();
    let healthy_endpoints = services
        .iter()
        .flat_map(|s| s.endpoints.iter())
        .filter(|e| e.healthy)
        .count();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        routes: state.routes.len(),
        services: services.len(),
        endpoints,
        healthy_endpoints,
    })
}

pub async fn get_routes(State(state): State<AdminState>) -> Json<Vec<RouteSummary>> {
    Json(state.routes.summaries())
}

pub async fn get_services(State(state): State<AdminState>) -> Json<Vec<ServiceEndpoints>> {
    Json(state.registry.snapshot())
}

/// Instance up.
pub async fn register_instance(
    State(state): State<AdminState>,
    Path(service): Path<String>,
    Json(body): Json<RegisterInstance>,
) -> Response {
    let endpoint = match Endpoint::parse(&body.address) {
        Ok(endpoint) => endpoint,
        Err(reason) => return bad_request(reason),
    };

    let changed = state.registry.on_instance_up(&service, endpoint.clone());
    let status = if changed {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (
        status,
        Json(InstanceResponse {
            service,
            endpoint,
            changed,
        }),
    )
        .into_response()
}

/// Instance down.
pub async fn deregister_instance(
    State(state): State<AdminState>,
    Path((service, address)): Path<(String, String)>,
) -> Response {
    let endpoint = match Endpoint::parse(&address) {
        Ok(endpoint) => endpoint,
        Err(reason) => return bad_request(reason),
    };

    if state.registry.on_instance_down(&service, &endpoint) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(format!("{address} is not registered for {service}"))
    }
}

/// Health change reported by an external checker.
pub async fn update_health(
    State(state): State<AdminState>,
    Path(address): Path<String>,
    Json(body): Json<HealthUpdate>,
) -> Response {
    let endpoint = match Endpoint::parse(&address) {
        Ok(endpoint) => endpoint,
        Err(reason) => return bad_request(reason),
    };

    let owner = state.registry.snapshot().into_iter().find(|s| {
        s.endpoints.iter().any(|e| e.same_instance(&endpoint))
    });
    let Some(owner) = owner else {
        return not_found(format!("{address} is not registered"));
    };

    let changed = state.registry.on_health_change(&endpoint, body.healthy);
    let mut endpoint = endpoint;
    endpoint.healthy = body.healthy;
    Json(InstanceResponse {
        service: owner.service,
        endpoint,
        changed,
    })
    .into_response()
}
