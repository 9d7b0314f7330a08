//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics and reports every
//! problem found rather than stopping at the first.

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::registry::Endpoint;
use crate::routing::RoutePattern;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("route #{index} has an empty id")]
    EmptyRouteId { index: usize },

    #[error("duplicate route id '{0}'")]
    DuplicateRouteId(String),

    #[error("route '{id}': {reason}")]
    InvalidRoute { id: String, reason: String },

    #[error("instance '{address}' of service '{service}': {reason}")]
    InvalidInstance {
        service: String,
        address: String,
        reason: String,
    },

    #[error("invalid listener address '{0}'")]
    InvalidBindAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config
        .listener
        .bind_address
        .parse::<std::net::SocketAddr>()
        .is_err()
    {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.id.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteId { index });
        } else if !seen_ids.insert(route.id.as_str()) {
            errors.push(ValidationError::DuplicateRouteId(route.id.clone()));
        }

        if let Err(reason) = RoutePattern::from_config(route) {
            errors.push(ValidationError::InvalidRoute {
                id: route.id.clone(),
                reason,
            });
        }
    }

    for instance in &config.instances {
        let reason = if instance.service.trim().is_empty() {
            Some("service name is empty".to_string())
        } else {
            Endpoint::parse(&instance.address).err()
        };
        if let Some(reason) = reason {
            errors.push(ValidationError::InvalidInstance {
                service: instance.service.clone(),
                address: instance.address.clone(),
                reason,
            });
        }
    }

    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.connect_ms"));
    }
    if config.timeouts.upstream_ms == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.upstream_ms"));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue("listener.max_body_bytes"));
    }
    if config.health_check.enabled {
        if config.health_check.interval_secs == 0 {
            errors.push(ValidationError::ZeroValue("health_check.interval_secs"));
        }
        if config.health_check.timeout_secs == 0 {
            errors.push(ValidationError::ZeroValue("health_check.timeout_secs"));
        }
        if config.health_check.healthy_threshold == 0 {
            errors.push(ValidationError::ZeroValue("health_check.healthy_threshold"));
        }
        if config.health_check.unhealthy_threshold == 0 {
            errors.push(ValidationError::ZeroValue(
                "health_check.unhealthy_threshold",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{InstanceConfig, RouteConfig};

    fn route(id: &str, path: &str, service: Option<&str>, uri: Option<&str>) -> RouteConfig {
        RouteConfig {
            id: id.into(),
            path: path.into(),
            service: service.map(Into::into),
            uri: uri.map(Into::into),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.routes.push(route("users", "/api/users/**", None, Some("lb://user-service")));
        config.routes.push(route("users", "/api/loans/**", Some("loan-service"), None));
        config.routes.push(route("bad", "api/risk", Some("risk-service"), None));
        config.routes.push(route("both", "/api/ai", Some("ai"), Some("lb://ai")));
        config.instances.push(InstanceConfig {
            service: "user-service".into(),
            address: "10.0.0.1".into(),
        });
        config.timeouts.upstream_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.contains(&ValidationError::DuplicateRouteId("users".into())));
        assert!(errors.contains(&ValidationError::ZeroValue("timeouts.upstream_ms")));
    }

    #[test]
    fn rejects_non_lb_uri() {
        let mut config = GatewayConfig::default();
        config.routes.push(route("users", "/api/users", None, Some("http://user-service")));
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidRoute { .. }));
    }

    #[test]
    fn rejects_zero_health_timeout() {
        let mut config = GatewayConfig::default();
        config.health_check.timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::ZeroValue("health_check.timeout_secs")]
        );

        // ignored while health checks are off
        config.health_check.enabled = false;
        assert!(validate_config(&config).is_ok());
    }
}
