//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LoadBalancePolicy;

    const SAMPLE: &str = r#"
        [listener]
        bind_address = "127.0.0.1:9000"

        [[routes]]
        id = "user-service"
        path = "/api/users/**"
        uri = "lb://ai-loan-user-service"

        [[routes]]
        id = "loan-service"
        path = "/api/loans"
        service = "ai-loan-loan-service"

        [[instances]]
        service = "ai-loan-user-service"
        address = "10.0.0.1:8080"

        [load_balancer]
        policy = "random"

        [health_check]
        enabled = false
    "#;

    #[test]
    fn parses_sample_config() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.instances.len(), 1);
        assert_eq!(config.load_balancer.policy, LoadBalancePolicy::Random);
        assert!(!config.health_check.enabled);
        // untouched sections keep their defaults
        assert!(config.retries.enabled);
        assert_eq!(config.timeouts.upstream_ms, 30_000);
    }

    #[test]
    fn reports_validation_errors() {
        let err = parse_config(
            r#"
            [[routes]]
            id = "broken"
            path = ""
            service = "x"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn reports_parse_errors() {
        let err = parse_config("routes = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn bundled_config_is_valid() {
        let config = parse_config(include_str!("../../gateway.toml")).unwrap();
        assert_eq!(config.routes.len(), 6);
        assert!(config.admin.enabled);
    }
}
