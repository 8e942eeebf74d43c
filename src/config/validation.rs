//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval, timeouts, confirmations)
//! - Check addresses and URLs parse
//! - Check that the status backend has what it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RotatorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{RotatorConfig, StatusBackend};
use crate::rotation::{OperatorIdentity, RotationInterval};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &RotatorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = OperatorIdentity::new(config.rotation.operator_identity.clone()) {
        errors.push(ValidationError::new("rotation.operator_identity", e.to_string()));
    }
    if let Err(e) = RotationInterval::from_minutes(config.rotation.interval_minutes) {
        errors.push(ValidationError::new("rotation.interval_minutes", e.to_string()));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::new("http.request_timeout_secs", "must be positive"));
    }
    if config.http.max_range_entries == 0 {
        errors.push(ValidationError::new("http.max_range_entries", "must be positive"));
    }

    if config.status.default_confirmations == 0 {
        errors.push(ValidationError::new("status.default_confirmations", "must be at least 1"));
    }
    if config.status.backend == StatusBackend::Chain && !config.blockchain.enabled {
        errors.push(ValidationError::new(
            "status.backend",
            "chain backend requires blockchain.enabled = true",
        ));
    }

    if config.blockchain.enabled {
        if url::Url::parse(&config.blockchain.rpc_url).is_err() {
            errors.push(ValidationError::new(
                "blockchain.rpc_url",
                format!("'{}' is not a URL", config.blockchain.rpc_url),
            ));
        }
        if config.blockchain.rpc_timeout_secs == 0 {
            errors.push(ValidationError::new("blockchain.rpc_timeout_secs", "must be positive"));
        }
        if config.blockchain.gas_price_multiplier < 1.0 {
            errors.push(ValidationError::new(
                "blockchain.gas_price_multiplier",
                "must be at least 1.0",
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
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

    fn valid_config() -> RotatorConfig {
        let mut config = RotatorConfig::default();
        config.rotation.operator_identity =
            "0xABCDEF0123456789abcdef0123456789ABCDEF01".to_string();
        config.rotation.interval_minutes = 5;
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.rotation.operator_identity = String::new();
        config.rotation.interval_minutes = -5;
        config.listener.bind_address = "not-an-address".to_string();
        config.status.default_confirmations = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "rotation.operator_identity",
                "rotation.interval_minutes",
                "listener.bind_address",
                "status.default_confirmations",
            ]
        );
    }

    #[test]
    fn test_chain_backend_requires_blockchain() {
        let mut config = valid_config();
        config.status.backend = StatusBackend::Chain;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "status.backend");

        config.blockchain.enabled = true;
        assert!(validate_config(&config).is_ok());

        config.blockchain.rpc_url = "::nope".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "blockchain.rpc_url");
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::new("http.max_range_entries", "must be positive");
        assert_eq!(err.to_string(), "http.max_range_entries: must be positive");
    }
}
