//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check that addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
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

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_non_zero(&mut errors, "listener.max_connections", config.listener.max_connections as u64);
    check_non_zero(&mut errors, "listener.backlog", config.listener.backlog as u64);

    check_non_zero(&mut errors, "client.idle_timeout_ms", config.client.idle_timeout_ms);
    check_non_zero(&mut errors, "client.max_head_bytes", config.client.max_head_bytes as u64);

    check_non_zero(&mut errors, "origin.timeout_secs", config.origin.timeout_secs);
    check_non_zero(&mut errors, "origin.read_chunk_bytes", config.origin.read_chunk_bytes as u64);
    check_non_zero(&mut errors, "origin.max_response_bytes", config.origin.max_response_bytes as u64);

    let agent = &config.origin.user_agent;
    if agent.is_empty() || !agent.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
        errors.push(ValidationError::new(
            "origin.user_agent",
            "must be non-empty printable ASCII",
        ));
    }

    if config.observability.metrics_enabled {
        check_addr(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if config.admin.enabled {
        check_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new("admin.api_key", "must not be empty when admin is enabled"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if let Err(e) = value.parse::<SocketAddr>() {
        errors.push(ValidationError::new(field, format!("invalid socket address {value:?}: {e}")));
    }
}

fn check_non_zero(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::new(field, "must be greater than zero"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.origin.timeout_secs = 0;
        config.origin.user_agent = "bad\r\nagent".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["listener.bind_address", "origin.timeout_secs", "origin.user_agent"]
        );
    }

    #[test]
    fn admin_checks_only_when_enabled() {
        let mut config = ProxyConfig::default();
        config.admin.api_key.clear();
        config.admin.bind_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.admin.enabled = true;
        assert_eq!(validate_config(&config).unwrap_err().len(), 2);
    }
}
