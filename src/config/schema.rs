//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! Every section has defaults, so an empty file (or no file) is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the caching proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Client-facing read limits.
    pub client: ClientConfig,

    /// Origin connector settings.
    pub origin: OriginConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Graceful shutdown settings.
    pub shutdown: ShutdownConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8888").
    pub bind_address: String,

    /// Maximum concurrent client sessions (backpressure).
    pub max_connections: usize,

    /// Listen backlog passed to the socket.
    pub backlog: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8888".to_string(),
            max_connections: 1024,
            backlog: 1024,
        }
    }
}

/// Limits applied while reading the client request head.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Inactivity timeout while waiting for request bytes, in milliseconds.
    pub idle_timeout_ms: u64,

    /// Largest request head accepted, in bytes.
    pub max_head_bytes: usize,
}

impl ClientConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 2000,
            max_head_bytes: 64 * 1024,
        }
    }
}

/// Origin connector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Connect and per-read timeout in seconds.
    pub timeout_secs: u64,

    /// `User-Agent` sent on every origin request.
    pub user_agent: String,

    /// Size of each socket read.
    pub read_chunk_bytes: usize,

    /// Largest origin response accepted, in bytes.
    pub max_response_bytes: usize,
}

impl OriginConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 6,
            user_agent: concat!("caching-proxy/", env!("CARGO_PKG_VERSION")).to_string(),
            read_chunk_bytes: 4096,
            max_response_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long live sessions get to finish after shutdown starts.
    pub drain_timeout_secs: u64,
}

impl ShutdownConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behaviour() {
        let config = ProxyConfig::default();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8888");
        assert_eq!(config.client.idle_timeout(), Duration::from_secs(2));
        assert_eq!(config.origin.timeout(), Duration::from_secs(6));
        assert!(config.origin.user_agent.starts_with("caching-proxy/"));
        assert!(!config.admin.enabled);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [origin]
            timeout_secs = 2

            [listener]
            bind_address = "0.0.0.0:3128"
            "#,
        )
        .unwrap();

        assert_eq!(config.origin.timeout_secs, 2);
        assert_eq!(config.origin.read_chunk_bytes, 4096);
        assert_eq!(config.listener.bind_address, "0.0.0.0:3128");
        assert_eq!(config.listener.max_connections, 1024);
    }
}
