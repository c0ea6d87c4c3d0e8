//! Structured logging.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the configured level applies to
/// this crate and everything else logs at `warn`.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(format!("warn,caching_proxy={level}"))
        .unwrap_or_else(|_| EnvFilter::new("warn,caching_proxy=info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_falls_back_on_bad_level() {
        let filter = default_filter("not a level!!");
        assert!(filter.to_string().contains("caching_proxy=info"));
    }

    #[test]
    fn filter_uses_configured_level() {
        let filter = default_filter("debug");
        assert!(filter.to_string().contains("caching_proxy=debug"));
    }
}
