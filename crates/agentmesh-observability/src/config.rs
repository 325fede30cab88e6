//! Environment-driven configuration for tracing and the metrics server.

use agentmesh_types::config::parse_env_var_with_warning;

const DEFAULT_METRICS_PORT: u16 = 9090;
const DEFAULT_LOG_FILTER: &str = "info";

/// Tracing/metrics settings for a single service process.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub service_name: String,
    pub metrics_port: u16,
    pub log_filter: String,
}

impl ObservabilityConfig {
    /// Loads settings for `service_name` from the environment:
    /// `METRICS_PORT` and `RUST_LOG` (falling back to `LOG_FILTER`).
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let log_filter = std::env::var("RUST_LOG")
            .ok()
            .or_else(|| std::env::var("LOG_FILTER").ok())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Self {
            service_name: service_name.into(),
            metrics_port: parse_env_var_with_warning("METRICS_PORT", DEFAULT_METRICS_PORT),
            log_filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env_overrides() {
        let cfg = ObservabilityConfig {
            service_name: "topology".to_string(),
            metrics_port: DEFAULT_METRICS_PORT,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        };
        assert_eq!(cfg.metrics_port, 9090);
        assert_eq!(cfg.log_filter, "info");
    }
}
