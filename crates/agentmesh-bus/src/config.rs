//! Environment-driven producer/consumer configuration.

use std::time::Duration;

use agentmesh_types::config::parse_env_var_with_warning;

/// Producer retry behavior for transient send failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 5_000,
        }
    }
}

/// Connection and delivery settings for [`crate::MessageBus`].
#[derive(Debug, Clone)]
pub struct BusConfig {
    pub brokers: String,
    pub send_timeout: Duration,
    pub retry: RetryConfig,
    pub enable_dlq: bool,
    pub dlq_suffix: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            send_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            enable_dlq: true,
            dlq_suffix: "-dlq".to_string(),
        }
    }
}

impl BusConfig {
    /// Loads settings from `KAFKA_BROKERS` / `KAFKA_SEND_TIMEOUT_SECS` /
    /// `KAFKA_MAX_RETRY_ATTEMPTS`, falling back to the documented defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let brokers = std::env::var("KAFKA_BROKERS").unwrap_or(defaults.brokers);
        let send_timeout = Duration::from_secs(parse_env_var_with_warning(
            "KAFKA_SEND_TIMEOUT_SECS",
            defaults.send_timeout.as_secs(),
        ));
        let max_attempts = parse_env_var_with_warning(
            "KAFKA_MAX_RETRY_ATTEMPTS",
            defaults.retry.max_attempts,
        );
        Self {
            brokers,
            send_timeout,
            retry: RetryConfig {
                max_attempts: max_attempts.max(1),
                ..defaults.retry
            },
            ..defaults
        }
    }

    /// The dead-letter topic name for `stream`.
    pub fn dlq_topic(&self, stream: &str) -> String {
        format!("{stream}{}", self.dlq_suffix)
    }
}

/// Consumer group and offset policy for a single subscription.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub group_id: String,
    pub auto_offset_reset: String,
    pub enable_auto_commit: bool,
    pub auto_commit_interval: Duration,
}

impl ConsumerConfig {
    /// A consumer group reading `group_id` from the earliest retained
    /// offset on first connect, per the at-least-once delivery contract.
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            auto_offset_reset: "earliest".to_string(),
            enable_auto_commit: true,
            auto_commit_interval: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dlq_topic_appends_suffix() {
        let cfg = BusConfig::default();
        assert_eq!(cfg.dlq_topic("agentmesh.messages"), "agentmesh.messages-dlq");
    }

    #[test]
    fn consumer_config_defaults_to_earliest_with_auto_commit() {
        let cfg = ConsumerConfig::new("topology-manager");
        assert_eq!(cfg.group_id, "topology-manager");
        assert_eq!(cfg.auto_offset_reset, "earliest");
        assert!(cfg.enable_auto_commit);
    }
}
