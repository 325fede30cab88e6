//! Environment-driven configuration shared by every AgentMesh service.
//!
//! `parse_env_var_with_warning`: an env var that is set but fails to
//! parse logs a warning and falls back to the default rather than
//! silently misbehaving or panicking.

use std::time::Duration;

/// Default initial edge weight, used both for full-mesh seeding and
/// for auto-created edges on first reinforcement.
pub const DEFAULT_INITIAL_EDGE_WEIGHT: f64 = 0.5;
/// Default per-message reinforcement increment (`alpha`).
pub const DEFAULT_REINFORCEMENT_AMOUNT: f64 = 0.1;
/// Default per-tick decay decrement (`beta`).
pub const DEFAULT_DECAY_RATE: f64 = 0.05;
/// Default interval between decay/prune ticks.
pub const DEFAULT_DECAY_INTERVAL: Duration = Duration::from_secs(5);
/// Default prune threshold (`theta`).
pub const DEFAULT_PRUNE_THRESHOLD: f64 = 0.1;
/// Default quorum ratio required to accept a proposal.
pub const DEFAULT_QUORUM_THRESHOLD: f64 = 0.6;
/// Default time a proposal may remain pending before expiring.
pub const DEFAULT_PROPOSAL_TIMEOUT: Duration = Duration::from_secs(30);
/// Default floor below which a waggle signal is not considered credible.
pub const DEFAULT_WAGGLE_INTENSITY_MIN: f64 = 0.3;
/// Default stream/topic name prefix.
pub const DEFAULT_STREAM_PREFIX: &str = "agentmesh.";

/// Parses an environment variable into `T`, warning and falling back
/// to `default` if the variable is set but fails to parse.
pub fn parse_env_var_with_warning<T: std::str::FromStr>(var_name: &str, default: T) -> T {
    match std::env::var(var_name) {
        Ok(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(var = var_name, value = %value, "invalid env var value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Tunable knobs for the topology/consensus engines, loaded from
/// environment variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningConfig {
    pub initial_edge_weight: f64,
    pub reinforcement_amount: f64,
    pub decay_rate: f64,
    pub decay_interval: Duration,
    pub prune_threshold: f64,
    pub quorum_threshold: f64,
    pub proposal_timeout: Duration,
    pub waggle_intensity_min: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            initial_edge_weight: DEFAULT_INITIAL_EDGE_WEIGHT,
            reinforcement_amount: DEFAULT_REINFORCEMENT_AMOUNT,
            decay_rate: DEFAULT_DECAY_RATE,
            decay_interval: DEFAULT_DECAY_INTERVAL,
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
            quorum_threshold: DEFAULT_QUORUM_THRESHOLD,
            proposal_timeout: DEFAULT_PROPOSAL_TIMEOUT,
            waggle_intensity_min: DEFAULT_WAGGLE_INTENSITY_MIN,
        }
    }
}

impl TuningConfig {
    /// Loads tuning values from the environment, falling back to
    /// spec-mandated defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            initial_edge_weight: parse_env_var_with_warning(
                "INITIAL_EDGE_WEIGHT",
                defaults.initial_edge_weight,
            ),
            reinforcement_amount: parse_env_var_with_warning(
                "REINFORCEMENT_AMOUNT",
                defaults.reinforcement_amount,
            ),
            decay_rate: parse_env_var_with_warning("DECAY_RATE", defaults.decay_rate),
            decay_interval: Duration::from_secs(parse_env_var_with_warning(
                "DECAY_INTERVAL_SECS",
                defaults.decay_interval.as_secs(),
            )),
            prune_threshold: parse_env_var_with_warning("PRUNE_THRESHOLD", defaults.prune_threshold),
            quorum_threshold: parse_env_var_with_warning(
                "QUORUM_THRESHOLD",
                defaults.quorum_threshold,
            ),
            proposal_timeout: Duration::from_secs(parse_env_var_with_warning(
                "PROPOSAL_TIMEOUT_SECS",
                defaults.proposal_timeout.as_secs(),
            )),
            waggle_intensity_min: parse_env_var_with_warning(
                "WAGGLE_INTENSITY_MIN",
                defaults.waggle_intensity_min,
            ),
        }
    }
}

/// Stream/topic naming, derived from a configurable prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamNames {
    prefix: String,
}

impl StreamNames {
    pub fn from_env() -> Self {
        let prefix = std::env::var("AGENTMESH_STREAM_PREFIX").unwrap_or_else(|_| DEFAULT_STREAM_PREFIX.to_string());
        Self { prefix }
    }

    fn named(&self, suffix: &str) -> String {
        format!("{}{}", self.prefix, suffix)
    }

    pub fn topology(&self) -> String {
        self.named("topology")
    }
    pub fn messages(&self) -> String {
        self.named("messages")
    }
    pub fn proposals(&self) -> String {
        self.named("proposals")
    }
    pub fn votes(&self) -> String {
        self.named("votes")
    }
    pub fn insights(&self) -> String {
        self.named("insights")
    }
    pub fn consensus(&self) -> String {
        self.named("consensus")
    }
}

impl Default for StreamNames {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_STREAM_PREFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuning_config_defaults_match_spec() {
        let c = TuningConfig::default();
        assert_eq!(c.initial_edge_weight, 0.5);
        assert_eq!(c.reinforcement_amount, 0.1);
        assert_eq!(c.decay_rate, 0.05);
        assert_eq!(c.prune_threshold, 0.1);
        assert_eq!(c.quorum_threshold, 0.6);
        assert_eq!(c.proposal_timeout, Duration::from_secs(30));
    }

    #[test]
    fn stream_names_apply_configured_prefix() {
        let names = StreamNames {
            prefix: "myprefix.".to_string(),
        };
        assert_eq!(names.topology(), "myprefix.topology");
        assert_eq!(names.votes(), "myprefix.votes");
    }

    #[test]
    fn default_stream_names_use_agentmesh_prefix() {
        let names = StreamNames::default();
        assert_eq!(names.messages(), "agentmesh.messages");
    }
}
