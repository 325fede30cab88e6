//! Structured logging initialization.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::ObservabilityConfig;
use crate::error::{Error, Result};

/// Installs a JSON-line `tracing` subscriber driven by `cfg.log_filter`,
/// tagging every event with `service = cfg.service_name`.
///
/// Idempotent: a second call after one has already succeeded in this
/// process returns `Ok(())` without reinstalling the subscriber.
pub fn init_tracing(cfg: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&cfg.log_filter)
        .map_err(|e| Error::Tracing(format!("invalid log filter {:?}: {e}", cfg.log_filter)))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    match tracing::subscriber::set_global_default(subscriber) {
        Ok(()) => {
            tracing::info!(service = %cfg.service_name, "tracing initialized");
            Ok(())
        }
        Err(_already_set) => Ok(()),
    }
}
