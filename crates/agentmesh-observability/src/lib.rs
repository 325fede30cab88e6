//! Shared tracing initialization and Prometheus metrics for every
//! AgentMesh service process.

pub mod config;
pub mod error;
pub mod metrics;
pub mod metrics_server;
pub mod tracer;

pub use config::ObservabilityConfig;
pub use error::{Error, Result};
pub use tracer::init_tracing;
