//! Safe Prometheus metric registration.
//!
//! AgentMesh binaries and the library crates they depend on (`agentmesh-bus`,
//! `agentmesh-store`) both want to register counters like
//! `agentmesh_bus_send_retries_total`. Registering the same name twice
//! against `prometheus::default_registry()` is an error upstream
//! panics on; these helpers look the metric up first and hand back
//! the existing handle instead.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, TextEncoder};
use std::sync::LazyLock;
use tracing::{debug, warn};

#[derive(Clone)]
struct CounterEntry {
    metric: Counter,
}

#[derive(Clone)]
struct CounterVecEntry {
    metric: CounterVec,
}

#[derive(Clone)]
struct GaugeEntry {
    metric: Gauge,
}

static COUNTERS: LazyLock<DashMap<String, CounterEntry>> = LazyLock::new(DashMap::new);
static COUNTER_VECS: LazyLock<DashMap<String, CounterVecEntry>> = LazyLock::new(DashMap::new);
static GAUGES: LazyLock<DashMap<String, GaugeEntry>> = LazyLock::new(DashMap::new);

/// Looks up or registers a plain counter.
pub fn counter(name: &str, help: &str) -> Counter {
    match COUNTERS.entry(name.to_string()) {
        Entry::Occupied(entry) => entry.get().metric.clone(),
        Entry::Vacant(entry) => {
            let metric = Counter::new(name, help).expect("metric name is a valid prometheus identifier");
            register(&metric, name);
            entry.insert(CounterEntry { metric: metric.clone() });
            metric
        }
    }
}

/// Looks up or registers a labeled counter vector.
pub fn counter_vec(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    match COUNTER_VECS.entry(name.to_string()) {
        Entry::Occupied(entry) => entry.get().metric.clone(),
        Entry::Vacant(entry) => {
            let metric = CounterVec::new(Opts::new(name, help), labels)
                .expect("metric name/labels are valid prometheus identifiers");
            register(&metric, name);
            entry.insert(CounterVecEntry { metric: metric.clone() });
            metric
        }
    }
}

/// Looks up or registers a plain gauge.
pub fn gauge(name: &str, help: &str) -> Gauge {
    match GAUGES.entry(name.to_string()) {
        Entry::Occupied(entry) => entry.get().metric.clone(),
        Entry::Vacant(entry) => {
            let metric = Gauge::new(name, help).expect("metric name is a valid prometheus identifier");
            register(&metric, name);
            entry.insert(GaugeEntry { metric: metric.clone() });
            metric
        }
    }
}

fn register(collector: &(impl prometheus::core::Collector + Clone + 'static), name: &str) {
    if let Err(e) = prometheus::default_registry().register(Box::new(collector.clone())) {
        match e {
            prometheus::Error::AlreadyReg => {
                debug!(metric = name, "metric already registered; continuing");
            }
            other => warn!(metric = name, error = %other, "metric registration failed"),
        }
    }
}

/// Renders every registered metric in Prometheus text exposition format.
pub fn export() -> String {
    let families = prometheus::default_registry().gather();
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buf) {
        warn!(error = %e, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registering_the_same_counter_name_twice_reuses_the_handle() {
        let a = counter("agentmesh_test_counter_total", "test counter");
        let b = counter("agentmesh_test_counter_total", "test counter");
        a.inc();
        assert_eq!(b.get(), 1.0);
    }

    #[test]
    fn export_includes_registered_metrics() {
        counter("agentmesh_test_export_total", "test export counter").inc();
        let text = export();
        assert!(text.contains("agentmesh_test_export_total"));
    }
}
