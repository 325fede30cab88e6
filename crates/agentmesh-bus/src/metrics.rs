//! Bus-specific Prometheus counters, registered once per process.

use prometheus::Counter;
use std::sync::LazyLock;

pub static MESSAGES_SENT_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    agentmesh_observability::metrics::counter(
        "agentmesh_bus_send_total",
        "Total number of records successfully published to the bus",
    )
});

pub static SEND_RETRIES_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    agentmesh_observability::metrics::counter(
        "agentmesh_bus_send_retries_total",
        "Total number of publish retries due to transient send failures",
    )
});

pub static SEND_FAILURES_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    agentmesh_observability::metrics::counter(
        "agentmesh_bus_send_failures_total",
        "Total number of publishes that exhausted all retries",
    )
});

pub static MESSAGES_CONSUMED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    agentmesh_observability::metrics::counter(
        "agentmesh_bus_consume_total",
        "Total number of records received from the bus",
    )
});

pub static CONSUME_HANDLER_ERRORS_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    agentmesh_observability::metrics::counter(
        "agentmesh_bus_consume_handler_errors_total",
        "Total number of records whose handler returned an error and were dropped",
    )
});
