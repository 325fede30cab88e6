//! Kafka-backed message bus client.
//!
//! Wraps `rdkafka`'s `FutureProducer`/`StreamConsumer` the way the
//! teacher's Kafka producer/consumer pair does: a retrying, metered
//! `publish`, and a consumer-group `consume` loop that logs and skips
//! records it cannot handle rather than stalling the partition.
//! Delivery is at-least-once; handlers must be idempotent.

pub mod config;
pub mod errors;
pub mod metrics;

use std::time::Duration;

use agentmesh_types::BusEnvelope;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use rdkafka::Message;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

pub use config::{BusConfig, ConsumerConfig, RetryConfig};
pub use errors::{Error, Result};

/// A bus client bound to one broker set, shared across every
/// publish/subscribe call a service makes.
pub struct MessageBus {
    producer: FutureProducer,
    config: BusConfig,
}

impl MessageBus {
    /// Connects a producer to `config.brokers`.
    pub fn connect(config: BusConfig) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", config.send_timeout.as_millis().to_string())
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .create()
            .map_err(|e| Error::ClientCreation(e.to_string()))?;
        Ok(Self { producer, config })
    }

    /// Publishes `payload` to `stream` keyed by `key`, wrapped in a
    /// [`BusEnvelope`]. Retries transient failures with exponential
    /// backoff and jitter; on exhaustion, best-effort forwards the
    /// raw JSON to `<stream><dlq_suffix>` and returns an error.
    pub async fn publish<T: Serialize>(&self, stream: &str, key: &str, record_type: &str, payload: T) -> Result<()> {
        let envelope = BusEnvelope::wrap(record_type, payload);
        let body = serde_json::to_vec(&envelope).map_err(|source| Error::Serialize {
            stream: stream.to_string(),
            source,
        })?;

        let retry = &self.config.retry;
        let mut last_reason = String::new();

        for attempt in 0..retry.max_attempts {
            let record = FutureRecord::to(stream).key(key).payload(&body);
            match self.producer.send(record, Timeout::After(self.config.send_timeout)).await {
                Ok(_) => {
                    metrics::MESSAGES_SENT_TOTAL.inc();
                    return Ok(());
                }
                Err((err, _)) => {
                    last_reason = err.to_string();
                    if attempt + 1 < retry.max_attempts {
                        metrics::SEND_RETRIES_TOTAL.inc();
                        let exp = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                        let delay = (retry.base_delay_ms.saturating_mul(exp)).min(retry.max_delay_ms);
                        let jitter = (delay as f64 * 0.25 * rand::random::<f64>()) as u64;
                        tracing::warn!(
                            stream,
                            attempt = attempt + 1,
                            max_attempts = retry.max_attempts,
                            error = %last_reason,
                            "bus publish failed, retrying"
                        );
                        tokio::time::sleep(Duration::from_millis(delay + jitter)).await;
                    }
                }
            }
        }

        metrics::SEND_FAILURES_TOTAL.inc();
        tracing::error!(stream, attempts = retry.max_attempts, error = %last_reason, "bus publish exhausted retries");

        if self.config.enable_dlq {
            let dlq_topic = self.config.dlq_topic(stream);
            let record = FutureRecord::to(&dlq_topic).key(key).payload(&body);
            if let Err((err, _)) = self.producer.send(record, Timeout::After(Duration::from_secs(5))).await {
                tracing::warn!(stream, dlq_topic, error = %err, "failed to forward record to DLQ");
            }
        }

        Err(Error::SendFailed {
            stream: stream.to_string(),
            attempts: retry.max_attempts,
            reason: last_reason,
        })
    }

    /// Subscribes to `stream` under `consumer.group_id` and invokes
    /// `handler` for every successfully decoded [`BusEnvelope<T>`]
    /// until `cancel` fires. A record that fails to decode, or a
    /// handler call that errors, is logged and dropped; the consumer
    /// advances past it rather than stalling the partition.
    pub async fn consume<T, F, Fut>(
        &self,
        stream: &str,
        consumer: ConsumerConfig,
        cancel: CancellationToken,
        mut handler: F,
    ) -> Result<()>
    where
        T: DeserializeOwned,
        F: FnMut(BusEnvelope<T>) -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<()>>,
    {
        let stream_consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.config.brokers)
            .set("group.id", &consumer.group_id)
            .set("auto.offset.reset", &consumer.auto_offset_reset)
            .set("enable.auto.commit", consumer.enable_auto_commit.to_string())
            .set(
                "auto.commit.interval.ms",
                consumer.auto_commit_interval.as_millis().to_string(),
            )
            .create()
            .map_err(|e| Error::ClientCreation(e.to_string()))?;

        stream_consumer
            .subscribe(&[stream])
            .map_err(|e| Error::InvalidConfig(format!("failed to subscribe to {stream}: {e}")))?;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(stream, group = %consumer.group_id, "consumer shutting down");
                    return Ok(());
                }
                recv = stream_consumer.recv() => {
                    match recv {
                        Ok(message) => {
                            metrics::MESSAGES_CONSUMED_TOTAL.inc();
                            let Some(bytes) = message.payload() else {
                                continue;
                            };
                            match serde_json::from_slice::<BusEnvelope<T>>(bytes) {
                                Ok(envelope) => {
                                    if let Err(e) = handler(envelope).await {
                                        metrics::CONSUME_HANDLER_ERRORS_TOTAL.inc();
                                        tracing::debug!(stream, error = %e, "handler rejected record, dropping");
                                    }
                                }
                                Err(e) => {
                                    metrics::CONSUME_HANDLER_ERRORS_TOTAL.inc();
                                    tracing::debug!(stream, error = %e, "failed to decode record, dropping");
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!(stream, error = %e, "transient consumer error");
                        }
                    }
                }
            }
        }
    }
}
