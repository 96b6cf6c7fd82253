//! Observation formatting and stream generators.
//!
//! A [`StreamGenerator`] turns buffered SensorThings observations into the
//! engine's event envelope and POSTs them to a receiver endpoint until its
//! expiration instant. Fan-out across generators is bounded and every
//! per-generator failure is propagated back to the caller.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use gedsys_core::domain::error::{GedsysError, Result};
use gedsys_core::domain::stream::StreamDefinition;
use gedsys_core::obs::emit_observation_pushed;
use gedsys_core::store::TransportError;

/// Format one expanded datastream record into the engine's event envelope.
///
/// The payload field carries the stream's phenomenon name; the remaining
/// envelope keys are fixed by the receiver mapping.
pub fn map_observation(
    event_id: &str,
    datastream: &Value,
    location: (f64, f64),
    stream: &StreamDefinition,
) -> Result<Value> {
    let malformed =
        |field: &str| GedsysError::MalformedObservation(format!("missing {field}"));

    let observation = datastream
        .get("Observations")
        .and_then(|o| o.get(0))
        .ok_or_else(|| malformed("Observations[0]"))?;
    let observation_id = observation
        .get("@iot.id")
        .ok_or_else(|| malformed("Observations[0].@iot.id"))?;
    let result_time = observation
        .get("resultTime")
        .ok_or_else(|| malformed("Observations[0].resultTime"))?;
    let result = observation
        .get("result")
        .ok_or_else(|| malformed("Observations[0].result"))?;
    let symbol = datastream
        .get("unitOfMeasurement")
        .and_then(|u| u.get("symbol"))
        .ok_or_else(|| malformed("unitOfMeasurement.symbol"))?;
    let phenomenon = stream
        .phenomenon_field()
        .ok_or_else(|| malformed("stream payload field"))?;

    Ok(json!({
        "event": {
            "metaData": {
                "observation_id": observation_id,
                "result_time": result_time,
                "symbol": symbol
            },
            "correlationData": {
                "event_id": event_id
            },
            "payloadData": {
                phenomenon.name.as_str(): result,
                "x_coord": location.0,
                "y_coord": location.1
            }
        }
    }))
}

/// Pushes a batch of observations into one CEP receiver endpoint.
pub struct StreamGenerator {
    id: String,
    receiver: String,
    observations: Vec<Value>,
    stream: StreamDefinition,
    update_frequency_ms: u64,
    expiration: DateTime<Utc>,
    client: reqwest::Client,
}

impl StreamGenerator {
    pub fn new(
        receiver_endpoint: impl Into<String>,
        observations: Vec<Value>,
        stream: StreamDefinition,
        expiration: DateTime<Utc>,
        update_frequency_ms: u64,
    ) -> Self {
        // Engine deployments historically run with stale certificates.
        let client = reqwest::Client::builder()
            .user_agent("gedsys/0.1.0")
            .danger_accept_invalid_certs(true)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            id: Uuid::new_v4().to_string(),
            receiver: receiver_endpoint.into(),
            observations,
            stream,
            update_frequency_ms,
            expiration,
            client,
        }
    }

    /// Unique identifier, carried in every pushed event's correlation data.
    pub fn id(&self) -> &str {
        &self.id
    }

    async fn push(&self, payload: &Value) -> std::result::Result<(), TransportError> {
        self.client
            .post(&self.receiver)
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        emit_observation_pushed(&self.id, &self.receiver);
        Ok(())
    }

    /// Push the batch once per cycle until expiration.
    ///
    /// A zero update frequency means a single pass. Observations that fail
    /// to map are skipped with a warning; a failed push aborts this
    /// generator and surfaces the cause. Returns the number of pushes.
    pub async fn run(&self, counter: &AtomicU64) -> Result<u64> {
        let mut pushed = 0u64;
        while Utc::now() < self.expiration {
            for thing in &self.observations {
                let Some(location) = crate::sensor::thing_coordinates(thing) else {
                    warn!(generator_id = %self.id, "observation without location, skipping");
                    continue;
                };
                let Some(datastream) = thing.get("Datastreams").and_then(|d| d.get(0)) else {
                    warn!(generator_id = %self.id, "observation without datastream, skipping");
                    continue;
                };
                let payload = match map_observation(&self.id, datastream, location, &self.stream) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(generator_id = %self.id, cause = %e, "unmappable observation, skipping");
                        continue;
                    }
                };
                self.push(&payload).await?;
                pushed += 1;
                counter.fetch_add(1, Ordering::Relaxed);
            }
            if self.update_frequency_ms == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(self.update_frequency_ms)).await;
        }
        Ok(pushed)
    }
}

/// Outcome of running a set of generators to completion.
pub struct StreamingOutcome {
    /// Total pushes across all generators.
    pub total_pushed: u64,
    /// Per-generator result, in completion order.
    pub results: Vec<(String, Result<u64>)>,
}

impl StreamingOutcome {
    pub fn fully_succeeded(&self) -> bool {
        self.results.iter().all(|(_, r)| r.is_ok())
    }
}

/// Run all generators with a bounded number of concurrent workers.
pub async fn stream_all(generators: Vec<StreamGenerator>, workers: usize) -> StreamingOutcome {
    let counter = Arc::new(AtomicU64::new(0));
    let results: Vec<(String, Result<u64>)> = stream::iter(generators)
        .map(|generator| {
            let counter = Arc::clone(&counter);
            async move {
                let id = generator.id().to_string();
                let result = generator.run(&counter).await;
                (id, result)
            }
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    StreamingOutcome {
        total_pushed: counter.load(Ordering::Relaxed),
        results,
    }
}
