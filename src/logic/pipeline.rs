//! Pipeline - Message-driven classification loop
//!
//! Consumes sensor envelopes, classifies each one against the installed
//! model and publishes a `PredictionResult` on the output topic.
//! A bad message is logged and skipped; the loop keeps running.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::logic::messages::{InboundReading, PredictionResult};
use crate::logic::model::{ClassifyError, Classifier};
use crate::logic::transport::Envelope;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error("outbound channel closed")]
    OutputClosed,
}

// ============================================================================
// TOPICS & STATS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub input: String,
    pub output: String,
}

/// Loop counters
#[derive(Debug, Default)]
pub struct PipelineStats {
    received: AtomicU64,
    published: AtomicU64,
    rejected: AtomicU64,
    ignored: AtomicU64,
    last_rejection: RwLock<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub received: u64,
    pub published: u64,
    pub rejected: u64,
    pub ignored: u64,
    pub last_rejection: Option<String>,
}

impl PipelineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            last_rejection: self.last_rejection.read().clone(),
        }
    }

    fn reject(&self, reason: String) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        *self.last_rejection.write() = Some(reason);
    }
}

// ============================================================================
// SINGLE MESSAGE
// ============================================================================

/// Decode, classify and build the outbound result for one payload
pub fn handle_message(
    classifier: &Classifier,
    payload: &[u8],
) -> Result<PredictionResult, ClassifyError> {
    let reading = InboundReading::from_slice(payload)?;
    log::debug!("Decoded reading: {}", reading.features.to_log_entry());
    let verdict = classifier.predict(&reading.features)?;
    Ok(PredictionResult::new(reading.timestamp, verdict))
}

// ============================================================================
// LOOP
// ============================================================================

pub struct Pipeline {
    classifier: Arc<Classifier>,
    topics: Topics,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new(classifier: Arc<Classifier>, topics: Topics) -> Self {
        Self {
            classifier,
            topics,
            stats: PipelineStats::default(),
        }
    }

    /// Run until `inbound` closes or `shutdown` resolves.
    ///
    /// Refuses to start without an installed model.
    pub async fn run<S>(
        &self,
        mut inbound: mpsc::Receiver<Envelope>,
        outbound: mpsc::Sender<Envelope>,
        shutdown: S,
    ) -> Result<StatsSnapshot, PipelineError>
    where
        S: Future<Output = ()>,
    {
        let model = self.classifier.model()?;
        log::info!(
            "Pipeline started: {} -> {} (model {})",
            self.topics.input,
            self.topics.output,
            model.metadata.model_id
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Shutdown requested, stopping pipeline");
                    break;
                }

                message = inbound.recv() => {
                    let Some(envelope) = message else {
                        log::info!("Inbound channel closed, stopping pipeline");
                        break;
                    };
                    self.process(envelope, &outbound).await?;
                }
            }
        }

        let snapshot = self.stats.snapshot();
        log::info!(
            "Pipeline stopped: received={} published={} rejected={} ignored={}",
            snapshot.received,
            snapshot.published,
            snapshot.rejected,
            snapshot.ignored
        );
        Ok(snapshot)
    }

    async fn process(
        &self,
        envelope: Envelope,
        outbound: &mpsc::Sender<Envelope>,
    ) -> Result<(), PipelineError> {
        if envelope.topic != self.topics.input {
            log::debug!("Ignoring message on topic '{}'", envelope.topic);
            self.stats.ignored.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        let result = match handle_message(&self.classifier, &envelope.payload) {
            Ok(result) => result,
            Err(e) if e.is_per_message() => {
                log::warn!("Skipping message: {}", e);
                let raw = String::from_utf8_lossy(&envelope.payload);
                log::debug!("Rejected payload: {}", raw);
                self.stats.reject(e.to_string());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let payload = match result.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("Failed to encode prediction: {}", e);
                self.stats.reject(e.to_string());
                return Ok(());
            }
        };

        outbound
            .send(Envelope::new(self.topics.output.as_str(), payload))
            .await
            .map_err(|_| PipelineError::OutputClosed)?;
        self.stats.published.fetch_add(1, Ordering::Relaxed);

        log::info!(
            "Prediction sent: timestamp={} wastage_prediction={}",
            result.timestamp,
            result.wastage_prediction
        );
        Ok(())
    }
}
