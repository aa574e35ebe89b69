//! Model Trainer - Offline fit at startup
//!
//! Fits the scaler and the 2-cluster partitioner on the historical dataset
//! and decides which cluster means wastage. Runs once, synchronously,
//! before any reading is classified.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cluster::{choose_wastage_cluster, ClusterModel, LabelStrategy};
use super::kmeans::{self, KMeansConfig, N_CLUSTERS};
use super::scaler::NormalizationParams;
use crate::logic::dataset::{DatasetError, HistoricalDataset, MIN_TRAINING_ROWS};
use crate::logic::features::LayoutInfo;

// ============================================================================
// CONFIG
// ============================================================================

/// Training parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    pub seed: u64,
    pub max_iterations: usize,
    pub n_init: usize,
    pub label_strategy: LabelStrategy,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        let kmeans = KMeansConfig::default();
        Self {
            seed: kmeans.seed,
            max_iterations: kmeans.max_iterations,
            n_init: kmeans.n_init,
            label_strategy: LabelStrategy::default(),
        }
    }
}

impl TrainerConfig {
    fn kmeans(&self) -> KMeansConfig {
        KMeansConfig {
            k: N_CLUSTERS,
            max_iterations: self.max_iterations.max(1),
            n_init: self.n_init.max(1),
            seed: self.seed,
        }
    }
}

// ============================================================================
// ARTIFACTS
// ============================================================================

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    pub fitted_at: DateTime<Utc>,
    pub seed: u64,
    pub training_rows: usize,
    /// `HistoricalDataset::fingerprint` of the training data
    pub dataset_fingerprint: String,
    pub layout: LayoutInfo,
}

/// Scaler and cluster model fitted together in the same normalized space
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub normalizer: NormalizationParams,
    pub clusters: ClusterModel,
    pub metadata: ModelMetadata,
}

/// Training diagnostics. `assignments` follows the dataset row order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub rows: usize,
    pub assignments: Vec<usize>,
    pub cluster_sizes: Vec<usize>,
    pub wastage_cluster: usize,
    pub inertia: f64,
    pub iterations: usize,
    pub converged: bool,
    pub duration_ms: u64,
}

impl TrainingReport {
    /// Verdict per training row, 1 for wastage
    pub fn row_predictions(&self) -> Vec<u8> {
        self.assignments
            .iter()
            .map(|&c| u8::from(c == self.wastage_cluster))
            .collect()
    }
}

// ============================================================================
// TRAINER
// ============================================================================

pub struct ModelTrainer {
    config: TrainerConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Fit the scaler and partitioner on `dataset`
    pub fn fit(
        &self,
        dataset: &HistoricalDataset,
    ) -> Result<(FittedModel, TrainingReport), DatasetError> {
        let start = Instant::now();
        dataset.ensure_min_rows(MIN_TRAINING_ROWS.max(N_CLUSTERS))?;
        dataset.ensure_finite()?;

        let raw = dataset.to_matrix();
        let normalizer = NormalizationParams::fit(&raw).ok_or(DatasetError::InsufficientData {
            rows: dataset.len(),
            required: MIN_TRAINING_ROWS,
        })?;
        let normalized = normalizer.transform_matrix(&raw);

        let fit = kmeans::fit(&normalized, &self.config.kmeans());
        let wastage_cluster =
            choose_wastage_cluster(self.config.label_strategy, &fit.centroids, &normalizer);

        let mut cluster_sizes = vec![0usize; N_CLUSTERS];
        for &c in &fit.labels {
            cluster_sizes[c] += 1;
        }

        let clusters = ClusterModel {
            centroids: fit.centroids,
            wastage_cluster,
            strategy: self.config.label_strategy,
        };

        let metadata = ModelMetadata {
            model_id: uuid::Uuid::new_v4().to_string(),
            fitted_at: Utc::now(),
            seed: self.config.seed,
            training_rows: dataset.len(),
            dataset_fingerprint: dataset.fingerprint(),
            layout: LayoutInfo::current(),
        };

        let report = TrainingReport {
            rows: dataset.len(),
            assignments: fit.labels,
            cluster_sizes,
            wastage_cluster,
            inertia: fit.inertia,
            iterations: fit.iterations,
            converged: fit.converged,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        log::info!(
            "Model {} fitted on {} rows: iterations={} converged={} inertia={:.4} sizes={:?}",
            metadata.model_id,
            report.rows,
            report.iterations,
            report.converged,
            report.inertia,
            report.cluster_sizes
        );
        for (i, centroid) in clusters.raw_centroids(&normalizer).iter().enumerate() {
            log::info!(
                "  cluster {} ({}): centroid={:?}",
                i,
                clusters.verdict_for(i),
                centroid
            );
        }
        let flagged = report.row_predictions().iter().filter(|&&p| p == 1).count();
        log::info!("  {} of {} training rows labeled wastage", flagged, report.rows);
        if !report.converged {
            log::warn!(
                "K-means hit the iteration cap ({}) before settling",
                self.config.max_iterations
            );
        }

        Ok((
            FittedModel {
                normalizer,
                clusters,
                metadata,
            },
            report,
        ))
    }
}

impl Default for ModelTrainer {
    fn default() -> Self {
        Self::new(TrainerConfig::default())
    }
}
