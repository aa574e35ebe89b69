//! Classifier - Online inference context
//!
//! Holds the fitted model for the process lifetime and classifies single
//! readings against it. The context is created empty at startup, receives
//! the model exactly once, and fails fast with `UnfittedModel` until then.

use ndarray::ArrayView1;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cluster::WastageVerdict;
use super::kmeans;
use super::trainer::FittedModel;
use crate::logic::features::layout::validate_layout_against;
use crate::logic::features::{
    FeatureError, FeatureVector, LayoutMismatchError, FEATURE_LAYOUT,
};

// ============================================================================
// ERRORS
// ============================================================================

/// Why a single message/reading could not be read
#[derive(Debug, Error)]
pub enum MalformedInput {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing required field 'timestamp'")]
    MissingTimestamp,

    #[error(transparent)]
    Field(#[from] FeatureError),
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("model has not been fitted yet")]
    UnfittedModel,

    #[error("model is already fitted")]
    AlreadyFitted,

    #[error("malformed input: {0}")]
    MalformedInput(#[from] MalformedInput),

    #[error(transparent)]
    LayoutMismatch(#[from] LayoutMismatchError),
}

impl From<FeatureError> for ClassifyError {
    fn from(err: FeatureError) -> Self {
        ClassifyError::MalformedInput(MalformedInput::Field(err))
    }
}

impl ClassifyError {
    /// Per-message failures that should skip the message, not stop the loop
    pub fn is_per_message(&self) -> bool {
        matches!(
            self,
            ClassifyError::MalformedInput(_) | ClassifyError::LayoutMismatch(_)
        )
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Detailed classification output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub cluster: usize,
    pub verdict: WastageVerdict,
    /// Euclidean distance to each centroid in normalized space
    pub distances: Vec<f64>,
    /// Share of the farther distance in the total; 0.5 means equidistant
    pub confidence: f64,
}

// ============================================================================
// CLASSIFIER CONTEXT
// ============================================================================

#[derive(Debug, Default)]
pub struct Classifier {
    model: OnceCell<FittedModel>,
}

impl Classifier {
    /// Empty context; `predict` fails until `install` is called
    pub fn new() -> Self {
        Self {
            model: OnceCell::new(),
        }
    }

    /// Install the fitted model. Only the first call succeeds.
    pub fn install(&self, model: FittedModel) -> Result<(), ClassifyError> {
        let model_id = model.metadata.model_id.clone();
        self.model.set(model).map_err(|_| ClassifyError::AlreadyFitted)?;
        log::info!("Classifier ready with model {}", model_id);
        Ok(())
    }

    pub fn model(&self) -> Result<&FittedModel, ClassifyError> {
        self.model.get().ok_or(ClassifyError::UnfittedModel)
    }

    /// Classify one reading with full detail
    pub fn classify(&self, reading: &FeatureVector) -> Result<Classification, ClassifyError> {
        let model = self.model()?;
        validate_layout_against(&model.metadata.layout, reading.version, reading.layout_hash)?;

        if let Some(pos) = reading.values.iter().position(|v| !v.is_finite()) {
            return Err(FeatureError::NotFinite(FEATURE_LAYOUT[pos]).into());
        }

        let normalized = model.normalizer.transform(reading.as_array());
        let point = ArrayView1::from(&normalized[..]);

        // Compare on a common scale so huge readings cannot overflow
        let (scale, relative) = kmeans::scaled_distances(&model.clusters.centroids, point);
        let cluster = kmeans::nearest_index(&relative);

        let nearest = relative[cluster];
        let farthest = relative.iter().cloned().fold(0.0f64, f64::max);
        let confidence = if farthest > 0.0 {
            1.0 / (1.0 + nearest / farthest)
        } else {
            0.5
        };
        let distances = relative.iter().map(|r| r * scale).collect();

        Ok(Classification {
            cluster,
            verdict: model.clusters.verdict_for(cluster),
            distances,
            confidence,
        })
    }

    /// Classify one reading, verdict only
    pub fn predict(&self, reading: &FeatureVector) -> Result<WastageVerdict, ClassifyError> {
        self.classify(reading).map(|c| c.verdict)
    }
}
