//! Model Module - Wastage clustering model
//!
//! Training (scaler + 2-cluster k-means) is kept apart from online
//! classification so the fitted artifacts can be shared read-only.

pub mod scaler;
pub mod kmeans;
pub mod cluster;
pub mod trainer;
pub mod classifier;

#[cfg(test)]
mod tests;

// Re-export common types
pub use classifier::{Classification, ClassifyError, Classifier, MalformedInput};
pub use cluster::{ClusterModel, LabelStrategy, WastageVerdict};
pub use kmeans::{KMeansConfig, N_CLUSTERS};
pub use scaler::NormalizationParams;
pub use trainer::{FittedModel, ModelMetadata, ModelTrainer, TrainerConfig, TrainingReport};
