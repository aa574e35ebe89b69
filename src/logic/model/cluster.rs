//! Cluster Model - Centroids and the cluster → verdict mapping
//!
//! Cluster ids from k-means carry no meaning of their own. The mapping to a
//! wastage verdict is decided once at training time by a `LabelStrategy`.

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::scaler::NormalizationParams;
use crate::logic::features::layout::CURRENT_USAGE_INDEX;
use crate::logic::features::FEATURE_COUNT;

// ============================================================================
// VERDICT
// ============================================================================

/// Binary classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WastageVerdict {
    Normal,
    Wastage,
}

impl WastageVerdict {
    /// Wire encoding: 1 for wastage, 0 for normal
    pub fn as_u8(&self) -> u8 {
        match self {
            WastageVerdict::Normal => 0,
            WastageVerdict::Wastage => 1,
        }
    }
}

impl fmt::Display for WastageVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WastageVerdict::Normal => write!(f, "normal"),
            WastageVerdict::Wastage => write!(f, "wastage"),
        }
    }
}

// ============================================================================
// LABEL STRATEGY
// ============================================================================

/// How the wastage cluster is chosen after fitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStrategy {
    /// Cluster whose centroid has the higher raw `current_usage`
    #[default]
    HighestCurrentUsage,
    /// Cluster 1 is wastage, cluster 0 is normal
    FixedClusterId,
}

impl LabelStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelStrategy::HighestCurrentUsage => "highest_current_usage",
            LabelStrategy::FixedClusterId => "fixed_cluster_id",
        }
    }
}

impl FromStr for LabelStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "highest_current_usage" | "current_usage" => Ok(LabelStrategy::HighestCurrentUsage),
            "fixed_cluster_id" | "fixed" => Ok(LabelStrategy::FixedClusterId),
            other => Err(format!("unknown label strategy '{}'", other)),
        }
    }
}

impl fmt::Display for LabelStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cluster id that the fixed-id rule labels as wastage
pub const FIXED_WASTAGE_CLUSTER: usize = 1;

/// Pick the wastage cluster for fitted centroids (normalized space)
pub fn choose_wastage_cluster(
    strategy: LabelStrategy,
    centroids: &Array2<f64>,
    scaler: &NormalizationParams,
) -> usize {
    match strategy {
        LabelStrategy::FixedClusterId => FIXED_WASTAGE_CLUSTER,
        LabelStrategy::HighestCurrentUsage => {
            let usage: Vec<f64> = centroids
                .rows()
                .into_iter()
                .map(|c| scaler.inverse_transform(c)[CURRENT_USAGE_INDEX])
                .collect();

            let mut best = FIXED_WASTAGE_CLUSTER.min(usage.len().saturating_sub(1));
            for (i, &u) in usage.iter().enumerate() {
                if u > usage[best] {
                    best = i;
                }
            }
            best
        }
    }
}

// ============================================================================
// CLUSTER MODEL
// ============================================================================

/// Fitted centroids plus the verdict mapping
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterModel {
    /// `(k, FEATURE_COUNT)` centroids in normalized space
    pub centroids: Array2<f64>,
    pub wastage_cluster: usize,
    pub strategy: LabelStrategy,
}

impl ClusterModel {
    /// Map a cluster id to its verdict
    pub fn verdict_for(&self, cluster: usize) -> WastageVerdict {
        if cluster == self.wastage_cluster {
            WastageVerdict::Wastage
        } else {
            WastageVerdict::Normal
        }
    }

    /// Centroids mapped back to raw feature units, for logging
    pub fn raw_centroids(&self, scaler: &NormalizationParams) -> Vec<[f64; FEATURE_COUNT]> {
        self.centroids
            .rows()
            .into_iter()
            .map(|c| scaler.inverse_transform(c))
            .collect()
    }
}
