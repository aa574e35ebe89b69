//! Dataset Module - Historical Training Data
//!
//! Loads the historical sensor rows the model is fitted on at startup.
//! Supports CSV with a header row and JSONL (one object per line).
//! The dataset is dropped once training has produced its artifacts.

pub mod reader;


use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ndarray::Array2;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::logic::features::{FeatureError, FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};

/// Minimum number of rows needed to fit two clusters
pub const MIN_TRAINING_ROWS: usize = 2;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset JSON error on line {line}: {source}")]
    Json {
        line: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("dataset is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("data format error on row {row}: {source}")]
    DataFormat {
        row: u64,
        #[source]
        source: FeatureError,
    },

    #[error("data format error on row {row}: expected a JSON object")]
    NotAnObject { row: u64 },

    #[error("insufficient data: {rows} row(s), at least {required} required")]
    InsufficientData { rows: usize, required: usize },
}

impl DatasetError {
    /// True for the errors the taxonomy groups as DataFormatError
    pub fn is_data_format(&self) -> bool {
        matches!(
            self,
            DatasetError::MissingColumns(_)
                | DatasetError::DataFormat { .. }
                | DatasetError::NotAnObject { .. }
                | DatasetError::Json { .. }
        )
    }
}

// ============================================================================
// FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Jsonl,
}

impl DatasetFormat {
    /// Infer format from file extension, CSV unless `.jsonl`/`.ndjson`
    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson") {
            DatasetFormat::Jsonl
        } else {
            DatasetFormat::Csv
        }
    }
}

impl FromStr for DatasetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(DatasetFormat::Csv),
            "jsonl" | "ndjson" => Ok(DatasetFormat::Jsonl),
            other => Err(format!("unknown dataset format '{}'", other)),
        }
    }
}

impl fmt::Display for DatasetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetFormat::Csv => write!(f, "csv"),
            DatasetFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

// ============================================================================
// HISTORICAL DATASET
// ============================================================================

/// Ordered training rows. Row order is kept so per-row assignments can be
/// audited against the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalDataset {
    rows: Vec<FeatureVector>,
}

impl HistoricalDataset {
    pub fn new(rows: Vec<FeatureVector>) -> Self {
        Self { rows }
    }

    /// Build from raw value rows, rejecting non-finite values
    pub fn from_values(rows: &[[f64; FEATURE_COUNT]]) -> Result<Self, DatasetError> {
        let dataset = Self::new(rows.iter().map(|v| FeatureVector::from_values(*v)).collect());
        dataset.ensure_finite()?;
        Ok(dataset)
    }

    /// Load from disk using the given format
    pub fn load(path: &Path, format: DatasetFormat) -> Result<Self, DatasetError> {
        log::info!("Loading {} dataset from: {}", format, path.display());

        let dataset = match format {
            DatasetFormat::Csv => reader::read_csv_file(path)?,
            DatasetFormat::Jsonl => reader::read_jsonl_file(path)?,
        };

        if dataset.is_empty() {
            log::warn!("Dataset {} has no data rows", path.display());
        } else {
            log::info!("Loaded {} training rows", dataset.len());
        }
        Ok(dataset)
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fail with InsufficientData when fewer than `required` rows exist
    pub fn ensure_min_rows(&self, required: usize) -> Result<(), DatasetError> {
        if self.rows.len() < required {
            return Err(DatasetError::InsufficientData {
                rows: self.rows.len(),
                required,
            });
        }
        Ok(())
    }

    /// Fail with DataFormat on the first NaN or infinite value (rows are 1-based)
    pub fn ensure_finite(&self) -> Result<(), DatasetError> {
        for (i, vector) in self.rows.iter().enumerate() {
            if let Some(pos) = vector.values.iter().position(|v| !v.is_finite()) {
                return Err(DatasetError::DataFormat {
                    row: i as u64 + 1,
                    source: FeatureError::NotFinite(FEATURE_LAYOUT[pos]),
                });
            }
        }
        Ok(())
    }

    /// SHA-256 over every value in row order, hex encoded.
    /// Identifies the data a model was fitted on.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for vector in &self.rows {
            for value in &vector.values {
                hasher.update(value.to_le_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }

    /// Row-major `(rows, FEATURE_COUNT)` matrix in layout order
    pub fn to_matrix(&self) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros((self.rows.len(), FEATURE_COUNT));
        for (mut row, vector) in matrix.rows_mut().into_iter().zip(&self.rows) {
            for (cell, value) in row.iter_mut().zip(vector.values.iter()) {
                *cell = *value;
            }
        }
        matrix
    }
}
