//! One sensor reading as a fixed-order vector, stamped with its layout.
//!
//! CSV rows and JSON messages both decode into this type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::layout::{layout_hash, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};

// ============================================================================
// FIELD ERRORS
// ============================================================================

/// A single feature could not be read from its source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("missing required field '{0}'")]
    Missing(&'static str),

    #[error("field '{field}' is not numeric: {found}")]
    NotNumeric { field: &'static str, found: String },

    #[error("field '{0}' is not a finite number")]
    NotFinite(&'static str),
}

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Versioned Feature Vector with layout metadata
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout (for mismatch detection)
    pub layout_hash: u32,
    /// Feature values in order defined by FEATURE_LAYOUT
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Create from raw values with current version
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// Read every layout field from a JSON object.
    ///
    /// Numbers are taken as-is and JSON booleans map to 0/1. Keys outside the
    /// layout are ignored.
    pub fn from_json_object(object: &Map<String, Value>) -> Result<Self, FeatureError> {
        let mut values = [0.0f64; FEATURE_COUNT];

        for (slot, &name) in values.iter_mut().zip(FEATURE_LAYOUT.iter()) {
            let raw = object.get(name).ok_or(FeatureError::Missing(name))?;
            *slot = json_number(name, raw)?;
        }

        Ok(Self::from_values(values))
    }

    /// Get values as array reference
    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self) -> Value {
        let named: Map<String, Value> = FEATURE_LAYOUT
            .iter()
            .zip(self.values.iter())
            .map(|(name, value)| (name.to_string(), Value::from(*value)))
            .collect();

        serde_json::json!({
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "values": named,
        })
    }
}

fn json_number(field: &'static str, raw: &Value) -> Result<f64, FeatureError> {
    let value = match raw {
        Value::Number(n) => n.as_f64().ok_or(FeatureError::NotFinite(field))?,
        Value::Bool(flag) => {
            if *flag {
                1.0
            } else {
                0.0
            }
        }
        other => {
            return Err(FeatureError::NotNumeric {
                field,
                found: other.to_string(),
            })
        }
    };

    if !value.is_finite() {
        return Err(FeatureError::NotFinite(field));
    }
    Ok(value)
}

/// Parse one textual cell (CSV) into a feature value.
///
/// Accepts plain numbers plus `true`/`false` in any case.
pub fn parse_cell(field: &'static str, cell: &str) -> Result<f64, FeatureError> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Err(FeatureError::Missing(field));
    }

    let value = if trimmed.eq_ignore_ascii_case("true") {
        1.0
    } else if trimmed.eq_ignore_ascii_case("false") {
        0.0
    } else {
        trimmed.parse::<f64>().map_err(|_| FeatureError::NotNumeric {
            field,
            found: trimmed.to_string(),
        })?
    };

    if !value.is_finite() {
        return Err(FeatureError::NotFinite(field));
    }
    Ok(value)
}

// ============================================================================
// TESTS
// ============================================================================
