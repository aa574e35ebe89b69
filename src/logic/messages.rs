//! Messages - Inbound sensor readings and outbound predictions
//!
//! Wire format is JSON. The inbound `timestamp` is opaque and is passed
//! through to the prediction unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logic::features::FeatureVector;
use crate::logic::model::{MalformedInput, WastageVerdict};

/// Decoded inbound message
#[derive(Debug, Clone, PartialEq)]
pub struct InboundReading {
    pub features: FeatureVector,
    pub timestamp: Value,
}

impl InboundReading {
    /// Decode a raw payload
    pub fn from_slice(payload: &[u8]) -> Result<Self, MalformedInput> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| MalformedInput::InvalidJson(e.to_string()))?;
        Self::from_value(value)
    }

    /// Decode an already parsed JSON value. `timestamp` must be present
    /// but may hold any JSON value, including null.
    pub fn from_value(value: Value) -> Result<Self, MalformedInput> {
        let Value::Object(mut object) = value else {
            return Err(MalformedInput::NotAnObject);
        };

        let features = FeatureVector::from_json_object(&object)?;
        let timestamp = object
            .remove("timestamp")
            .ok_or(MalformedInput::MissingTimestamp)?;

        Ok(Self { features, timestamp })
    }
}

/// Outbound message, serialized as `{"timestamp": .., "wastage_prediction": 0|1}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub timestamp: Value,
    pub wastage_prediction: u8,
}

impl PredictionResult {
    pub fn new(timestamp: Value, verdict: WastageVerdict) -> Self {
        Self {
            timestamp,
            wastage_prediction: verdict.as_u8(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
