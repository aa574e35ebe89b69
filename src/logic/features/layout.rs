//! Sensor field order shared by the dataset reader and the message decoder.
//!
//! Bump `FEATURE_VERSION` whenever a field is added, removed or reordered.
//! A model keeps the version and hash it was fitted under and refuses
//! readings stamped with anything else.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FEATURE_VERSION: u8 = 1;

/// Number of sensor fields per reading
pub const FEATURE_COUNT: usize = 5;

/// Field names, in vector order
pub const FEATURE_LAYOUT: [&str; FEATURE_COUNT] = [
    "person_detected", // occupancy, 0/1
    "temperature",
    "lamp_on", // relay, 0/1
    "fan_on",  // relay, 0/1
    "current_usage",
];

/// Position of `current_usage`; the wastage cluster is picked on it
pub const CURRENT_USAGE_INDEX: usize = 4;

/// CRC32 over the version byte and the NUL-terminated field names
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);
    for name in FEATURE_LAYOUT.iter() {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

/// Layout stamp stored in model metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "reading built for layout v{actual_version} ({actual_hash:08x}), \
     model expects v{expected_version} ({expected_hash:08x})"
)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

/// Check a reading's stamp against the layout a model was fitted with
pub fn validate_layout_against(
    expected: &LayoutInfo,
    actual_version: u8,
    actual_hash: u32,
) -> Result<(), LayoutMismatchError> {
    if actual_version == expected.version && actual_hash == expected.hash {
        return Ok(());
    }
    Err(LayoutMismatchError {
        expected_version: expected.version,
        expected_hash: expected.hash,
        actual_version,
        actual_hash,
    })
}
