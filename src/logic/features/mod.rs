//! Features Module - Sensor Feature Contract
//!
//! Shared contract between training rows and live readings.
//! Every consumer goes through `FEATURE_LAYOUT` for field order.

pub mod layout;
pub mod vector;

// Re-export common types
pub use layout::{LayoutInfo, LayoutMismatchError, FEATURE_COUNT, FEATURE_LAYOUT};
pub use vector::{FeatureError, FeatureVector};
