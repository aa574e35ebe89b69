//! Logic Module - Business Logic & Engines
//!
//! ## Architecture
//! - `features/` - Sensor feature layout and vectors
//! - `dataset/` - Historical training data (CSV, JSONL)
//! - `model/` - Scaler, k-means, trainer and classifier
//! - `messages` - Inbound reading / outbound prediction wire types
//! - `transport/` - Message bus seam
//! - `pipeline` - Classification loop

pub mod config;
pub mod error;

pub mod features;
pub mod dataset;
pub mod model;

pub mod messages;
pub mod transport;
pub mod pipeline;
