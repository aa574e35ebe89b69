//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults and the
//! environment variable names that override them.

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Energy Wastage Core";

/// Historical dataset read at startup
pub const DEFAULT_DATASET_PATH: &str = "dataset.csv";

/// Topic carrying sensor readings
pub const DEFAULT_INPUT_TOPIC: &str = "sensor";

/// Topic receiving predictions
pub const DEFAULT_OUTPUT_TOPIC: &str = "prediction";

/// Fixed seed so a restart on the same data yields the same model
pub const DEFAULT_SEED: u64 = 42;

/// Lloyd iteration cap per k-means run
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

/// Seeded k-means restarts
pub const DEFAULT_N_INIT: usize = 10;

/// Buffer size of the inbound/outbound channels
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

// ============================================
// Environment variable names
// ============================================

pub const ENV_DATASET_PATH: &str = "WASTAGE_DATASET_PATH";
pub const ENV_DATASET_FORMAT: &str = "WASTAGE_DATASET_FORMAT";
pub const ENV_INPUT_TOPIC: &str = "WASTAGE_INPUT_TOPIC";
pub const ENV_OUTPUT_TOPIC: &str = "WASTAGE_OUTPUT_TOPIC";
pub const ENV_SEED: &str = "WASTAGE_SEED";
pub const ENV_MAX_ITERATIONS: &str = "WASTAGE_MAX_ITERATIONS";
pub const ENV_N_INIT: &str = "WASTAGE_N_INIT";
pub const ENV_LABEL_STRATEGY: &str = "WASTAGE_LABEL_STRATEGY";
pub const ENV_CHANNEL_CAPACITY: &str = "WASTAGE_CHANNEL_CAPACITY";
