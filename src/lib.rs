//! Energy Wastage Core
//!
//! Fits a 2-cluster model on historical room sensor data at startup and
//! labels each live reading as wastage or normal.

pub mod constants;
pub mod logic;

pub use logic::config::Config;
pub use logic::error::{AppError, AppResult};
pub use logic::model::{Classifier, ModelTrainer, WastageVerdict};
