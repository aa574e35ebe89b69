//! Error handling
//!
//! Top-level error for startup and the serving loop. Module errors convert
//! into it with `?`.

use thiserror::Error;

use crate::logic::config::ConfigError;
use crate::logic::dataset::DatasetError;
use crate::logic::model::ClassifyError;
use crate::logic::pipeline::PipelineError;
use crate::logic::transport::TransportError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("training failed: {0}")]
    Training(#[from] DatasetError),

    #[error("classifier error: {0}")]
    Classify(#[from] ClassifyError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl AppError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 2,
            AppError::Training(_) => 3,
            AppError::Classify(_) | AppError::Pipeline(_) | AppError::Transport(_) => 1,
        }
    }
}
