use recsys_core::DataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RerankError {
    #[error("lambda must be within [0, 1], got {0}")]
    InvalidLambda(f64),

    #[error("cutoff must be positive, got {0}")]
    InvalidCutoff(usize),

    #[error("invalid window size {window}: {reason}")]
    InvalidWindow { window: usize, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Configuration error: {0}")]
    Config(#[from] envy::Error),

    #[error("Rerank task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, RerankError>;
