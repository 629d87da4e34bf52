pub mod config;
pub mod error;
pub mod jobs;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{RerankError, Result};
pub use jobs::{BatchStats, RerankBatchJob};
pub use models::{BinomialModel, IntentModel};
pub use services::{
    BinomialCoverage, CombSum, LambdaReranker, Mmr, RandomReranker, Reranker, RerankerConfig,
    XQuad,
};
