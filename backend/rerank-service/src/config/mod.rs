use crate::error::Result;
use crate::services::RerankerConfig;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rerank: RerankSettings,
    pub batch: BatchSettings,
}

/// Which reranker the batch job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    CombSum,
    XQuad,
    Binomial,
    Mmr,
    Random,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::CombSum => "combsum",
            Algorithm::XQuad => "xquad",
            Algorithm::Binomial => "binomial",
            Algorithm::Mmr => "mmr",
            Algorithm::Random => "random",
        }
    }
}

/// `RERANK_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct RerankSettings {
    #[serde(default = "default_algorithm")]
    pub algorithm: Algorithm,
    #[serde(default = "default_lambda")]
    pub lambda: f64,
    #[serde(default = "default_cutoff")]
    pub cutoff: usize,
    #[serde(default)]
    pub window_size: Option<usize>,
    #[serde(default)]
    pub normalize: bool,
    #[serde(default)]
    pub append_tail: bool,
    /// Output length per user; defaults to the cutoff
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Weight of the global feature distribution in the binomial model
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default)]
    pub seed: u64,
}

/// `BATCH_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchSettings {
    pub recommendations_path: PathBuf,
    pub preferences_path: PathBuf,
    pub features_path: PathBuf,
    pub output_path: PathBuf,
    #[serde(default)]
    pub concurrency: Option<usize>,
}

fn default_algorithm() -> Algorithm {
    Algorithm::XQuad
}

fn default_lambda() -> f64 {
    0.5
}

fn default_cutoff() -> usize {
    20
}

fn default_alpha() -> f64 {
    0.5
}

impl Default for RerankSettings {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            lambda: default_lambda(),
            cutoff: default_cutoff(),
            window_size: None,
            normalize: false,
            append_tail: false,
            max_length: None,
            alpha: default_alpha(),
            seed: 0,
        }
    }
}

impl RerankSettings {
    /// Unvalidated; validation happens when a reranker is built.
    pub fn reranker_config(&self) -> RerankerConfig {
        let mut config = RerankerConfig::new(self.lambda, self.cutoff)
            .with_normalize(self.normalize)
            .with_append_tail(self.append_tail);
        if let Some(window) = self.window_size {
            config = config.with_window_size(window);
        }
        config
    }

    pub fn output_length(&self) -> usize {
        self.max_length.unwrap_or(self.cutoff)
    }
}

impl BatchSettings {
    /// Worker count; falls back to the number of CPUs.
    pub fn concurrency(&self) -> usize {
        self.concurrency
            .filter(|&n| n > 0)
            .unwrap_or_else(num_cpus::get)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            rerank: envy::prefixed("RERANK_").from_env()?,
            batch: envy::prefixed("BATCH_").from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RerankError;

    const RERANK_VARS: &[&str] = &[
        "RERANK_ALGORITHM",
        "RERANK_LAMBDA",
        "RERANK_CUTOFF",
        "RERANK_WINDOW_SIZE",
        "RERANK_NORMALIZE",
        "RERANK_APPEND_TAIL",
        "RERANK_MAX_LENGTH",
        "RERANK_ALPHA",
        "RERANK_SEED",
    ];

    fn set_batch_paths() {
        std::env::set_var("BATCH_RECOMMENDATIONS_PATH", "/data/recs.jsonl");
        std::env::set_var("BATCH_PREFERENCES_PATH", "/data/prefs.tsv");
        std::env::set_var("BATCH_FEATURES_PATH", "/data/features.tsv");
        std::env::set_var("BATCH_OUTPUT_PATH", "/data/out.jsonl");
        std::env::remove_var("BATCH_CONCURRENCY");
    }

    #[test]
    #[serial_test::serial]
    fn test_defaults_from_env() {
        RERANK_VARS.iter().for_each(|v| std::env::remove_var(v));
        set_batch_paths();

        let config = Config::from_env().unwrap();
        assert_eq!(config.rerank.algorithm, Algorithm::XQuad);
        assert_eq!(config.rerank.cutoff, 20);
        assert_eq!(config.rerank.output_length(), 20);
        assert!(config.rerank.window_size.is_none());
        assert_eq!(config.batch.output_path, PathBuf::from("/data/out.jsonl"));
        assert!(config.batch.concurrency() >= 1);
    }

    #[test]
    #[serial_test::serial]
    fn test_overrides_from_env() {
        RERANK_VARS.iter().for_each(|v| std::env::remove_var(v));
        set_batch_paths();
        std::env::set_var("RERANK_ALGORITHM", "binomial");
        std::env::set_var("RERANK_LAMBDA", "0.9");
        std::env::set_var("RERANK_CUTOFF", "10");
        std::env::set_var("RERANK_WINDOW_SIZE", "100");
        std::env::set_var("RERANK_NORMALIZE", "true");
        std::env::set_var("BATCH_CONCURRENCY", "3");

        let config = Config::from_env().unwrap();
        assert_eq!(config.rerank.algorithm, Algorithm::Binomial);
        assert_eq!(config.batch.concurrency(), 3);

        let reranker_config = config.rerank.reranker_config();
        assert_eq!(reranker_config.lambda, 0.9);
        assert_eq!(reranker_config.cutoff, 10);
        assert_eq!(reranker_config.window_size, Some(100));
        assert!(reranker_config.normalize);
        assert!(reranker_config.validate().is_ok());

        RERANK_VARS.iter().for_each(|v| std::env::remove_var(v));
        std::env::remove_var("BATCH_CONCURRENCY");
    }

    #[test]
    #[serial_test::serial]
    fn test_missing_paths_fail() {
        std::env::remove_var("BATCH_OUTPUT_PATH");
        assert!(matches!(Config::from_env(), Err(RerankError::Config(_))));
    }

    #[test]
    #[serial_test::serial]
    fn test_malformed_value_is_config_error() {
        RERANK_VARS.iter().for_each(|v| std::env::remove_var(v));
        set_batch_paths();
        std::env::set_var("RERANK_LAMBDA", "lots");

        let result = Config::from_env();
        std::env::remove_var("RERANK_LAMBDA");
        assert!(matches!(result, Err(RerankError::Config(_))));
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(Algorithm::CombSum.as_str(), "combsum");
        assert_eq!(Algorithm::XQuad.as_str(), "xquad");
    }
}
