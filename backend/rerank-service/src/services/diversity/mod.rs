//! Diversity Layer - greedy re-ranking of per-user recommendation lists.
//!
//! Every lambda reranker shares one selection loop ([`LambdaReranker`]) and
//! differs only in its novelty objective:
//! - [`CombSum`] / [`XQuad`]: intent-aware aggregation
//! - [`BinomialCoverage`]: genre coverage under the binomial model
//! - [`Mmr`]: average feature distance to the selected items
//!
//! [`RandomReranker`] is a shuffle baseline.

pub mod binomial;
pub mod intent_aware;
pub mod lambda;
pub mod mmr;
pub mod random;

pub use binomial::{BinomialContext, BinomialCoverage, BinomialCoverageStrategy};
pub use intent_aware::{CombSum, IntentAwareStrategy, IntentContext, RedundancyMode, XQuad};
pub use lambda::{LambdaReranker, NoveltyStrategy, Objective, RelevanceOnly, StrategyContext};
pub use mmr::{ItemDistance, JaccardFeatureDistance, Mmr, MmrStrategy};
pub use random::RandomReranker;

use crate::config::{Algorithm, RerankSettings};
use crate::error::{RerankError, Result};
use crate::models::{BinomialModel, IntentModel};
use recsys_core::{FeatureData, Id, PreferenceData, Recommendation};
use std::sync::Arc;
use tracing::info;

/// Produces a new recommendation from an input one.
pub trait Reranker<U, I>: Send + Sync {
    fn name(&self) -> &str;

    /// Rerank `recommendation`, returning at most `max_length` items.
    fn rerank(&self, recommendation: &Recommendation<U, I>, max_length: usize) -> Recommendation<U, I>;
}

/// Options shared by all greedy rerankers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankerConfig {
    /// 1.0 = relevance only, 0.0 = novelty only
    pub lambda: f64,
    /// Maximum number of greedily selected items
    pub cutoff: usize,
    /// Rescale relevance and novelty by their pool maximum at every step
    pub normalize: bool,
    /// Leading input items eligible for selection; defaults to the whole input
    pub window_size: Option<usize>,
    /// Fill up to `cutoff` with the items past the window, in input order
    pub append_tail: bool,
}

impl RerankerConfig {
    pub fn new(lambda: f64, cutoff: usize) -> Self {
        Self {
            lambda,
            cutoff,
            normalize: false,
            window_size: None,
            append_tail: false,
        }
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = Some(window_size);
        self
    }

    pub fn with_append_tail(mut self, append_tail: bool) -> Self {
        self.append_tail = append_tail;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.lambda) {
            return Err(RerankError::InvalidLambda(self.lambda));
        }
        if self.cutoff == 0 {
            return Err(RerankError::InvalidCutoff(self.cutoff));
        }
        if let Some(window) = self.window_size {
            if window == 0 {
                return Err(RerankError::InvalidWindow {
                    window,
                    reason: "window must hold at least one item".to_string(),
                });
            }
            if window < self.cutoff && !self.append_tail {
                return Err(RerankError::InvalidWindow {
                    window,
                    reason: format!(
                        "window smaller than cutoff {} requires append_tail",
                        self.cutoff
                    ),
                });
            }
        }
        Ok(())
    }

    /// Number of leading items of an `input_len` list that form the pool.
    pub fn window_len(&self, input_len: usize) -> usize {
        self.window_size.unwrap_or(input_len).min(input_len)
    }

    /// Output length cap for a call asking for `max_length` items.
    pub fn output_len(&self, max_length: usize) -> usize {
        self.cutoff.min(max_length)
    }
}

/// Build the reranker selected by `settings`, with models built over every
/// user in `preferences`.
pub fn build_reranker<U, I, F>(
    settings: &RerankSettings,
    preferences: &dyn PreferenceData<U, I>,
    feature_data: Arc<dyn FeatureData<I, F>>,
) -> Result<Arc<dyn Reranker<U, I>>>
where
    U: Id,
    I: Id,
    F: Id,
{
    let config = settings.reranker_config();
    config.validate()?;

    let reranker: Arc<dyn Reranker<U, I>> = match settings.algorithm {
        Algorithm::CombSum => {
            let model = IntentModel::new(preferences.users(), preferences, feature_data);
            Arc::new(LambdaReranker::new(CombSum::new(Arc::new(model)), config)?)
        }
        Algorithm::XQuad => {
            let model = IntentModel::new(preferences.users(), preferences, feature_data);
            Arc::new(LambdaReranker::new(XQuad::new(Arc::new(model)), config)?)
        }
        Algorithm::Binomial => {
            let model = BinomialModel::new(
                preferences.users(),
                preferences,
                feature_data.as_ref(),
                settings.alpha,
            )?;
            Arc::new(LambdaReranker::new(
                BinomialCoverage::new(Arc::new(model), feature_data),
                config,
            )?)
        }
        Algorithm::Mmr => {
            let distance = Arc::new(JaccardFeatureDistance::new(feature_data));
            Arc::new(LambdaReranker::new(Mmr::new(distance), config)?)
        }
        Algorithm::Random => Arc::new(RandomReranker::new(config, settings.seed)?),
    };

    info!(
        algorithm = reranker.name(),
        lambda = config.lambda,
        cutoff = config.cutoff,
        window = ?config.window_size,
        normalize = config.normalize,
        "Reranker ready"
    );

    Ok(reranker)
}
