//! Binomial coverage objective.
//!
//! Coverage is the geometric mean, over the user's still-uncovered features,
//! of the probability that each feature stays missing at the cutoff. The
//! exponent is fixed at `1 / |user features|` for a whole invocation, so
//! dividing out the features of a committed item is the same as recomputing
//! over the reduced set.

use super::lambda::{NoveltyStrategy, Objective, StrategyContext};
use crate::models::{BinomialModel, UserBinomialModel};
use crate::utils::{geometric_product, safe_ratio};
use recsys_core::{FeatureData, Id, Scored};
use std::collections::HashSet;
use std::sync::Arc;

/// Immutable inputs of one binomial coverage invocation.
pub struct BinomialContext<I: Id, F: Id> {
    pub cutoff: usize,
    pub feature_data: Arc<dyn FeatureData<I, F>>,
    pub model: Arc<UserBinomialModel<F>>,
}

pub struct BinomialCoverageStrategy<I: Id, F: Id> {
    ctx: BinomialContext<I, F>,
    uncovered: HashSet<F>,
    coverage: f64,
    exponent: f64,
}

impl<I: Id, F: Id> BinomialCoverageStrategy<I, F> {
    pub fn new(ctx: BinomialContext<I, F>) -> Self {
        let uncovered: HashSet<F> = ctx.model.features().cloned().collect();
        let exponent = if uncovered.is_empty() {
            0.0
        } else {
            1.0 / uncovered.len() as f64
        };

        let mut strategy = Self {
            ctx,
            uncovered,
            coverage: 1.0,
            exponent,
        };
        strategy.coverage = strategy.recompute_coverage();
        strategy
    }

    pub fn coverage(&self) -> f64 {
        self.coverage
    }

    pub fn uncovered(&self) -> &HashSet<F> {
        &self.uncovered
    }

    fn longing(&self, f: &F) -> f64 {
        self.ctx.model.longing(f, self.ctx.cutoff)
    }

    fn recompute_coverage(&self) -> f64 {
        geometric_product(self.uncovered.iter().map(|f| self.longing(f)), self.exponent)
    }

    /// Coverage contribution of the uncovered features `item` exhibits.
    fn item_coverage(&self, item: &I) -> f64 {
        let mut seen: HashSet<&F> = HashSet::new();
        let longings: Vec<f64> = self
            .ctx
            .feature_data
            .item_features(item)
            .iter()
            .map(|(f, _)| f)
            .filter(|f| self.uncovered.contains(*f))
            .filter(|f| seen.insert(*f))
            .map(|f| self.longing(f))
            .collect();
        geometric_product(longings, self.exponent)
    }
}

impl<I: Id, F: Id> NoveltyStrategy<I> for BinomialCoverageStrategy<I, F> {
    fn novelty(&self, candidate: &Scored<I>) -> f64 {
        safe_ratio(self.coverage, self.item_coverage(&candidate.id))
    }

    fn update(&mut self, chosen: &Scored<I>) {
        let mut removed = Vec::new();
        for (f, _) in self.ctx.feature_data.item_features(&chosen.id) {
            if self.uncovered.remove(f) {
                removed.push(self.ctx.model.longing(f, self.ctx.cutoff));
            }
        }
        if removed.is_empty() {
            return;
        }

        let item_coverage = geometric_product(removed, self.exponent);
        self.coverage = if item_coverage > 0.0 {
            self.coverage / item_coverage
        } else {
            // a zero factor cannot be divided out
            self.recompute_coverage()
        };
    }
}

/// Binomial coverage reranking objective.
///
/// S. Vargas, L. Baltrunas, A. Karatzoglou, P. Castells. Coverage, redundancy
/// and size-awareness in genre diversity for recommender systems. RecSys 2014.
pub struct BinomialCoverage<U: Id, I: Id, F: Id> {
    model: Arc<BinomialModel<U, F>>,
    feature_data: Arc<dyn FeatureData<I, F>>,
}

impl<U: Id, I: Id, F: Id> BinomialCoverage<U, I, F> {
    pub fn new(model: Arc<BinomialModel<U, F>>, feature_data: Arc<dyn FeatureData<I, F>>) -> Self {
        Self {
            model,
            feature_data,
        }
    }
}

impl<U: Id, I: Id, F: Id> Objective<U, I> for BinomialCoverage<U, I, F> {
    type Strategy = BinomialCoverageStrategy<I, F>;

    fn name(&self) -> &'static str {
        "binomial"
    }

    fn strategy(&self, ctx: StrategyContext<'_, U, I>) -> Self::Strategy {
        BinomialCoverageStrategy::new(BinomialContext {
            cutoff: ctx.cutoff,
            feature_data: self.feature_data.clone(),
            model: self.model.user_model(ctx.user),
        })
    }
}
