//! Intent-aware objectives: CombSUM and xQuAD.
//!
//! Both spread each candidate's relevance over the intents it covers,
//! `pif(i, f) = score(i) / Σ_{j in pool covering f} score(j)`, and weight it
//! by the user's intent prior `p(f)`. On every commit both multiply a
//! per-intent redundancy by `1 - pif`. Only xQuAD reads it back.

use super::lambda::{NoveltyStrategy, Objective, StrategyContext};
use crate::models::{IntentModel, UserIntentModel};
use crate::utils::NEUTRAL;
use recsys_core::{FeatureData, Id, Scored};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Whether the redundancy accumulator feeds back into novelty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedundancyMode {
    /// Maintained on update but never consulted (CombSUM)
    Tracked,
    /// Multiplied into every intent term (xQuAD)
    Folded,
}

/// Immutable inputs of one intent-aware invocation.
pub struct IntentContext<I: Id, F: Id> {
    pub feature_data: Arc<dyn FeatureData<I, F>>,
    pub model: Arc<UserIntentModel<F>>,
}

impl<I: Id, F: Id> IntentContext<I, F> {
    /// Features of `item` that are intents of the user, each at most once.
    fn item_intents(&self, item: &I) -> Vec<&F> {
        let mut seen: HashSet<&F> = HashSet::new();
        self.feature_data
            .item_features(item)
            .iter()
            .map(|(f, _)| f)
            .filter(|f| self.model.contains(f) && seen.insert(*f))
            .collect()
    }
}

pub struct IntentAwareStrategy<I: Id, F: Id> {
    ctx: IntentContext<I, F>,
    mode: RedundancyMode,
    prob_norm: HashMap<F, f64>,
    redundancy: HashMap<F, f64>,
}

impl<I: Id, F: Id> IntentAwareStrategy<I, F> {
    pub fn new(ctx: IntentContext<I, F>, candidates: &[Scored<I>], mode: RedundancyMode) -> Self {
        let mut prob_norm: HashMap<F, f64> = HashMap::new();
        for candidate in candidates {
            for f in ctx.item_intents(&candidate.id) {
                *prob_norm.entry(f.clone()).or_insert(0.0) += candidate.score;
            }
        }

        Self {
            ctx,
            mode,
            prob_norm,
            redundancy: HashMap::new(),
        }
    }

    /// Share of intent `f`'s pool relevance held by `item`.
    fn pif(&self, item: &Scored<I>, f: &F) -> f64 {
        let norm = match self.prob_norm.get(f) {
            Some(&n) if n != 0.0 => n,
            _ => NEUTRAL,
        };
        item.score / norm
    }

    /// Remaining headroom of intent `f`; starts at 1.0.
    pub fn redundancy(&self, f: &F) -> f64 {
        self.redundancy.get(f).copied().unwrap_or(1.0)
    }
}

impl<I: Id, F: Id> NoveltyStrategy<I> for IntentAwareStrategy<I, F> {
    fn novelty(&self, candidate: &Scored<I>) -> f64 {
        self.ctx
            .item_intents(&candidate.id)
            .into_iter()
            .map(|f| {
                let term = self.ctx.model.p(f) * self.pif(candidate, f);
                match self.mode {
                    RedundancyMode::Tracked => term,
                    RedundancyMode::Folded => term * self.redundancy(f),
                }
            })
            .sum()
    }

    fn update(&mut self, chosen: &Scored<I>) {
        let discounts: Vec<(F, f64)> = self
            .ctx
            .item_intents(&chosen.id)
            .into_iter()
            .map(|f| (f.clone(), 1.0 - self.pif(chosen, f)))
            .collect();

        for (f, discount) in discounts {
            *self.redundancy.entry(f).or_insert(1.0) *= discount;
        }
    }
}

fn intent_strategy<U: Id, I: Id, F: Id>(
    model: &IntentModel<U, I, F>,
    ctx: StrategyContext<'_, U, I>,
    mode: RedundancyMode,
) -> IntentAwareStrategy<I, F> {
    IntentAwareStrategy::new(
        IntentContext {
            feature_data: model.feature_data().clone(),
            model: model.user_model(ctx.user),
        },
        ctx.candidates,
        mode,
    )
}

/// CombSUM intent-aware objective.
///
/// Redundancy is tracked but does not affect novelty, so the ranking only
/// depends on how much intent-weighted relevance each item carries.
pub struct CombSum<U: Id, I: Id, F: Id> {
    model: Arc<IntentModel<U, I, F>>,
}

impl<U: Id, I: Id, F: Id> CombSum<U, I, F> {
    pub fn new(model: Arc<IntentModel<U, I, F>>) -> Self {
        Self { model }
    }
}

impl<U: Id, I: Id, F: Id> Objective<U, I> for CombSum<U, I, F> {
    type Strategy = IntentAwareStrategy<I, F>;

    fn name(&self) -> &'static str {
        "combsum"
    }

    fn strategy(&self, ctx: StrategyContext<'_, U, I>) -> Self::Strategy {
        intent_strategy(&self.model, ctx, RedundancyMode::Tracked)
    }
}

/// xQuAD intent-aware objective.
///
/// R. L. T. Santos, C. Macdonald, I. Ounis. Exploiting query reformulations
/// for web search result diversification. WWW 2010.
pub struct XQuad<U: Id, I: Id, F: Id> {
    model: Arc<IntentModel<U, I, F>>,
}

impl<U: Id, I: Id, F: Id> XQuad<U, I, F> {
    pub fn new(model: Arc<IntentModel<U, I, F>>) -> Self {
        Self { model }
    }
}

impl<U: Id, I: Id, F: Id> Objective<U, I> for XQuad<U, I, F> {
    type Strategy = IntentAwareStrategy<I, F>;

    fn name(&self) -> &'static str {
        "xquad"
    }

    fn strategy(&self, ctx: StrategyContext<'_, U, I>) -> Self::Strategy {
        intent_strategy(&self.model, ctx, RedundancyMode::Folded)
    }
}
