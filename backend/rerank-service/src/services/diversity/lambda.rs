//! Greedy lambda reranking.
//!
//! At every step each remaining candidate is scored by
//! `lambda * relevance + (1 - lambda) * novelty`, the best one is committed
//! and the per-user strategy is told about it before the next pass.

use super::{Reranker, RerankerConfig};
use crate::error::Result;
use crate::utils::{interpolate, max_divisor};
use recsys_core::{Id, Recommendation, Scored};
use tracing::debug;

/// Novelty state for one (user, recommendation) invocation.
///
/// `novelty` must not change state; `update` is called exactly once per
/// committed item, after it was chosen and before the next `novelty` call.
pub trait NoveltyStrategy<I> {
    fn novelty(&self, candidate: &Scored<I>) -> f64;

    fn update(&mut self, chosen: &Scored<I>);
}

/// What a strategy gets to see when it is created.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a, U, I> {
    pub user: &'a U,
    /// The candidate pool, in input order.
    pub candidates: &'a [Scored<I>],
    /// Number of items the greedy loop will select at most.
    pub cutoff: usize,
}

/// A diversification objective: a factory of fresh per-user strategies.
pub trait Objective<U, I>: Send + Sync {
    type Strategy: NoveltyStrategy<I>;

    fn name(&self) -> &'static str;

    fn strategy(&self, ctx: StrategyContext<'_, U, I>) -> Self::Strategy;
}

/// Greedy reranker driven by an [`Objective`].
pub struct LambdaReranker<O> {
    objective: O,
    config: RerankerConfig,
}

impl<O> LambdaReranker<O> {
    /// Fails if `config` is invalid; no work is done with a bad configuration.
    pub fn new(objective: O, config: RerankerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { objective, config })
    }

    /// Index of the best candidate in `pool`; earlier candidates win ties.
    fn select<I, S>(&self, pool: &[Scored<I>], strategy: &S) -> usize
    where
        S: NoveltyStrategy<I>,
    {
        let novelties: Vec<f64> = pool.iter().map(|c| strategy.novelty(c)).collect();

        let (rel_norm, nov_norm) = if self.config.normalize {
            (
                max_divisor(pool.iter().map(|c| c.score)),
                max_divisor(novelties.iter().copied()),
            )
        } else {
            (1.0, 1.0)
        };

        let mut best_idx = 0;
        let mut best_value = f64::NEG_INFINITY;
        for (i, (candidate, novelty)) in pool.iter().zip(&novelties).enumerate() {
            let value = interpolate(
                self.config.lambda,
                candidate.score / rel_norm,
                novelty / nov_norm,
            );
            if value > best_value {
                best_value = value;
                best_idx = i;
            }
        }
        best_idx
    }
}

impl<U, I, O> Reranker<U, I> for LambdaReranker<O>
where
    U: Id,
    I: Id,
    O: Objective<U, I>,
{
    fn name(&self) -> &str {
        self.objective.name()
    }

    fn rerank(&self, recommendation: &Recommendation<U, I>, max_length: usize) -> Recommendation<U, I> {
        let user = &recommendation.user;
        let limit = self.config.output_len(max_length);
        if limit == 0 || recommendation.is_empty() {
            return Recommendation::empty(user.clone());
        }

        let window_len = self.config.window_len(recommendation.len());
        let (window, tail) = recommendation.items.split_at(window_len);

        let mut strategy = self.objective.strategy(StrategyContext {
            user,
            candidates: window,
            cutoff: self.config.cutoff,
        });

        let mut pool: Vec<Scored<I>> = window.to_vec();
        let mut selected: Vec<Scored<I>> = Vec::with_capacity(limit.min(window_len));

        while selected.len() < limit && !pool.is_empty() {
            let best = self.select(&pool, &strategy);
            let chosen = pool.remove(best);
            strategy.update(&chosen);
            selected.push(chosen);
        }

        let diversified = selected.len();
        if self.config.append_tail {
            let missing = limit.saturating_sub(selected.len());
            selected.extend(tail.iter().take(missing).cloned());
        }

        debug!(
            user = ?user,
            objective = self.objective.name(),
            input = recommendation.len(),
            window = window_len,
            diversified,
            output = selected.len(),
            "Reranked recommendation"
        );

        Recommendation::new(user.clone(), selected)
    }
}

/// Novelty-free objective: the reranker reduces to sorting by relevance.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelevanceOnly;

/// Strategy of [`RelevanceOnly`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroNovelty;

impl<I> NoveltyStrategy<I> for ZeroNovelty {
    fn novelty(&self, _candidate: &Scored<I>) -> f64 {
        0.0
    }

    fn update(&mut self, _chosen: &Scored<I>) {}
}

impl<U, I> Objective<U, I> for RelevanceOnly {
    type Strategy = ZeroNovelty;

    fn name(&self) -> &'static str {
        "relevance"
    }

    fn strategy(&self, _ctx: StrategyContext<'_, U, I>) -> ZeroNovelty {
        ZeroNovelty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RerankError;
    use std::collections::HashMap;

    /// Fixed per-item novelty; records every update.
    struct TableStrategy {
        novelty: HashMap<&'static str, f64>,
        updates: Vec<&'static str>,
    }

    impl NoveltyStrategy<&'static str> for TableStrategy {
        fn novelty(&self, candidate: &Scored<&'static str>) -> f64 {
            assert!(
                !self.updates.contains(&candidate.id),
                "selected item {} scored again",
                candidate.id
            );
            self.novelty.get(candidate.id).copied().unwrap_or(0.0)
        }

        fn update(&mut self, chosen: &Scored<&'static str>) {
            self.updates.push(chosen.id);
        }
    }

    struct Table(Vec<(&'static str, f64)>);

    impl Objective<&'static str, &'static str> for Table {
        type Strategy = TableStrategy;

        fn name(&self) -> &'static str {
            "table"
        }

        fn strategy(&self, _ctx: StrategyContext<'_, &'static str, &'static str>) -> TableStrategy {
            TableStrategy {
                novelty: self.0.iter().copied().collect(),
                updates: Vec::new(),
            }
        }
    }

    /// Novelty table that switches to the next phase after every update.
    struct PhasedStrategy {
        phases: Vec<HashMap<&'static str, f64>>,
        step: usize,
    }

    impl NoveltyStrategy<&'static str> for PhasedStrategy {
        fn novelty(&self, candidate: &Scored<&'static str>) -> f64 {
            let phase = &self.phases[self.step.min(self.phases.len() - 1)];
            phase.get(candidate.id).copied().unwrap_or(0.0)
        }

        fn update(&mut self, _chosen: &Scored<&'static str>) {
            self.step += 1;
        }
    }

    struct Phased(Vec<Vec<(&'static str, f64)>>);

    impl Objective<&'static str, &'static str> for Phased {
        type Strategy = PhasedStrategy;

        fn name(&self) -> &'static str {
            "phased"
        }

        fn strategy(&self, _ctx: StrategyContext<'_, &'static str, &'static str>) -> PhasedStrategy {
            PhasedStrategy {
                phases: self
                    .0
                    .iter()
                    .map(|phase| phase.iter().copied().collect())
                    .collect(),
                step: 0,
            }
        }
    }

    fn rec(items: &[(&'static str, f64)]) -> Recommendation<&'static str, &'static str> {
        Recommendation::from_pairs("u1", items.iter().copied())
    }

    fn ids(rec: &Recommendation<&'static str, &'static str>) -> Vec<&'static str> {
        rec.item_ids().copied().collect()
    }

    #[test]
    fn test_lambda_one_is_relevance_order() {
        let reranker =
            LambdaReranker::new(RelevanceOnly, RerankerConfig::new(1.0, 2)).unwrap();
        let input = rec(&[("i1", 0.9), ("i2", 0.8), ("i3", 0.7)]);

        let output = reranker.rerank(&input, 2);
        assert_eq!(ids(&output), vec!["i1", "i2"]);
        assert_eq!(output.items[0].score, 0.9);
    }

    #[test]
    fn test_lambda_one_sorts_unsorted_input() {
        let reranker =
            LambdaReranker::new(RelevanceOnly, RerankerConfig::new(1.0, 3)).unwrap();
        let input = rec(&[("i1", 0.2), ("i2", 0.8), ("i3", 0.5)]);

        assert_eq!(ids(&reranker.rerank(&input, 3)), vec!["i2", "i3", "i1"]);
    }

    #[test]
    fn test_lambda_zero_picks_most_novel_first() {
        let objective = Table(vec![("i1", 0.1), ("i2", 0.2), ("i3", 0.9)]);
        let reranker = LambdaReranker::new(objective, RerankerConfig::new(0.0, 3)).unwrap();
        let input = rec(&[("i1", 0.9), ("i2", 0.8), ("i3", 0.1)]);

        let output = reranker.rerank(&input, 3);
        assert_eq!(output.items[0].id, "i3");
    }

    #[test]
    fn test_ties_keep_input_rank() {
        let reranker =
            LambdaReranker::new(RelevanceOnly, RerankerConfig::new(0.5, 3)).unwrap();
        let input = rec(&[("i1", 0.5), ("i2", 0.5), ("i3", 0.5)]);

        assert_eq!(ids(&reranker.rerank(&input, 3)), vec!["i1", "i2", "i3"]);
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let reranker =
            LambdaReranker::new(RelevanceOnly, RerankerConfig::new(0.5, 10)).unwrap();
        let output = reranker.rerank(&rec(&[]), 10);

        assert!(output.is_empty());
        assert_eq!(output.user, "u1");
    }

    #[test]
    fn test_zero_max_length_gives_empty_output() {
        let reranker =
            LambdaReranker::new(RelevanceOnly, RerankerConfig::new(0.5, 10)).unwrap();
        assert!(reranker.rerank(&rec(&[("i1", 1.0)]), 0).is_empty());
    }

    #[test]
    fn test_fewer_candidates_than_cutoff() {
        let reranker =
            LambdaReranker::new(RelevanceOnly, RerankerConfig::new(0.5, 10)).unwrap();
        let output = reranker.rerank(&rec(&[("i1", 0.3), ("i2", 0.6)]), 10);

        assert_eq!(ids(&output), vec!["i2", "i1"]);
    }

    #[test]
    fn test_window_limits_candidates() {
        let objective = Table(vec![("i4", 100.0)]);
        let config = RerankerConfig::new(0.0, 2).with_window_size(3);
        let reranker = LambdaReranker::new(objective, config).unwrap();
        let input = rec(&[("i1", 0.9), ("i2", 0.8), ("i3", 0.7), ("i4", 0.6)]);

        let output = reranker.rerank(&input, 2);
        // i4 is outside the window, however novel it is
        assert_eq!(output.len(), 2);
        assert!(!ids(&output).contains(&"i4"));
    }

    #[test]
    fn test_append_tail_fills_past_window() {
        let config = RerankerConfig::new(1.0, 4)
            .with_window_size(2)
            .with_append_tail(true);
        let reranker = LambdaReranker::new(RelevanceOnly, config).unwrap();
        let input = rec(&[("i1", 0.1), ("i2", 0.9), ("i3", 0.2), ("i4", 0.8), ("i5", 0.7)]);

        assert_eq!(
            ids(&reranker.rerank(&input, 4)),
            vec!["i2", "i1", "i3", "i4"]
        );
    }

    #[test]
    fn test_update_called_once_per_selection() {
        let objective = Table(vec![("i1", 0.3), ("i2", 0.2), ("i3", 0.1)]);
        let reranker = LambdaReranker::new(objective, RerankerConfig::new(0.5, 3)).unwrap();
        let input = rec(&[("i1", 0.5), ("i2", 0.5), ("i3", 0.5)]);

        // TableStrategy panics if a selected item is scored again
        let output = reranker.rerank(&input, 3);
        assert_eq!(ids(&output), vec!["i1", "i2", "i3"]);
    }

    #[test]
    fn test_normalize_rescales_both_terms() {
        // raw novelty dwarfs relevance; normalized, relevance decides at lambda 0.6
        let objective = Table(vec![("i1", 100.0), ("i2", 90.0)]);
        let config = RerankerConfig::new(0.6, 1).with_normalize(true);
        let reranker = LambdaReranker::new(objective, config).unwrap();
        let input = rec(&[("i1", 0.1), ("i2", 1.0)]);

        assert_eq!(ids(&reranker.rerank(&input, 1)), vec!["i2"]);

        let objective = Table(vec![("i1", 100.0), ("i2", 90.0)]);
        let raw = LambdaReranker::new(objective, RerankerConfig::new(0.6, 1)).unwrap();
        assert_eq!(ids(&raw.rerank(&input, 1)), vec!["i1"]);
    }

    #[test]
    fn test_normalize_recomputed_every_step() {
        // step 2 norms are rel 0.5 and nov 0.15: b = 0.83, c = 0.9.
        // Reusing the step 1 norms (1.0 and 10.0) would give b = 0.255, c = 0.2075.
        let phases = || {
            Phased(vec![
                vec![("a", 10.0), ("b", 1.0), ("c", 0.0)],
                vec![("b", 0.1), ("c", 0.15)],
            ])
        };
        let input = rec(&[("a", 1.0), ("b", 0.5), ("c", 0.4)]);

        let config = RerankerConfig::new(0.5, 2).with_normalize(true);
        let reranker = LambdaReranker::new(phases(), config).unwrap();
        assert_eq!(ids(&reranker.rerank(&input, 2)), vec!["a", "c"]);

        // raw step 2: b = 0.3, c = 0.275
        let raw = LambdaReranker::new(phases(), RerankerConfig::new(0.5, 2)).unwrap();
        assert_eq!(ids(&raw.rerank(&input, 2)), vec!["a", "b"]);
    }

    #[test]
    fn test_default_window_reaches_below_cutoff() {
        let objective = Table(vec![("i3", 1.0)]);
        let reranker = LambdaReranker::new(objective, RerankerConfig::new(0.5, 2)).unwrap();
        let input = rec(&[("i1", 0.9), ("i2", 0.8), ("i3", 0.7)]);

        assert_eq!(ids(&reranker.rerank(&input, 2)), vec!["i3", "i1"]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = LambdaReranker::new(RelevanceOnly, RerankerConfig::new(1.5, 10));
        assert!(matches!(result, Err(RerankError::InvalidLambda(_))));

        let result = LambdaReranker::new(RelevanceOnly, RerankerConfig::new(0.5, 0));
        assert!(matches!(result, Err(RerankError::InvalidCutoff(0))));
    }

    #[test]
    fn test_input_not_mutated() {
        let reranker =
            LambdaReranker::new(RelevanceOnly, RerankerConfig::new(1.0, 3)).unwrap();
        let input = rec(&[("i1", 0.2), ("i2", 0.8)]);
        let before = input.clone();

        let _ = reranker.rerank(&input, 3);
        assert_eq!(input, before);
    }
}
