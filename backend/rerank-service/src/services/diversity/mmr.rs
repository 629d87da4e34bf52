//! Maximal marginal relevance with a running average distance.

use super::lambda::{NoveltyStrategy, Objective, StrategyContext};
use recsys_core::{FeatureData, Id, Scored};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Distance between two items, in [0, 1].
pub trait ItemDistance<I>: Send + Sync {
    fn distance(&self, a: &I, b: &I) -> f64;
}

/// Jaccard distance between item feature sets.
pub struct JaccardFeatureDistance<I: Id, F: Id> {
    feature_data: Arc<dyn FeatureData<I, F>>,
}

impl<I: Id, F: Id> JaccardFeatureDistance<I, F> {
    pub fn new(feature_data: Arc<dyn FeatureData<I, F>>) -> Self {
        Self { feature_data }
    }

    fn feature_set(&self, item: &I) -> HashSet<&F> {
        self.feature_data
            .item_features(item)
            .iter()
            .map(|(f, _)| f)
            .collect()
    }
}

impl<I: Id, F: Id> ItemDistance<I> for JaccardFeatureDistance<I, F> {
    fn distance(&self, a: &I, b: &I) -> f64 {
        let fa = self.feature_set(a);
        let fb = self.feature_set(b);
        let union = fa.union(&fb).count();
        if union == 0 {
            return 0.0;
        }
        let intersection = fa.intersection(&fb).count();
        1.0 - intersection as f64 / union as f64
    }
}

/// Novelty = average distance to the items selected so far.
pub struct MmrStrategy<I: Id> {
    distance: Arc<dyn ItemDistance<I>>,
    avg_distance: HashMap<I, f64>,
    selected: usize,
}

impl<I: Id> MmrStrategy<I> {
    pub fn new(distance: Arc<dyn ItemDistance<I>>, candidates: &[Scored<I>]) -> Self {
        Self {
            distance,
            avg_distance: candidates.iter().map(|c| (c.id.clone(), 0.0)).collect(),
            selected: 0,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }
}

impl<I: Id> NoveltyStrategy<I> for MmrStrategy<I> {
    fn novelty(&self, candidate: &Scored<I>) -> f64 {
        self.avg_distance.get(&candidate.id).copied().unwrap_or(0.0)
    }

    fn update(&mut self, chosen: &Scored<I>) {
        self.avg_distance.remove(&chosen.id);
        self.selected += 1;
        let n = self.selected as f64;
        for (item, avg) in self.avg_distance.iter_mut() {
            let d = self.distance.distance(&chosen.id, item);
            *avg += (d - *avg) / n;
        }
    }
}

/// MMR objective over a pluggable item distance.
pub struct Mmr<I: Id> {
    distance: Arc<dyn ItemDistance<I>>,
}

impl<I: Id> Mmr<I> {
    pub fn new(distance: Arc<dyn ItemDistance<I>>) -> Self {
        Self { distance }
    }
}

impl<U, I: Id> Objective<U, I> for Mmr<I> {
    type Strategy = MmrStrategy<I>;

    fn name(&self) -> &'static str {
        "mmr"
    }

    fn strategy(&self, ctx: StrategyContext<'_, U, I>) -> Self::Strategy {
        MmrStrategy::new(self.distance.clone(), ctx.candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::diversity::{LambdaReranker, Reranker, RerankerConfig};
    use recsys_core::{Recommendation, SimpleFeatureData};

    fn distance() -> Arc<dyn ItemDistance<&'static str>> {
        let features: Arc<dyn FeatureData<&'static str, &'static str>> =
            Arc::new(SimpleFeatureData::from_triples(vec![
                ("i1", "a", 1.0),
                ("i2", "a", 1.0),
                ("i3", "b", 1.0),
                ("i4", "a", 1.0),
                ("i4", "c", 1.0),
            ]));
        Arc::new(JaccardFeatureDistance::new(features))
    }

    #[test]
    fn test_jaccard_distance() {
        let d = distance();
        assert_eq!(d.distance(&"i1", &"i2"), 0.0);
        assert_eq!(d.distance(&"i1", &"i3"), 1.0);
        assert!((d.distance(&"i1", &"i4") - 0.5).abs() < 1e-12);
        assert_eq!(d.distance(&"x", &"y"), 0.0);
    }

    #[test]
    fn test_running_average() {
        let candidates: Vec<_> = ["i1", "i2", "i3", "i4"]
            .iter()
            .map(|id| Scored::new(*id, 1.0))
            .collect();
        let mut s = MmrStrategy::new(distance(), &candidates);
        assert_eq!(s.novelty(&candidates[2]), 0.0);

        s.update(&candidates[0]);
        s.update(&candidates[2]);
        assert_eq!(s.selected(), 2);
        // i4: d(i1) = 0.5, d(i3) = 1.0
        assert!((s.novelty(&candidates[3]) - 0.75).abs() < 1e-12);
        // i2: d(i1) = 0.0, d(i3) = 1.0
        assert!((s.novelty(&candidates[1]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_mmr_reranker_spreads_features() {
        let reranker = LambdaReranker::new(Mmr::new(distance()), RerankerConfig::new(0.5, 3)).unwrap();
        let input = Recommendation::from_pairs("u1", vec![("i1", 0.9), ("i2", 0.85), ("i3", 0.5)]);

        let ids: Vec<_> = reranker.rerank(&input, 3).item_ids().copied().collect();
        assert_eq!(ids, vec!["i1", "i3", "i2"]);
    }
}
