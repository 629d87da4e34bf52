use crate::recommendation::Id;
use std::collections::{HashMap, HashSet};

/// Item feature data: which features (genres, aspects) an item exhibits.
pub trait FeatureData<I, F>: Send + Sync {
    /// `(feature, weight)` pairs of an item; empty for unknown items.
    fn item_features(&self, item: &I) -> &[(F, f64)];

    /// All known features, in a stable order.
    fn features(&self) -> Vec<F>;

    fn has_feature(&self, item: &I, feature: &F) -> bool
    where
        F: PartialEq,
    {
        self.item_features(item).iter().any(|(f, _)| f == feature)
    }
}

/// In-memory feature data keyed by item.
///
/// A feature is stored at most once per item; the first weight wins.
#[derive(Debug, Clone)]
pub struct SimpleFeatureData<I, F> {
    by_item: HashMap<I, Vec<(F, f64)>>,
    features: Vec<F>,
    known: HashSet<F>,
}

impl<I: Id, F: Id> Default for SimpleFeatureData<I, F> {
    fn default() -> Self {
        Self {
            by_item: HashMap::new(),
            features: Vec::new(),
            known: HashSet::new(),
        }
    }
}

impl<I: Id, F: Id> SimpleFeatureData<I, F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(item, feature, weight)` triples.
    pub fn from_triples(triples: impl IntoIterator<Item = (I, F, f64)>) -> Self {
        let mut data = Self::new();
        for (item, feature, weight) in triples {
            data.add(item, feature, weight);
        }
        data
    }

    pub fn add(&mut self, item: I, feature: F, weight: f64) {
        let item_features = self.by_item.entry(item).or_default();
        if item_features.iter().any(|(f, _)| *f == feature) {
            return;
        }
        if self.known.insert(feature.clone()) {
            self.features.push(feature.clone());
        }
        item_features.push((feature, weight));
    }

    pub fn num_items(&self) -> usize {
        self.by_item.len()
    }
}

impl<I: Id, F: Id> FeatureData<I, F> for SimpleFeatureData<I, F> {
    fn item_features(&self, item: &I) -> &[(F, f64)] {
        self.by_item.get(item).map(Vec::as_slice).unwrap_or(&[])
    }

    fn features(&self) -> Vec<F> {
        self.features.clone()
    }
}
