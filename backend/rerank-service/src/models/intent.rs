use recsys_core::{FeatureData, Id, PreferenceData};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Intent distribution of one user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserIntentModel<F: Id> {
    probabilities: HashMap<F, f64>,
}

impl<F: Id> Default for UserIntentModel<F> {
    fn default() -> Self {
        Self {
            probabilities: HashMap::new(),
        }
    }
}

impl<F: Id> UserIntentModel<F> {
    pub fn from_probabilities(probabilities: HashMap<F, f64>) -> Self {
        Self { probabilities }
    }

    /// Prior probability of intent `f`; 0.0 for intents the user never showed.
    pub fn p(&self, f: &F) -> f64 {
        self.probabilities.get(f).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, f: &F) -> bool {
        self.probabilities.contains_key(f)
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

/// Intent-aware model: a user's intents are the features of the items they
/// interacted with, weighted by frequency.
pub struct IntentModel<U: Id, I: Id, F: Id> {
    models: HashMap<U, Arc<UserIntentModel<F>>>,
    empty: Arc<UserIntentModel<F>>,
    feature_data: Arc<dyn FeatureData<I, F>>,
}

impl<U: Id, I: Id, F: Id> IntentModel<U, I, F> {
    pub fn new(
        users: impl IntoIterator<Item = U>,
        preferences: &dyn PreferenceData<U, I>,
        feature_data: Arc<dyn FeatureData<I, F>>,
    ) -> Self {
        let models: HashMap<U, Arc<UserIntentModel<F>>> = users
            .into_iter()
            .map(|user| {
                let model = Self::build_user_model(&user, preferences, feature_data.as_ref());
                (user, Arc::new(model))
            })
            .collect();

        debug!(users = models.len(), "Built intent models");

        Self {
            models,
            empty: Arc::new(UserIntentModel::default()),
            feature_data,
        }
    }

    fn build_user_model(
        user: &U,
        preferences: &dyn PreferenceData<U, I>,
        feature_data: &dyn FeatureData<I, F>,
    ) -> UserIntentModel<F> {
        let mut counts: HashMap<F, f64> = HashMap::new();
        for pref in preferences.user_preferences(user) {
            for (f, _) in feature_data.item_features(&pref.id) {
                *counts.entry(f.clone()).or_insert(0.0) += 1.0;
            }
        }

        let norm: f64 = counts.values().sum();
        if norm > 0.0 {
            counts.values_mut().for_each(|c| *c /= norm);
        }

        UserIntentModel::from_probabilities(counts)
    }

    /// Model of `user`; users without a model get an empty one.
    pub fn user_model(&self, user: &U) -> Arc<UserIntentModel<F>> {
        self.models
            .get(user)
            .cloned()
            .unwrap_or_else(|| self.empty.clone())
    }

    pub fn feature_data(&self) -> &Arc<dyn FeatureData<I, F>> {
        &self.feature_data
    }

    pub fn num_users(&self) -> usize {
        self.models.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recsys_core::{SimpleFeatureData, SimplePreferenceData};

    fn fixture() -> IntentModel<&'static str, &'static str, &'static str> {
        let prefs = SimplePreferenceData::from_triples(vec![
            ("u1", "i1", 5.0),
            ("u1", "i2", 3.0),
            ("u2", "i3", 4.0),
        ]);
        let features = SimpleFeatureData::from_triples(vec![
            ("i1", "action", 1.0),
            ("i1", "comedy", 1.0),
            ("i2", "action", 1.0),
            ("i3", "drama", 1.0),
        ]);
        IntentModel::new(prefs.users(), &prefs, Arc::new(features))
    }

    #[test]
    fn test_intent_probabilities_follow_feature_frequency() {
        let model = fixture();
        let u1 = model.user_model(&"u1");

        assert!((u1.p(&"action") - 2.0 / 3.0).abs() < 1e-12);
        assert!((u1.p(&"comedy") - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(u1.p(&"drama"), 0.0);
        assert!(!u1.contains(&"drama"));
        assert_eq!(model.num_users(), 2);
    }

    #[test]
    fn test_unknown_user_gets_empty_model() {
        let model = fixture();
        assert!(model.user_model(&"ghost").is_empty());
    }
}
