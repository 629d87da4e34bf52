use crate::error::{RerankError, Result};
use recsys_core::{FeatureData, Id, PreferenceData};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Feature distribution of one user under the binomial diversity model.
#[derive(Debug, Clone, PartialEq)]
pub struct UserBinomialModel<F: Id> {
    probabilities: HashMap<F, f64>,
}

impl<F: Id> Default for UserBinomialModel<F> {
    fn default() -> Self {
        Self {
            probabilities: HashMap::new(),
        }
    }
}

impl<F: Id> UserBinomialModel<F> {
    pub fn from_probabilities(probabilities: HashMap<F, f64>) -> Self {
        Self { probabilities }
    }

    /// Features relevant to this user.
    pub fn features(&self) -> impl Iterator<Item = &F> {
        self.probabilities.keys()
    }

    pub fn num_features(&self) -> usize {
        self.probabilities.len()
    }

    pub fn contains(&self, f: &F) -> bool {
        self.probabilities.contains_key(f)
    }

    /// Probability that a random item liked by the user exhibits `f`.
    pub fn p(&self, f: &F) -> f64 {
        self.probabilities.get(f).copied().unwrap_or(0.0)
    }

    /// Probability that `f` is still missing after `k` independent draws.
    pub fn longing(&self, f: &F, k: usize) -> f64 {
        (1.0 - self.p(f)).powf(k as f64)
    }
}

/// Binomial genre-diversity model.
///
/// Mixes a user's own feature frequencies with the global ones; `alpha` is
/// the weight of the global distribution.
pub struct BinomialModel<U: Id, F: Id> {
    models: HashMap<U, Arc<UserBinomialModel<F>>>,
    global: HashMap<F, f64>,
    empty: Arc<UserBinomialModel<F>>,
    alpha: f64,
}

impl<U: Id, F: Id> BinomialModel<U, F> {
    pub fn new<I: Id>(
        users: impl IntoIterator<Item = U>,
        preferences: &dyn PreferenceData<U, I>,
        feature_data: &dyn FeatureData<I, F>,
        alpha: f64,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(RerankError::InvalidParameter(format!(
                "binomial alpha must be within [0, 1], got {alpha}"
            )));
        }

        let global = Self::global_probabilities(preferences, feature_data);

        let models: HashMap<U, Arc<UserBinomialModel<F>>> = users
            .into_iter()
            .map(|user| {
                let model = Self::build_user_model(&user, preferences, feature_data, &global, alpha);
                (user, Arc::new(model))
            })
            .collect();

        debug!(
            users = models.len(),
            features = global.len(),
            alpha,
            "Built binomial models"
        );

        Ok(Self {
            models,
            global,
            empty: Arc::new(UserBinomialModel::default()),
            alpha,
        })
    }

    /// Fraction of all preferences whose item exhibits each feature.
    fn global_probabilities<I: Id>(
        preferences: &dyn PreferenceData<U, I>,
        feature_data: &dyn FeatureData<I, F>,
    ) -> HashMap<F, f64> {
        let mut counts: HashMap<F, f64> = HashMap::new();
        for user in preferences.users() {
            for pref in preferences.user_preferences(&user) {
                count_features(&mut counts, feature_data.item_features(&pref.id));
            }
        }

        let total = preferences.num_preferences() as f64;
        if total > 0.0 {
            counts.values_mut().for_each(|c| *c /= total);
        }
        counts
    }

    fn build_user_model<I: Id>(
        user: &U,
        preferences: &dyn PreferenceData<U, I>,
        feature_data: &dyn FeatureData<I, F>,
        global: &HashMap<F, f64>,
        alpha: f64,
    ) -> UserBinomialModel<F> {
        let prefs = preferences.user_preferences(user);
        if prefs.is_empty() {
            return UserBinomialModel::default();
        }

        let mut counts: HashMap<F, f64> = HashMap::new();
        for pref in prefs {
            count_features(&mut counts, feature_data.item_features(&pref.id));
        }

        let n = prefs.len() as f64;
        let probabilities = counts
            .into_iter()
            .map(|(f, c)| {
                let p_user = c / n;
                let p_global = global.get(&f).copied().unwrap_or(0.0);
                (f, (1.0 - alpha) * p_user + alpha * p_global)
            })
            .collect();

        UserBinomialModel::from_probabilities(probabilities)
    }

    /// Model of `user`; users without a model get an empty one.
    pub fn user_model(&self, user: &U) -> Arc<UserBinomialModel<F>> {
        self.models
            .get(user)
            .cloned()
            .unwrap_or_else(|| self.empty.clone())
    }

    /// Global probability of `f` across all preferences.
    pub fn global_p(&self, f: &F) -> f64 {
        self.global.get(f).copied().unwrap_or(0.0)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

// Each distinct feature of an item counts once per preference.
fn count_features<F: Id>(counts: &mut HashMap<F, f64>, features: &[(F, f64)]) {
    let mut seen: HashSet<&F> = HashSet::with_capacity(features.len());
    for (f, _) in features {
        if seen.insert(f) {
            *counts.entry(f.clone()).or_insert(0.0) += 1.0;
        }
    }
}
