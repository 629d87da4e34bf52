use crate::recommendation::{Id, Scored};
use std::collections::HashMap;

/// User preference data (ratings, clicks, plays...).
pub trait PreferenceData<U, I>: Send + Sync {
    /// Users with at least one preference, in a stable order.
    fn users(&self) -> Vec<U>;

    /// Preferences of a user; empty for unknown users.
    fn user_preferences(&self, user: &U) -> &[Scored<I>];

    /// Total number of (user, item) preferences.
    fn num_preferences(&self) -> usize;

    fn num_users(&self) -> usize {
        self.users().len()
    }
}

/// In-memory preference data keyed by user.
#[derive(Debug, Clone)]
pub struct SimplePreferenceData<U, I> {
    by_user: HashMap<U, Vec<Scored<I>>>,
    users: Vec<U>,
    num_preferences: usize,
}

impl<U: Id, I: Id> Default for SimplePreferenceData<U, I> {
    fn default() -> Self {
        Self {
            by_user: HashMap::new(),
            users: Vec::new(),
            num_preferences: 0,
        }
    }
}

impl<U: Id, I: Id> SimplePreferenceData<U, I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(user, item, value)` triples.
    pub fn from_triples(triples: impl IntoIterator<Item = (U, I, f64)>) -> Self {
        let mut data = Self::new();
        for (user, item, value) in triples {
            data.add(user, item, value);
        }
        data
    }

    pub fn add(&mut self, user: U, item: I, value: f64) {
        if !self.by_user.contains_key(&user) {
            self.users.push(user.clone());
        }
        self.by_user
            .entry(user)
            .or_default()
            .push(Scored::new(item, value));
        self.num_preferences += 1;
    }
}

impl<U: Id, I: Id> PreferenceData<U, I> for SimplePreferenceData<U, I> {
    fn users(&self) -> Vec<U> {
        self.users.clone()
    }

    fn user_preferences(&self, user: &U) -> &[Scored<I>] {
        self.by_user.get(user).map(Vec::as_slice).unwrap_or(&[])
    }

    fn num_preferences(&self) -> usize {
        self.num_preferences
    }

    fn num_users(&self) -> usize {
        self.users.len()
    }
}
