use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Bound shared by user, item and feature identifiers.
pub trait Id: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Id for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// An identifier paired with a relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored<T> {
    pub id: T,
    pub score: f64,
}

impl<T> Scored<T> {
    pub fn new(id: T, score: f64) -> Self {
        Self { id, score }
    }
}

/// A ranked list of items for one user.
///
/// Item order is the upstream ranking. Rerankers never mutate an input
/// recommendation; they build a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation<U, I> {
    pub user: U,
    pub items: Vec<Scored<I>>,
}

impl<U, I> Recommendation<U, I> {
    pub fn new(user: U, items: Vec<Scored<I>>) -> Self {
        Self { user, items }
    }

    /// Recommendation with no items.
    pub fn empty(user: U) -> Self {
        Self {
            user,
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item identifiers in ranking order.
    pub fn item_ids(&self) -> impl Iterator<Item = &I> {
        self.items.iter().map(|s| &s.id)
    }
}

impl<U, I: Clone> Recommendation<U, I> {
    /// Build from `(item, score)` pairs.
    pub fn from_pairs(user: U, pairs: impl IntoIterator<Item = (I, f64)>) -> Self {
        Self {
            user,
            items: pairs
                .into_iter()
                .map(|(id, score)| Scored::new(id, score))
                .collect(),
        }
    }
}
