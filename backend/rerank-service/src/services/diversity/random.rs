use super::{Reranker, RerankerConfig};
use crate::error::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use recsys_core::{Id, Recommendation};
use sha2::{Digest, Sha256};
use std::hash::{Hash, Hasher};

/// Shuffles the window; a baseline for diversity experiments.
///
/// The shuffle is seeded per user, so results do not depend on the order in
/// which users are processed.
pub struct RandomReranker {
    config: RerankerConfig,
    seed: u64,
}

impl RandomReranker {
    pub fn new(config: RerankerConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, seed })
    }

    /// First 8 bytes (little endian) of SHA-256 over the seed (little endian)
    /// followed by the user's `Hash` byte stream. Stable across toolchains.
    fn user_seed<U: Hash>(&self, user: &U) -> u64 {
        let mut hasher = Sha256Hasher(Sha256::new());
        hasher.0.update(self.seed.to_le_bytes());
        user.hash(&mut hasher);
        hasher.finish()
    }
}

struct Sha256Hasher(Sha256);

impl Hasher for Sha256Hasher {
    fn write(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    fn finish(&self) -> u64 {
        let digest = self.0.clone().finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(head)
    }
}

impl<U: Id, I: Id> Reranker<U, I> for RandomReranker {
    fn name(&self) -> &str {
        "random"
    }

    fn rerank(&self, recommendation: &Recommendation<U, I>, max_length: usize) -> Recommendation<U, I> {
        let limit = self.config.output_len(max_length);
        let window_len = self.config.window_len(recommendation.len());
        let (window, tail) = recommendation.items.split_at(window_len);

        let mut items = window.to_vec();
        let mut rng = StdRng::seed_from_u64(self.user_seed(&recommendation.user));
        items.shuffle(&mut rng);
        items.truncate(limit);

        if self.config.append_tail {
            let missing = limit.saturating_sub(items.len());
            items.extend(tail.iter().take(missing).cloned());
        }

        Recommendation::new(recommendation.user.clone(), items)
    }
}
