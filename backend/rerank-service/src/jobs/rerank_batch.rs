// ============================================
// Rerank Batch Job
// ============================================
//
// Reranks a whole file of per-user recommendations.
//
// Workflow:
// 1. Read recommendations (one JSON object per line)
// 2. Rerank every user on a blocking worker, at most `concurrency` at a time
// 3. Write the reranked lists (one JSON object per line)
//
// Users are independent; output order across users is not preserved.

use crate::error::{RerankError, Result};
use crate::services::Reranker;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use recsys_core::format::{read_recommendations, write_recommendations};
use recsys_core::{Id, Recommendation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Rerank batch statistics
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub users_processed: usize,
    pub items_in: usize,
    pub items_out: usize,
    pub total_duration_ms: u64,
}

/// Rerank batch job runner
pub struct RerankBatchJob<U, I> {
    reranker: Arc<dyn Reranker<U, I>>,
    max_length: usize,
    concurrency: usize,
}

impl<U: Id, I: Id> RerankBatchJob<U, I> {
    pub fn new(reranker: Arc<dyn Reranker<U, I>>, max_length: usize, concurrency: usize) -> Self {
        Self {
            reranker,
            max_length,
            concurrency: concurrency.max(1),
        }
    }

    /// Rerank all recommendations.
    ///
    /// Fails as a whole if any worker fails; no partial output is returned.
    pub async fn run(
        &self,
        recommendations: Vec<Recommendation<U, I>>,
    ) -> Result<(Vec<Recommendation<U, I>>, BatchStats)> {
        let started_at = Utc::now();
        let start = Instant::now();
        let items_in = recommendations.iter().map(Recommendation::len).sum();

        info!(
            reranker = self.reranker.name(),
            users = recommendations.len(),
            concurrency = self.concurrency,
            max_length = self.max_length,
            "Starting rerank batch"
        );

        let max_length = self.max_length;
        let results: Vec<std::result::Result<Recommendation<U, I>, tokio::task::JoinError>> =
            stream::iter(recommendations)
                .map(|recommendation| {
                    let reranker = self.reranker.clone();
                    tokio::task::spawn_blocking(move || {
                        reranker.rerank(&recommendation, max_length)
                    })
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        let mut reranked = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(recommendation) => reranked.push(recommendation),
                Err(e) => {
                    error!(error = %e, "Rerank worker failed");
                    return Err(RerankError::Task(e.to_string()));
                }
            }
        }

        let stats = BatchStats {
            started_at: Some(started_at),
            completed_at: Some(Utc::now()),
            users_processed: reranked.len(),
            items_in,
            items_out: reranked.iter().map(Recommendation::len).sum(),
            total_duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            users = stats.users_processed,
            items_in = stats.items_in,
            items_out = stats.items_out,
            duration_ms = stats.total_duration_ms,
            "Rerank batch completed"
        );

        Ok((reranked, stats))
    }
}

impl<U, I> RerankBatchJob<U, I>
where
    U: Id + Serialize + DeserializeOwned,
    I: Id + Serialize + DeserializeOwned,
{
    /// Read `input`, rerank, and write `output` (JSON lines).
    pub async fn run_file(&self, input: &Path, output: &Path) -> Result<BatchStats> {
        let recommendations: Vec<Recommendation<U, I>> = read_recommendations(input)?;
        let (reranked, stats) = self.run(recommendations).await?;
        write_recommendations(output, &reranked)?;

        info!(
            input = %input.display(),
            output = %output.display(),
            "Wrote reranked recommendations"
        );
        Ok(stats)
    }
}
