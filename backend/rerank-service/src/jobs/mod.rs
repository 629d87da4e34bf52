// ============================================
// Background Jobs
// ============================================
//
// Batch jobs that run outside the request path.

pub mod rerank_batch;

pub use rerank_batch::{BatchStats, RerankBatchJob};
