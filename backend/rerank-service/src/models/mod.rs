//! Per-user probabilistic models.
//!
//! Built once from preference and feature data, then shared read-only (via
//! `Arc`) by every rerank invocation for that user.

pub mod binomial;
pub mod intent;

pub use binomial::{BinomialModel, UserBinomialModel};
pub use intent::{IntentModel, UserIntentModel};
