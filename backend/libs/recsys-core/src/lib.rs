//! Shared recommendation data model.
//!
//! Holds the types every reranker consumes and produces ([`Recommendation`],
//! [`Scored`]) together with the preference and feature data collaborators
//! that per-user models are built from.

pub mod error;
pub mod feature;
pub mod format;
pub mod preference;
pub mod recommendation;

pub use error::{DataError, DataResult};
pub use feature::{FeatureData, SimpleFeatureData};
pub use preference::{PreferenceData, SimplePreferenceData};
pub use recommendation::{Id, Recommendation, Scored};
