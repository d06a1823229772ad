//! Feature Engineering Engine
//!
//! Turns a batch of validated records into a standardized, weighted feature
//! matrix suitable for Euclidean clustering.

mod features;
mod vocabulary;

pub use features::{EncodingMeta, FeatureEncoder, FeatureMatrix, FeatureWeights, FieldLayout};
pub use vocabulary::CategoryVocabulary;

use thiserror::Error;

/// Errors during feature encoding
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("Cannot encode an empty batch")]
    EmptyBatch,
    #[error("Invalid weight for {field}: {value} (must be finite and >= 0)")]
    InvalidWeight { field: &'static str, value: f64 },
}
