//! Cluster Synthesizer
//!
//! Microaggregation step of the pipeline: summarises each repaired cluster
//! and draws synthetic records from those summaries instead of releasing
//! real rows.

mod names;
mod statistics;
mod synthesis;

pub use names::{random_pseudonym, FIRST_NAMES, LAST_NAMES};
pub use statistics::ClusterStatistics;
pub use synthesis::{AnonymizedRecord, ClusterSynthesizer, SynthesisConfig, SyntheticCluster};

use thiserror::Error;

/// Errors during synthesis
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthesisError {
    #[error("Label count {labels} does not match record count {records}")]
    LabelMismatch { records: usize, labels: usize },
    #[error("Invalid sampling distribution: {0}")]
    InvalidDistribution(String),
    #[error("Date offset {0} days falls outside the calendar range")]
    DateOutOfRange(i64),
}
