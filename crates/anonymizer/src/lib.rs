//! Vaccination Record Anonymizer
//!
//! End-to-end microaggregation pipeline:
//! - Feature encoding of validated records
//! - Seeded k-means partitioning
//! - Minimum group size repair (k-anonymity floor)
//! - Synthetic record generation per cluster
//! - Profile re-identification audit

pub mod audit;
pub mod config;
pub mod io;
pub mod pipeline;

pub use audit::{ProfileAudit, ProfileCriteria, ProfileFields};
pub use config::AnonymizerConfig;
pub use pipeline::{AnonymizationOutput, AnonymizationReport, Anonymizer};

pub use record_validator::{Record, RecordTable};
pub use synthesizer::AnonymizedRecord;

use cluster_engine::ClusterError;
use feature_engine::EncodingError;
use record_validator::ValidationError;
use synthesizer::SynthesisError;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Pipeline error types
#[derive(Error, Debug)]
pub enum AnonymizerError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Clustering failed: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed batch file: {0}")]
    Format(String),
}

impl From<::config::ConfigError> for AnonymizerError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AnonymizerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(err.to_string())
    }
}

/// Initialize logging
pub fn init_logging(level: Level) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
