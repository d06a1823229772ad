//! Clustering Engine
//!
//! Partitions a feature matrix with seeded k-means and repairs the result so
//! that every cluster holds at least the minimum anonymity group size.

mod distance;
mod kmeans;
mod repair;

pub use distance::{centroid, cluster_sizes, group_members, squared_euclidean};
pub use kmeans::{target_cluster_count, Clusterer, KMeans, KMeansConfig};
pub use repair::{GroupRepairer, RepairOutcome};

use thiserror::Error;

/// Errors during clustering and repair
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    #[error("Cannot cluster an empty batch")]
    EmptyBatch,
    #[error("Minimum group size must be at least 1, got {0}")]
    InvalidGroupSize(usize),
    #[error("Invalid clustering configuration: {0}")]
    InvalidConfig(String),
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
