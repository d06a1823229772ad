//! Seeded K-Means Partitioning
//!
//! Lloyd iterations from a k-means++ seeding, repeated `n_init` times; the
//! restart with the lowest inertia wins. All randomness comes from the
//! caller's generator so a fixed seed reproduces the same partition.

use crate::distance::squared_euclidean;
use crate::ClusterError;
use feature_engine::FeatureMatrix;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Number of clusters to ask k-means for: `max(1, n / k)`
pub fn target_cluster_count(n: usize, min_group_size: usize) -> usize {
    (n / min_group_size.max(1)).max(1)
}

/// K-means configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    /// Number of restarts (best inertia kept)
    pub n_init: usize,
    /// Maximum Lloyd iterations per restart
    pub max_iterations: usize,
    /// Convergence threshold on total squared centroid shift
    pub tolerance: f64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            n_init: 10,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

impl KMeansConfig {
    /// Reject configurations that cannot run
    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.n_init == 0 {
            return Err(ClusterError::InvalidConfig("n_init must be at least 1".to_string()));
        }
        if self.max_iterations == 0 {
            return Err(ClusterError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "tolerance must be finite and >= 0, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Fitted k-means partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeans {
    centroids: Vec<Vec<f64>>,
    labels: Vec<usize>,
    inertia: f64,
    iterations: usize,
}

impl KMeans {
    /// Fit `n_clusters` clusters, keeping the best of `config.n_init` restarts
    pub fn fit<R: Rng + ?Sized>(
        matrix: &FeatureMatrix,
        n_clusters: usize,
        config: &KMeansConfig,
        rng: &mut R,
    ) -> Result<Self, ClusterError> {
        if matrix.is_empty() {
            return Err(ClusterError::EmptyBatch);
        }
        config.validate()?;
        let dims = matrix.dimension();
        if let Some(row) = matrix.rows().iter().find(|r| r.len() != dims) {
            return Err(ClusterError::DimensionMismatch {
                expected: dims,
                actual: row.len(),
            });
        }
        let n_clusters = n_clusters.clamp(1, matrix.len());

        let mut best: Option<KMeans> = None;
        for init in 0..config.n_init {
            let result = Self::fit_single(matrix, n_clusters, config, rng);
            debug!(
                "k-means restart {}: inertia {:.6} after {} iterations",
                init, result.inertia, result.iterations
            );
            if best.as_ref().map_or(true, |b| result.inertia < b.inertia) {
                best = Some(result);
            }
        }

        best.ok_or_else(|| ClusterError::InvalidConfig("no k-means restart ran".to_string()))
    }

    fn fit_single<R: Rng + ?Sized>(
        matrix: &FeatureMatrix,
        k: usize,
        config: &KMeansConfig,
        rng: &mut R,
    ) -> Self {
        let mut centroids = Self::kmeans_plus_plus_init(matrix, k, rng);
        let mut labels = Self::assign(matrix, &centroids);
        let mut iterations = 0;

        for _ in 0..config.max_iterations {
            iterations += 1;
            let updated = Self::update(matrix, &labels, &centroids);
            let shift: f64 = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_euclidean(old, new))
                .sum();
            centroids = updated;
            labels = Self::assign(matrix, &centroids);
            if shift <= config.tolerance {
                break;
            }
        }

        let inertia = matrix
            .rows()
            .iter()
            .zip(&labels)
            .map(|(row, &c)| squared_euclidean(row, &centroids[c]))
            .sum();

        Self {
            centroids,
            labels,
            inertia,
            iterations,
        }
    }

    /// K-means++ seeding: first centre uniform, then D²-weighted
    fn kmeans_plus_plus_init<R: Rng + ?Sized>(
        matrix: &FeatureMatrix,
        k: usize,
        rng: &mut R,
    ) -> Vec<Vec<f64>> {
        let rows = matrix.rows();
        let mut centroids = Vec::with_capacity(k);
        centroids.push(rows[rng.random_range(0..rows.len())].clone());

        for _ in 1..k {
            let distances: Vec<f64> = rows
                .iter()
                .map(|row| {
                    centroids
                        .iter()
                        .map(|c| squared_euclidean(row, c))
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            let total: f64 = distances.iter().sum();
            if total <= 0.0 {
                // Every point already coincides with a centre
                centroids.push(rows[rng.random_range(0..rows.len())].clone());
                continue;
            }

            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = rows.len() - 1;
            for (i, &d) in distances.iter().enumerate() {
                cumsum += d;
                if d > 0.0 && cumsum >= threshold {
                    selected = i;
                    break;
                }
            }
            centroids.push(rows[selected].clone());
        }

        centroids
    }

    /// Nearest centroid per row (ties go to the lowest index)
    fn assign(matrix: &FeatureMatrix, centroids: &[Vec<f64>]) -> Vec<usize> {
        matrix
            .rows()
            .iter()
            .map(|row| Self::nearest(row, centroids))
            .collect()
    }

    fn nearest(row: &[f64], centroids: &[Vec<f64>]) -> usize {
        let mut best = 0;
        let mut best_dist = f64::MAX;
        for (i, c) in centroids.iter().enumerate() {
            let d = squared_euclidean(row, c);
            if d < best_dist {
                best = i;
                best_dist = d;
            }
        }
        best
    }

    /// Recompute centroids; an empty cluster moves to the row farthest from
    /// its current centre that has not been used for another empty cluster
    fn update(matrix: &FeatureMatrix, labels: &[usize], centroids: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let k = centroids.len();
        let dims = matrix.dimension();
        let mut sums = vec![vec![0.0; dims]; k];
        let mut counts = vec![0usize; k];

        for (row, &c) in matrix.rows().iter().zip(labels) {
            counts[c] += 1;
            for (s, v) in sums[c].iter_mut().zip(row) {
                *s += v;
            }
        }

        let mut taken = vec![false; matrix.len()];
        for c in 0..k {
            if counts[c] > 0 {
                let n = counts[c] as f64;
                sums[c].iter_mut().for_each(|s| *s /= n);
                continue;
            }
            let farthest = matrix
                .rows()
                .iter()
                .enumerate()
                .filter(|(i, _)| !taken[*i])
                .map(|(i, row)| (i, squared_euclidean(row, &centroids[labels[i]])))
                .fold(None, |acc: Option<(usize, f64)>, (i, d)| match acc {
                    Some((_, best)) if best >= d => acc,
                    _ => Some((i, d)),
                });
            match farthest {
                Some((i, _)) => {
                    taken[i] = true;
                    sums[c] = matrix.row(i).to_vec();
                }
                None => sums[c] = centroids[c].clone(),
            }
        }

        sums
    }

    /// Cluster label per input row
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Consume the fit and return its labels
    pub fn into_labels(self) -> Vec<usize> {
        self.labels
    }

    /// Cluster centroids
    pub fn centroids(&self) -> &[Vec<f64>] {
        &self.centroids
    }

    /// Sum of squared distances to assigned centroids
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Lloyd iterations used by the winning restart
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Initial partitioning step of the pipeline
#[derive(Debug, Clone)]
pub struct Clusterer {
    min_group_size: usize,
    config: KMeansConfig,
}

impl Clusterer {
    /// Create a clusterer for minimum group size `min_group_size`
    pub fn new(min_group_size: usize, config: KMeansConfig) -> Result<Self, ClusterError> {
        if min_group_size == 0 {
            return Err(ClusterError::InvalidGroupSize(min_group_size));
        }
        config.validate()?;
        Ok(Self {
            min_group_size,
            config,
        })
    }

    /// Minimum group size this clusterer targets
    pub fn min_group_size(&self) -> usize {
        self.min_group_size
    }

    /// Assign every row a cluster label.
    ///
    /// Asks for `max(1, n / k)` clusters; fewer rows than `k` end up in a
    /// single cluster. An empty matrix is rejected.
    pub fn cluster<R: Rng + ?Sized>(
        &self,
        matrix: &FeatureMatrix,
        rng: &mut R,
    ) -> Result<Vec<usize>, ClusterError> {
        if matrix.is_empty() {
            return Err(ClusterError::EmptyBatch);
        }
        let target = target_cluster_count(matrix.len(), self.min_group_size);
        if target == 1 {
            info!("{} records below 2k, using a single cluster", matrix.len());
            return Ok(vec![0; matrix.len()]);
        }

        let fit = KMeans::fit(matrix, target, &self.config, rng)?;
        info!(
            "k-means: {} records into {} clusters (inertia {:.4})",
            matrix.len(),
            target,
            fit.inertia()
        );
        Ok(fit.into_labels())
    }
}
