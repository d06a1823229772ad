//! Distance and Grouping Helpers

use feature_engine::FeatureMatrix;
use std::collections::BTreeMap;

/// Squared Euclidean distance between two equal-length vectors
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Mean feature vector of the given rows
pub fn centroid(matrix: &FeatureMatrix, members: &[usize]) -> Vec<f64> {
    let mut mean = vec![0.0; matrix.dimension()];
    if members.is_empty() {
        return mean;
    }
    for &i in members {
        for (m, v) in mean.iter_mut().zip(matrix.row(i)) {
            *m += v;
        }
    }
    let n = members.len() as f64;
    mean.iter_mut().for_each(|m| *m /= n);
    mean
}

/// Record indices per cluster id, in ascending id order
pub fn group_members(labels: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(idx);
    }
    groups
}

/// Size of every cluster id present in `labels`
pub fn cluster_sizes(labels: &[usize]) -> BTreeMap<usize, usize> {
    let mut sizes = BTreeMap::new();
    for &label in labels {
        *sizes.entry(label).or_insert(0) += 1;
    }
    sizes
}
