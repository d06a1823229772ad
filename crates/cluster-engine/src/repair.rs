//! Minimum Group Size Repair
//!
//! Greedy merge loop: while some cluster is smaller than `k`, the smallest
//! one (lowest id on ties) is absorbed whole into the cluster whose centroid
//! is nearest to its own (lowest id on ties). Each pass removes one cluster
//! id, so the loop ends after at most `clusters - 1` merges.

use crate::distance::{centroid, group_members, squared_euclidean};
use crate::ClusterError;
use feature_engine::FeatureMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Result of a repair pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairOutcome {
    /// Final cluster label per record
    pub labels: Vec<usize>,
    /// Number of clusters absorbed
    pub merges: usize,
}

impl RepairOutcome {
    /// Number of distinct clusters left
    pub fn cluster_count(&self) -> usize {
        group_members(&self.labels).len()
    }
}

/// Enforces the minimum anonymity group size on a labelling
#[derive(Debug, Clone, Copy)]
pub struct GroupRepairer {
    min_group_size: usize,
}

impl GroupRepairer {
    /// Create a repairer for minimum group size `min_group_size`
    pub fn new(min_group_size: usize) -> Result<Self, ClusterError> {
        if min_group_size == 0 {
            return Err(ClusterError::InvalidGroupSize(min_group_size));
        }
        Ok(Self { min_group_size })
    }

    /// Merge undersized clusters until every cluster has at least `k`
    /// members, or a single cluster remains.
    pub fn repair(&self, labels: &[usize], matrix: &FeatureMatrix) -> Result<RepairOutcome, ClusterError> {
        if labels.is_empty() {
            return Err(ClusterError::EmptyBatch);
        }
        if labels.len() != matrix.len() {
            return Err(ClusterError::DimensionMismatch {
                expected: matrix.len(),
                actual: labels.len(),
            });
        }

        let mut groups = group_members(labels);
        let mut merges = 0;

        while groups.len() > 1 {
            let Some(smallest) = self.smallest_violating(&groups) else {
                break;
            };
            let members = groups.remove(&smallest).unwrap_or_default();
            let own = centroid(matrix, &members);

            // Nearest centroid, lowest id on ties; infinite distances still compare.
            let nearest = groups
                .iter()
                .map(|(&id, others)| (id, squared_euclidean(&own, &centroid(matrix, others))))
                .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            let Some((target, best)) = nearest else {
                groups.insert(smallest, members);
                break;
            };

            debug!(
                "Merging cluster {} ({} members) into cluster {} (distance {:.4})",
                smallest,
                members.len(),
                target,
                best
            );
            groups.entry(target).or_default().extend(members);
            merges += 1;
        }

        let mut repaired = vec![0; labels.len()];
        for (id, members) in &groups {
            for &i in members {
                repaired[i] = *id;
            }
        }

        Ok(RepairOutcome {
            labels: repaired,
            merges,
        })
    }

    /// Smallest cluster below the threshold; ties go to the lowest id
    fn smallest_violating(&self, groups: &BTreeMap<usize, Vec<usize>>) -> Option<usize> {
        groups
            .iter()
            .filter(|(_, members)| members.len() < self.min_group_size)
            .min_by_key(|(id, members)| (members.len(), **id))
            .map(|(id, _)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::cluster_sizes;
    use proptest::prelude::*;

    fn line(values: &[f64]) -> FeatureMatrix {
        FeatureMatrix::from_rows(values.iter().map(|v| vec![*v]).collect(), 1)
    }

    #[test]
    fn test_valid_labels_unchanged() {
        let matrix = line(&[0.0, 0.1, 0.2, 5.0, 5.1, 5.2]);
        let labels = vec![0, 0, 0, 1, 1, 1];
        let outcome = GroupRepairer::new(3).unwrap().repair(&labels, &matrix).unwrap();
        assert_eq!(outcome.labels, labels);
        assert_eq!(outcome.merges, 0);
    }

    #[test]
    fn test_small_cluster_merges_into_nearest() {
        let matrix = line(&[0.0, 0.1, 0.2, 5.0, 5.1, 5.2, 4.0]);
        let labels = vec![0, 0, 0, 1, 1, 1, 2];
        let outcome = GroupRepairer::new(3).unwrap().repair(&labels, &matrix).unwrap();
        assert_eq!(outcome.labels[6], 1);
        assert_eq!(outcome.merges, 1);
        assert_eq!(outcome.cluster_count(), 2);
    }

    #[test]
    fn test_smallest_violator_goes_first() {
        // Cluster 2 (size 1) is processed before cluster 1 (size 2).
        // It sits nearest cluster 1, which then reaches size 3.
        let matrix = line(&[0.0, 0.0, 0.0, 10.0, 10.0, 11.0]);
        let labels = vec![0, 0, 0, 1, 1, 2];
        let outcome = GroupRepairer::new(3).unwrap().repair(&labels, &matrix).unwrap();
        assert_eq!(outcome.labels, vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(outcome.merges, 1);
    }

    #[test]
    fn test_tie_breaks_on_lowest_id() {
        // Cluster 5 is equidistant from clusters 1 and 3.
        let matrix = line(&[-1.0, -1.0, 1.0, 1.0, 0.0]);
        let labels = vec![3, 3, 1, 1, 5];
        let outcome = GroupRepairer::new(2).unwrap().repair(&labels, &matrix).unwrap();
        assert_eq!(outcome.labels[4], 1);
    }

    #[test]
    fn test_collapses_to_single_cluster_when_batch_too_small() {
        let matrix = line(&[0.0, 1.0, 2.0]);
        let labels = vec![0, 1, 2];
        let outcome = GroupRepairer::new(6).unwrap().repair(&labels, &matrix).unwrap();
        assert_eq!(outcome.cluster_count(), 1);
        assert_eq!(outcome.merges, 2);
    }

    #[test]
    fn test_overflowing_distances_still_merge() {
        let matrix = line(&[1e200, 1e200, -1e200]);
        let outcome = GroupRepairer::new(2).unwrap().repair(&[0, 0, 1], &matrix).unwrap();
        assert_eq!(outcome.labels, vec![0, 0, 0]);
        assert_eq!(outcome.merges, 1);
    }

    #[test]
    fn test_length_mismatch() {
        let matrix = line(&[0.0, 1.0]);
        assert!(matches!(
            GroupRepairer::new(1).unwrap().repair(&[0], &matrix),
            Err(ClusterError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    proptest! {
        #[test]
        fn prop_every_cluster_reaches_k(
            values in prop::collection::vec(-50.0f64..50.0, 1..60),
            raw_labels in prop::collection::vec(0usize..12, 60),
            k in 1usize..8,
        ) {
            let matrix = line(&values);
            let labels: Vec<usize> = raw_labels[..values.len()].to_vec();
            let initial = cluster_sizes(&labels).len();
            let outcome = GroupRepairer::new(k).unwrap().repair(&labels, &matrix).unwrap();
            let sizes = cluster_sizes(&outcome.labels);

            prop_assert!(sizes.values().all(|&s| s > 0));
            if values.len() >= k {
                prop_assert!(sizes.values().all(|&s| s >= k));
            } else {
                prop_assert_eq!(sizes.len(), 1);
            }
            prop_assert_eq!(outcome.merges, initial - sizes.len());
        }
    }
}
