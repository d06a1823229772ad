//! Synthetic Record Generation
//!
//! Draw order is fixed for reproducibility: clusters in ascending id, records
//! in generation order, and per record age, date, sex, site, vaccination,
//! then the pseudonym.

use crate::names::random_pseudonym;
use crate::statistics::ClusterStatistics;
use crate::SynthesisError;
use chrono::{NaiveDate, TimeDelta};
use cluster_engine::group_members;
use rand::distr::Bernoulli;
use rand::seq::IndexedRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use record_validator::{Record, DATE_SENTINEL};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Synthesis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Emit two synthetic records per real member instead of one.
    /// Not read from configuration files; the pipeline sets it from its own
    /// top-level flag.
    #[serde(skip_deserializing, default = "default_generate_extra")]
    pub generate_extra: bool,
    /// Standard deviation of the age draw (years)
    pub age_std_dev: f64,
    /// Standard deviation of the day-offset draw (days)
    pub date_std_dev: f64,
}

fn default_generate_extra() -> bool {
    true
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            generate_extra: default_generate_extra(),
            age_std_dev: 2.5,
            date_std_dev: 3.0,
        }
    }
}

impl SynthesisConfig {
    /// Reject non-positive or non-finite spreads
    pub fn validate(&self) -> Result<(), SynthesisError> {
        for (name, value) in [("age_std_dev", self.age_std_dev), ("date_std_dev", self.date_std_dev)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SynthesisError::InvalidDistribution(format!(
                    "{name} must be finite and > 0, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Synthetic records emitted for a cluster of `size` members
    pub fn output_count(&self, size: usize) -> usize {
        if self.generate_extra {
            size * 2
        } else {
            size
        }
    }
}

/// Released synthetic record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymizedRecord {
    pub pseudonym: String,
    pub age: u32,
    pub sex: String,
    pub vaccination_status: bool,
    #[serde(with = "iso_date_or_empty")]
    pub vaccination_date: Option<NaiveDate>,
    pub vaccination_site: String,
}

mod iso_date_or_empty {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

/// Synthetic output of one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticCluster {
    /// Final cluster id
    pub cluster_id: usize,
    /// Aggregates the records were drawn from
    pub statistics: ClusterStatistics,
    /// Generated records, in generation order
    pub records: Vec<AnonymizedRecord>,
}

/// Draws synthetic records from per-cluster statistics
#[derive(Debug, Clone, Default)]
pub struct ClusterSynthesizer {
    config: SynthesisConfig,
}

impl ClusterSynthesizer {
    /// Create a synthesizer
    pub fn new(config: SynthesisConfig) -> Result<Self, SynthesisError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Synthesize every cluster and flatten the result in cluster order
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        records: &[Record],
        labels: &[usize],
        min_date: Option<NaiveDate>,
        rng: &mut R,
    ) -> Result<Vec<AnonymizedRecord>, SynthesisError> {
        Ok(self
            .synthesize_clusters(records, labels, min_date, rng)?
            .into_iter()
            .flat_map(|c| c.records)
            .collect())
    }

    /// Synthesize each cluster, keeping the per-cluster grouping
    pub fn synthesize_clusters<R: Rng + ?Sized>(
        &self,
        records: &[Record],
        labels: &[usize],
        min_date: Option<NaiveDate>,
        rng: &mut R,
    ) -> Result<Vec<SyntheticCluster>, SynthesisError> {
        if records.len() != labels.len() {
            return Err(SynthesisError::LabelMismatch {
                records: records.len(),
                labels: labels.len(),
            });
        }

        let mut clusters = Vec::new();
        for (cluster_id, members) in group_members(labels) {
            let statistics = ClusterStatistics::compute(records, &members, min_date);
            let generated = self.synthesize_cluster(&statistics, min_date, rng)?;
            debug!(
                "Cluster {}: {} members -> {} synthetic records (mean age {}, mean offset {:?})",
                cluster_id,
                statistics.size,
                generated.len(),
                statistics.mean_age,
                statistics.mean_day_offset
            );
            clusters.push(SyntheticCluster {
                cluster_id,
                statistics,
                records: generated,
            });
        }

        let total: usize = clusters.iter().map(|c| c.records.len()).sum();
        info!("Synthesized {} records from {} clusters", total, clusters.len());
        Ok(clusters)
    }

    fn synthesize_cluster<R: Rng + ?Sized>(
        &self,
        stats: &ClusterStatistics,
        min_date: Option<NaiveDate>,
        rng: &mut R,
    ) -> Result<Vec<AnonymizedRecord>, SynthesisError> {
        let age_dist = Normal::new(f64::from(stats.mean_age), self.config.age_std_dev)
            .map_err(|e| SynthesisError::InvalidDistribution(e.to_string()))?;
        // Undated clusters draw around the sentinel and discard the offset.
        let dated = stats.mean_day_offset.zip(min_date);
        let mean_offset = dated.map_or(DATE_SENTINEL, |(mean, _)| mean);
        let date_dist = Normal::new(mean_offset as f64, self.config.date_std_dev)
            .map_err(|e| SynthesisError::InvalidDistribution(e.to_string()))?;
        let vaccination = Bernoulli::new(stats.vaccinated_fraction())
            .map_err(|e| SynthesisError::InvalidDistribution(e.to_string()))?;

        let count = self.config.output_count(stats.size);
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let age = age_dist.sample(rng).max(0.0).round() as u32;

            let offset = date_dist.sample(rng).max(DATE_SENTINEL as f64).round() as i64;
            let vaccination_date = match dated {
                Some((_, origin)) => Some(shift_date(origin, offset)?),
                None => None,
            };

            let sex = pick(&stats.sexes, rng);
            let vaccination_site = pick(&stats.sites, rng);
            let vaccination_status = vaccination.sample(rng);

            out.push(AnonymizedRecord {
                pseudonym: random_pseudonym(rng),
                age,
                sex,
                vaccination_status,
                vaccination_date,
                vaccination_site,
            });
        }

        Ok(out)
    }
}

fn pick<R: Rng + ?Sized>(values: &[String], rng: &mut R) -> String {
    values.choose(rng).cloned().unwrap_or_default()
}

fn shift_date(origin: NaiveDate, offset: i64) -> Result<NaiveDate, SynthesisError> {
    TimeDelta::try_days(offset)
        .and_then(|delta| origin.checked_add_signed(delta))
        .ok_or(SynthesisError::DateOutOfRange(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn record(age: u32, sex: &str, vaccinated: bool, date: Option<NaiveDate>, site: &str) -> Record {
        Record {
            name: "real name".to_string(),
            age,
            sex: sex.to_string(),
            vaccinated,
            vaccination_date: date,
            vaccination_site: site.to_string(),
        }
    }

    fn feb(day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2021, 2, day)
    }

    fn batch() -> (Vec<Record>, Vec<usize>) {
        let records = vec![
            record(25, "F", true, feb(16), "UBS Centro"),
            record(27, "F", true, feb(10), "UBS Centro"),
            record(23, "F", true, feb(20), "UBS Sul"),
            record(70, "M", false, None, "UBS Norte"),
            record(72, "M", false, None, "UBS Norte"),
            record(68, "F", false, None, "UBS Leste"),
        ];
        (records, vec![4, 4, 4, 9, 9, 9])
    }

    #[test]
    fn test_output_count_follows_multiplier() {
        let (records, labels) = batch();
        let mut rng = StdRng::seed_from_u64(42);
        let doubled = ClusterSynthesizer::default()
            .synthesize(&records, &labels, feb(10), &mut rng)
            .unwrap();
        assert_eq!(doubled.len(), 12);

        let single = ClusterSynthesizer::new(SynthesisConfig {
            generate_extra: false,
            ..Default::default()
        })
        .unwrap()
        .synthesize(&records, &labels, feb(10), &mut rng)
        .unwrap();
        assert_eq!(single.len(), 6);
    }

    #[test]
    fn test_categorical_containment_and_dates() {
        let (records, labels) = batch();
        let mut rng = StdRng::seed_from_u64(7);
        let clusters = ClusterSynthesizer::default()
            .synthesize_clusters(&records, &labels, feb(10), &mut rng)
            .unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].cluster_id, 4);
        assert_eq!(clusters[1].cluster_id, 9);

        for cluster in &clusters {
            let sexes: BTreeSet<&str> = cluster.statistics.sexes.iter().map(String::as_str).collect();
            let sites: BTreeSet<&str> = cluster.statistics.sites.iter().map(String::as_str).collect();
            for rec in &cluster.records {
                assert!(sexes.contains(rec.sex.as_str()));
                assert!(sites.contains(rec.vaccination_site.as_str()));
                assert!(!rec.pseudonym.contains("real name"));
            }
        }

        // Dated cluster: all members in February, mean offset 5 days from Feb 10.
        assert!(clusters[0].records.iter().all(|r| r.vaccination_date.is_some()));
        // Undated cluster: every date empty.
        assert!(clusters[1].records.iter().all(|r| r.vaccination_date.is_none()));
        assert!(clusters[1].records.iter().all(|r| !r.vaccination_status));
        assert!(clusters[0].records.iter().all(|r| r.vaccination_status));
    }

    #[test]
    fn test_seeded_output_is_reproducible() {
        let (records, labels) = batch();
        let synth = ClusterSynthesizer::default();
        let a = synth
            .synthesize(&records, &labels, feb(10), &mut StdRng::seed_from_u64(3))
            .unwrap();
        let b = synth
            .synthesize(&records, &labels, feb(10), &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_undated_cluster_keeps_draw_order() {
        let dated: Vec<Record> = [feb(3), feb(9), feb(12)]
            .into_iter()
            .map(|d| record(40, "F", true, d, "UBS Sul"))
            .collect();
        let undated: Vec<Record> = dated
            .iter()
            .map(|r| Record {
                vaccination_date: None,
                ..r.clone()
            })
            .collect();
        let labels = vec![0; 3];
        let synth = ClusterSynthesizer::default();
        let a = synth
            .synthesize(&dated, &labels, feb(3), &mut StdRng::seed_from_u64(5))
            .unwrap();
        let b = synth
            .synthesize(&undated, &labels, feb(3), &mut StdRng::seed_from_u64(5))
            .unwrap();

        assert!(b.iter().all(|r| r.vaccination_date.is_none()));
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.age, y.age);
            assert_eq!(x.pseudonym, y.pseudonym);
            assert_eq!(x.vaccination_status, y.vaccination_status);
        }
    }

    #[test]
    fn test_label_mismatch() {
        let (records, _) = batch();
        let err = ClusterSynthesizer::default()
            .synthesize(&records, &[0, 0], feb(1), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(err, SynthesisError::LabelMismatch { records: 6, labels: 2 });
    }

    #[test]
    fn test_invalid_spread_rejected() {
        let config = SynthesisConfig {
            age_std_dev: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            ClusterSynthesizer::new(config),
            Err(SynthesisError::InvalidDistribution(_))
        ));
    }

    #[test]
    fn test_serialized_dates() {
        let rec = AnonymizedRecord {
            pseudonym: "Ana Silva".to_string(),
            age: 30,
            sex: "F".to_string(),
            vaccination_status: true,
            vaccination_date: None,
            vaccination_site: "UBS Sul".to_string(),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["vaccination_date"], "");

        let dated = AnonymizedRecord {
            vaccination_date: feb(16),
            ..rec
        };
        let json = serde_json::to_string(&dated).unwrap();
        assert!(json.contains("\"2021-02-16\""));
        let back: AnonymizedRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dated);
    }

    #[test]
    fn test_zero_age_cluster_dates_stay_above_floor() {
        let records = vec![record(0, "F", true, feb(1), "A"); 4];
        let labels = vec![0; 4];
        let out = ClusterSynthesizer::default()
            .synthesize(&records, &labels, feb(1), &mut StdRng::seed_from_u64(11))
            .unwrap();
        // Offset floor is the sentinel, so the earliest synthetic date is one day before origin.
        let floor = feb(1).unwrap().pred_opt();
        assert!(out.iter().all(|r| r.vaccination_date >= floor));
        assert_eq!(out.len(), 8);
    }
}
