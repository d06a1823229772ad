//! Anonymization pipeline
//!
//! encode -> cluster -> repair -> synthesize, over one in-memory batch. Every
//! random draw comes from a single generator seeded once per run.

use crate::audit::ProfileAudit;
use crate::config::AnonymizerConfig;
use crate::AnonymizerError;
use cluster_engine::{cluster_sizes, target_cluster_count, ClusterError, Clusterer, GroupRepairer};
use feature_engine::FeatureEncoder;
use metrics::counter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use record_validator::{Record, RecordTable, RecordValidator};
use serde::{Deserialize, Serialize};
use synthesizer::{AnonymizedRecord, ClusterSynthesizer};
use tracing::info;

/// Summary of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymizationReport {
    /// Records in the input batch
    pub input_records: usize,
    /// Clusters requested from k-means
    pub target_clusters: usize,
    /// Distinct clusters before repair
    pub initial_clusters: usize,
    /// Clusters absorbed by repair
    pub merges: usize,
    /// `(cluster id, size)` after repair, ascending id
    pub cluster_sizes: Vec<(usize, usize)>,
    /// Synthetic records released
    pub synthetic_records: usize,
    /// Profile audit, when a profile is configured
    pub audit: Option<ProfileAudit>,
}

/// Released records plus the run summary
#[derive(Debug, Clone, PartialEq)]
pub struct AnonymizationOutput {
    pub records: Vec<AnonymizedRecord>,
    /// Final cluster id per input record
    pub labels: Vec<usize>,
    pub report: AnonymizationReport,
}

/// The anonymization pipeline
#[derive(Debug, Clone)]
pub struct Anonymizer {
    config: AnonymizerConfig,
    validator: RecordValidator,
    encoder: FeatureEncoder,
    clusterer: Clusterer,
    repairer: GroupRepairer,
    synthesizer: ClusterSynthesizer,
}

impl Anonymizer {
    /// Build every stage from the configuration
    pub fn new(config: AnonymizerConfig) -> Result<Self, AnonymizerError> {
        config.validate()?;
        Ok(Self {
            validator: RecordValidator::new(),
            encoder: FeatureEncoder::new(config.weights)?,
            clusterer: Clusterer::new(config.k, config.clustering.clone())?,
            repairer: GroupRepairer::new(config.k)?,
            synthesizer: ClusterSynthesizer::new(config.synthesis_config())?,
            config,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &AnonymizerConfig {
        &self.config
    }

    /// Validate a raw table, then anonymize it
    pub fn run_table(&self, table: &RecordTable) -> Result<AnonymizationOutput, AnonymizerError> {
        let records = self.validator.parse_table(table)?;
        self.run(&records)
    }

    /// Anonymize a batch with a generator seeded from the configuration
    pub fn run(&self, records: &[Record]) -> Result<AnonymizationOutput, AnonymizerError> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.run_with_rng(records, &mut rng)
    }

    /// Anonymize a batch drawing from `rng`.
    ///
    /// An empty batch is rejected; there is no cluster count for zero records.
    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        records: &[Record],
        rng: &mut R,
    ) -> Result<AnonymizationOutput, AnonymizerError> {
        if records.is_empty() {
            return Err(ClusterError::EmptyBatch.into());
        }
        counter!("anonymizer.records.input").increment(records.len() as u64);
        info!(
            "Anonymizing {} records with k={} (seed {})",
            records.len(),
            self.config.k,
            self.config.seed
        );

        let (matrix, meta) = self.encoder.encode(records)?;
        let target_clusters = target_cluster_count(records.len(), self.config.k);

        let initial = self.clusterer.cluster(&matrix, rng)?;
        let initial_clusters = cluster_sizes(&initial).len();

        let repaired = self.repairer.repair(&initial, &matrix)?;
        counter!("anonymizer.repair.merges").increment(repaired.merges as u64);
        let sizes: Vec<(usize, usize)> = cluster_sizes(&repaired.labels).into_iter().collect();
        info!(
            "Repair: {} -> {} clusters ({} merges), sizes {:?}",
            initial_clusters,
            sizes.len(),
            repaired.merges,
            sizes.iter().map(|(_, s)| *s).collect::<Vec<_>>()
        );

        let synthetic = self
            .synthesizer
            .synthesize(records, &repaired.labels, meta.min_date, rng)?;
        counter!("anonymizer.records.synthetic").increment(synthetic.len() as u64);

        let audit = self
            .config
            .audit_profile
            .as_ref()
            .map(|criteria| ProfileAudit::run(criteria, records, &synthetic));

        let report = AnonymizationReport {
            input_records: records.len(),
            target_clusters,
            initial_clusters,
            merges: repaired.merges,
            cluster_sizes: sizes,
            synthetic_records: synthetic.len(),
            audit,
        };

        Ok(AnonymizationOutput {
            records: synthetic,
            labels: repaired.labels,
            report,
        })
    }
}
