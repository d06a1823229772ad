//! Anonymizer configuration
//!
//! Layered with the `config` crate: an optional file, then environment
//! variables such as `ANONYMIZER__K=4` or `ANONYMIZER__WEIGHTS__AGE=2.0`.

use crate::audit::ProfileCriteria;
use crate::AnonymizerError;
use cluster_engine::KMeansConfig;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use feature_engine::FeatureWeights;
use serde::{Deserialize, Serialize};
use std::path::Path;
use synthesizer::SynthesisConfig;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ANONYMIZER";

/// Anonymizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonymizerConfig {
    /// Minimum anonymity group size
    pub k: usize,

    /// Per-field distance weights
    pub weights: FeatureWeights,

    /// Emit two synthetic records per real member
    pub generate_extra: bool,

    /// Seed of the run's random source
    pub seed: u64,

    /// K-means restarts and convergence
    pub clustering: KMeansConfig,

    /// Sampling spreads
    pub synthesis: SynthesisConfig,

    /// Profile to audit the release against
    pub audit_profile: Option<ProfileCriteria>,
}

impl Default for AnonymizerConfig {
    fn default() -> Self {
        Self {
            k: 6,
            weights: FeatureWeights::default(),
            generate_extra: true,
            seed: 42,
            clustering: KMeansConfig::default(),
            synthesis: SynthesisConfig::default(),
            audit_profile: None,
        }
    }
}

impl AnonymizerConfig {
    /// Load from an optional file, overridden by `ANONYMIZER__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self, AnonymizerError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        Self::build(builder.add_source(Self::environment()))
    }

    /// Parse a TOML document, without environment overrides
    pub fn from_toml(source: &str) -> Result<Self, AnonymizerError> {
        Self::build(Config::builder().add_source(File::from_str(source, FileFormat::Toml)))
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    fn build(
        builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, AnonymizerError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), AnonymizerError> {
        if self.k == 0 {
            return Err(AnonymizerError::Config(
                "k must be a positive integer".to_string(),
            ));
        }
        self.weights.validate()?;
        self.clustering.validate()?;
        self.synthesis_config().validate()?;
        Ok(())
    }

    /// Synthesis settings with the top-level multiplier flag applied
    pub fn synthesis_config(&self) -> SynthesisConfig {
        SynthesisConfig {
            generate_extra: self.generate_extra,
            ..self.synthesis.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnonymizerConfig::default();
        assert_eq!(config.k, 6);
        assert!(config.generate_extra);
        assert_eq!(config.weights.sex, 0.8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnonymizerConfig::from_toml(
            r#"
            k = 3
            generate_extra = false

            [weights]
            age = 2.0

            [audit_profile]
            age_min = 20
            age_max = 30
            sex = "F"
            "#,
        )
        .unwrap();
        assert_eq!(config.k, 3);
        assert!(!config.generate_extra);
        assert_eq!(config.weights.age, 2.0);
        assert_eq!(config.weights.site, 0.9);
        assert_eq!(config.seed, 42);
        assert_eq!(config.clustering.n_init, 10);
        assert!(!config.synthesis_config().generate_extra);
        let profile = config.audit_profile.as_ref().unwrap();
        assert_eq!(profile.sex.as_deref(), Some("F"));
        assert_eq!(profile.vaccination_month, None);
    }

    #[test]
    fn test_multiplier_only_set_at_top_level() {
        let config = AnonymizerConfig::from_toml(
            r#"
            [synthesis]
            generate_extra = false
            age_std_dev = 4.0
            "#,
        )
        .unwrap();
        assert!(config.generate_extra);
        assert!(config.synthesis_config().generate_extra);
        assert_eq!(config.synthesis.age_std_dev, 4.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            AnonymizerConfig::from_toml("k = 0"),
            Err(AnonymizerError::Config(_))
        ));
        assert!(matches!(
            AnonymizerConfig::from_toml("[weights]\ndate = -1.0"),
            Err(AnonymizerError::Encoding(_))
        ));
        assert!(matches!(
            AnonymizerConfig::from_toml("[synthesis]\ndate_std_dev = 0.0"),
            Err(AnonymizerError::Synthesis(_))
        ));
    }
}
