//! Feature Matrix Assembly

use crate::vocabulary::CategoryVocabulary;
use crate::EncodingError;
use chrono::NaiveDate;
use record_validator::{Record, Standardizer};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::debug;

/// Number of standardized numeric columns (age, vaccination, date)
pub const NUMERIC_DIMENSION: usize = 3;

/// Per-field distance weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    pub age: f64,
    pub sex: f64,
    pub vaccination: f64,
    pub date: f64,
    pub site: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            age: 1.0,
            sex: 0.8,
            vaccination: 0.5,
            date: 0.7,
            site: 0.9,
        }
    }
}

impl FeatureWeights {
    /// Reject negative or non-finite weights
    pub fn validate(&self) -> Result<(), EncodingError> {
        let fields = [
            ("age", self.age),
            ("sex", self.sex),
            ("vaccination", self.vaccination),
            ("date", self.date),
            ("site", self.site),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(EncodingError::InvalidWeight { field, value });
            }
        }
        Ok(())
    }
}

/// Column ranges of each semantic field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    pub age: Range<usize>,
    pub vaccination: Range<usize>,
    pub date: Range<usize>,
    pub sex: Range<usize>,
    pub site: Range<usize>,
}

impl FieldLayout {
    fn new(sex_len: usize, site_len: usize) -> Self {
        let sex_start = NUMERIC_DIMENSION;
        let site_start = sex_start + sex_len;
        Self {
            age: 0..1,
            vaccination: 1..2,
            date: 2..3,
            sex: sex_start..site_start,
            site: site_start..site_start + site_len,
        }
    }

    /// Total number of columns
    pub fn dimension(&self) -> usize {
        self.site.end
    }
}

/// Dense row-major feature matrix, one row per record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    rows: Vec<Vec<f64>>,
    dimension: usize,
}

impl FeatureMatrix {
    /// Build a matrix from rows; all rows must share `dimension`
    pub fn from_rows(rows: Vec<Vec<f64>>, dimension: usize) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == dimension));
        Self { rows, dimension }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Row `i`
    pub fn row(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }

    /// All rows
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }
}

/// Everything fitted on a batch that is needed to encode records against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingMeta {
    /// Column ranges
    pub layout: FieldLayout,
    /// Weights in effect
    pub weights: FeatureWeights,
    /// Earliest valid vaccination date in the batch
    pub min_date: Option<NaiveDate>,
    /// Sex categories in column order
    pub sex: CategoryVocabulary,
    /// Site categories in column order
    pub site: CategoryVocabulary,
    age_scaler: Standardizer,
    vaccination_scaler: Standardizer,
    date_scaler: Standardizer,
}

impl EncodingMeta {
    /// Feature dimensionality
    pub fn dimension(&self) -> usize {
        self.layout.dimension()
    }

    /// Day offset of a record from the batch's earliest date, or the sentinel
    pub fn day_offset(&self, record: &Record) -> i64 {
        record.day_offset(self.min_date)
    }

    /// Encode one record against the fitted batch
    pub fn transform(&self, record: &Record) -> Vec<f64> {
        let mut row = vec![0.0; self.dimension()];
        let w = &self.weights;

        row[self.layout.age.start] = w.age * self.age_scaler.transform(f64::from(record.age));
        row[self.layout.vaccination.start] =
            w.vaccination * self.vaccination_scaler.transform(flag(record.vaccinated));
        row[self.layout.date.start] =
            w.date * self.date_scaler.transform(self.day_offset(record) as f64);

        self.sex
            .encode_into(&record.sex, w.sex, &mut row[self.layout.sex.clone()]);
        self.site
            .encode_into(&record.vaccination_site, w.site, &mut row[self.layout.site.clone()]);

        row
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Encoder turning record batches into weighted feature matrices
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    weights: FeatureWeights,
}

impl FeatureEncoder {
    /// Create an encoder with the given weights
    pub fn new(weights: FeatureWeights) -> Result<Self, EncodingError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    /// Weights in use
    pub fn weights(&self) -> &FeatureWeights {
        &self.weights
    }

    /// Fit scalers, vocabularies and the date origin over a batch
    pub fn fit(&self, records: &[Record]) -> Result<EncodingMeta, EncodingError> {
        if records.is_empty() {
            return Err(EncodingError::EmptyBatch);
        }

        let min_date = records.iter().filter_map(|r| r.vaccination_date).min();

        let ages: Vec<f64> = records.iter().map(|r| f64::from(r.age)).collect();
        let flags: Vec<f64> = records.iter().map(|r| flag(r.vaccinated)).collect();
        // Sentinel rows take part in the date column's statistics as -1.
        let offsets: Vec<f64> = records
            .iter()
            .map(|r| r.day_offset(min_date) as f64)
            .collect();

        let sex = CategoryVocabulary::fit(records.iter().map(|r| r.sex.as_str()));
        let site = CategoryVocabulary::fit(records.iter().map(|r| r.vaccination_site.as_str()));
        let layout = FieldLayout::new(sex.len(), site.len());

        debug!(
            "Fitted encoder: {} records, {} sex categories, {} sites, min date {:?}",
            records.len(),
            sex.len(),
            site.len(),
            min_date
        );

        Ok(EncodingMeta {
            layout,
            weights: self.weights,
            min_date,
            sex,
            site,
            age_scaler: Standardizer::fit(&ages),
            vaccination_scaler: Standardizer::fit(&flags),
            date_scaler: Standardizer::fit(&offsets),
        })
    }

    /// Fit on the batch and encode every record of it
    pub fn encode(&self, records: &[Record]) -> Result<(FeatureMatrix, EncodingMeta), EncodingError> {
        let meta = self.fit(records)?;
        let rows = records.iter().map(|r| meta.transform(r)).collect();
        let matrix = FeatureMatrix::from_rows(rows, meta.dimension());
        Ok((matrix, meta))
    }
}
