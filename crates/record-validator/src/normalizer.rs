//! Batch Standardization

use serde::{Deserialize, Serialize};

/// Spread below which a column is treated as constant
const MIN_SPREAD: f64 = 1e-12;

/// Z-score column scaler fitted once over a whole batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    /// Batch mean
    mean: f64,
    /// Batch population standard deviation
    std_dev: f64,
}

impl Standardizer {
    /// Fit over `values`.
    ///
    /// An empty slice yields an identity scaler (mean 0, unit spread).
    pub fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 1.0,
            };
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

        Self {
            mean,
            std_dev: variance.sqrt(),
        }
    }

    /// Scale a single value.
    ///
    /// Constant columns scale by 1, so every batch value maps to 0.
    pub fn transform(&self, value: f64) -> f64 {
        let scale = if self.std_dev < MIN_SPREAD { 1.0 } else { self.std_dev };
        (value - self.mean) / scale
    }

    /// Get fitted mean
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Get fitted standard deviation
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }
}
