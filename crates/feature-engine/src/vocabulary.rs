//! Categorical Vocabularies

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sorted set of category values observed in one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    categories: Vec<String>,
}

impl CategoryVocabulary {
    /// Collect the distinct values, in lexicographic order
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unique: BTreeSet<&str> = values.into_iter().collect();
        Self {
            categories: unique.into_iter().map(str::to_string).collect(),
        }
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether no category was observed
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Column offset of a category within the block
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// Categories in column order
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Write the weighted one-hot block for `value` into `out`.
    ///
    /// The block weight is split evenly across its columns. Values outside
    /// the vocabulary leave the block all zero.
    pub fn encode_into(&self, value: &str, block_weight: f64, out: &mut [f64]) {
        out.iter_mut().for_each(|v| *v = 0.0);
        if self.categories.is_empty() {
            return;
        }
        if let Some(idx) = self.index_of(value) {
            out[idx] = block_weight / self.categories.len() as f64;
        }
    }
}
