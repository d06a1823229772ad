//! Vaccination Record Types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day offset used for records without a usable vaccination date
pub const DATE_SENTINEL: i64 = -1;

/// One subject's validated data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Real name (never released)
    pub name: String,
    /// Age in whole years
    pub age: u32,
    /// Sex category, free-form within a batch
    pub sex: String,
    /// Coerced vaccination status
    pub vaccinated: bool,
    /// Parsed vaccination date, `None` when empty or unparseable
    pub vaccination_date: Option<NaiveDate>,
    /// Vaccination site category
    pub vaccination_site: String,
}

impl Record {
    /// Days between the vaccination date and `origin`, or the sentinel
    pub fn day_offset(&self, origin: Option<NaiveDate>) -> i64 {
        match (self.vaccination_date, origin) {
            (Some(date), Some(origin)) => (date - origin).num_days(),
            _ => DATE_SENTINEL,
        }
    }
}

/// Header plus string cells, as handed over by the reading collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTable {
    /// Column names in cell order
    pub columns: Vec<String>,
    /// Row cells, one entry per column
    pub rows: Vec<Vec<String>>,
}

impl RecordTable {
    /// Create a table from a header and rows
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Position of a column in the header
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
