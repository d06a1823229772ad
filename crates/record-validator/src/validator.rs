//! Record Validator for Column and Field Checks

use crate::error::ValidationError;
use crate::record::{Record, RecordTable};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

/// Columns every input batch must carry
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "name",
    "age",
    "sex",
    "vaccination_status",
    "vaccination_date",
    "vaccination_site",
];

/// Spellings that count as "vaccinated"
const VACCINATED_VALUES: [&str; 6] = ["sim", "s", "yes", "y", "true", "1"];

/// Coerce a vaccination status cell to a flag.
///
/// Anything not recognised as an affirmative answer, including an empty cell,
/// is treated as not vaccinated.
pub fn parse_vaccination_status(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    VACCINATED_VALUES.contains(&normalized.as_str())
}

/// Parse an ISO-8601 calendar date, optionally followed by a time component
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
}

/// Column positions resolved once per table
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    name: usize,
    age: usize,
    sex: usize,
    status: usize,
    date: usize,
    site: usize,
}

/// Validator turning raw tables into records
#[derive(Debug, Clone, Default)]
pub struct RecordValidator;

impl RecordValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Check that every required column is in the header
    pub fn validate_columns(&self, table: &RecordTable) -> Result<(), ValidationError> {
        for column in REQUIRED_COLUMNS {
            if table.column_index(column).is_none() {
                return Err(ValidationError::MissingColumn(column));
            }
        }
        Ok(())
    }

    /// Parse every row of a table.
    ///
    /// Columns are checked before any row is read, so a bad header never
    /// yields partial output.
    pub fn parse_table(&self, table: &RecordTable) -> Result<Vec<Record>, ValidationError> {
        self.validate_columns(table)?;
        let columns = Self::resolve(table)?;

        let records = table
            .rows
            .iter()
            .enumerate()
            .map(|(row, cells)| self.parse_row(row, cells, table.columns.len(), columns))
            .collect::<Result<Vec<_>, _>>()?;

        let missing_dates = records
            .iter()
            .filter(|r| r.vaccination_date.is_none())
            .count();
        if missing_dates > 0 {
            warn!(
                "{} of {} records have no usable vaccination date",
                missing_dates,
                records.len()
            );
        }
        debug!("Parsed {} records", records.len());

        Ok(records)
    }

    fn resolve(table: &RecordTable) -> Result<ColumnMap, ValidationError> {
        let index = |name: &'static str| {
            table
                .column_index(name)
                .ok_or(ValidationError::MissingColumn(name))
        };
        Ok(ColumnMap {
            name: index("name")?,
            age: index("age")?,
            sex: index("sex")?,
            status: index("vaccination_status")?,
            date: index("vaccination_date")?,
            site: index("vaccination_site")?,
        })
    }

    fn parse_row(
        &self,
        row: usize,
        cells: &[String],
        expected: usize,
        columns: ColumnMap,
    ) -> Result<Record, ValidationError> {
        if cells.len() < expected {
            return Err(ValidationError::RaggedRow {
                row,
                expected,
                actual: cells.len(),
            });
        }

        let age_cell = cells[columns.age].trim();
        if age_cell.is_empty() {
            return Err(ValidationError::MissingField { row, field: "age" });
        }
        let age = age_cell
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidAge {
                row,
                value: age_cell.to_string(),
            })?;

        let sex = Self::required(cells[columns.sex].as_str(), row, "sex")?;
        let site = Self::required(cells[columns.site].as_str(), row, "vaccination_site")?;

        Ok(Record {
            name: cells[columns.name].trim().to_string(),
            age,
            sex,
            vaccinated: parse_vaccination_status(&cells[columns.status]),
            vaccination_date: parse_date(&cells[columns.date]),
            vaccination_site: site,
        })
    }

    fn required(value: &str, row: usize, field: &'static str) -> Result<String, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            Err(ValidationError::MissingField { row, field })
        } else {
            Ok(value.to_string())
        }
    }
}
