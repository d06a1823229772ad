//! Record Validation and Normalization
//!
//! Provides the input boundary of the anonymization pipeline: required column
//! checks, field coercion for vaccination records, and batch z-score
//! standardization.

mod error;
mod normalizer;
mod record;
mod validator;

pub use error::ValidationError;
pub use normalizer::Standardizer;
pub use record::{Record, RecordTable, DATE_SENTINEL};
pub use validator::{parse_date, parse_vaccination_status, RecordValidator, REQUIRED_COLUMNS};
