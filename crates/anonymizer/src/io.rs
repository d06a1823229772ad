//! JSON batch files
//!
//! Input is a JSON array of objects, one per record. A column is present only
//! if every object carries it, so a key missing from any row surfaces as a
//! missing column during validation.

use crate::AnonymizerError;
use record_validator::{RecordTable, REQUIRED_COLUMNS};
use serde_json::{Map, Value};
use std::io::{Read, Write};
use synthesizer::AnonymizedRecord;
use tracing::debug;

/// Read a record table from a JSON array of objects
pub fn read_table<R: Read>(reader: R) -> Result<RecordTable, AnonymizerError> {
    let value: Value = serde_json::from_reader(reader)?;
    let Value::Array(items) = value else {
        return Err(AnonymizerError::Format("expected a JSON array of records".to_string()));
    };

    let objects = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(AnonymizerError::Format(format!(
                "record {i} is not an object: {other}"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let columns: Vec<String> = match objects.first() {
        Some(first) => first
            .keys()
            .filter(|key| objects.iter().all(|o| o.contains_key(*key)))
            .cloned()
            .collect(),
        // No rows to infer keys from; let the empty batch reach the pipeline.
        None => REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
    };

    let rows = objects
        .iter()
        .map(|object| columns.iter().map(|c| cell(object, c)).collect())
        .collect();

    debug!("Read {} rows with columns {:?}", objects.len(), columns);
    Ok(RecordTable::new(columns, rows))
}

fn cell(object: &Map<String, Value>, column: &str) -> String {
    match object.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Write released records as a pretty-printed JSON array and flush
pub fn write_records<W: Write>(mut writer: W, records: &[AnonymizedRecord]) -> Result<(), AnonymizerError> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}
