use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from statistics flattening.
#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    #[error("statistics record has no fields")]
    EmptyRecord,

    #[error("no statistics records to flatten")]
    EmptyInput,
}

/// One element of a statistics response, as decoded from the wire: field
/// name to either a scalar or a list of breakdown sub-records.
pub type RawStatRecord = Map<String, Value>;

/// One flattened row: column name to scalar value.
pub type FlatStatRow = Map<String, Value>;

/// Flattened statistics materialized as a single table.
///
/// Columns are fixed from the first row. Later rows are appended as-is
/// even when their key sets differ; no column reconciliation happens.
#[derive(Debug, Clone)]
pub struct StatTable {
    pub columns: Vec<String>,
    pub rows: Vec<FlatStatRow>,
}

/// Flattens one record: scalar fields are copied verbatim, breakdown
/// lists (arrays whose elements are all objects) are merged positionally.
pub fn flatten_record(record: &RawStatRecord) -> Result<FlatStatRow, StatsError> {
    if record.is_empty() {
        return Err(StatsError::EmptyRecord);
    }

    let mut row = FlatStatRow::new();
    for (field, value) in record {
        match value {
            Value::Array(subs) if subs.iter().all(Value::is_object) => {
                merge_breakdown(subs, &mut row);
            }
            other => {
                row.insert(field.clone(), other.clone());
            }
        }
    }
    Ok(row)
}

/// Applies [`flatten_record`] to each record, preserving input order.
pub fn flatten_all(records: &[RawStatRecord]) -> Result<Vec<FlatStatRow>, StatsError> {
    if records.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    records.iter().map(flatten_record).collect()
}

/// Flattens all records and fixes the column list from the first row.
pub fn to_table(records: &[RawStatRecord]) -> Result<StatTable, StatsError> {
    let rows = flatten_all(records)?;
    let columns = rows[0].keys().cloned().collect();
    Ok(StatTable { columns, rows })
}

/// Walks the breakdown sub-records' entry values in document order across
/// the whole list and pairs them up: the first value of each pair names
/// the output column, the second becomes the cell value. The merge is
/// positional, not name-based, and assumes the upstream
/// `{dimension, metric}` entry order. A trailing unpaired value is
/// dropped.
fn merge_breakdown(subs: &[Value], row: &mut FlatStatRow) {
    let values: Vec<&Value> = subs
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|sub| sub.values())
        .collect();

    for pair in values.chunks_exact(2) {
        row.insert(column_name(pair[0]), pair[1].clone());
    }
}

fn column_name(value: &Value) -> String {
    match value {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}
