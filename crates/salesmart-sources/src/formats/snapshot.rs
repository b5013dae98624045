use std::fs;
use std::path::Path;

use polars::prelude::{DataFrame, PolarsResult};
use serde_json::{Map, Value};

use crate::cells::{CellValue, RecordTable};
use crate::errors::SourceError;

/// One record object taken from a keyed snapshot file.
pub type SnapshotRecord = Map<String, Value>;

/// Reads a JSON object of `{snapshot_key: {..record..}}` and returns the record
/// objects in the order they are written. The snapshot keys are discarded.
pub fn read_snapshot(path: &Path) -> Result<Vec<SnapshotRecord>, SourceError> {
    let content = fs::read_to_string(path)?;
    let Value::Object(entries) = serde_json::from_str::<Value>(&content)? else {
        return Err(SourceError::NotAnObject {
            path: path.to_path_buf(),
        });
    };

    let mut records = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        match value {
            Value::Object(record) => records.push(record),
            _ => {
                return Err(SourceError::RecordNotAnObject {
                    path: path.to_path_buf(),
                    key,
                })
            }
        }
    }
    Ok(records)
}

/// Builds one frame from records gathered across snapshot files, typing each
/// column over every record.
pub fn snapshot_frame(records: &[SnapshotRecord]) -> PolarsResult<DataFrame> {
    let mut table = RecordTable::new();
    for record in records {
        table.push_row(
            record
                .iter()
                .map(|(key, value)| (key.as_str(), json_cell(value))),
        );
    }
    table.into_frame()
}

fn json_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => n.as_f64().map(CellValue::from_f64).unwrap_or(CellValue::Null),
        },
        Value::String(s) => CellValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => CellValue::Text(value.to_string()),
    }
}
