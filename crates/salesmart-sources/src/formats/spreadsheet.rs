use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::DataFrame;

use crate::cells::{CellValue, RecordTable};
use crate::errors::SourceError;

/// Reads the first worksheet of a workbook. The first row is the header; fully
/// blank rows are skipped.
pub fn read_workbook(path: &Path) -> Result<DataFrame, SourceError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SourceError::EmptyWorkbook {
            path: path.to_path_buf(),
        })??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };

    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| header_name(idx, cell))
        .collect();

    let mut table = RecordTable::with_columns(&names);
    for row in rows {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        table.push_row(
            names
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name.as_str(), cell_value(cell))),
        );
    }

    Ok(table.into_frame()?)
}

pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::from_f64(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::Text(naive.to_string()),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn header_name(idx: usize, cell: &Data) -> String {
    match cell_value(cell) {
        CellValue::Null => format!("column_{idx}"),
        CellValue::Text(s) => s.trim().to_string(),
        CellValue::Int(i) => i.to_string(),
        CellValue::Float(f) => f.to_string(),
        CellValue::Bool(b) => b.to_string(),
    }
}
