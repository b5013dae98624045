use std::collections::HashMap;

use polars::prelude::*;

/// A single untyped cell read from a spreadsheet or JSON snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Integral floats collapse to `Int` so `1.0` from a workbook joins with `1` from parquet.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite()
            && value.fract() == 0.0
            && value >= i64::MIN as f64
            && value <= i64::MAX as f64
        {
            CellValue::Int(value as i64)
        } else {
            CellValue::Float(value)
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Int(i) => Some(i.to_string()),
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::Text(s) => Some(s.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Empty,
    Bool,
    Int,
    Float,
    Text,
}

impl ColumnKind {
    fn widen(self, value: &CellValue) -> Self {
        use ColumnKind::*;
        match (self, value) {
            (kind, CellValue::Null) => kind,
            (Empty | Bool, CellValue::Bool(_)) => Bool,
            (Empty | Int, CellValue::Int(_)) => Int,
            (Empty | Int | Float, CellValue::Float(_)) => Float,
            (Float, CellValue::Int(_)) => Float,
            _ => Text,
        }
    }
}

/// Row-oriented accumulator that becomes a typed `DataFrame`.
///
/// Columns appear in order of first sighting; rows missing a column hold null.
#[derive(Debug, Default)]
pub struct RecordTable {
    names: Vec<String>,
    index: HashMap<String, usize>,
    columns: Vec<Vec<CellValue>>,
    rows: usize,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a table whose header is known up front, so the columns exist even with no rows.
    pub fn with_columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for name in names {
            table.column_index(name.as_ref());
        }
        table
    }

    pub fn push_row<I, K>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (K, CellValue)>,
        K: AsRef<str>,
    {
        for column in &mut self.columns {
            column.push(CellValue::Null);
        }
        let row = self.rows;
        self.rows += 1;

        for (name, value) in cells {
            let idx = self.column_index(name.as_ref());
            self.columns[idx][row] = value;
        }
    }

    pub fn into_frame(self) -> PolarsResult<DataFrame> {
        let height = self.rows;
        let columns: Vec<Column> = self
            .names
            .into_iter()
            .zip(self.columns)
            .map(|(name, values)| build_column(name, values, height))
            .collect();
        DataFrame::new(columns)
    }

    fn column_index(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.columns.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        self.columns.push(vec![CellValue::Null; self.rows]);
        idx
    }
}

fn build_column(name: String, values: Vec<CellValue>, height: usize) -> Column {
    let kind = values
        .iter()
        .fold(ColumnKind::Empty, |kind, value| kind.widen(value));

    match kind {
        ColumnKind::Empty => Series::full_null(name.into(), height, &DataType::String).into(),
        ColumnKind::Bool => {
            let data: Vec<Option<bool>> = values
                .iter()
                .map(|value| match value {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), data)
        }
        ColumnKind::Int => {
            let data: Vec<Option<i64>> = values
                .iter()
                .map(|value| match value {
                    CellValue::Int(i) => Some(*i),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), data)
        }
        ColumnKind::Float => {
            let data: Vec<Option<f64>> = values
                .iter()
                .map(|value| match value {
                    CellValue::Int(i) => Some(*i as f64),
                    CellValue::Float(f) => Some(*f),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), data)
        }
        ColumnKind::Text => {
            let data: Vec<Option<String>> = values.iter().map(CellValue::as_text).collect();
            Column::new(name.into(), data)
        }
    }
}
