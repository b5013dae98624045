use std::path::Path;

use polars::prelude::DataFrame;

use crate::errors::SourceError;
use crate::formats::{read_delimited, read_parquet, read_workbook};

/// A file format that yields one table per file.
pub trait TableReader {
    fn name(&self) -> &'static str;
    fn read(&self, path: &Path) -> Result<DataFrame, SourceError>;
}

pub struct ParquetTable;

impl TableReader for ParquetTable {
    fn name(&self) -> &'static str {
        "parquet"
    }

    fn read(&self, path: &Path) -> Result<DataFrame, SourceError> {
        read_parquet(path)
    }
}

pub struct DelimitedTable;

impl TableReader for DelimitedTable {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn read(&self, path: &Path) -> Result<DataFrame, SourceError> {
        read_delimited(path)
    }
}

pub struct WorkbookTable;

impl TableReader for WorkbookTable {
    fn name(&self) -> &'static str {
        "xlsx"
    }

    fn read(&self, path: &Path) -> Result<DataFrame, SourceError> {
        read_workbook(path)
    }
}
