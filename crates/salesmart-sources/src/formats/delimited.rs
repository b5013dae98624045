use std::path::Path;

use polars::prelude::*;

use crate::errors::SourceError;

/// Reads a headered comma-separated file, letting polars infer column types.
pub fn read_delimited(path: &Path) -> Result<DataFrame, SourceError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}
