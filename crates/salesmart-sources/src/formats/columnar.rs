use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::errors::SourceError;

pub fn read_parquet(path: &Path) -> Result<DataFrame, SourceError> {
    let file = File::open(path)?;
    let df = ParquetReader::new(file).finish()?;
    Ok(df)
}
