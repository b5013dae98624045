use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("polars read failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("spreadsheet read failed: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("workbook {} has no worksheets", path.display())]
    EmptyWorkbook { path: PathBuf },

    #[error("snapshot {} is not a JSON object", path.display())]
    NotAnObject { path: PathBuf },

    #[error("snapshot {} entry {key:?} is not a JSON object", path.display())]
    RecordNotAnObject { path: PathBuf, key: String },
}
