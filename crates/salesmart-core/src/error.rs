use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::report::SourceKind;
use crate::schema::Dataset;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("{dataset} record set is missing required column '{column}'")]
    MissingColumn {
        dataset: Dataset,
        column: &'static str,
    },

    #[error("failed to read {origin} file {}: {message}", path.display())]
    SourceRead {
        origin: SourceKind,
        path: PathBuf,
        message: String,
    },

    #[error("invalid source pattern {pattern}: {message}")]
    Pattern { pattern: String, message: String },

    #[error("another run holds the lock at {}", path.display())]
    RunInProgress { path: PathBuf },

    #[error("pipeline run aborted: {0}")]
    RunAborted(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, EtlError>;
