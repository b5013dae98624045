use std::fmt;
use std::path::{Path, PathBuf};

use salesmart_sources::{DateParseError, SourceError};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    PartitionedSales,
    DelimitedSales,
    StoreMaster,
    CashierSnapshot,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourceKind::PartitionedSales => "parquet sales",
            SourceKind::DelimitedSales => "csv sales",
            SourceKind::StoreMaster => "store master",
            SourceKind::CashierSnapshot => "cashier snapshot",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UndatedFile,
    ReadFailed,
}

/// A source file that was skipped without failing the run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceWarning {
    pub source: SourceKind,
    pub path: PathBuf,
    pub kind: WarningKind,
    pub message: String,
}

/// Per-run collector for recoverable problems. Each entry is also logged as it
/// is recorded.
#[derive(Debug, Default)]
pub struct RunReport {
    warnings: Vec<SourceWarning>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_undated(&mut self, source: SourceKind, path: &Path, err: &DateParseError) {
        warn!(
            %source,
            path = %path.display(),
            "Could not find Year, Month or Day in: {} ({err})",
            path.display()
        );
        self.warnings.push(SourceWarning {
            source,
            path: path.to_path_buf(),
            kind: WarningKind::UndatedFile,
            message: err.to_string(),
        });
    }

    pub fn read_failed(&mut self, source: SourceKind, path: &Path, err: &SourceError) {
        error!(
            %source,
            path = %path.display(),
            "An error occurred while processing {}: {err}",
            path.display()
        );
        self.warnings.push(SourceWarning {
            source,
            path: path.to_path_buf(),
            kind: WarningKind::ReadFailed,
            message: err.to_string(),
        });
    }

    pub fn warnings(&self) -> &[SourceWarning] {
        &self.warnings
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<SourceWarning> {
        self.warnings
    }
}
