use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::Serialize;
use tracing::{error, info};

use crate::datamarts::{DatamartKind, Datamarts};
use crate::error::Result;

/// A datamart file that was written and renamed into place.
#[derive(Debug, Clone, Serialize)]
pub struct WrittenDatamart {
    pub kind: DatamartKind,
    pub path: PathBuf,
    pub rows: usize,
}

struct Staged {
    written: WrittenDatamart,
    staging: PathBuf,
}

/// Writes every datamart as a headered CSV under `output_dir`, replacing any
/// previous file of the same name.
///
/// All files are staged before any is renamed into place, so a failed write
/// leaves the previous run's set untouched.
pub fn write_datamarts(datamarts: &Datamarts, output_dir: &Path) -> Result<Vec<WrittenDatamart>> {
    fs::create_dir_all(output_dir)?;

    let mut staged: Vec<Staged> = Vec::new();
    for (kind, frame) in datamarts.iter() {
        match stage_datamart(kind, frame, output_dir) {
            Ok(entry) => staged.push(entry),
            Err(err) => {
                error!(datamart = %kind, "Failed to write {kind}; keeping previous outputs: {err}");
                discard(&staged);
                let _ = fs::remove_file(staging_path(kind, output_dir));
                return Err(err);
            }
        }
    }

    let mut written = Vec::with_capacity(staged.len());
    for (idx, entry) in staged.iter().enumerate() {
        if let Err(err) = fs::rename(&entry.staging, &entry.written.path) {
            discard(&staged[idx..]);
            return Err(err.into());
        }
        info!(
            datamart = %entry.written.kind,
            rows = entry.written.rows,
            path = %entry.written.path.display(),
            "Saved {} to {}",
            entry.written.kind,
            entry.written.path.display()
        );
        written.push(entry.written.clone());
    }
    Ok(written)
}

fn staging_path(kind: DatamartKind, output_dir: &Path) -> PathBuf {
    output_dir.join(format!(".{}.tmp", kind.file_name()))
}

fn stage_datamart(kind: DatamartKind, frame: &DataFrame, output_dir: &Path) -> Result<Staged> {
    let staging = staging_path(kind, output_dir);

    // CsvWriter needs a mutable frame.
    let mut frame = frame.clone();
    let mut file = File::create(&staging)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut frame)?;
    file.sync_all()?;

    Ok(Staged {
        written: WrittenDatamart {
            kind,
            path: output_dir.join(kind.file_name()),
            rows: frame.height(),
        },
        staging,
    })
}

fn discard(staged: &[Staged]) {
    for entry in staged {
        let _ = fs::remove_file(&entry.staging);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamarts::build_datamarts;

    fn merged() -> DataFrame {
        df!(
            "Amount" => [10.0],
            "StoreID" => [1i64],
            "StoreName" => ["North"],
            "CashierId" => [9i64],
            "Name" => ["Alice"],
            "Year" => [2024i32],
            "Month" => [1i32],
            "Day" => [2i32],
        )
        .unwrap()
    }

    #[test]
    fn failed_write_keeps_the_previous_set_intact() {
        let dir = tempfile::tempdir().unwrap();
        let marts = build_datamarts(&merged()).unwrap();
        for kind in DatamartKind::ALL {
            fs::write(dir.path().join(kind.file_name()), "previous\n").unwrap();
        }
        // A directory in the staging slot makes the fourth datamart unwritable.
        fs::create_dir(staging_path(DatamartKind::SalesByDay, dir.path())).unwrap();

        assert!(write_datamarts(&marts, dir.path()).is_err());

        for kind in DatamartKind::ALL {
            let contents = fs::read_to_string(dir.path().join(kind.file_name())).unwrap();
            assert_eq!(contents, "previous\n", "{kind} was replaced");
            if kind != DatamartKind::SalesByDay {
                assert!(!staging_path(kind, dir.path()).exists());
            }
        }
    }

    #[test]
    fn successful_write_replaces_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let marts = build_datamarts(&merged()).unwrap();
        fs::write(dir.path().join("sales_by_store.csv"), "previous\n").unwrap();

        let written = write_datamarts(&marts, dir.path()).unwrap();

        assert_eq!(written.len(), DatamartKind::ALL.len());
        let store = fs::read_to_string(dir.path().join("sales_by_store.csv")).unwrap();
        assert!(store.starts_with("StoreID,StoreName,TotalSales,PercentSales"));
        for kind in DatamartKind::ALL {
            assert!(!staging_path(kind, dir.path()).exists());
        }
    }
}
