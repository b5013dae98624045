use std::path::{Path, PathBuf};

use polars::prelude::*;
use salesmart_sources::{
    parse_partition_path, parse_sales_filename, read_snapshot, snapshot_frame, DateParseError,
    DelimitedTable, ParquetTable, PartitionDate, SourceError, TableReader, WorkbookTable,
};
use tracing::{debug, error, info, warn};

use crate::config::{EtlConfig, FailurePolicy};
use crate::error::{EtlError, Result};
use crate::report::{RunReport, SourceKind};
use crate::schema::{
    require_column, Dataset, AMOUNT, CASHIER_ID, DAY, MONTH, STORE_ID, STORE_NAME, YEAR,
};

type DateOf = fn(&Path) -> std::result::Result<PartitionDate, DateParseError>;

/// The sales record set plus how many rows each source family contributed.
#[derive(Debug, Clone)]
pub struct SalesExtract {
    pub frame: DataFrame,
    pub partitioned_rows: usize,
    pub delimited_rows: usize,
}

/// Reads the partitioned parquet files and the dated CSV files into one sales
/// set, parquet rows first. Each row is stamped with the date taken from its
/// file's location.
pub fn extract_sales(config: &EtlConfig, report: &mut RunReport) -> Result<SalesExtract> {
    let partitioned = ingest_dated_files(
        SourceKind::PartitionedSales,
        &config.pattern(&config.layout.partitioned_sales),
        &ParquetTable,
        parse_partition_path,
        config,
        report,
    )?;
    let delimited = ingest_dated_files(
        SourceKind::DelimitedSales,
        &config.pattern(&config.layout.delimited_sales),
        &DelimitedTable,
        parse_sales_filename,
        config,
        report,
    )?;

    let partitioned_rows = partitioned.iter().map(DataFrame::height).sum();
    let delimited_rows = delimited.iter().map(DataFrame::height).sum();
    if delimited_rows == 0 {
        warn!("No data found in CSV files.");
    }

    let mut frames = partitioned;
    frames.extend(delimited);

    let frame = match stack_frames(frames)? {
        Some(frame) => frame,
        None => {
            warn!("No sales rows were ingested; continuing with an empty sales set");
            empty_sales_frame()?
        }
    };

    Ok(SalesExtract {
        frame,
        partitioned_rows,
        delimited_rows,
    })
}

/// Reads and concatenates every store master workbook.
pub fn extract_store(config: &EtlConfig, report: &mut RunReport) -> Result<DataFrame> {
    let files = list_files(&config.pattern(&config.layout.store_master))?;
    info!(count = files.len(), "Found {} store files", files.len());
    if files.is_empty() {
        error!("No store files found.");
    }

    let mut frames = Vec::with_capacity(files.len());
    for path in files {
        match WorkbookTable.read(&path) {
            Ok(df) => {
                info!(path = %path.display(), rows = df.height(), "Loaded {} records from {}", df.height(), path.display());
                frames.push(df);
            }
            Err(err) => on_read_failure(
                config.failure_policy,
                SourceKind::StoreMaster,
                &path,
                err,
                report,
            )?,
        }
    }

    let store = match stack_frames(frames)? {
        Some(store) => store,
        None => empty_store_frame()?,
    };
    info!(rows = store.height(), "Successfully loaded {} records from store files", store.height());
    Ok(store)
}

/// Flattens every keyed snapshot file into one cashier set. The identifier
/// column is mandatory: without it the run cannot continue.
pub fn extract_cashier(config: &EtlConfig, report: &mut RunReport) -> Result<DataFrame> {
    let pattern = config.pattern(&config.layout.cashier_snapshots);
    info!(pattern = %pattern, "Extracting cashier data");
    let files = list_files(&pattern)?;
    info!(count = files.len(), "Found {} cashier files", files.len());

    let mut records = Vec::new();
    for path in files {
        match read_snapshot(&path) {
            Ok(mut batch) => {
                info!(path = %path.display(), rows = batch.len(), "Loaded {} records from {}", batch.len(), path.display());
                records.append(&mut batch);
            }
            Err(err) => on_read_failure(
                config.failure_policy,
                SourceKind::CashierSnapshot,
                &path,
                err,
                report,
            )?,
        }
    }

    let cashier = snapshot_frame(&records)?;
    require_column(&cashier, Dataset::Cashier, CASHIER_ID)?;
    info!(columns = ?cashier.get_column_names(), "Extracted cashier columns");
    Ok(cashier)
}

fn ingest_dated_files(
    source: SourceKind,
    pattern: &str,
    reader: &dyn TableReader,
    date_of: DateOf,
    config: &EtlConfig,
    report: &mut RunReport,
) -> Result<Vec<DataFrame>> {
    let files = list_files(pattern)?;
    info!(%source, count = files.len(), "Found {} {} files", files.len(), reader.name());

    let mut frames = Vec::new();
    for path in files {
        let date = match date_of(&path) {
            Ok(date) => date,
            Err(err) => {
                report.skip_undated(source, &path, &err);
                continue;
            }
        };

        if let Some(range) = config.date_range {
            if !range.contains(date.as_naive_date()) {
                debug!(path = %path.display(), %date, "Outside requested date range");
                continue;
            }
        }

        let loaded = reader
            .read(&path)
            .and_then(|df| stamp_date(df, date).map_err(SourceError::from));
        match loaded {
            Ok(df) => {
                info!(path = %path.display(), rows = df.height(), "Loaded {} records from {}", df.height(), path.display());
                frames.push(df);
            }
            Err(err) => on_read_failure(config.failure_policy, source, &path, err, report)?,
        }
    }

    Ok(frames)
}

fn on_read_failure(
    policy: FailurePolicy,
    source: SourceKind,
    path: &Path,
    err: SourceError,
    report: &mut RunReport,
) -> Result<()> {
    match policy {
        FailurePolicy::SkipAndContinue => {
            report.read_failed(source, path, &err);
            Ok(())
        }
        FailurePolicy::FailFast => {
            error!(%source, path = %path.display(), "Aborting on unreadable file: {err}");
            Err(EtlError::SourceRead {
                origin: source,
                path: path.to_path_buf(),
                message: err.to_string(),
            })
        }
    }
}

/// Adds `Year`, `Month`, `Day` columns, replacing any the file already carried.
pub fn stamp_date(mut df: DataFrame, date: PartitionDate) -> PolarsResult<DataFrame> {
    let rows = df.height();
    df.with_column(Series::new(YEAR.into(), vec![date.year(); rows]))?;
    df.with_column(Series::new(MONTH.into(), vec![date.month() as i32; rows]))?;
    df.with_column(Series::new(DAY.into(), vec![date.day() as i32; rows]))?;
    Ok(df)
}

/// Vertically concatenates frames whose columns may differ, widening types as needed.
pub fn stack_frames(frames: Vec<DataFrame>) -> PolarsResult<Option<DataFrame>> {
    match frames.len() {
        0 => Ok(None),
        1 => Ok(frames.into_iter().next()),
        _ => {
            let lazy: Vec<LazyFrame> = frames.into_iter().map(IntoLazy::lazy).collect();
            let combined = concat_lf_diagonal(
                lazy,
                UnionArgs {
                    to_supertypes: true,
                    ..Default::default()
                },
            )?
            .collect()?;
            Ok(Some(combined))
        }
    }
}

fn list_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern).map_err(|err| EtlError::Pattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(err) => warn!("Skipping unreadable directory entry: {err}"),
        }
    }
    files.sort();
    Ok(files)
}

fn empty_sales_frame() -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Series::new_empty(AMOUNT.into(), &DataType::Float64).into(),
        Series::new_empty(STORE_ID.into(), &DataType::Int64).into(),
        Series::new_empty(CASHIER_ID.into(), &DataType::Int64).into(),
        Series::new_empty(YEAR.into(), &DataType::Int32).into(),
        Series::new_empty(MONTH.into(), &DataType::Int32).into(),
        Series::new_empty(DAY.into(), &DataType::Int32).into(),
    ])
}

fn empty_store_frame() -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Series::new_empty(STORE_ID.into(), &DataType::Int64).into(),
        Series::new_empty(STORE_NAME.into(), &DataType::String).into(),
    ])
}
