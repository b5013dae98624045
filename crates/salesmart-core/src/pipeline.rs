use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, info_span, warn, Level};
use uuid::Uuid;

use crate::config::EtlConfig;
use crate::datamarts::build_datamarts;
use crate::error::{EtlError, Result};
use crate::extract::{extract_cashier, extract_sales, extract_store};
use crate::load::{write_datamarts, WrittenDatamart};
use crate::lock::RunLock;
use crate::merge::merge_sales;
use crate::reconcile::reconcile_cashiers;
use crate::report::{RunReport, SourceWarning};

#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceCounts {
    pub partitioned_sales_rows: usize,
    pub delimited_sales_rows: usize,
    pub store_rows: usize,
    pub cashier_rows: usize,
}

/// What a completed run read, produced and skipped.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: SourceCounts,
    pub reconciled_cashiers: usize,
    pub merged_rows: usize,
    pub outputs: Vec<WrittenDatamart>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SourceWarning>,
}

/// Classification of a run for callers that only care how it ended.
#[derive(Debug)]
pub enum RunOutcome {
    Success(RunSummary),
    /// Outputs were written but some source files were skipped.
    PartialSuccess(RunSummary),
    Failure(EtlError),
}

impl RunOutcome {
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            RunOutcome::Success(summary) | RunOutcome::PartialSuccess(summary) => Some(summary),
            RunOutcome::Failure(_) => None,
        }
    }

    pub fn warnings(&self) -> &[SourceWarning] {
        self.summary()
            .map(|summary| summary.warnings.as_slice())
            .unwrap_or_default()
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::Failure(_))
    }
}

impl From<Result<RunSummary>> for RunOutcome {
    fn from(result: Result<RunSummary>) -> Self {
        match result {
            Ok(summary) if summary.warnings.is_empty() => RunOutcome::Success(summary),
            Ok(summary) => RunOutcome::PartialSuccess(summary),
            Err(err) => RunOutcome::Failure(err),
        }
    }
}

/// Runs extract, reconcile, merge, aggregate and load once. Nothing is
/// written unless every stage before loading succeeds.
pub fn run_pipeline(config: &EtlConfig) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let span = info_span!("etl_run", %run_id);
    let _enter = span.enter();

    let output_dir = config.output_dir();
    let _lock = RunLock::acquire(&output_dir)?;
    let mut report = RunReport::new();

    info!("Starting data extraction...");
    let sales = extract_sales(config, &mut report)?;
    let store = extract_store(config, &mut report)?;
    let cashier = extract_cashier(config, &mut report)?;
    info!("Data extraction completed.");

    info!("Starting data transformation...");
    let reconciled = reconcile_cashiers(&cashier)?;
    let merged = merge_sales(&sales.frame, &store, &reconciled)?;
    let datamarts = build_datamarts(&merged)?;
    info!("Data transformation completed.");

    info!("Starting data loading...");
    let outputs = write_datamarts(&datamarts, &output_dir)?;
    info!("Data loading completed.");

    Ok(RunSummary {
        run_id,
        started_at,
        finished_at: Utc::now(),
        sources: SourceCounts {
            partitioned_sales_rows: sales.partitioned_rows,
            delimited_sales_rows: sales.delimited_rows,
            store_rows: store.height(),
            cashier_rows: cashier.height(),
        },
        reconciled_cashiers: reconciled.height(),
        merged_rows: merged.height(),
        outputs,
        warnings: report.into_warnings(),
    })
}

/// One run with its own log file. The file subscriber is only installed for
/// this thread and only for the duration of the run.
pub fn execute(config: &EtlConfig) -> RunOutcome {
    let log_file = match open_run_log(config) {
        Ok(file) => file,
        Err(err) => {
            error!(log_dir = %config.log_dir.display(), "Cannot open run log: {err}");
            return RunOutcome::Failure(err);
        }
    };

    let subscriber = tracing_subscriber::fmt()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        info!("ETL process started.");
        let outcome = RunOutcome::from(run_pipeline(config));
        match &outcome {
            RunOutcome::Success(_) => info!("ETL process completed successfully."),
            RunOutcome::PartialSuccess(_) => warn!(
                skipped = outcome.warnings().len(),
                "ETL process completed with {} skipped source files.",
                outcome.warnings().len()
            ),
            RunOutcome::Failure(err) => error!("ETL process failed: {err}"),
        }
        outcome
    })
}

fn open_run_log(config: &EtlConfig) -> Result<fs::File> {
    fs::create_dir_all(&config.log_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_file())?;
    Ok(file)
}
