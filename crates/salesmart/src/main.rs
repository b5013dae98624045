use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use salesmart_core::config::{parse_schedule_time, DateRange, EtlConfig, FailurePolicy};
use salesmart_core::pipeline::{execute, RunOutcome};
use salesmart_core::scheduler::Scheduler;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Retail sales datamart ETL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline once and print the run summary as JSON
    Run(SourceArgs),
    /// Run the pipeline every day at a fixed local time
    Schedule(ScheduleArgs),
}

#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Root data directory (overrides DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Directory for etl.log (overrides LOG_DIR)
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// First sales date to include, YYYY-MM-DD
    #[arg(long, requires = "end_date")]
    start_date: Option<NaiveDate>,
    /// Last sales date to include, YYYY-MM-DD
    #[arg(long, requires = "start_date")]
    end_date: Option<NaiveDate>,
    /// Abort on the first unreadable source file instead of skipping it
    #[arg(long)]
    fail_fast: bool,
}

#[derive(Args, Debug, Default)]
struct ScheduleArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Daily trigger time, HH:MM (overrides SALESMART_SCHEDULE_AT)
    #[arg(long)]
    at: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args).await,
        Command::Schedule(args) => handle_schedule(args).await,
    }
}

fn load_config(args: &SourceArgs) -> Result<EtlConfig> {
    let mut config = EtlConfig::from_env().context("invalid ETL configuration in environment")?;

    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &args.log_dir {
        config.log_dir = dir.clone();
    }
    if let (Some(start), Some(end)) = (args.start_date, args.end_date) {
        config.date_range = Some(DateRange::new(start, end).context("invalid --start-date/--end-date")?);
    }
    if args.fail_fast {
        config.failure_policy = FailurePolicy::FailFast;
    }

    Ok(config)
}

async fn handle_run(args: SourceArgs) -> Result<()> {
    let config = load_config(&args)?;
    info!(
        data_dir = %config.data_dir.display(),
        policy = %config.failure_policy,
        "Starting one-off ETL run"
    );

    let outcome = tokio::task::spawn_blocking(move || execute(&config))
        .await
        .context("ETL run panicked")?;

    match outcome {
        RunOutcome::Success(summary) | RunOutcome::PartialSuccess(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        RunOutcome::Failure(err) => Err(anyhow!(err).context("ETL run failed")),
    }
}

async fn handle_schedule(args: ScheduleArgs) -> Result<()> {
    let mut config = load_config(&args.source)?;
    if let Some(at) = &args.at {
        config.schedule_at = parse_schedule_time(at).context("invalid --at time")?;
    }

    let scheduler = Arc::new(Scheduler::new(config));
    info!(at = %scheduler.schedule().at, "Scheduling daily ETL runs");
    scheduler.run().await;
    Ok(())
}
