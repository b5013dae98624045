use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use tracing::{error, info, warn};

use crate::config::EtlConfig;
use crate::error::EtlError;
use crate::pipeline::{execute, RunOutcome};

/// Fires once a day at a fixed wall-clock time in the caller's time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// The first occurrence strictly after `now`: today if still ahead, else tomorrow.
    ///
    /// A fire time repeated by a fall-back transition fires on its first
    /// occurrence; one skipped by a spring-forward transition fires an hour later
    /// on the wall clock.
    pub fn next_fire_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let zone = now.timezone();
        let mut day = now.date_naive();
        loop {
            if let Some(fire) = resolve_wall_clock(&zone, day.and_time(self.at)) {
                if fire > *now {
                    return fire;
                }
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => return now.clone(),
            }
        }
    }
}

fn resolve_wall_clock<Tz: TimeZone>(zone: &Tz, wall: NaiveDateTime) -> Option<DateTime<Tz>> {
    match zone.from_local_datetime(&wall) {
        LocalResult::Single(fire) => Some(fire),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => zone
            .from_local_datetime(&(wall + TimeDelta::hours(1)))
            .earliest(),
    }
}

/// Allows at most one run at a time within the process.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    busy: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<FlightPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held while a run is in flight; dropping it lets the next trigger through.
#[derive(Debug)]
pub struct FlightPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub enum TriggerOutcome {
    Completed(RunOutcome),
    /// Another run was still in progress.
    Rejected,
}

pub struct Scheduler {
    config: Arc<EtlConfig>,
    schedule: DailySchedule,
    guard: SingleFlight,
}

impl Scheduler {
    pub fn new(config: EtlConfig) -> Self {
        let schedule = DailySchedule::new(config.schedule_at);
        Self {
            config: Arc::new(config),
            schedule,
            guard: SingleFlight::new(),
        }
    }

    pub fn schedule(&self) -> DailySchedule {
        self.schedule
    }

    pub fn guard(&self) -> &SingleFlight {
        &self.guard
    }

    /// Performs one guarded run on a blocking thread.
    pub async fn trigger(&self) -> TriggerOutcome {
        let Some(permit) = self.guard.try_acquire() else {
            warn!("ETL run already in progress; trigger rejected");
            return TriggerOutcome::Rejected;
        };

        let config = Arc::clone(&self.config);
        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            execute(&config)
        })
        .await;

        let outcome = joined
            .unwrap_or_else(|err| RunOutcome::Failure(EtlError::RunAborted(err.to_string())));
        log_outcome(&outcome);
        TriggerOutcome::Completed(outcome)
    }

    /// Sleeps until each daily fire time and triggers a run. Never returns.
    pub async fn run(self: Arc<Self>) {
        info!(at = %self.schedule.at, "Daily ETL schedule started");
        loop {
            let now = Local::now();
            let next = self.schedule.next_fire_after(&now);
            let wait = next
                .signed_duration_since(now)
                .to_std()
                .unwrap_or(Duration::ZERO);
            info!(next = %next, "Next ETL run scheduled");
            tokio::time::sleep(wait).await;

            let scheduler = Arc::clone(&self);
            tokio::spawn(async move {
                scheduler.trigger().await;
            });
        }
    }
}

fn log_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Success(summary) => {
            info!(run_id = %summary.run_id, merged_rows = summary.merged_rows, "Scheduled run succeeded")
        }
        RunOutcome::PartialSuccess(summary) => warn!(
            run_id = %summary.run_id,
            skipped = outcome.warnings().len(),
            "Scheduled run finished with skipped source files"
        ),
        RunOutcome::Failure(err) => error!(error = %err, "Scheduled run failed"),
    }
}
