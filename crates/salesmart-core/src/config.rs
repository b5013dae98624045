use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_DATA_DIR: &str = "/data";
pub const DEFAULT_LOG_DIR: &str = "/logs";
pub const LOG_FILE_NAME: &str = "etl.log";

pub const ENV_DATA_DIR: &str = "DATA_DIR";
pub const ENV_LOG_DIR: &str = "LOG_DIR";
pub const ENV_START_DATE: &str = "SALESMART_START_DATE";
pub const ENV_END_DATE: &str = "SALESMART_END_DATE";
pub const ENV_FAILURE_POLICY: &str = "SALESMART_FAILURE_POLICY";
pub const ENV_SCHEDULE_AT: &str = "SALESMART_SCHEDULE_AT";

const DEFAULT_SCHEDULE_AT: &str = "00:15";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be an ISO date (YYYY-MM-DD), got {value:?}")]
    InvalidDate { key: &'static str, value: String },

    #[error("a date range needs both a start and an end date")]
    HalfOpenRange,

    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("unknown failure policy {0:?} (expected \"skip\" or \"fail-fast\")")]
    UnknownPolicy(String),

    #[error("schedule time must be HH:MM, got {0:?}")]
    InvalidTime(String),
}

/// How per-file read failures are handled, for every source alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Log the failure, record a warning and move on to the next file.
    #[default]
    SkipAndContinue,
    /// Abort the run on the first unreadable file.
    FailFast,
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" | "skip-and-continue" => Ok(FailurePolicy::SkipAndContinue),
            "fail-fast" | "failfast" => Ok(FailurePolicy::FailFast),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::SkipAndContinue => f.write_str("skip"),
            FailurePolicy::FailFast => f.write_str("fail-fast"),
        }
    }
}

/// Inclusive calendar range selecting which dated sales files are ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Source patterns and output directory, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    pub partitioned_sales: String,
    pub delimited_sales: String,
    pub store_master: String,
    pub cashier_snapshots: String,
    pub output_dir: String,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            partitioned_sales: "sales_data/**/*.parquet".to_string(),
            delimited_sales: "new_sales_data/*.csv".to_string(),
            store_master: "master_store.xlsx".to_string(),
            cashier_snapshots: "cashier_data/*.json".to_string(),
            output_dir: "output".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub date_range: Option<DateRange>,
    pub failure_policy: FailurePolicy,
    pub schedule_at: NaiveTime,
    pub layout: SourceLayout,
}

impl EtlConfig {
    pub fn new(data_dir: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            log_dir: log_dir.into(),
            date_range: None,
            failure_policy: FailurePolicy::default(),
            schedule_at: NaiveTime::from_hms_opt(0, 15, 0).unwrap_or_default(),
            layout: SourceLayout::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from any key/value source; unset or blank keys use defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = get(ENV_DATA_DIR).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let log_dir = get(ENV_LOG_DIR).unwrap_or_else(|| DEFAULT_LOG_DIR.to_string());

        let mut config = Self::new(data_dir, log_dir);
        config.date_range = parse_date_range(
            get(ENV_START_DATE).as_deref(),
            get(ENV_END_DATE).as_deref(),
        )?;
        if let Some(policy) = get(ENV_FAILURE_POLICY) {
            config.failure_policy = policy.parse()?;
        }
        config.schedule_at =
            parse_schedule_time(get(ENV_SCHEDULE_AT).as_deref().unwrap_or(DEFAULT_SCHEDULE_AT))?;

        Ok(config)
    }

    /// Absolute glob pattern for a layout entry.
    pub fn pattern(&self, relative: &str) -> String {
        self.data_dir.join(relative).to_string_lossy().into_owned()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join(&self.layout.output_dir)
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }
}

pub fn parse_date_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Option<DateRange>, ConfigError> {
    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => {
            let start = parse_iso_date(ENV_START_DATE, start)?;
            let end = parse_iso_date(ENV_END_DATE, end)?;
            DateRange::new(start, end).map(Some)
        }
        _ => Err(ConfigError::HalfOpenRange),
    }
}

pub fn parse_schedule_time(value: &str) -> Result<NaiveTime, ConfigError> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| ConfigError::InvalidTime(value.to_string()))
}

fn parse_iso_date(key: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = EtlConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config.data_dir, PathBuf::from("/data"));
        assert_eq!(config.log_file(), PathBuf::from("/logs/etl.log"));
        assert_eq!(config.output_dir(), PathBuf::from("/data/output"));
        assert_eq!(config.date_range, None);
        assert_eq!(config.failure_policy, FailurePolicy::SkipAndContinue);
        assert_eq!(config.schedule_at, NaiveTime::from_hms_opt(0, 15, 0).unwrap());
    }

    #[test]
    fn env_values_override_defaults() {
        let config = EtlConfig::from_lookup(lookup(&[
            ("DATA_DIR", "/srv/retail"),
            ("SALESMART_START_DATE", "2024-01-01"),
            ("SALESMART_END_DATE", "2024-12-31"),
            ("SALESMART_FAILURE_POLICY", "fail-fast"),
            ("SALESMART_SCHEDULE_AT", "22:43"),
        ]))
        .expect("config");

        assert_eq!(config.pattern("cashier_data/*.json"), "/srv/retail/cashier_data/*.json");
        let range = config.date_range.expect("range");
        assert_eq!(range.start(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(range.end(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.schedule_at, NaiveTime::from_hms_opt(22, 43, 0).unwrap());
    }

    #[test]
    fn half_open_and_inverted_ranges_are_rejected() {
        assert_eq!(
            parse_date_range(Some("2024-01-01"), None),
            Err(ConfigError::HalfOpenRange)
        );
        assert!(matches!(
            parse_date_range(Some("2024-02-01"), Some("2024-01-01")),
            Err(ConfigError::InvertedRange { .. })
        ));
        assert!(matches!(
            parse_date_range(Some("01/02/2024"), Some("2024-01-03")),
            Err(ConfigError::InvalidDate { key: ENV_START_DATE, .. })
        ));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let range = DateRange::new(start, end).unwrap();

        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(start.pred_opt().unwrap()));
        assert!(!range.contains(end.succ_opt().unwrap()));
    }

    #[test]
    fn unknown_policy_is_an_error() {
        assert_eq!(
            "sometimes".parse::<FailurePolicy>(),
            Err(ConfigError::UnknownPolicy("sometimes".to_string()))
        );
    }
}
