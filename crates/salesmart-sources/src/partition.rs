use std::fmt;
use std::path::{Component, Path};

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static PARTITION_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Year|Month|Day)=(\d{1,4})$").expect("partition segment pattern")
});

static SALES_FILE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"sales_data_(\d{4})-(\d{2})_(\d{2})").expect("sales file name pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateSegment {
    Year,
    Month,
    Day,
}

impl fmt::Display for DateSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DateSegment::Year => "Year",
            DateSegment::Month => "Month",
            DateSegment::Day => "Day",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("path has no {0}=<n> segment")]
    MissingSegment(DateSegment),

    #[error("file name carries no sales_data_YYYY-MM_DD token")]
    NoDateToken,

    #[error("{year:04}-{month:02}-{day:02} is not a calendar date")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

/// Calendar date recovered from a source file's location rather than its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionDate(NaiveDate);

impl PartitionDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateParseError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or(DateParseError::InvalidDate { year, month, day })
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn as_naive_date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for PartitionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Reads `Year=<n>/Month=<n>/Day=<n>` directory segments. When a segment name
/// repeats, the one closest to the file wins.
pub fn parse_partition_path(path: &Path) -> Result<PartitionDate, DateParseError> {
    let mut year = None;
    let mut month = None;
    let mut day = None;

    for component in path.components() {
        let Component::Normal(segment) = component else {
            continue;
        };
        let Some(segment) = segment.to_str() else {
            continue;
        };
        let Some(captures) = PARTITION_SEGMENT.captures(segment) else {
            continue;
        };
        let Ok(value) = captures[2].parse::<u32>() else {
            continue;
        };
        match &captures[1] {
            "Year" => year = Some(value),
            "Month" => month = Some(value),
            "Day" => day = Some(value),
            _ => {}
        }
    }

    let year = year.ok_or(DateParseError::MissingSegment(DateSegment::Year))?;
    let month = month.ok_or(DateParseError::MissingSegment(DateSegment::Month))?;
    let day = day.ok_or(DateParseError::MissingSegment(DateSegment::Day))?;

    PartitionDate::from_ymd(year as i32, month, day)
}

/// Reads the `sales_data_YYYY-MM_DD` token from the file name only; parent
/// directories are ignored.
pub fn parse_sales_filename(path: &Path) -> Result<PartitionDate, DateParseError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or(DateParseError::NoDateToken)?;
    let captures = SALES_FILE_TOKEN
        .captures(file_name)
        .ok_or(DateParseError::NoDateToken)?;

    let year: i32 = captures[1].parse().map_err(|_| DateParseError::NoDateToken)?;
    let month: u32 = captures[2].parse().map_err(|_| DateParseError::NoDateToken)?;
    let day: u32 = captures[3].parse().map_err(|_| DateParseError::NoDateToken)?;

    PartitionDate::from_ymd(year, month, day)
}
