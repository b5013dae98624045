use std::fmt;

use polars::prelude::DataFrame;
use serde::Serialize;

use crate::error::{EtlError, Result};

pub const AMOUNT: &str = "Amount";
pub const STORE_ID: &str = "StoreID";
pub const STORE_NAME: &str = "StoreName";
pub const CASHIER_ID: &str = "CashierId";
pub const CASHIER_NAME: &str = "Name";
pub const CASHIER_EMAIL: &str = "Email";

pub const YEAR: &str = "Year";
pub const MONTH: &str = "Month";
pub const DAY: &str = "Day";

pub const TOTAL_SALES: &str = "TotalSales";
pub const PERCENT_SALES: &str = "PercentSales";

/// Cashier columns repaired by forward/backward fill during reconciliation.
pub const CASHIER_FILL_COLUMNS: [&str; 2] = [CASHIER_NAME, CASHIER_EMAIL];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Sales,
    Store,
    Cashier,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Dataset::Sales => "sales",
            Dataset::Store => "store",
            Dataset::Cashier => "cashier",
        };
        f.write_str(label)
    }
}

pub fn has_column(df: &DataFrame, column: &str) -> bool {
    df.get_column_index(column).is_some()
}

pub fn require_column(df: &DataFrame, dataset: Dataset, column: &'static str) -> Result<()> {
    if has_column(df, column) {
        Ok(())
    } else {
        tracing::error!(%dataset, column, "{dataset} record set is missing '{column}' column");
        Err(EtlError::MissingColumn { dataset, column })
    }
}
