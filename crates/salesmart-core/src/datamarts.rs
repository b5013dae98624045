use std::fmt;

use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::schema::{
    AMOUNT, CASHIER_ID, CASHIER_NAME, DAY, MONTH, PERCENT_SALES, STORE_ID, STORE_NAME,
    TOTAL_SALES, YEAR,
};

/// The five grouped-sum views written by every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatamartKind {
    SalesByStore,
    SalesByCashier,
    SalesByMonth,
    SalesByDay,
    SalesByStoreCashier,
}

impl DatamartKind {
    pub const ALL: [DatamartKind; 5] = [
        DatamartKind::SalesByStore,
        DatamartKind::SalesByCashier,
        DatamartKind::SalesByMonth,
        DatamartKind::SalesByDay,
        DatamartKind::SalesByStoreCashier,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DatamartKind::SalesByStore => "sales_by_store",
            DatamartKind::SalesByCashier => "sales_by_cashier",
            DatamartKind::SalesByMonth => "sales_by_month",
            DatamartKind::SalesByDay => "sales_by_day",
            DatamartKind::SalesByStoreCashier => "sales_by_store_cashier",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.csv", self.name())
    }

    /// Group-by columns, which are also the sort order of the output.
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            DatamartKind::SalesByStore => &[STORE_ID, STORE_NAME],
            DatamartKind::SalesByCashier => &[CASHIER_ID, CASHIER_NAME],
            DatamartKind::SalesByMonth => &[YEAR, MONTH],
            DatamartKind::SalesByDay => &[YEAR, MONTH, DAY],
            DatamartKind::SalesByStoreCashier => &[STORE_ID, STORE_NAME, CASHIER_ID, CASHIER_NAME],
        }
    }

    pub fn has_percent(self) -> bool {
        matches!(self, DatamartKind::SalesByStore | DatamartKind::SalesByCashier)
    }
}

impl fmt::Display for DatamartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct Datamarts {
    frames: Vec<(DatamartKind, DataFrame)>,
}

impl Datamarts {
    pub fn get(&self, kind: DatamartKind) -> Option<&DataFrame> {
        self.frames
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map(|(_, frame)| frame)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DatamartKind, &DataFrame)> {
        self.frames.iter().map(|(kind, frame)| (*kind, frame))
    }
}

pub fn build_datamarts(merged: &DataFrame) -> Result<Datamarts> {
    let mut frames = Vec::with_capacity(DatamartKind::ALL.len());
    for kind in DatamartKind::ALL {
        let frame = build_datamart(merged, kind)?;
        info!(datamart = %kind, rows = frame.height(), "Built {kind} with {} rows", frame.height());
        frames.push((kind, frame));
    }
    Ok(Datamarts { frames })
}

pub fn build_datamart(merged: &DataFrame, kind: DatamartKind) -> Result<DataFrame> {
    let summed = grouped_sum(merged, kind.keys())?;
    if kind.has_percent() {
        with_percent(summed, kind)
    } else {
        Ok(summed)
    }
}

/// Rows with a null in any key column belong to no group and are left out of
/// the totals, including the grand total behind `PercentSales`.
fn grouped_sum(merged: &DataFrame, keys: &[&str]) -> Result<DataFrame> {
    let key_exprs: Vec<Expr> = keys.iter().map(|key| col(*key)).collect();
    let keys_present = keys
        .iter()
        .map(|key| col(*key).is_not_null())
        .reduce(|all, present| all.and(present))
        .unwrap_or_else(|| lit(true));

    let summed = merged
        .clone()
        .lazy()
        .filter(keys_present)
        .group_by(key_exprs)
        .agg([col(AMOUNT).cast(DataType::Float64).sum().alias(TOTAL_SALES)])
        .sort(keys.to_vec(), SortMultipleOptions::default())
        .collect()?;
    Ok(summed)
}

fn with_percent(mut summed: DataFrame, kind: DatamartKind) -> Result<DataFrame> {
    let totals = summed.column(TOTAL_SALES)?.f64()?.clone();
    let grand_total: f64 = totals.sum().unwrap_or(0.0);

    let percent: Vec<Option<f64>> = if grand_total == 0.0 {
        warn!(datamart = %kind, "Total sales are zero; {PERCENT_SALES} is left empty");
        vec![None; totals.len()]
    } else {
        totals
            .iter()
            .map(|total| total.map(|total| total / grand_total * 100.0))
            .collect()
    };

    summed.with_column(Series::new(PERCENT_SALES.into(), percent))?;
    Ok(summed)
}
