use polars::prelude::*;
use tracing::{debug, info};

use crate::error::Result;
use crate::schema::{require_column, Dataset, CASHIER_ID, STORE_ID};

/// Inner-joins sales with the store master on `StoreID`, then with the
/// reconciled cashiers on `CashierId`. Sales rows whose ids are absent from
/// either reference set drop out.
pub fn merge_sales(sales: &DataFrame, store: &DataFrame, cashier: &DataFrame) -> Result<DataFrame> {
    require_column(sales, Dataset::Sales, STORE_ID)?;
    require_column(store, Dataset::Store, STORE_ID)?;
    require_column(sales, Dataset::Sales, CASHIER_ID)?;
    require_column(cashier, Dataset::Cashier, CASHIER_ID)?;

    let (sales, store) = align_key(sales, store, STORE_ID)?;
    let (sales, cashier) = align_key(&sales, cashier, CASHIER_ID)?;

    let merged = sales
        .lazy()
        .join(
            store.lazy(),
            [col(STORE_ID)],
            [col(STORE_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .join(
            cashier.lazy(),
            [col(CASHIER_ID)],
            [col(CASHIER_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .collect()?;

    info!(rows = merged.height(), "Merged {} sales rows", merged.height());
    Ok(merged)
}

/// Common type for a join key: integers stay integral, any float widens both
/// sides to `Float64`, and everything else compares as text.
pub fn join_key_dtype(left: &DataType, right: &DataType) -> DataType {
    if left.is_integer() && right.is_integer() {
        DataType::Int64
    } else if left.is_primitive_numeric() && right.is_primitive_numeric() {
        DataType::Float64
    } else {
        DataType::String
    }
}

fn align_key(left: &DataFrame, right: &DataFrame, key: &str) -> Result<(DataFrame, DataFrame)> {
    let left_key = left.column(key)?;
    let right_key = right.column(key)?;
    let dtype = join_key_dtype(left_key.dtype(), right_key.dtype());
    debug!(
        key,
        left = %left_key.dtype(),
        right = %right_key.dtype(),
        target = %dtype,
        "Aligning join key"
    );

    let mut left = left.clone();
    let mut right = right.clone();
    let cast_left = left_key.cast(&dtype)?;
    let cast_right = right_key.cast(&dtype)?;
    left.with_column(cast_left)?;
    right.with_column(cast_right)?;
    Ok((left, right))
}
