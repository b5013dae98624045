use polars::prelude::*;

use salesmart_core::error::EtlError;
use salesmart_core::merge::merge_sales;
use salesmart_core::schema::Dataset;

fn references() -> PolarsResult<(DataFrame, DataFrame)> {
    let store = df!(
        "StoreID" => [1i64, 2],
        "StoreName" => ["North", "South"],
    )?;
    let cashier = df!(
        "CashierId" => [9i64, 7],
        "Name" => ["Alice", "Bob"],
    )?;
    Ok((store, cashier))
}

#[test]
fn only_rows_with_both_references_survive() -> PolarsResult<()> {
    let sales = df!(
        "Amount" => [10.0, 20.0, 30.0, 40.0, 50.0],
        "StoreID" => [1i64, 2, 3, 1, 2],
        "CashierId" => [9i64, 7, 9, 8, 9],
    )?;
    let (store, cashier) = references()?;

    let merged = merge_sales(&sales, &store, &cashier).expect("merge");

    // Store 3 and cashier 8 are unknown.
    assert_eq!(merged.height(), 3);
    for column in ["Amount", "StoreName", "Name"] {
        assert!(merged.column(column).is_ok(), "missing {column}");
    }
    let total: f64 = merged.column("Amount")?.f64()?.sum().unwrap_or_default();
    assert_eq!(total, 80.0);
    Ok(())
}

#[test]
fn mismatched_numeric_key_types_still_join() -> PolarsResult<()> {
    let sales = df!(
        "Amount" => [10.0],
        "StoreID" => [1.0f64],
        "CashierId" => [9i32],
    )?;
    let (store, cashier) = references()?;

    let merged = merge_sales(&sales, &store, &cashier).expect("merge");
    assert_eq!(merged.height(), 1);
    assert_eq!(merged.column("StoreName")?.str()?.get(0), Some("North"));
    Ok(())
}

#[test]
fn textual_keys_join_against_integral_ones() -> PolarsResult<()> {
    let sales = df!(
        "Amount" => [10.0],
        "StoreID" => ["2"],
        "CashierId" => [7i64],
    )?;
    let (store, cashier) = references()?;

    let merged = merge_sales(&sales, &store, &cashier).expect("merge");
    assert_eq!(merged.height(), 1);
    assert_eq!(merged.column("StoreName")?.str()?.get(0), Some("South"));
    Ok(())
}

#[test]
fn missing_store_key_names_the_dataset() -> PolarsResult<()> {
    let sales = df!(
        "Amount" => [10.0],
        "StoreID" => [1i64],
        "CashierId" => [9i64],
    )?;
    let store = df!("StoreName" => ["North"])?;
    let (_, cashier) = references()?;

    let err = merge_sales(&sales, &store, &cashier).expect_err("must fail");
    assert!(matches!(
        err,
        EtlError::MissingColumn {
            dataset: Dataset::Store,
            column: "StoreID"
        }
    ));
    Ok(())
}

#[test]
fn missing_sales_cashier_key_is_fatal() -> PolarsResult<()> {
    let sales = df!(
        "Amount" => [10.0],
        "StoreID" => [1i64],
    )?;
    let (store, cashier) = references()?;

    let err = merge_sales(&sales, &store, &cashier).expect_err("must fail");
    assert!(matches!(
        err,
        EtlError::MissingColumn {
            dataset: Dataset::Sales,
            column: "CashierId"
        }
    ));
    Ok(())
}
