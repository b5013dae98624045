use std::collections::HashMap;

use polars::prelude::*;
use tracing::{info, warn};

use crate::error::Result;
use crate::schema::{has_column, require_column, Dataset, CASHIER_FILL_COLUMNS, CASHIER_ID};

/// Collapses the raw cashier set to one row per `CashierId`.
///
/// Within each id group (groups in order of first appearance, rows in file
/// order) `Name` and `Email` are forward-filled, then backward-filled, and the
/// first row of the group is kept. Rows without an id are dropped.
pub fn reconcile_cashiers(cashier: &DataFrame) -> Result<DataFrame> {
    require_column(cashier, Dataset::Cashier, CASHIER_ID)?;

    let keys = cashier.column(CASHIER_ID)?.cast(&DataType::String)?;
    let groups = group_rows(keys.str()?);

    let without_id = cashier.height() - groups.iter().map(Vec::len).sum::<usize>();
    if without_id > 0 {
        warn!(rows = without_id, "Dropping {without_id} cashier rows without a CashierId");
    }

    let heads: Vec<IdxSize> = groups.iter().map(|rows| rows[0] as IdxSize).collect();
    let mut reconciled = cashier.take(&IdxCa::from_vec("row".into(), heads))?;

    for name in CASHIER_FILL_COLUMNS {
        if !has_column(cashier, name) {
            continue;
        }
        let column = cashier.column(name)?;
        let present = column.is_not_null();

        let sources: Vec<IdxSize> = groups
            .iter()
            .map(|rows| {
                let valid: Vec<bool> = rows
                    .iter()
                    .map(|&row| present.get(row).unwrap_or(false))
                    .collect();
                let head = fill_sources(&valid)
                    .first()
                    .copied()
                    .flatten()
                    .unwrap_or(0);
                rows[head] as IdxSize
            })
            .collect();

        let filled = column.take(&IdxCa::from_vec("row".into(), sources))?;
        reconciled.with_column(filled)?;
    }

    info!(
        input_rows = cashier.height(),
        cashiers = reconciled.height(),
        "Reconciled cashier records"
    );
    Ok(reconciled)
}

/// Row indices per id, groups ordered by first appearance. Null ids form no group.
fn group_rows(keys: &StringChunked) -> Vec<Vec<usize>> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for (row, key) in keys.iter().enumerate() {
        let Some(key) = key else { continue };
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row);
    }

    groups
}

/// For each position in a group, the position whose value it carries after a
/// forward fill followed by a backward fill. `None` when the group has no value.
fn fill_sources(valid: &[bool]) -> Vec<Option<usize>> {
    let mut last = None;
    let forward: Vec<Option<usize>> = valid
        .iter()
        .enumerate()
        .map(|(pos, &is_valid)| {
            if is_valid {
                last = Some(pos);
            }
            last
        })
        .collect();

    let mut next = None;
    let mut filled = forward.clone();
    for pos in (0..forward.len()).rev() {
        match forward[pos] {
            Some(source) => next = Some(source),
            None => filled[pos] = next,
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_fill_runs_before_backward_fill() {
        // Backward-then-forward would give position 2 the value from position 3.
        let filled = fill_sources(&[false, true, false, true, false]);
        assert_eq!(
            filled,
            vec![Some(1), Some(1), Some(1), Some(3), Some(3)]
        );
    }

    #[test]
    fn all_null_group_has_no_source() {
        assert_eq!(fill_sources(&[false, false]), vec![None, None]);
    }

    #[test]
    fn groups_follow_first_appearance() {
        let keys = StringChunked::new(
            "CashierId".into(),
            &[Some("7"), Some("3"), None, Some("7"), Some("3")],
        );
        assert_eq!(group_rows(&keys), vec![vec![0, 3], vec![1, 4]]);
    }
}
