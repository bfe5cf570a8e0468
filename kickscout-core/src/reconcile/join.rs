//! Inner join between the prediction table and a collaborator table.
//!
//! Join semantics:
//! - keys are compared as text, so `123`, `123.0` and `"123"` match
//! - non-key columns present on both sides are suffixed `_x` (prediction
//!   side) and `_y` (collaborator side)
//! - row order follows the prediction table
//! - unmatched rows on either side are dropped

use polars::prelude::*;

use crate::schema::has_column;

const LEFT_ROW: &str = "__left_row";

/// Inner join `left.left_key == right.right_key`.
///
/// A right table without `right_key` (e.g. built from an empty payload)
/// yields an empty result rather than an error.
pub fn inner_join(
    left: &DataFrame,
    right: &DataFrame,
    left_key: &str,
    right_key: &str,
) -> PolarsResult<DataFrame> {
    let mut left = left.clone();
    let mut right = right.clone();

    if !has_column(&right, right_key) {
        let height = right.height();
        right.with_column(Column::full_null(right_key.into(), height, &DataType::String))?;
    }

    suffix_collisions(&mut left, &mut right, left_key, right_key)?;
    key_as_text(&mut left, left_key)?;
    key_as_text(&mut right, right_key)?;

    let left = left.with_row_index(LEFT_ROW.into(), None)?;
    let joined = left
        .lazy()
        .join(
            right.lazy(),
            [col(left_key)],
            [col(right_key)],
            JoinArgs::new(JoinType::Inner),
        )
        .sort(
            [LEFT_ROW],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    joined.drop(LEFT_ROW)
}

/// Rename columns that exist on both sides, pandas-merge style.
fn suffix_collisions(
    left: &mut DataFrame,
    right: &mut DataFrame,
    left_key: &str,
    right_key: &str,
) -> PolarsResult<()> {
    let shared: Vec<String> = right
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != right_key && has_column(left, name.as_str()))
        .map(|name| name.to_string())
        .collect();

    for name in shared {
        if name != left_key {
            left.rename(&name, format!("{name}_x").into())?;
        }
        right.rename(&name, format!("{name}_y").into())?;
    }
    Ok(())
}

/// Replace the key column with its text form. Float keys go through Int64
/// first so `7.0` becomes `"7"`.
fn key_as_text(df: &mut DataFrame, key: &str) -> PolarsResult<()> {
    let column = df.column(key)?;
    let text = match column.dtype() {
        DataType::String => return Ok(()),
        dtype if dtype.is_float() => column.cast(&DataType::Int64)?.cast(&DataType::String)?,
        _ => column.cast(&DataType::String)?,
    };
    df.with_column(text)?;
    Ok(())
}
