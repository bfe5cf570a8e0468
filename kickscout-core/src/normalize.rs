//! Declarative column normalization for collaborator payloads.
//!
//! Squad and market payloads drift in naming between API versions (`prob`
//! vs `s11_prob`) and joins add `_x`/`_y` suffixes to colliding columns.
//! Each [`ColumnRule`] names the canonical column and the source names it
//! may arrive under, in precedence order. Rules are applied in table order.

use polars::prelude::*;
use tracing::trace;

use crate::schema::columns::{MV, MV_CHANGE_YESTERDAY, S_11_PROB};
use crate::schema::has_column;

/// One canonical column and the source names it may arrive under.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub canonical: &'static str,
    /// Source names, highest precedence first. The first one present is
    /// renamed to `canonical`, replacing any column already called that.
    pub candidates: &'static [&'static str],
}

/// Normalization table shared by the squad and market reports.
///
/// `mv_x` is the reporting-table side of a join collision; the reporting
/// value wins over whatever the payload carried. Only a bare `mv_change_1d`
/// feeds `mv_change_yesterday`: when both sides carry it the suffixed pair
/// is left alone and the column comes out null.
pub const REPORT_RULES: &[ColumnRule] = &[
    ColumnRule {
        canonical: MV,
        candidates: &["mv_x"],
    },
    ColumnRule {
        canonical: S_11_PROB,
        candidates: &["prob", "s11_prob"],
    },
    ColumnRule {
        canonical: MV_CHANGE_YESTERDAY,
        candidates: &["mv_change_1d"],
    },
];

impl ColumnRule {
    /// First candidate present in `df`.
    pub fn source_in(&self, df: &DataFrame) -> Option<&'static str> {
        self.candidates
            .iter()
            .copied()
            .find(|candidate| has_column(df, candidate))
    }

    /// Apply this rule to `df` in place.
    ///
    /// If no candidate is present and the canonical column is absent too, a
    /// Float64 all-null column is created.
    pub fn apply(&self, df: &mut DataFrame) -> PolarsResult<()> {
        match self.source_in(df) {
            Some(source) => {
                if has_column(df, self.canonical) {
                    df.drop_in_place(self.canonical)?;
                }
                trace!(from = source, to = self.canonical, "renaming column");
                df.rename(source, self.canonical.into())?;
            }
            None if !has_column(df, self.canonical) => {
                let height = df.height();
                df.with_column(Column::full_null(
                    self.canonical.into(),
                    height,
                    &DataType::Float64,
                ))?;
            }
            None => {}
        }
        Ok(())
    }
}

/// Apply every rule of `rules` to `df`, in order.
pub fn normalize(df: &mut DataFrame, rules: &[ColumnRule]) -> PolarsResult<()> {
    for rule in rules {
        rule.apply(df)?;
    }
    Ok(())
}
