//! Market (bidding) report: predictions for players listed on the transfer
//! market, with time left on each listing.

use chrono::DateTime;
use chrono_tz::Tz;
use polars::prelude::*;
use tracing::{debug, info};

use super::join::inner_join;
use crate::clock::{hours_until_listing_rollover, Clock};
use crate::data::{records_to_frame, MarketProvider};
use crate::error::ReportError;
use crate::normalize::{normalize, REPORT_RULES};
use crate::round2;
use crate::schema::columns::{
    EXPIRING_TODAY, EXPIRY_SECS, HOURS_TO_EXP, MARKET_PLAYER_ID, PLAYER_ID, PREDICTED_MV_TARGET,
};
use crate::schema::{column_names, has_column, ReportSchema};

/// Listings whose predicted target is at or below this are not worth a bid.
pub const MIN_ACTIONABLE_TARGET: f64 = 5000.0;

/// Fetch open listings and reconcile them against the prediction table.
pub fn reconcile_market(
    predictions: &DataFrame,
    provider: &dyn MarketProvider,
    clock: &dyn Clock,
    token: &str,
    league_id: &str,
) -> Result<DataFrame, ReportError> {
    let listings = provider.players_on_market(token, league_id)?;
    let listings = records_to_frame(&listings)?;
    join_market(predictions, &listings, &clock.now())
}

/// Join the prediction table to an already-fetched listings table.
pub fn join_market(
    predictions: &DataFrame,
    listings: &DataFrame,
    now: &DateTime<Tz>,
) -> Result<DataFrame, ReportError> {
    let mut bids = inner_join(predictions, listings, PLAYER_ID, MARKET_PLAYER_ID)?;

    let hours = hours_to_expiry(&bids)?;
    let expiring = expiring_today(&hours, hours_until_listing_rollover(now))?;
    bids.with_column(hours)?;
    bids.with_column(expiring)?;

    let mut bids = if has_column(&bids, PREDICTED_MV_TARGET) {
        bids.lazy()
            .filter(col(PREDICTED_MV_TARGET).gt(lit(MIN_ACTIONABLE_TARGET)))
            .sort(
                [PREDICTED_MV_TARGET],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .collect()?
    } else {
        bids
    };

    normalize(&mut bids, REPORT_RULES)?;
    let bids = ReportSchema::project(&bids, &ReportSchema::market())?;

    debug!(columns = ?column_names(&bids), "market report columns");
    info!(
        listings = listings.height(),
        actionable = bids.height(),
        "reconciled market"
    );
    Ok(bids)
}

/// `round(exp / 3600, 2)`, or all-null when listings carry no `exp`.
fn hours_to_expiry(bids: &DataFrame) -> PolarsResult<Column> {
    if !has_column(bids, EXPIRY_SECS) {
        return Ok(Column::full_null(
            HOURS_TO_EXP.into(),
            bids.height(),
            &DataType::Float64,
        ));
    }

    let secs = bids.column(EXPIRY_SECS)?.cast(&DataType::Float64)?;
    let hours: Float64Chunked = secs
        .f64()?
        .into_iter()
        .map(|s| s.map(|s| round2(s / 3600.0)))
        .collect();
    Ok(hours.with_name(HOURS_TO_EXP.into()).into_column())
}

/// `hours_to_exp < hours_left`; a null expiry counts as not expiring.
fn expiring_today(hours: &Column, hours_left: f64) -> PolarsResult<Column> {
    let flags: BooleanChunked = hours
        .f64()?
        .into_iter()
        .map(|h| Some(h.is_some_and(|h| h < hours_left)))
        .collect();
    Ok(flags.with_name(EXPIRING_TODAY.into()).into_column())
}
