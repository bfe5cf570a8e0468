//! Squad report: predictions for the players the manager currently owns.

use polars::prelude::*;
use tracing::{debug, info};

use super::join::inner_join;
use crate::data::{records_to_frame, SquadProvider};
use crate::error::ReportError;
use crate::normalize::{normalize, REPORT_RULES};
use crate::schema::columns::{PLAYER_ID, SQUAD_PLAYER_ID};
use crate::schema::{column_names, ReportSchema};

/// Fetch the squad and reconcile it against the prediction table.
///
/// `token` and `league_id` are passed through to the provider untouched.
pub fn reconcile_squad(
    predictions: &DataFrame,
    provider: &dyn SquadProvider,
    token: &str,
    league_id: &str,
) -> Result<DataFrame, ReportError> {
    let payload = provider.players_in_squad(token, league_id)?;
    let roster = records_to_frame(payload.roster())?;
    join_squad(predictions, &roster)
}

/// Join the prediction table to an already-fetched roster table.
pub fn join_squad(predictions: &DataFrame, roster: &DataFrame) -> Result<DataFrame, ReportError> {
    let mut squad = inner_join(predictions, roster, PLAYER_ID, SQUAD_PLAYER_ID)?;
    normalize(&mut squad, REPORT_RULES)?;
    let squad = ReportSchema::project(&squad, &ReportSchema::squad())?;

    debug!(columns = ?column_names(&squad), "squad report columns");
    info!(
        roster = roster.height(),
        matched = squad.height(),
        "reconciled squad"
    );
    Ok(squad)
}
