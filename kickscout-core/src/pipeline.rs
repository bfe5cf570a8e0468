//! End-to-end daily run: snapshot → predictions → squad and market reports.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use polars::prelude::DataFrame;
use tracing::info;

use crate::clock::{reporting_date, Clock};
use crate::data::{records_to_frame, select_reporting_day, MarketProvider, SquadProvider};
use crate::error::ReportError;
use crate::model::ValuePredictor;
use crate::predict::predict_and_shape;
use crate::reconcile::{join_market, join_squad};

/// Everything produced by one run.
#[derive(Debug, Clone)]
pub struct DailyReports {
    pub reporting_date: NaiveDate,
    pub generated_at: DateTime<Tz>,
    pub model_name: String,
    pub predictions: DataFrame,
    pub squad: DataFrame,
    pub market: DataFrame,
}

/// Wires the model, collaborators and clock together.
///
/// The clock is read once per run, so the reporting date and the market
/// expiry boundary always agree.
pub struct DailyPipeline<'a> {
    model: &'a dyn ValuePredictor,
    features: &'a [String],
    squad: &'a dyn SquadProvider,
    market: &'a dyn MarketProvider,
    clock: &'a dyn Clock,
}

impl<'a> DailyPipeline<'a> {
    pub fn new(
        model: &'a dyn ValuePredictor,
        features: &'a [String],
        squad: &'a dyn SquadProvider,
        market: &'a dyn MarketProvider,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            model,
            features,
            squad,
            market,
            clock,
        }
    }

    /// Select the reporting day from `snapshot`, score it and shape it.
    pub fn predictions(&self, snapshot: &DataFrame) -> Result<(NaiveDate, DataFrame), ReportError> {
        let day = reporting_date(&self.clock.now());
        let today = select_reporting_day(snapshot, day)?;
        Ok((day, predict_and_shape(&today, self.model, self.features)?))
    }

    /// Full run. Squad and market are fetched with the same token and league.
    pub fn run(
        &self,
        snapshot: &DataFrame,
        token: &str,
        league_id: &str,
    ) -> Result<DailyReports, ReportError> {
        let now = self.clock.now();
        let day = reporting_date(&now);
        info!(%now, %day, league_id, "starting daily run");

        let today = select_reporting_day(snapshot, day)?;
        let predictions = predict_and_shape(&today, self.model, self.features)?;

        let payload = self.squad.players_in_squad(token, league_id)?;
        let squad = join_squad(&predictions, &records_to_frame(payload.roster())?)?;

        let listings = self.market.players_on_market(token, league_id)?;
        let market = join_market(&predictions, &records_to_frame(&listings)?, &now)?;

        Ok(DailyReports {
            reporting_date: day,
            generated_at: now,
            model_name: self.model.name().to_string(),
            predictions,
            squad,
            market,
        })
    }
}
