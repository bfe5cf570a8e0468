//! KickScout Core: prediction shaping and squad/market reconciliation.
//!
//! This crate turns a daily player snapshot and a fitted value model into
//! three tables:
//! - the prediction table, ranked by predicted market-value target
//! - the squad report, joined against the manager's current roster
//! - the market report, joined against open transfer-market listings
//!
//! Roster and market data come from loosely-schematized collaborator
//! payloads. Their column-name drift is absorbed by a single declarative
//! normalization table (see [`normalize`]).

pub mod clock;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod predict;
pub mod reconcile;
pub mod schema;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, ScoutConfig};
pub use error::ReportError;
pub use model::{LinearModel, ModelError, ValuePredictor};
pub use pipeline::{DailyPipeline, DailyReports};

/// Round half-to-even at two decimals, matching how the upstream notebooks
/// round predicted values and expiry hours.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
