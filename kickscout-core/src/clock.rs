//! League time.
//!
//! Everything time-dependent in the reports is expressed in Europe/Berlin
//! wall-clock time. Two daily boundaries matter:
//! - market values refresh nightly around 22:15, so before that the latest
//!   published values still belong to the previous day
//! - transfer-market listings roll over at 22:00
//!
//! The current time is always injected through [`Clock`] so reports can be
//! reproduced for a pinned instant.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::round2;

/// Time zone the league's daily cycle runs in.
pub const LEAGUE_TZ: Tz = chrono_tz::Europe::Berlin;

/// Seconds after local midnight at which market values are refreshed (22:15).
const VALUE_REFRESH_SECS: u32 = 22 * 3600 + 15 * 60;

/// Seconds after local midnight at which market listings roll over (22:00).
const LISTING_ROLLOVER_SECS: u32 = 22 * 3600;

/// Source of the current league-local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
}

/// Reads the system clock and converts to league time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&LEAGUE_TZ)
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<Tz>);

impl FixedClock {
    pub fn new(at: DateTime<Tz>) -> Self {
        Self(at)
    }

    /// Pin the clock to a league-local wall-clock time.
    ///
    /// Returns `None` for local times skipped by a DST transition. For the
    /// repeated hour in autumn the earlier instant is used.
    pub fn at_local(naive: NaiveDateTime) -> Option<Self> {
        LEAGUE_TZ.from_local_datetime(&naive).earliest().map(Self)
    }

    /// Parse either an RFC 3339 timestamp (any offset) or a naive
    /// `YYYY-MM-DDTHH:MM[:SS]` interpreted as league-local time.
    pub fn parse(input: &str) -> Option<Self> {
        if let Ok(at) = DateTime::parse_from_rfc3339(input) {
            return Some(Self(at.with_timezone(&LEAGUE_TZ)));
        }
        ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
            .and_then(Self::at_local)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        self.0
    }
}

/// Date whose market values the reports describe.
///
/// At or before 22:15 local the nightly refresh has not happened yet, so the
/// newest values are yesterday's.
pub fn reporting_date(now: &DateTime<Tz>) -> NaiveDate {
    let today = now.date_naive();
    let time = now.time();
    let secs = time.num_seconds_from_midnight();
    let before_refresh =
        secs < VALUE_REFRESH_SECS || (secs == VALUE_REFRESH_SECS && time.nanosecond() == 0);

    if before_refresh {
        today.pred_opt().unwrap_or(today)
    } else {
        today
    }
}

/// Hours from `now` until 22:00 local on the same calendar day, rounded to
/// two decimals.
///
/// After 22:00 the result is negative: the boundary is not advanced to the
/// following day. Wall-clock difference, so a DST switch earlier in the day
/// does not shift it.
pub fn hours_until_listing_rollover(now: &DateTime<Tz>) -> f64 {
    let time = now.time();
    let elapsed = f64::from(time.num_seconds_from_midnight())
        + f64::from(time.nanosecond()) / 1_000_000_000.0;
    round2((f64::from(LISTING_ROLLOVER_SECS) - elapsed) / 3600.0)
}
