//! Magnitude × elapsed-time histograms.
//!
//! Each (period, magnitude bucket) pair owns five nested counters. An event
//! always bumps `total`, then cascades from the coarsest horizon to the
//! finest, stopping at the first horizon it falls outside of.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Milliseconds in one day.
const MS_PER_DAY: i64 = 86_400_000;

/// Which series a bin belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Period {
    /// Days since the mainshock (aftershocks)
    First,
    /// Days before now (aftershocks)
    Past,
    /// Days before the mainshock (historical seismicity)
    Prior,
}

impl Period {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "First",
            Self::Past => "Past",
            Self::Prior => "Prior",
        }
    }
}

/// Counters for one (period, magnitude bucket) pair.
///
/// `day <= week <= month <= year <= total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Bin {
    pub total: u32,
    pub year: u32,
    pub month: u32,
    pub week: u32,
    pub day: u32,
}

impl Bin {
    fn add(&mut self, days: i64) {
        self.total += 1;
        if days <= 365 {
            self.year += 1;
            if days <= 30 {
                self.month += 1;
                if days <= 7 {
                    self.week += 1;
                    if days <= 1 {
                        self.day += 1;
                    }
                }
            }
        }
    }
}

/// Histograms for every period seen in one aggregation run.
///
/// Bins are created lazily and iterate in ascending magnitude order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MagnitudeTimeBins {
    periods: BTreeMap<Period, BTreeMap<i64, Bin>>,
}

impl MagnitudeTimeBins {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event that is `days` whole days from the period's reference instant.
    pub fn add(&mut self, period: Period, magnitude_bucket: i64, days: i64) {
        self.periods
            .entry(period)
            .or_default()
            .entry(magnitude_bucket)
            .or_default()
            .add(days);
    }

    /// Rows for `period`, ascending by magnitude bucket.
    pub fn rows(&self, period: Period) -> impl Iterator<Item = (i64, &Bin)> {
        self.periods
            .get(&period)
            .into_iter()
            .flat_map(|bins| bins.iter().map(|(mag, bin)| (*mag, bin)))
    }

    #[must_use]
    pub fn get(&self, period: Period, magnitude_bucket: i64) -> Option<&Bin> {
        self.periods.get(&period)?.get(&magnitude_bucket)
    }

    /// Whether any event was folded into `period`.
    #[must_use]
    pub fn has_period(&self, period: Period) -> bool {
        self.periods.get(&period).is_some_and(|bins| !bins.is_empty())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// Whole days from `from` to `to`, floored (negative when `to` is earlier).
#[must_use]
pub fn elapsed_days(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_milliseconds().div_euclid(MS_PER_DAY)
}
