//! Relative-age classification of events.
//!
//! Each event falls into exactly one category. The checks run in a fixed
//! order: before/at the mainshock first, then the recency windows from the
//! nearest to the farthest.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Age category of an event relative to the mainshock and the current instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Age {
    /// Before the mainshock
    Historical,
    /// Exactly at the mainshock origin time
    Mainshock,
    /// Within the past hour
    PastHour,
    /// Within the past day
    PastDay,
    /// Within the past week
    PastWeek,
    /// Anything else
    Older,
}

impl Age {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Historical => "historical",
            Self::Mainshock => "mainshock",
            Self::PastHour => "pasthour",
            Self::PastDay => "pastday",
            Self::PastWeek => "pastweek",
            Self::Older => "older",
        }
    }
}

/// Classifies event times against a fixed mainshock and "now".
///
/// The recency cut-offs are computed once so every event in a run is judged
/// against the same instants.
#[derive(Debug, Clone, Copy)]
pub struct AgeClassifier {
    mainshock: DateTime<Utc>,
    past_hour: DateTime<Utc>,
    past_day: DateTime<Utc>,
    past_week: DateTime<Utc>,
}

impl AgeClassifier {
    #[must_use]
    pub fn new(mainshock: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            mainshock,
            past_hour: now - Duration::hours(1),
            past_day: now - Duration::days(1),
            past_week: now - Duration::weeks(1),
        }
    }

    #[must_use]
    pub fn classify(&self, event: DateTime<Utc>) -> Age {
        if event < self.mainshock {
            Age::Historical
        } else if event == self.mainshock {
            Age::Mainshock
        } else if event >= self.past_hour {
            Age::PastHour
        } else if event >= self.past_day {
            Age::PastDay
        } else if event >= self.past_week {
            Age::PastWeek
        } else {
            Age::Older
        }
    }
}
