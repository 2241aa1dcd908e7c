//! Summary-list inclusion rules.
//!
//! Which events make it into the summary table depends on the mainshock
//! magnitude, the user's minimum magnitude for the feature, and whether the
//! event happened before or after the mainshock.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::QueryParams;
use crate::models::EarthquakeEvent;

/// Magnitude thresholds for the summary list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    /// Applied to events after the mainshock
    pub aftershocks: f64,
    /// Applied to events before the mainshock
    pub historical: f64,
}

impl Thresholds {
    /// Thresholds implied by the mainshock magnitude alone.
    #[must_use]
    pub fn for_mainshock(magnitude: f64) -> Self {
        Self {
            aftershocks: (magnitude - 2.5).floor(),
            historical: (magnitude - 1.0).floor(),
        }
    }

    /// Raise each threshold to the user's configured minimum where that is higher.
    #[must_use]
    pub fn effective(magnitude: f64, params: &QueryParams) -> Self {
        let base = Self::for_mainshock(magnitude);
        Self {
            aftershocks: base.aftershocks.max(params.aftershocks.min_magnitude),
            historical: base.historical.max(params.historical.min_magnitude),
        }
    }
}

/// Decides summary-list membership for events around one mainshock.
#[derive(Debug, Clone, Copy)]
pub struct SummaryClassifier {
    mainshock_time: DateTime<Utc>,
    thresholds: Thresholds,
}

impl SummaryClassifier {
    #[must_use]
    pub const fn new(mainshock_time: DateTime<Utc>, thresholds: Thresholds) -> Self {
        Self {
            mainshock_time,
            thresholds,
        }
    }

    #[must_use]
    pub const fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Whether `event` belongs in the summary list.
    ///
    /// The mainshock itself always qualifies regardless of magnitude.
    #[must_use]
    pub fn includes(&self, event: &EarthquakeEvent) -> bool {
        (event.time > self.mainshock_time && event.magnitude >= self.thresholds.aftershocks)
            || (event.time < self.mainshock_time && event.magnitude >= self.thresholds.historical)
            || event.time == self.mainshock_time
    }
}
