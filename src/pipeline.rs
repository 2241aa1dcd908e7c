//! Aggregation of a feature collection around a mainshock.
//!
//! A run walks the feed once, in feed order (ascending time), and derives for
//! every event its age, distance and direction from the mainshock, magnitude
//! bucket and summary-list membership. Aftershock and historical runs also
//! fill the magnitude-time histograms. Every run builds its own state, so
//! concurrent runs never share anything mutable.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::age::{Age, AgeClassifier};
use crate::bins::{MagnitudeTimeBins, Period, elapsed_days};
use crate::classify::{SummaryClassifier, Thresholds};
use crate::config::{FeatureKind, QueryParams};
use crate::geodesy::{self, Compass, Point};
use crate::models::{EarthquakeEvent, Feature, Mainshock};

/// Milliseconds in one day, for fractional day counts.
const MS_PER_DAY: f64 = 86_400_000.0;

/// An event together with everything derived from it during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedEvent {
    pub event: EarthquakeEvent,
    pub age: Age,
    /// Magnitude rounded to one decimal
    pub magnitude: f64,
    /// Floor of the rounded magnitude
    pub magnitude_bucket: i64,
    /// Distance from the mainshock epicenter, rounded to one decimal
    pub distance_km: f64,
    pub bearing_degrees: f64,
    pub direction: Compass,
    pub in_summary: bool,
}

/// The result of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub kind: FeatureKind,
    /// Every well-formed event, in feed order
    pub events: Vec<ClassifiedEvent>,
    /// Events that qualify for the summary list, most recent first
    pub summary: Vec<ClassifiedEvent>,
    pub bins: MagnitudeTimeBins,
    /// Latest event of an aftershock run
    pub most_recent_aftershock: Option<ClassifiedEvent>,
    /// Set when a summary-list event has no local-time offset and must be shown in UTC
    pub uses_utc_fallback: bool,
    pub thresholds: Thresholds,
    /// Days from the mainshock to now, rounded to one decimal (aftershock runs)
    pub sequence_duration_days: Option<f64>,
    /// Records dropped because they were malformed
    pub skipped: usize,
}

/// Mutable state for a single run.
#[derive(Debug, Default)]
struct RunState {
    events: Vec<ClassifiedEvent>,
    summary: Vec<ClassifiedEvent>,
    bins: MagnitudeTimeBins,
    most_recent_aftershock: Option<ClassifiedEvent>,
    uses_utc_fallback: bool,
    skipped: usize,
}

/// Aggregates feed records for one feature around one mainshock.
#[derive(Debug, Clone)]
pub struct Aggregator {
    mainshock: Mainshock,
    kind: FeatureKind,
    now: DateTime<Utc>,
    ages: AgeClassifier,
    classifier: SummaryClassifier,
}

impl Aggregator {
    #[must_use]
    pub fn new(
        mainshock: Mainshock,
        kind: FeatureKind,
        params: &QueryParams,
        now: DateTime<Utc>,
    ) -> Self {
        let thresholds = Thresholds::effective(mainshock.magnitude, params);
        Self {
            ages: AgeClassifier::new(mainshock.time, now),
            classifier: SummaryClassifier::new(mainshock.time, thresholds),
            mainshock,
            kind,
            now,
        }
    }

    /// Run the aggregation over `features`, which must be in ascending time order.
    ///
    /// Malformed records are skipped and counted; they never abort the run.
    #[instrument(skip_all, fields(kind = self.kind.as_str(), records = features.len()))]
    pub fn run(&self, features: &[Feature]) -> Aggregation {
        let mut state = RunState::default();

        for feature in features {
            match feature.to_event() {
                Ok(event) => self.fold(&mut state, event),
                Err(e) => {
                    warn!("skipping record: {e}");
                    state.skipped += 1;
                }
            }
        }

        // Accumulated oldest first; the summary table shows newest first
        state.summary.reverse();

        info!(
            "aggregated {} events ({} in summary, {} skipped)",
            state.events.len(),
            state.summary.len(),
            state.skipped
        );

        Aggregation {
            kind: self.kind,
            events: state.events,
            summary: state.summary,
            bins: state.bins,
            most_recent_aftershock: state.most_recent_aftershock,
            uses_utc_fallback: state.uses_utc_fallback,
            thresholds: self.classifier.thresholds(),
            sequence_duration_days: (self.kind == FeatureKind::Aftershocks)
                .then(|| self.sequence_duration_days()),
            skipped: state.skipped,
        }
    }

    fn fold(&self, state: &mut RunState, event: EarthquakeEvent) {
        let classified = self.classify(event);

        if classified.in_summary {
            if classified.event.utc_offset_minutes.is_none() {
                state.uses_utc_fallback = true;
            }
            state.summary.push(classified.clone());
        }

        let time = classified.event.time;
        let bucket = classified.magnitude_bucket;
        match self.kind {
            FeatureKind::Aftershocks => {
                let since_mainshock = elapsed_days(self.mainshock.time, time);
                state.bins.add(Period::First, bucket, since_mainshock);
                let before_now = elapsed_days(time, self.now);
                state.bins.add(Period::Past, bucket, before_now);

                // Feed is ascending, so the last write is the latest event
                state.most_recent_aftershock = Some(classified.clone());
            }
            FeatureKind::Historical => {
                let before_mainshock = elapsed_days(time, self.mainshock.time);
                state.bins.add(Period::Prior, bucket, before_mainshock);
            }
            FeatureKind::Mainshock | FeatureKind::Foreshocks => {}
        }

        state.events.push(classified);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn classify(&self, event: EarthquakeEvent) -> ClassifiedEvent {
        let epicenter = Point::new(self.mainshock.latitude, self.mainshock.longitude);
        let location = Point::new(event.latitude, event.longitude);
        let bearing = geodesy::bearing_degrees(epicenter, location);
        let magnitude = geodesy::round1(event.magnitude);

        ClassifiedEvent {
            age: self.ages.classify(event.time),
            magnitude,
            magnitude_bucket: magnitude.floor() as i64,
            distance_km: geodesy::round1(geodesy::distance_km(epicenter, location)),
            bearing_degrees: bearing,
            direction: Compass::from_bearing(bearing),
            in_summary: self.classifier.includes(&event),
            event,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn sequence_duration_days(&self) -> f64 {
        let ms = (self.now - self.mainshock.time).num_milliseconds();
        geodesy::round1(ms as f64 / MS_PER_DAY)
    }
}
