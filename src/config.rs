//! Run configuration: feature kinds and per-feature query parameters.

use serde::Serialize;

use crate::bins::Period;

/// Which event collection a run aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Mainshock,
    Aftershocks,
    Foreshocks,
    Historical,
}

impl FeatureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mainshock => "mainshock",
            Self::Aftershocks => "aftershocks",
            Self::Foreshocks => "foreshocks",
            Self::Historical => "historical",
        }
    }

    /// Histogram periods filled by this kind of run.
    #[must_use]
    pub const fn periods(self) -> &'static [Period] {
        match self {
            Self::Aftershocks => &[Period::First, Period::Past],
            Self::Historical => &[Period::Prior],
            Self::Mainshock | Self::Foreshocks => &[],
        }
    }

    /// Human-readable layer name.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Mainshock => "Mainshock",
            Self::Aftershocks => "Aftershocks",
            Self::Foreshocks => "Foreshocks",
            Self::Historical => "Historical seismicity",
        }
    }
}

impl std::str::FromStr for FeatureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainshock" => Ok(Self::Mainshock),
            "aftershocks" => Ok(Self::Aftershocks),
            "foreshocks" => Ok(Self::Foreshocks),
            "historical" => Ok(Self::Historical),
            _ => Err(format!(
                "unknown feature: {s} (expected: mainshock, aftershocks, foreshocks, historical)"
            )),
        }
    }
}

/// Query settings for one feature collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureQuery {
    pub min_magnitude: f64,
    pub max_radius_km: f64,
}

/// Query settings for every feature collection around a mainshock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueryParams {
    pub aftershocks: FeatureQuery,
    pub foreshocks: FeatureQuery,
    /// Foreshock lookback before the mainshock
    pub foreshock_days: u32,
    pub historical: FeatureQuery,
    /// Historical lookback before the mainshock
    pub historical_years: u32,
}

impl QueryParams {
    /// Defaults scaled to the mainshock's estimated rupture length.
    ///
    /// Rupture area comes from the Hanks-Bakun magnitude-area relation,
    /// `A = 10^(M-4)`, and length is approximated as `A^0.7`. Radii are rounded
    /// to the nearest 10 km.
    #[must_use]
    pub fn for_mainshock(magnitude: f64) -> Self {
        let rupture_area = 10f64.powf(magnitude - 4.0);
        let rupture_length = rupture_area.powf(0.7);
        let tens = round_half_up(0.1 * rupture_length);

        let nearby = FeatureQuery {
            min_magnitude: 0.0,
            max_radius_km: (10.0 * tens).max(5.0),
        };

        Self {
            aftershocks: nearby,
            foreshocks: FeatureQuery {
                min_magnitude: 1.0,
                ..nearby
            },
            foreshock_days: 30,
            historical: FeatureQuery {
                min_magnitude: round_half_up((magnitude - 2.0).max(4.0)),
                max_radius_km: (15.0 * tens).max(20.0),
            },
            historical_years: 10,
        }
    }

    /// Settings for the given feature; the mainshock shares the aftershock query.
    #[must_use]
    pub const fn query(&self, kind: FeatureKind) -> FeatureQuery {
        match kind {
            FeatureKind::Mainshock | FeatureKind::Aftershocks => self.aftershocks,
            FeatureKind::Foreshocks => self.foreshocks,
            FeatureKind::Historical => self.historical,
        }
    }
}

/// Round half toward positive infinity.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
