//! Data models for USGS GeoJSON feeds and the event records aggregated from them.
//!
//! The feed structures mirror the FDSN event service GeoJSON output. They are
//! lenient: a record that is missing fields, or that does not parse at all,
//! stays in the collection and is rejected on its own when it is converted
//! into an [`EarthquakeEvent`].

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::QuakeseqError;

/// Top-level GeoJSON response from FDSN queries.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    /// Always "FeatureCollection"
    #[serde(rename = "type")]
    pub type_: String,

    /// Feed metadata
    #[serde(default)]
    pub metadata: Option<Metadata>,

    /// Earthquake events, ascending by time when queried with `orderby=time-asc`
    #[serde(deserialize_with = "deserialize_features")]
    pub features: Vec<Feature>,
}

fn deserialize_features<'de, D>(deserializer: D) -> Result<Vec<Feature>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values.into_iter().map(Feature::from_value).collect())
}

impl FeatureCollection {
    /// Validate the response structure.
    pub fn validate(&self) -> Result<(), QuakeseqError> {
        if self.type_ != "FeatureCollection" {
            return Err(QuakeseqError::InvalidResponse(format!(
                "expected type 'FeatureCollection', got '{}'",
                self.type_
            )));
        }
        Ok(())
    }

    /// Number of events reported by the feed, falling back to the feature count.
    #[must_use]
    pub fn count(&self) -> usize {
        self.metadata
            .as_ref()
            .map_or(self.features.len(), |m| m.count)
    }
}

/// Metadata about the feed response.
#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    /// Number of events in response
    #[serde(default)]
    pub count: usize,
}

/// A single earthquake record as delivered by the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    /// Always "Feature"
    #[serde(rename = "type", default)]
    pub type_: String,

    /// Unique event ID
    #[serde(default)]
    pub id: String,

    /// Geographic location
    #[serde(default)]
    pub geometry: Option<Geometry>,

    /// Event properties
    #[serde(default)]
    pub properties: Properties,

    /// Why the record could not be parsed, when it could not
    #[serde(skip)]
    pub parse_error: Option<String>,
}

impl Feature {
    /// Parse one feed record, keeping records that fail to parse as
    /// placeholders that carry the parse error.
    fn from_value(value: Value) -> Self {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        serde_json::from_value(value).unwrap_or_else(|e: serde_json::Error| Self {
            type_: "Feature".into(),
            id,
            geometry: None,
            properties: Properties::default(),
            parse_error: Some(e.to_string()),
        })
    }

    /// Get the event time as a `DateTime<Utc>`.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.properties
            .time
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    /// Convert into an [`EarthquakeEvent`].
    ///
    /// # Errors
    ///
    /// Returns [`QuakeseqError::MalformedEvent`] when the record did not
    /// parse, or has no magnitude, no usable origin time, or fewer than three
    /// coordinates.
    pub fn to_event(&self) -> Result<EarthquakeEvent, QuakeseqError> {
        let malformed = |reason: String| QuakeseqError::MalformedEvent {
            id: self.id.clone(),
            reason,
        };
        if let Some(error) = &self.parse_error {
            return Err(malformed(error.clone()));
        }

        let coords = self
            .geometry
            .as_ref()
            .map(|g| g.coordinates.as_slice())
            .unwrap_or_default();
        let &[longitude, latitude, depth_km, ..] = coords else {
            return Err(malformed(format!(
                "expected 3 coordinates, got {}",
                coords.len()
            )));
        };
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(malformed("non-finite coordinates".into()));
        }

        let magnitude = self
            .properties
            .mag
            .filter(|m| m.is_finite())
            .ok_or_else(|| malformed("missing magnitude".into()))?;
        let time = self
            .time()
            .ok_or_else(|| malformed("missing origin time".into()))?;

        Ok(EarthquakeEvent {
            id: self.id.clone(),
            magnitude,
            time,
            latitude,
            longitude,
            depth_km,
            magnitude_type: self
                .properties
                .mag_type
                .clone()
                .unwrap_or_else(|| "M".into()),
            utc_offset_minutes: self.properties.tz,
            place: self.properties.place.clone(),
            status: self.properties.status.clone(),
            url: self.properties.url.clone(),
        })
    }
}

/// Geographic geometry for an event.
#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    /// Always "Point"
    #[serde(rename = "type", default)]
    pub type_: String,

    /// Coordinates: [longitude, latitude, depth_km]
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

/// Event properties used by the aggregation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Properties {
    /// Magnitude value
    pub mag: Option<f64>,

    /// Magnitude type (mb, Ml, Mw, etc.)
    #[serde(rename = "magType")]
    pub mag_type: Option<String>,

    /// Human-readable place description
    pub place: Option<String>,

    /// Event time (ms since epoch)
    pub time: Option<i64>,

    /// Offset of local time at the epicenter from UTC, in minutes
    pub tz: Option<i32>,

    /// Event status: "automatic" or "reviewed"
    pub status: Option<String>,

    /// Event page URL
    pub url: Option<String>,
}

/// The principal event all other events are referenced to.
#[derive(Debug, Clone, Serialize)]
pub struct Mainshock {
    pub id: String,
    pub magnitude: f64,
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: f64,
}

impl TryFrom<&Feature> for Mainshock {
    type Error = QuakeseqError;

    fn try_from(feature: &Feature) -> Result<Self, Self::Error> {
        let event = feature.to_event()?;
        Ok(Self {
            id: event.id,
            magnitude: event.magnitude,
            time: event.time,
            latitude: event.latitude,
            longitude: event.longitude,
            depth_km: event.depth_km,
        })
    }
}

/// A validated earthquake record. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarthquakeEvent {
    pub id: String,
    pub magnitude: f64,
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: f64,
    pub magnitude_type: String,
    pub utc_offset_minutes: Option<i32>,
    pub place: Option<String>,
    pub status: Option<String>,
    pub url: Option<String>,
}
