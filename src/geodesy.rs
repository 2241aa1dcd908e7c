//! Great-circle distance, bearing, and compass direction between two points.

use std::f64::consts::PI;

use serde::Serialize;

/// Earth radius in kilometers for haversine calculations.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Calculate the great-circle distance between two points using the haversine formula.
///
/// Returns distance in kilometers.
#[must_use]
pub fn distance_km(a: Point, b: Point) -> f64 {
    let lat1_rad = a.latitude * PI / 180.0;
    let lat2_rad = b.latitude * PI / 180.0;
    let delta_lat = (b.latitude - a.latitude) * PI / 180.0;
    let delta_lon = (b.longitude - a.longitude) * PI / 180.0;

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Initial bearing from `a` to `b`, in degrees clockwise from north, in `[0, 360)`.
#[must_use]
pub fn bearing_degrees(a: Point, b: Point) -> f64 {
    let lat1_rad = a.latitude.to_radians();
    let lat2_rad = b.latitude.to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let y = delta_lon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();

    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if bearing >= 360.0 { 0.0 } else { bearing }
}

/// One of the 8 principal compass directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Compass {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Compass {
    const SECTORS: [Self; 8] = [
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
    ];

    /// Map a bearing onto its 45° sector.
    ///
    /// Sectors are centered on the labels, so boundaries sit at 22.5° + k·45°.
    /// A bearing exactly on a boundary belongs to the next sector clockwise.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_bearing(bearing: f64) -> Self {
        let shifted = (bearing + 22.5).rem_euclid(360.0);
        let index = (shifted / 45.0).floor() as usize;
        Self::SECTORS[index % Self::SECTORS.len()]
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NE => "NE",
            Self::E => "E",
            Self::SE => "SE",
            Self::S => "S",
            Self::SW => "SW",
            Self::W => "W",
            Self::NW => "NW",
        }
    }
}

impl std::fmt::Display for Compass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round to one decimal place, ties toward positive infinity.
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0
}
