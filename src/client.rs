//! USGS FDSN event service client.
//!
//! Loads the mainshock and the feature collections around it. Uses blocking
//! reqwest with rustls for TLS. Nothing here is needed by the aggregation
//! core, which only ever sees the parsed records.

use std::time::Duration;

use chrono::{DateTime, Months, Utc};
use reqwest::blocking::Client;
use tracing::{debug, instrument};

use crate::config::{FeatureKind, QueryParams};
use crate::errors::QuakeseqError;
use crate::models::{Feature, FeatureCollection, Mainshock};

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("quakeseq/", env!("CARGO_PKG_VERSION"));

/// USGS base URL for the FDSN event service.
const USGS_BASE_URL: &str = "https://earthquake.usgs.gov";

/// Timestamp format accepted by the FDSN `starttime`/`endtime` parameters.
const FDSN_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Client for the USGS FDSN event service.
pub struct UsgsClient {
    client: Client,
    base_url: String,
}

impl UsgsClient {
    /// Create a new USGS client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, QuakeseqError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: USGS_BASE_URL.to_string(),
        })
    }

    /// Fetch the detail record of a single event.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or response cannot be parsed.
    #[instrument(skip(self))]
    pub fn fetch_mainshock(&self, eventid: &str) -> Result<Feature, QuakeseqError> {
        let url = mainshock_url(&self.base_url, eventid);
        let body = self.get(&url)?;
        let feature: Feature = serde_json::from_str(&body)?;
        if feature.type_ != "Feature" {
            return Err(QuakeseqError::InvalidResponse(format!(
                "expected type 'Feature', got '{}'",
                feature.type_
            )));
        }
        Ok(feature)
    }

    /// Fetch the events of one feature collection around `mainshock`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or response cannot be parsed.
    #[instrument(skip(self, mainshock, params))]
    pub fn fetch_feature(
        &self,
        mainshock: &Mainshock,
        kind: FeatureKind,
        params: &QueryParams,
    ) -> Result<FeatureCollection, QuakeseqError> {
        let url = feature_url(&self.base_url, mainshock, kind, params)?;
        let body = self.get(&url)?;
        let feed: FeatureCollection = serde_json::from_str(&body)?;

        // Validate response structure
        feed.validate()?;

        debug!(
            "fetched {} records, feed reports {}",
            feed.features.len(),
            feed.count()
        );
        Ok(feed)
    }

    fn get(&self, url: &str) -> Result<String, QuakeseqError> {
        debug!("fetching {}", url);

        let response = self.client.get(url).send()?;

        // Check status before parsing
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(QuakeseqError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.text()?)
    }
}

/// Detail feed URL for one event.
#[must_use]
pub fn mainshock_url(base_url: &str, eventid: &str) -> String {
    format!("{base_url}/fdsnws/event/1/query?eventid={eventid}&format=geojson")
}

/// Query URL for a feature collection around `mainshock`.
///
/// # Errors
///
/// Returns [`QuakeseqError::InvalidInput`] for the mainshock kind, which has
/// no collection of its own, or if the lookback window falls outside the
/// representable date range.
pub fn feature_url(
    base_url: &str,
    mainshock: &Mainshock,
    kind: FeatureKind,
    params: &QueryParams,
) -> Result<String, QuakeseqError> {
    let out_of_range = || QuakeseqError::InvalidInput("lookback window out of range".into());
    let second = chrono::Duration::seconds(1);

    let (starttime, endtime) = match kind {
        FeatureKind::Mainshock => {
            return Err(QuakeseqError::InvalidInput(
                "the mainshock is loaded by event id, not by query".into(),
            ));
        }
        FeatureKind::Aftershocks => (mainshock.time + second, None),
        FeatureKind::Foreshocks => (
            mainshock.time - chrono::Duration::days(i64::from(params.foreshock_days)),
            Some(mainshock.time - second),
        ),
        FeatureKind::Historical => (
            mainshock
                .time
                .checked_sub_months(Months::new(params.historical_years.saturating_mul(12)))
                .ok_or_else(out_of_range)?,
            Some(mainshock.time),
        ),
    };

    let query = params.query(kind);
    let mut pairs = vec![
        "format=geojson".to_string(),
        "orderby=time-asc".to_string(),
        format!("latitude={}", mainshock.latitude),
        format!("longitude={}", mainshock.longitude),
        format!("maxradiuskm={}", query.max_radius_km),
        format!("minmagnitude={}", query.min_magnitude),
        format!("starttime={}", fdsn_time(starttime)),
    ];
    if let Some(end) = endtime {
        pairs.push(format!("endtime={}", fdsn_time(end)));
    }

    Ok(format!("{base_url}/fdsnws/event/1/query?{}", pairs.join("&")))
}

fn fdsn_time(time: DateTime<Utc>) -> String {
    time.format(FDSN_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn mainshock() -> Mainshock {
        Mainshock {
            id: "ak20419010".into(),
            magnitude: 7.1,
            time: Utc.with_ymd_and_hms(2018, 11, 30, 17, 29, 29).unwrap(),
            latitude: 61.346,
            longitude: -149.955,
            depth_km: 46.7,
        }
    }

    #[test]
    fn test_mainshock_url() {
        assert_eq!(
            mainshock_url(USGS_BASE_URL, "ak20419010"),
            "https://earthquake.usgs.gov/fdsnws/event/1/query?eventid=ak20419010&format=geojson"
        );
    }

    #[test]
    fn test_aftershocks_url() {
        let ms = mainshock();
        let params = QueryParams::for_mainshock(ms.magnitude);
        let url = feature_url(USGS_BASE_URL, &ms, FeatureKind::Aftershocks, &params).unwrap();
        assert!(url.starts_with(
            "https://earthquake.usgs.gov/fdsnws/event/1/query?format=geojson&orderby=time-asc"
        ));
        assert!(url.contains("latitude=61.346&longitude=-149.955"));
        assert!(url.contains("maxradiuskm=150"));
        assert!(url.contains("minmagnitude=0"));
        assert!(url.contains("starttime=2018-11-30T17:29:30"));
        assert!(!url.contains("endtime"));
    }

    #[test]
    fn test_historical_url() {
        let ms = mainshock();
        let params = QueryParams::for_mainshock(ms.magnitude);
        let url = feature_url(USGS_BASE_URL, &ms, FeatureKind::Historical, &params).unwrap();
        assert!(url.contains("starttime=2008-11-30T17:29:29"));
        assert!(url.contains("endtime=2018-11-30T17:29:29"));
        assert!(url.contains("minmagnitude=5"));
    }

    #[test]
    fn test_foreshocks_url() {
        let ms = mainshock();
        let params = QueryParams::for_mainshock(ms.magnitude);
        let url = feature_url(USGS_BASE_URL, &ms, FeatureKind::Foreshocks, &params).unwrap();
        assert!(url.contains("starttime=2018-10-31T17:29:29"));
        assert!(url.contains("endtime=2018-11-30T17:29:28"));
        assert!(url.contains("minmagnitude=1"));
    }

    #[test]
    fn test_mainshock_kind_has_no_query() {
        let ms = mainshock();
        let params = QueryParams::for_mainshock(ms.magnitude);
        assert!(feature_url(USGS_BASE_URL, &ms, FeatureKind::Mainshock, &params).is_err());
    }
}
