//! End-to-end runs over inline GeoJSON feeds.

use chrono::{Duration, TimeZone, Utc};

use quakeseq::age::Age;
use quakeseq::bins::Period;
use quakeseq::config::{FeatureKind, QueryParams};
use quakeseq::geodesy::Compass;
use quakeseq::models::{Feature, FeatureCollection, Mainshock};
use quakeseq::{Aggregator, ForecastRequest, calculate};

// 2019-07-06T03:19:53.040Z
const MAINSHOCK_MS: i64 = 1_562_383_193_040;
const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;

const MAINSHOCK_JSON: &str = r#"{
    "type": "Feature",
    "id": "ci38457511",
    "geometry": {"type": "Point", "coordinates": [-117.599, 35.77, 8.0]},
    "properties": {"mag": 7.1, "magType": "mw", "time": 1562383193040, "tz": -420}
}"#;

fn feature_json(id: &str, mag: Option<f64>, offset_ms: i64, lat: f64, tz: Option<i32>) -> String {
    let mag = mag.map_or_else(|| "null".to_string(), |m| m.to_string());
    let tz = tz.map_or_else(|| "null".to_string(), |t| t.to_string());
    format!(
        r#"{{"type": "Feature", "id": "{id}",
            "geometry": {{"type": "Point", "coordinates": [-117.599, {lat}, 5.0]}},
            "properties": {{"mag": {mag}, "magType": "ml", "time": {}, "tz": {tz}}}}}"#,
        MAINSHOCK_MS + offset_ms
    )
}

fn collection(features: &[String]) -> FeatureCollection {
    let json = format!(
        r#"{{"type": "FeatureCollection", "features": [{}]}}"#,
        features.join(",")
    );
    let feed: FeatureCollection = serde_json::from_str(&json).unwrap();
    feed.validate().unwrap();
    feed
}

fn mainshock() -> Mainshock {
    let feature: Feature = serde_json::from_str(MAINSHOCK_JSON).unwrap();
    Mainshock::try_from(&feature).unwrap()
}

#[test]
fn test_aftershock_sequence() {
    let ms = mainshock();
    assert_eq!(ms.time, Utc.timestamp_millis_opt(MAINSHOCK_MS).unwrap());

    let feed = collection(&[
        feature_json("a1", Some(5.4), HOUR_MS, 35.87, Some(-420)),
        feature_json("a2", Some(3.06), 2 * DAY_MS + 6 * HOUR_MS, 35.77, Some(-420)),
        feature_json("a3", None, 2 * DAY_MS + 7 * HOUR_MS, 35.77, Some(-420)),
        feature_json("a4", Some(4.46), 3 * DAY_MS, 35.77, None),
    ]);

    let now = ms.time + Duration::days(10);
    let params = QueryParams::for_mainshock(ms.magnitude);
    let result = Aggregator::new(ms, FeatureKind::Aftershocks, &params, now).run(&feed.features);

    assert_eq!(result.events.len(), 3);
    assert_eq!(result.skipped, 1);
    assert!((result.thresholds.aftershocks - 4.0).abs() < 1e-12);
    assert!((result.thresholds.historical - 6.0).abs() < 1e-12);

    // Newest first, M3.1 left out
    let ids: Vec<&str> = result.summary.iter().map(|e| e.event.id.as_str()).collect();
    assert_eq!(ids, ["a4", "a1"]);
    assert!(result.uses_utc_fallback);

    let a1 = &result.events[0];
    assert!((a1.distance_km - 11.1).abs() < 1e-9);
    assert_eq!(a1.direction, Compass::N);
    assert_eq!(a1.age, Age::Older);

    // Exactly one week before now
    let a4 = &result.events[2];
    assert!((a4.magnitude - 4.5).abs() < 1e-12);
    assert_eq!(a4.magnitude_bucket, 4);
    assert_eq!(a4.age, Age::PastWeek);

    let most_recent = result.most_recent_aftershock.as_ref().unwrap();
    assert_eq!(most_recent.event.id, "a4");

    let first5 = result.bins.get(Period::First, 5).unwrap();
    assert_eq!((first5.total, first5.week, first5.day), (1, 1, 1));
    let past5 = result.bins.get(Period::Past, 5).unwrap();
    assert_eq!((past5.month, past5.week), (1, 0));
    let first3 = result.bins.get(Period::First, 3).unwrap();
    assert_eq!((first3.week, first3.day), (1, 0));
    let past3 = result.bins.get(Period::Past, 3).unwrap();
    assert_eq!((past3.week, past3.day), (1, 0));
    assert!(!result.bins.has_period(Period::Prior));

    let buckets: Vec<i64> = result.bins.rows(Period::First).map(|(m, _)| m).collect();
    assert_eq!(buckets, [3, 4, 5]);

    assert_eq!(result.sequence_duration_days, Some(10.0));
}

#[test]
fn test_incomplete_records_are_skipped_not_fatal() {
    let ms = mainshock();
    let good = feature_json("a1", Some(5.4), HOUR_MS, 35.87, Some(-420));
    let later = feature_json("a2", Some(4.8), 2 * HOUR_MS, 35.77, Some(-420));
    let broken = [
        format!(
            r#"{{"type": "Feature", "id": "nocoords",
                "geometry": {{"type": "Point"}},
                "properties": {{"mag": 4.0, "time": {}}}}}"#,
            MAINSHOCK_MS + HOUR_MS + 1
        ),
        r#"{"type": "Feature", "id": "noprops",
            "geometry": {"type": "Point", "coordinates": [-117.599, 35.77, 5.0]}}"#
            .to_string(),
        format!(
            r#"{{"type": "Feature", "id": "badmag",
                "geometry": {{"type": "Point", "coordinates": [-117.599, 35.77, 5.0]}},
                "properties": {{"mag": "big", "time": {}}}}}"#,
            MAINSHOCK_MS + HOUR_MS + 2
        ),
    ];

    let now = ms.time + Duration::days(1);
    let params = QueryParams::for_mainshock(ms.magnitude);
    for record in broken {
        let feed = collection(&[good.clone(), record, later.clone()]);
        assert_eq!(feed.features.len(), 3);

        let result = Aggregator::new(ms.clone(), FeatureKind::Aftershocks, &params, now)
            .run(&feed.features);
        assert_eq!(result.skipped, 1);
        let ids: Vec<&str> = result.events.iter().map(|e| e.event.id.as_str()).collect();
        assert_eq!(ids, ["a1", "a2"]);
    }
}

#[test]
fn test_historical_sequence() {
    let ms = mainshock();
    let feed = collection(&[
        feature_json("h1", Some(6.2), -400 * DAY_MS, 35.77, Some(-480)),
        feature_json("h2", Some(5.0), -20 * DAY_MS, 35.77, Some(-420)),
        feature_json(&ms.id, Some(7.1), 0, 35.77, Some(-420)),
    ]);

    let now = ms.time + Duration::days(2);
    let params = QueryParams::for_mainshock(ms.magnitude);
    let result = Aggregator::new(ms, FeatureKind::Historical, &params, now).run(&feed.features);

    let ids: Vec<&str> = result.summary.iter().map(|e| e.event.id.as_str()).collect();
    assert_eq!(ids, ["ci38457511", "h1"]);
    assert!(!result.uses_utc_fallback);
    assert!(result.most_recent_aftershock.is_none());
    assert!(result.sequence_duration_days.is_none());

    assert_eq!(result.events[0].age, Age::Historical);
    assert_eq!(result.events[2].age, Age::Mainshock);

    let h1 = result.bins.get(Period::Prior, 6).unwrap();
    assert_eq!((h1.total, h1.year), (1, 0));
    let h2 = result.bins.get(Period::Prior, 5).unwrap();
    assert_eq!((h2.year, h2.month, h2.week), (1, 1, 0));
    let main = result.bins.get(Period::Prior, 7).unwrap();
    assert_eq!(main.day, 1);
    assert!(!result.bins.has_period(Period::First));
}

#[test]
fn test_forecast_from_sequence_duration() {
    let ms = mainshock();
    let now = ms.time + Duration::days(10);
    let params = QueryParams::for_mainshock(ms.magnitude);
    let result = Aggregator::new(ms.clone(), FeatureKind::Aftershocks, &params, now).run(&[]);

    assert!(result.events.is_empty());
    assert!(result.bins.is_empty());

    let from_now = calculate(&ForecastRequest {
        start_days: result.sequence_duration_days,
        ..ForecastRequest::new(ms.magnitude)
    })
    .unwrap();
    let from_origin = calculate(&ForecastRequest::new(ms.magnitude)).unwrap();

    assert!((from_now.start_days - 10.0).abs() < 1e-12);
    assert!(from_now.expected_number > 0.0);
    assert!(from_now.expected_number < from_origin.expected_number);
    assert!(from_now.probability < from_origin.probability);
    assert!(from_now.confidence_lower <= from_now.confidence_upper);
}
