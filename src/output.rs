//! Output formatters for summaries and forecasts.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use chrono::FixedOffset;
use serde::Serialize;

use crate::age::Age;
use crate::bins::Period;
use crate::config::{FeatureKind, QueryParams};
use crate::forecast::ForecastResult;
use crate::pipeline::{Aggregation, ClassifiedEvent};

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Age-based colors, matching the map markers
const BLUE: &str = "\x1b[94m"; // mainshock
const RED: &str = "\x1b[91m"; // past hour
const ORANGE: &str = "\x1b[38;5;208m"; // past day
const YELLOW: &str = "\x1b[93m"; // past week
const WHITE: &str = "\x1b[97m"; // older
const GREY: &str = "\x1b[37m"; // historical

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON document
    Json,
    /// Newline-delimited JSON (one summary event per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// Get the color code for an age category.
fn age_color(age: Age) -> &'static str {
    match age {
        Age::Historical => GREY,
        Age::Mainshock => BLUE,
        Age::PastHour => RED,
        Age::PastDay => ORANGE,
        Age::PastWeek => YELLOW,
        Age::Older => WHITE,
    }
}

/// Event time at the epicenter when the feed gives an offset, else UTC.
///
/// Local times are starred, as in the summary table footnote. Offsets that
/// are not a valid UTC offset fall back to UTC.
fn display_time(event: &ClassifiedEvent) -> String {
    let local = event
        .event
        .utc_offset_minutes
        .and_then(|minutes| minutes.checked_mul(60))
        .and_then(FixedOffset::east_opt);
    match local {
        Some(offset) => event
            .event
            .time
            .with_timezone(&offset)
            .format("%b %-d, %Y %-I:%M:%S %p*")
            .to_string(),
        None => event.event.time.format("%b %-d, %Y %H:%M:%S UTC").to_string(),
    }
}

fn write_event_row<W: Write>(writer: &mut W, event: &ClassifiedEvent) -> io::Result<()> {
    let color = age_color(event.age);
    let place = event.event.place.as_deref().unwrap_or("Unknown location");
    writeln!(
        writer,
        "  {color}{BOLD}{} {:.1}{RESET} │ {} │ {:>7.1} km {:<2} │ {DIM}{:>5.1} km deep{RESET} │ {place}",
        event.event.magnitude_type,
        event.magnitude,
        display_time(event),
        event.distance_km,
        event.direction.as_str(),
        event.event.depth_km,
    )
}

fn write_event_table<W: Write>(
    writer: &mut W,
    events: &[ClassifiedEvent],
    uses_utc_fallback: bool,
) -> io::Result<()> {
    if events.is_empty() {
        return writeln!(writer, "  None.");
    }
    for event in events {
        write_event_row(writer, event)?;
    }
    let mut note = String::from("* = local time at epicenter.");
    if uses_utc_fallback {
        note.push_str(" Using UTC when local time is not available.");
    }
    writeln!(writer, "  {DIM}{note}{RESET}")
}

fn write_bins<W: Write>(
    writer: &mut W,
    aggregation: &Aggregation,
    period: Period,
) -> io::Result<()> {
    if !aggregation.bins.has_period(period) {
        return Ok(());
    }
    writeln!(
        writer,
        "  {BOLD}{:<8}{:>7}{:>7}{:>7}{:>7}{:>8}{RESET}",
        format!("{}:", period.as_str()),
        "Day",
        "Week",
        "Month",
        "Year",
        "Total"
    )?;
    for (magnitude, bin) in aggregation.bins.rows(period) {
        writeln!(
            writer,
            "  {:<8}{:>7}{:>7}{:>7}{:>7}{:>8}",
            format!("M {magnitude}"),
            bin.day,
            bin.week,
            bin.month,
            bin.year,
            bin.total
        )?;
    }
    Ok(())
}

/// Write an aggregation in human-readable form.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_summary_human<W: Write>(
    writer: &mut W,
    aggregation: &Aggregation,
    params: &QueryParams,
) -> io::Result<()> {
    let kind = aggregation.kind;
    writeln!(writer, "{BOLD}🌍 {}{RESET}", kind.title())?;

    if kind != FeatureKind::Mainshock {
        let query = params.query(kind);
        write!(
            writer,
            "M {}+ earthquakes within {} km of mainshock epicenter",
            query.min_magnitude, query.max_radius_km
        )?;
        match kind {
            FeatureKind::Aftershocks => {
                if let Some(days) = aggregation.sequence_duration_days {
                    write!(writer, ". The duration of the aftershock sequence is {days} days")?;
                }
            }
            FeatureKind::Foreshocks => {
                write!(writer, " in the prior {} days", params.foreshock_days)?;
            }
            FeatureKind::Historical => {
                write!(writer, " in the prior {} years", params.historical_years)?;
            }
            FeatureKind::Mainshock => {}
        }
        writeln!(writer, ".")?;
    }

    for period in kind.periods() {
        write_bins(writer, aggregation, *period)?;
    }

    if kind == FeatureKind::Aftershocks {
        writeln!(writer, "\n{BOLD}Most Recent Aftershock{RESET}")?;
        let latest: Vec<ClassifiedEvent> =
            aggregation.most_recent_aftershock.iter().cloned().collect();
        write_event_table(writer, &latest, aggregation.uses_utc_fallback)?;
    }

    let threshold = match kind {
        FeatureKind::Historical | FeatureKind::Foreshocks => aggregation.thresholds.historical,
        FeatureKind::Aftershocks | FeatureKind::Mainshock => aggregation.thresholds.aftershocks,
    };
    if kind == FeatureKind::Mainshock {
        writeln!(writer, "\n{BOLD}Mainshock{RESET}")?;
    } else {
        writeln!(
            writer,
            "\n{BOLD}M {threshold}+ Earthquakes ({}){RESET}",
            aggregation.summary.len()
        )?;
    }
    write_event_table(writer, &aggregation.summary, aggregation.uses_utc_fallback)?;

    if aggregation.skipped > 0 {
        writeln!(
            writer,
            "  {DIM}{} malformed record(s) skipped.{RESET}",
            aggregation.skipped
        )?;
    }
    Ok(())
}

/// Write a forecast in human-readable form.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_forecast_human<W: Write>(writer: &mut W, result: &ForecastResult) -> io::Result<()> {
    let end = result.start_days + result.duration_days;
    writeln!(writer, "{BOLD}Aftershock Forecast{RESET}")?;
    writeln!(
        writer,
        "  Probability of one or more M {}+ aftershocks of the M {} mainshock",
        result.aftershock_magnitude, result.mainshock_magnitude
    )?;
    writeln!(
        writer,
        "  between {} and {end} days after it: {BOLD}{:.1}%{RESET}",
        result.start_days,
        result.probability * 100.0
    )?;
    writeln!(
        writer,
        "  Expected number: {:.2} ({:.0}% range: {} to {})",
        result.expected_number,
        result.confidence * 100.0,
        result.confidence_lower,
        result.confidence_upper
    )?;
    writeln!(
        writer,
        "  {DIM}Model: a = {}, b = {}, p = {}, c = {}{RESET}",
        result.params.a, result.params.b, result.params.p, result.params.c
    )
}

/// Write any serializable value as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write, T: Serialize>(writer: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write the summary list as newline-delimited JSON, one event per line.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, events: &[ClassifiedEvent]) -> io::Result<()> {
    for event in events {
        let json = serde_json::to_string(event)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write an aggregation in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_summary<W: Write>(
    writer: &mut W,
    aggregation: &Aggregation,
    params: &QueryParams,
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_summary_human(writer, aggregation, params),
        Format::Json => write_json(writer, aggregation),
        Format::Ndjson => write_ndjson(writer, &aggregation.summary),
    }
}

/// Write a forecast in the specified format. NDJSON writes a single line.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_forecast<W: Write>(
    writer: &mut W,
    result: &ForecastResult,
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_forecast_human(writer, result),
        Format::Json => write_json(writer, result),
        Format::Ndjson => {
            let json = serde_json::to_string(result)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(writer, "{json}")
        }
    }
}
