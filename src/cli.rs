//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use quakeseq::config::{FeatureKind, QueryParams};
use quakeseq::forecast::{ForecastRequest, ModelParams};
use quakeseq::output::Format;

/// Aftershock forecasts and earthquake sequence summaries.
#[derive(Parser, Debug)]
#[command(name = "quakeseq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Forecast aftershock counts and probability for a mainshock magnitude
    Forecast(ForecastArgs),

    /// Summarize a feature collection around a mainshock
    Summary(SummaryArgs),
}

/// Arguments for the `forecast` command.
#[derive(Parser, Debug)]
pub struct ForecastArgs {
    /// Mainshock magnitude
    #[arg(long, short = 'm')]
    pub magnitude: f64,

    /// Minimum aftershock magnitude (default: one below the mainshock)
    #[arg(long)]
    pub aftershock_magnitude: Option<f64>,

    /// Start of the forecast window, in days after the mainshock
    #[arg(long)]
    pub start_days: Option<f64>,

    /// Length of the forecast window, in days
    #[arg(long)]
    pub duration_days: Option<f64>,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Confidence level for the expected-count range
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

impl ForecastArgs {
    #[must_use]
    pub fn request(&self) -> ForecastRequest {
        ForecastRequest {
            mainshock_magnitude: Some(self.magnitude),
            aftershock_magnitude: self.aftershock_magnitude,
            start_days: self.start_days,
            duration_days: self.duration_days,
            params: Some(self.model.params()),
            confidence: self.confidence,
        }
    }
}

/// Generic aftershock model parameters; each defaults to the California values.
#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Productivity parameter a
    #[arg(long, allow_negative_numbers = true)]
    pub a: Option<f64>,

    /// Gutenberg-Richter b-value
    #[arg(long)]
    pub b: Option<f64>,

    /// Omori decay exponent p
    #[arg(long)]
    pub p: Option<f64>,

    /// Omori time offset c (days)
    #[arg(long)]
    pub c: Option<f64>,
}

impl ModelArgs {
    #[must_use]
    pub fn params(&self) -> ModelParams {
        let defaults = ModelParams::default();
        ModelParams {
            a: self.a.unwrap_or(defaults.a),
            b: self.b.unwrap_or(defaults.b),
            p: self.p.unwrap_or(defaults.p),
            c: self.c.unwrap_or(defaults.c),
        }
    }
}

/// Arguments for the `summary` command.
#[derive(Parser, Debug)]
pub struct SummaryArgs {
    /// USGS event id of the mainshock
    #[arg(long)]
    pub eqid: String,

    /// Feature collection to summarize
    #[arg(long, default_value = "aftershocks", value_parser = parse_feature)]
    pub feature: FeatureKind,

    /// Read the feature collection from a GeoJSON file instead of querying USGS
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Minimum aftershock magnitude
    #[arg(long)]
    pub as_mag: Option<f64>,

    /// Aftershock search radius (km)
    #[arg(long)]
    pub as_dist: Option<f64>,

    /// Minimum foreshock magnitude
    #[arg(long)]
    pub fs_mag: Option<f64>,

    /// Foreshock search radius (km)
    #[arg(long)]
    pub fs_dist: Option<f64>,

    /// Foreshock lookback (days)
    #[arg(long)]
    pub fs_days: Option<u32>,

    /// Minimum historical magnitude
    #[arg(long)]
    pub hs_mag: Option<f64>,

    /// Historical search radius (km)
    #[arg(long)]
    pub hs_dist: Option<f64>,

    /// Historical lookback (years)
    #[arg(long)]
    pub hs_years: Option<u32>,

    /// Also print the aftershock forecast from the current sequence duration
    #[arg(long)]
    pub forecast: bool,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

impl SummaryArgs {
    /// Mainshock-derived defaults with any command-line overrides applied.
    #[must_use]
    pub fn query_params(&self, mainshock_magnitude: f64) -> QueryParams {
        let mut params = QueryParams::for_mainshock(mainshock_magnitude);
        if let Some(v) = self.as_mag {
            params.aftershocks.min_magnitude = v;
        }
        if let Some(v) = self.as_dist {
            params.aftershocks.max_radius_km = v;
        }
        if let Some(v) = self.fs_mag {
            params.foreshocks.min_magnitude = v;
        }
        if let Some(v) = self.fs_dist {
            params.foreshocks.max_radius_km = v;
        }
        if let Some(v) = self.fs_days {
            params.foreshock_days = v;
        }
        if let Some(v) = self.hs_mag {
            params.historical.min_magnitude = v;
        }
        if let Some(v) = self.hs_dist {
            params.historical.max_radius_km = v;
        }
        if let Some(v) = self.hs_years {
            params.historical_years = v;
        }
        params
    }
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

/// Parse a feature kind from string.
fn parse_feature(s: &str) -> Result<FeatureKind, String> {
    s.parse()
}
