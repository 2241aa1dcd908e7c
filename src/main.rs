//! quakeseq - aftershock forecasts and earthquake sequence summaries from your terminal.

use std::fs;
use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use quakeseq::client::UsgsClient;
use quakeseq::config::FeatureKind;
use quakeseq::forecast::{self, ForecastRequest};
use quakeseq::models::{FeatureCollection, Mainshock};
use quakeseq::output;
use quakeseq::pipeline::Aggregator;

mod cli;

use cli::{Cli, Command};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Forecast(args) => cmd_forecast(&args),
        Command::Summary(args) => cmd_summary(&args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the `forecast` command.
fn cmd_forecast(args: &cli::ForecastArgs) -> Result<()> {
    let result = forecast::calculate(&args.request()).context("failed to calculate forecast")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_forecast(&mut handle, &result, args.format)?;

    Ok(())
}

/// Execute the `summary` command - load a feature collection and aggregate it.
fn cmd_summary(args: &cli::SummaryArgs) -> Result<()> {
    let client = UsgsClient::new().context("failed to create USGS client")?;

    let mainshock_feature = client
        .fetch_mainshock(&args.eqid)
        .with_context(|| format!("failed to fetch mainshock {}", args.eqid))?;
    let mainshock =
        Mainshock::try_from(&mainshock_feature).context("mainshock record is unusable")?;
    let params = args.query_params(mainshock.magnitude);

    let features = match (&args.input, args.feature) {
        (Some(path), _) => {
            let body = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let feed: FeatureCollection =
                serde_json::from_str(&body).context("failed to parse feed file")?;
            feed.validate()?;
            feed.features
        }
        (None, FeatureKind::Mainshock) => vec![mainshock_feature],
        (None, kind) => {
            client
                .fetch_feature(&mainshock, kind, &params)
                .with_context(|| format!("failed to fetch {} feed", kind.as_str()))?
                .features
        }
    };

    info!(
        "summarizing {} {} around M{} {}",
        features.len(),
        args.feature.as_str(),
        mainshock.magnitude,
        mainshock.id
    );

    let magnitude = mainshock.magnitude;
    let aggregation =
        Aggregator::new(mainshock, args.feature, &params, chrono::Utc::now()).run(&features);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_summary(&mut handle, &aggregation, &params, args.format)?;

    if args.forecast {
        match aggregation.sequence_duration_days {
            Some(elapsed) => {
                let request = ForecastRequest {
                    start_days: Some(elapsed),
                    ..ForecastRequest::new(magnitude)
                };
                let result =
                    forecast::calculate(&request).context("failed to calculate forecast")?;
                output::write_forecast(&mut handle, &result, args.format)?;
            }
            None => tracing::warn!("forecasts are only available for aftershock summaries"),
        }
    }

    Ok(())
}
