//! quakeseq - aftershock forecasts and earthquake sequence summaries.
//!
//! The core is a set of pure functions over already-loaded event records:
//!
//! - [`forecast`]: the generic aftershock model (expected count, probability,
//!   confidence range).
//! - [`pipeline`]: classification and binning of a feature collection around a
//!   mainshock, built on [`geodesy`], [`age`], [`bins`] and [`classify`].
//!
//! [`client`] loads feeds from the USGS FDSN event service and [`output`]
//! renders results; the core depends on neither.

pub mod age;
pub mod bins;
pub mod classify;
pub mod client;
pub mod config;
pub mod errors;
pub mod forecast;
pub mod geodesy;
pub mod models;
pub mod output;
pub mod pipeline;

pub use errors::QuakeseqError;
pub use forecast::{ForecastRequest, ForecastResult, ModelParams, calculate};
pub use pipeline::{Aggregation, Aggregator, ClassifiedEvent};
