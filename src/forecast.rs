//! Generic aftershock-sequence forecast.
//!
//! The aftershock rate follows a modified Omori-Utsu decay combined with
//! Gutenberg-Richter magnitude scaling, parameterized by `(a, b, p, c)`:
//!
//! ```text
//! λ(t, M) = 10^(a + b·(Mmain − M)) · (t + c)^(−p)
//! ```
//!
//! Integrating over a magnitude range and a time window gives the expected
//! number of events `N`. Occurrence is treated as a Poisson process, so the
//! probability of at least one event is `1 − e^(−N)`.

use serde::Serialize;
use tracing::debug;

use crate::errors::QuakeseqError;

/// Magnitude difference used as the upper bound of the magnitude integral.
/// Large enough to be no practical limit.
const UPPER_MAGNITUDE_DIFFERENCE: f64 = 9.0;

/// Tolerance for replacing `p = 1` with [`P_SUBSTITUTE`].
const P_TOLERANCE: f64 = 0.000_01;

/// Value used instead of `p` when `p` is within [`P_TOLERANCE`] of 1.
const P_SUBSTITUTE: f64 = 1.000_01;

/// Expected counts above this use the normal approximation for the range.
const NORMAL_APPROXIMATION_ABOVE: f64 = 100.0;

/// Default window start, in days after the mainshock.
pub const DEFAULT_START_DAYS: f64 = 0.01;

/// Default window length, in days.
pub const DEFAULT_DURATION_DAYS: f64 = 7.0;

/// Default confidence level for the expected-count range.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Generic aftershock model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelParams {
    /// Productivity
    pub a: f64,
    /// Gutenberg-Richter b-value
    pub b: f64,
    /// Omori decay exponent
    pub p: f64,
    /// Omori time offset (days)
    pub c: f64,
}

impl Default for ModelParams {
    /// Generic California parameters.
    fn default() -> Self {
        Self {
            a: -1.76,
            b: 0.90,
            p: 1.07,
            c: 0.05,
        }
    }
}

impl ModelParams {
    /// Replace `p ≈ 1` with 1.00001, where the closed-form time integral is singular.
    #[must_use]
    pub fn normalized(self) -> Self {
        if (self.p - 1.0).abs() < P_TOLERANCE {
            Self {
                p: P_SUBSTITUTE,
                ..self
            }
        } else {
            self
        }
    }
}

/// Inputs for one forecast. Only the mainshock magnitude is required.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForecastRequest {
    pub mainshock_magnitude: Option<f64>,
    /// Defaults to one unit below the mainshock
    pub aftershock_magnitude: Option<f64>,
    pub start_days: Option<f64>,
    pub duration_days: Option<f64>,
    pub params: Option<ModelParams>,
    pub confidence: Option<f64>,
}

impl ForecastRequest {
    #[must_use]
    pub fn new(mainshock_magnitude: f64) -> Self {
        Self {
            mainshock_magnitude: Some(mainshock_magnitude),
            ..Self::default()
        }
    }
}

/// Forecast output, echoing the request with defaults filled in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastResult {
    pub mainshock_magnitude: f64,
    pub aftershock_magnitude: f64,
    pub start_days: f64,
    pub duration_days: f64,
    pub params: ModelParams,
    pub confidence: f64,
    /// Expected number of events in the window
    pub expected_number: f64,
    /// Probability of one or more events in the window
    pub probability: f64,
    pub confidence_lower: i64,
    pub confidence_upper: i64,
}

/// Compute the forecast for `request`.
///
/// # Errors
///
/// Returns [`QuakeseqError::InvalidInput`] if the mainshock magnitude is
/// missing, if any supplied scalar is not finite, or if the confidence level
/// is not strictly between 0 and 1.
pub fn calculate(request: &ForecastRequest) -> Result<ForecastResult, QuakeseqError> {
    // Zero is a real magnitude; only an absent or NaN value is rejected
    let mainshock = request
        .mainshock_magnitude
        .filter(|m| m.is_finite())
        .ok_or_else(|| {
            QuakeseqError::InvalidInput(
                "mainshock magnitude is required to calculate aftershock probability".into(),
            )
        })?;

    let aftershock = request.aftershock_magnitude.unwrap_or(mainshock - 1.0);
    let start = request.start_days.unwrap_or(DEFAULT_START_DAYS);
    let duration = request.duration_days.unwrap_or(DEFAULT_DURATION_DAYS);
    let params = request.params.unwrap_or_default().normalized();
    let confidence = request.confidence.unwrap_or(DEFAULT_CONFIDENCE);

    for (name, value) in [
        ("aftershock magnitude", aftershock),
        ("start", start),
        ("duration", duration),
        ("a", params.a),
        ("b", params.b),
        ("p", params.p),
        ("c", params.c),
    ] {
        if !value.is_finite() {
            return Err(QuakeseqError::InvalidInput(format!(
                "{name} must be finite, got {value}"
            )));
        }
    }
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(QuakeseqError::InvalidInput(format!(
            "confidence level must be between 0 and 1, got {confidence}"
        )));
    }

    let number = expected_number(
        &params,
        aftershock - mainshock,
        UPPER_MAGNITUDE_DIFFERENCE,
        start,
        start + duration,
    );
    let probability = occurrence_probability(number);
    let (lower, upper) = confidence_range(number, confidence);

    debug!(
        "forecast M{mainshock} → M{aftershock}+ over [{start}, {}] days: N={number:.4}, P={probability:.4}",
        start + duration
    );

    Ok(ForecastResult {
        mainshock_magnitude: mainshock,
        aftershock_magnitude: aftershock,
        start_days: start,
        duration_days: duration,
        params,
        confidence,
        expected_number: number,
        probability,
        confidence_lower: lower,
        confidence_upper: upper,
    })
}

/// Expected number of events with magnitude difference in `[dm1, dm2]` from
/// the mainshock, between `t1` and `t2` days after it.
#[must_use]
pub fn expected_number(params: &ModelParams, dm1: f64, dm2: f64, t1: f64, t2: f64) -> f64 {
    let magnitude_term =
        10f64.powf(params.a - params.b * dm1) - 10f64.powf(params.a - params.b * dm2);
    magnitude_term * time_integral(params.p, params.c, t1, t2)
}

/// `∫ (t + c)^(−p) dt` over `[t1, t2]`.
///
/// The `q == 0` branch divides the logarithmic form by zero and so yields an
/// infinite or NaN result. [`ModelParams::normalized`] keeps callers of
/// [`calculate`] off that branch.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn time_integral(p: f64, c: f64, t1: f64, t2: f64) -> f64 {
    let q = 1.0 - p;
    if q == 0.0 {
        ((t2 + c).ln() - (t1 + c).ln()) / q
    } else {
        ((t2 + c).powf(q) - (t1 + c).powf(q)) / q
    }
}

/// Probability of one or more events when `number` are expected.
#[must_use]
pub fn occurrence_probability(number: f64) -> f64 {
    1.0 - (-number).exp()
}

/// Probability of exactly `k` events when `a` are expected.
///
/// Negative `k` yields `e^(−a)`: the product is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn poisson(a: f64, k: i64) -> f64 {
    let mut x = 1.0;
    for i in 1..=k {
        x *= a / i as f64;
    }
    x * (-a).exp()
}

/// Range around the expected count `a` at the `conf` confidence level.
///
/// Above 100 the normal approximation `a ± 2√a` is used whatever `conf` is.
/// Otherwise the range grows outward from `floor(a)`, always taking the more
/// probable side next, until the accumulated probability reaches `conf`.
/// Each bound is then pulled back in by one.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn confidence_range(a: f64, conf: f64) -> (i64, i64) {
    if a > NORMAL_APPROXIMATION_ABOVE {
        let sigma = a.sqrt();
        return ((a - 2.0 * sigma) as i64, (a + 2.0 * sigma) as i64);
    }

    let mut lower = a.floor() as i64;
    let mut upper = lower + 1;
    let mut p = poisson(a, lower);
    let mut q = poisson(a, upper);
    let mut sum = 0.0;

    while sum < conf {
        if lower >= 0 && p > q {
            sum += p;
            lower -= 1;
            p = poisson(a, lower);
        } else {
            // Upper tail exhausted in floating point; nothing left to add
            if q == 0.0 {
                break;
            }
            sum += q;
            upper += 1;
            q = poisson(a, upper);
        }
    }

    (lower + 1, upper - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::cast_precision_loss)]
    fn within(result: &ForecastResult) -> bool {
        let n = result.expected_number;
        result.confidence_lower as f64 <= n && n < (result.confidence_upper + 1) as f64
    }

    #[test]
    fn test_default_m7_golden() {
        let result = calculate(&ForecastRequest::new(7.0)).unwrap();
        assert!((result.expected_number - 0.681_386_357_231_128_1).abs() < 1e-6);
        assert!((result.probability - 0.494_084_873_134_618_35).abs() < 1e-6);
        assert_eq!((result.confidence_lower, result.confidence_upper), (0, 2));
        assert!((result.aftershock_magnitude - 6.0).abs() < 1e-12);
        assert!((result.start_days - 0.01).abs() < 1e-12);
        assert!((result.duration_days - 7.0).abs() < 1e-12);
        assert!((result.confidence - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_m7_smaller_aftershocks_golden() {
        let request = ForecastRequest {
            aftershock_magnitude: Some(5.0),
            ..ForecastRequest::new(7.0)
        };
        let result = calculate(&request).unwrap();
        assert!((result.expected_number - 5.412_444_227_777_163).abs() < 1e-6);
        assert!((result.probability - 0.995_539_276_149_394_9).abs() < 1e-6);
        assert_eq!((result.confidence_lower, result.confidence_upper), (1, 10));
    }

    #[test]
    fn test_normal_approximation_golden() {
        let request = ForecastRequest {
            aftershock_magnitude: Some(3.0),
            ..ForecastRequest::new(7.0)
        };
        let result = calculate(&request).unwrap();
        assert!((result.expected_number - 341.502_143_752_854_07).abs() < 1e-6);
        assert_eq!((result.confidence_lower, result.confidence_upper), (304, 378));
        assert!(within(&result));
    }

    #[test]
    fn test_missing_mainshock_is_invalid() {
        let err = calculate(&ForecastRequest::default()).unwrap_err();
        assert!(matches!(err, QuakeseqError::InvalidInput(_)));

        let err = calculate(&ForecastRequest::new(f64::NAN)).unwrap_err();
        assert!(matches!(err, QuakeseqError::InvalidInput(_)));
    }

    #[test]
    fn test_zero_mainshock_magnitude_is_accepted() {
        let result = calculate(&ForecastRequest::new(0.0)).unwrap();
        assert!((result.aftershock_magnitude - (-1.0)).abs() < 1e-12);
        assert!(result.expected_number.is_finite());
        assert!((0.0..=1.0).contains(&result.probability));
    }

    #[test]
    fn test_confidence_level_must_be_a_probability() {
        for conf in [0.0, 1.0, 1.5, -0.1] {
            let request = ForecastRequest {
                confidence: Some(conf),
                ..ForecastRequest::new(6.0)
            };
            assert!(calculate(&request).is_err(), "accepted conf {conf}");
        }
    }

    #[test]
    fn test_p_of_one_is_substituted() {
        let with_p = |p: f64| ForecastRequest {
            params: Some(ModelParams {
                p,
                ..ModelParams::default()
            }),
            ..ForecastRequest::new(7.0)
        };
        let exact = calculate(&with_p(1.0)).unwrap();
        let substituted = calculate(&with_p(1.000_01)).unwrap();
        assert_eq!(exact, substituted);
        assert!((exact.params.p - 1.000_01).abs() < 1e-15);
        assert!((exact.expected_number - 0.658_150_133_882_521).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_leaves_other_p_alone() {
        let params = ModelParams::default().normalized();
        assert!((params.p - 1.07).abs() < 1e-15);
    }

    #[test]
    fn test_time_integral_at_q_zero_is_degenerate() {
        // Only reachable by calling the integral directly with p = 1
        let value = time_integral(1.0, 0.05, 0.01, 7.01);
        assert!(value.is_infinite());
    }

    #[test]
    fn test_repeat_calls_are_identical() {
        let request = ForecastRequest {
            aftershock_magnitude: Some(4.3),
            start_days: Some(2.5),
            duration_days: Some(30.0),
            ..ForecastRequest::new(6.4)
        };
        let a = calculate(&request).unwrap();
        let b = calculate(&request).unwrap();
        assert_eq!(a.expected_number.to_bits(), b.expected_number.to_bits());
        assert_eq!(a.probability.to_bits(), b.probability.to_bits());
        assert_eq!(a, b);
    }

    #[test]
    fn test_probability_grows_with_duration() {
        let mut last = -1.0;
        for duration in [0.5, 1.0, 7.0, 30.0, 365.0] {
            let request = ForecastRequest {
                aftershock_magnitude: Some(6.5),
                duration_days: Some(duration),
                ..ForecastRequest::new(7.0)
            };
            let result = calculate(&request).unwrap();
            assert!((0.0..=1.0).contains(&result.probability));
            assert!(result.probability > last);
            last = result.probability;
        }
    }

    #[test]
    fn test_poisson_pmf() {
        assert!((poisson(2.0, 0) - (-2.0f64).exp()).abs() < 1e-15);
        assert!((poisson(2.0, 2) - 2.0 * (-2.0f64).exp()).abs() < 1e-15);
        assert!((poisson(2.0, -1) - (-2.0f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn test_confidence_range_reference_values() {
        assert_eq!(confidence_range(0.5, 0.95), (0, 2));
        assert_eq!(confidence_range(3.0, 0.95), (0, 6));
        assert_eq!(confidence_range(150.0, 0.95), (125, 174));
    }

    #[test]
    fn test_confidence_range_brackets_expected_count() {
        for a in [0.0, 0.05, 0.3, 0.99, 1.0, 2.7, 9.5, 42.0, 99.9, 100.5, 1234.5] {
            let (lower, upper) = confidence_range(a, DEFAULT_CONFIDENCE);
            #[allow(clippy::cast_precision_loss)]
            let (lo, hi) = (lower as f64, upper as f64);
            assert!(lo <= a, "lower {lower} above {a}");
            // The final pull-back can leave the upper bound at floor(a)
            assert!(a < hi + 1.0, "upper {upper} too low for {a}");
            assert!(lower <= upper);
        }
    }

    #[test]
    fn test_tiny_expected_count_collapses_range() {
        assert_eq!(confidence_range(0.001, 0.95), (0, 0));
    }
}
