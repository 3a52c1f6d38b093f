//! Mathematical utility functions for fractal analysis.
//!
//! Least-squares line fitting, profile integration, linear detrending and
//! log-spaced scale generation shared by the HFD and DFA estimators.

use crate::errors::{FractalResult, FractalVoiceError};

/// Numerical constants
pub mod constants {
    /// Smallest argument accepted by [`super::float_ops::safe_ln`]
    pub const MIN_LOG_VALUE: f64 = 1e-300;
    /// Spread of the predictor below which a regression is singular
    pub const MIN_PREDICTOR_SPREAD: f64 = 1e-12;
    /// Default epsilon for approximate comparisons
    pub const DEFAULT_EPSILON: f64 = 1e-10;
}

/// Safe floating point helpers
pub mod float_ops {
    use super::constants::{DEFAULT_EPSILON, MIN_LOG_VALUE};

    /// Check if a floating point number is approximately zero
    #[inline]
    pub fn approx_zero(x: f64) -> bool {
        x.abs() < DEFAULT_EPSILON
    }

    /// Safe logarithm that checks for positive arguments and finite inputs
    pub fn safe_ln(x: f64) -> Option<f64> {
        if x > MIN_LOG_VALUE && x.is_finite() {
            Some(x.ln())
        } else {
            None
        }
    }
}

/// Safe comparison for floating point values (NaN sorts last)
pub fn float_total_cmp(a: &f64, b: &f64) -> std::cmp::Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => a.total_cmp(b),
    }
}

/// Calculate median (handles even-length correctly)
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut v = values.to_vec();
    v.sort_by(float_total_cmp);
    let n = v.len();
    if n % 2 == 1 {
        v[n / 2]
    } else {
        0.5 * (v[n / 2 - 1] + v[n / 2])
    }
}

/// Ordinary least squares fit of `y = intercept + slope * x`.
///
/// Returns `(slope, intercept)`. Data is centered before accumulating the
/// cross products so large predictor offsets do not cancel catastrophically.
///
/// # Errors
/// - `InsufficientData` when fewer than two points or mismatched lengths
/// - `NumericalError` for non-finite input or a constant predictor
///
/// # Example
/// ```rust
/// use fractal_voice::math_utils::ols_regression;
///
/// let x = vec![1.0, 2.0, 3.0, 4.0];
/// let y = vec![3.0, 5.0, 7.0, 9.0];
/// let (slope, intercept) = ols_regression(&x, &y).unwrap();
/// assert!((slope - 2.0).abs() < 1e-12);
/// assert!((intercept - 1.0).abs() < 1e-12);
/// ```
pub fn ols_regression(x: &[f64], y: &[f64]) -> FractalResult<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return Err(FractalVoiceError::InsufficientData {
            scale_seconds: 0.0,
            required: 2,
            actual: x.len().min(y.len()),
        });
    }

    if !x.iter().chain(y).all(|v| v.is_finite()) {
        return Err(FractalVoiceError::NumericalError {
            reason: "Non-finite values in regression data".to_string(),
        });
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (sxy, sxx) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (xi, yi)| {
            let dx = xi - mean_x;
            (sxy + dx * (yi - mean_y), sxx + dx * dx)
        });

    if sxx < constants::MIN_PREDICTOR_SPREAD {
        return Err(FractalVoiceError::NumericalError {
            reason: format!(
                "Predictor variable has zero variance in regression (sxx = {:.2e})",
                sxx
            ),
        });
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    if !slope.is_finite() || !intercept.is_finite() {
        return Err(FractalVoiceError::NumericalError {
            reason: "Non-finite regression coefficients computed".to_string(),
        });
    }

    Ok((slope, intercept))
}

/// Integrate a series into its profile (cumulative sum with mean removal).
pub fn integrate_series(data: &[f64]) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    data.iter()
        .scan(0.0, |cumsum, &value| {
            *cumsum += value - mean;
            Some(*cumsum)
        })
        .collect()
}

/// Root-mean-square residual of a segment around its least-squares line.
///
/// The predictor is the sample position `0..n`, so the fit is closed form.
/// Uses the biased (n divisor) estimator, standard in DFA.
pub fn calculate_segment_fluctuation(segment: &[f64]) -> FractalResult<f64> {
    let n = segment.len();
    if n < 3 {
        return Err(FractalVoiceError::InsufficientData {
            scale_seconds: 0.0,
            required: 3,
            actual: n,
        });
    }

    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let mean_y = segment.iter().sum::<f64>() / nf;
    // Sum of (i - mean_x)^2 over 0..n
    let sxx = nf * (nf * nf - 1.0) / 12.0;

    let sxy: f64 = segment
        .iter()
        .enumerate()
        .map(|(i, &y)| (i as f64 - mean_x) * (y - mean_y))
        .sum();
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let rss: f64 = segment
        .iter()
        .enumerate()
        .map(|(i, &y)| {
            let residual = y - (intercept + slope * i as f64);
            residual * residual
        })
        .sum();

    Ok((rss / nf).sqrt())
}

/// Generate logarithmically spaced integer sizes in `[min_size, max_size]`.
///
/// Sizes advance geometrically by `growth_factor`; rounding duplicates are
/// dropped so the result is strictly increasing. Returns an empty vector when
/// `max_size < min_size`.
pub fn generate_window_sizes(min_size: usize, max_size: usize, growth_factor: f64) -> Vec<usize> {
    const MAX_ITERATIONS: usize = 1000;

    if max_size < min_size || min_size == 0 || growth_factor <= 1.0 {
        return Vec::new();
    }

    let mut sizes: Vec<usize> = Vec::new();
    let mut current = min_size as f64;
    let mut iterations = 0;

    while current.round() as usize <= max_size && iterations < MAX_ITERATIONS {
        let size = current.round() as usize;
        if sizes.last().map_or(true, |&last| size > last) {
            sizes.push(size);
        }
        current *= growth_factor;
        iterations += 1;
    }

    sizes
}
