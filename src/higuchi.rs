//! Higuchi fractal dimension (HFD) of a single window.
//!
//! For each interval k the window is sub-sampled at stride k from every
//! offset m < k, the normalized curve length of each sub-sequence is averaged
//! into L(k), and the dimension is the least-squares slope of ln L(k) against
//! ln(1/k).
//!
//! With [`HiguchiNormalization::Reduced`] the lengths skip the final division
//! by k, so the slope is D - 1: white noise lands near 1 and a smooth
//! sinusoid near 0. [`HiguchiNormalization::Standard`] is the classic
//! estimator with D in [1, 2].
//!
//! A constant window has L(k) = 0 for every k and yields an HFD of exactly 0
//! instead of taking the logarithm of zero.

use crate::{
    config::HiguchiNormalization,
    errors::{validate_data_length, FractalResult, FractalVoiceError},
    math_utils::{float_ops, ols_regression},
};

/// Smallest window the estimator accepts (two intervals need three samples).
pub const MIN_HIGUCHI_SAMPLES: usize = 3;

/// Averaged curve length L(k) for k = 1..=k_max.
///
/// `k_max` is clamped to `N - 1`. Offsets that leave no complete interval
/// are excluded from the average.
pub fn higuchi_curve_lengths(
    window: &[f64],
    k_max: usize,
    normalization: HiguchiNormalization,
) -> Vec<(usize, f64)> {
    let n = window.len();
    if n < 2 {
        return Vec::new();
    }
    let k_max = k_max.min(n - 1);

    (1..=k_max)
        .filter_map(|k| {
            let mut total = 0.0;
            let mut valid_offsets = 0usize;

            for m in 0..k {
                let intervals = (n - m - 1) / k;
                if intervals == 0 {
                    continue;
                }
                let length: f64 = (1..=intervals)
                    .map(|i| (window[m + i * k] - window[m + (i - 1) * k]).abs())
                    .sum();
                let mut normalized = length * (n - 1) as f64 / (intervals * k) as f64;
                if normalization == HiguchiNormalization::Standard {
                    normalized /= k as f64;
                }
                total += normalized;
                valid_offsets += 1;
            }

            (valid_offsets > 0).then(|| (k, total / valid_offsets as f64))
        })
        .collect()
}

/// Higuchi fractal dimension of `window`.
///
/// # Errors
/// - `InsufficientData` for windows shorter than [`MIN_HIGUCHI_SAMPLES`]
/// - `InvalidParameter` when `k_max < 2`
///
/// # Example
/// ```rust
/// use fractal_voice::{config::HiguchiNormalization, higuchi::estimate_higuchi_fd};
///
/// let flat = vec![0.25; 64];
/// assert_eq!(estimate_higuchi_fd(&flat, 8, HiguchiNormalization::Reduced).unwrap(), 0.0);
/// ```
pub fn estimate_higuchi_fd(
    window: &[f64],
    k_max: usize,
    normalization: HiguchiNormalization,
) -> FractalResult<f64> {
    validate_data_length(window, MIN_HIGUCHI_SAMPLES, 0.0)?;
    if k_max < 2 {
        return Err(FractalVoiceError::InvalidParameter {
            parameter: "k_max".to_string(),
            value: k_max as f64,
            constraint: ">= 2".to_string(),
        });
    }

    let lengths = higuchi_curve_lengths(window, k_max, normalization);

    let (log_inv_k, log_l): (Vec<f64>, Vec<f64>) = lengths
        .iter()
        .filter_map(|&(k, l)| float_ops::safe_ln(l).map(|ln_l| (-(k as f64).ln(), ln_l)))
        .unzip();

    // Degenerate: flat window, or too few non-zero lengths to fit a line
    if log_l.len() < 2 {
        log::debug!(
            "Higuchi lengths degenerate ({} of {} positive); HFD = 0",
            log_l.len(),
            lengths.len()
        );
        return Ok(0.0);
    }

    let (slope, _) = ols_regression(&log_inv_k, &log_l)?;
    Ok(slope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{generate_signal, SignalKind};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_constant_window_is_zero() {
        for &value in &[0.0, 1.0, -3.5] {
            let window = vec![value; 500];
            for normalization in [HiguchiNormalization::Reduced, HiguchiNormalization::Standard] {
                assert_eq!(estimate_higuchi_fd(&window, 8, normalization).unwrap(), 0.0);
            }
        }
    }

    #[test]
    fn test_white_noise_near_one_reduced() {
        let noise = generate_signal(SignalKind::UniformNoise, 4000, 11).unwrap();
        let hfd = estimate_higuchi_fd(&noise, 10, HiguchiNormalization::Reduced).unwrap();
        assert!((hfd - 1.0).abs() < 0.1, "white noise HFD {}", hfd);
    }

    #[test]
    fn test_standard_is_reduced_plus_one() {
        let noise = generate_signal(SignalKind::GaussianNoise, 2000, 5).unwrap();
        let reduced = estimate_higuchi_fd(&noise, 8, HiguchiNormalization::Reduced).unwrap();
        let standard = estimate_higuchi_fd(&noise, 8, HiguchiNormalization::Standard).unwrap();
        assert_approx_eq!(standard - reduced, 1.0, 1e-9);
    }

    #[test]
    fn test_smooth_sine_near_zero() {
        let sine: Vec<f64> = (0..2000)
            .map(|i| (2.0 * std::f64::consts::PI * i as f64 / 400.0).sin())
            .collect();
        let hfd = estimate_higuchi_fd(&sine, 8, HiguchiNormalization::Reduced).unwrap();
        assert!(hfd.abs() < 0.1, "sine HFD {}", hfd);
    }

    #[test]
    fn test_k_max_clamped_to_window() {
        let window = vec![0.0, 1.0, 0.5, 2.0];
        let lengths = higuchi_curve_lengths(&window, 10, HiguchiNormalization::Reduced);
        assert_eq!(lengths.len(), 3);
        assert_eq!(lengths.last().map(|&(k, _)| k), Some(3));
        assert!(estimate_higuchi_fd(&window, 10, HiguchiNormalization::Reduced)
            .unwrap()
            .is_finite());
    }

    #[test]
    fn test_curve_length_of_ramp() {
        // Unit ramp: every stride-k step is k, so the reduced length is N - 1 for all k
        let ramp: Vec<f64> = (0..11).map(|i| i as f64).collect();
        for (k, l) in higuchi_curve_lengths(&ramp, 4, HiguchiNormalization::Reduced) {
            assert_approx_eq!(l, 10.0, 1e-12);
            assert!(k <= 4);
        }
    }

    #[test]
    fn test_short_window_rejected() {
        assert!(matches!(
            estimate_higuchi_fd(&[1.0, 2.0], 8, HiguchiNormalization::Reduced),
            Err(FractalVoiceError::InsufficientData { .. })
        ));
        assert!(matches!(
            estimate_higuchi_fd(&[1.0, 2.0, 3.0], 1, HiguchiNormalization::Reduced),
            Err(FractalVoiceError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_deterministic() {
        let noise = generate_signal(SignalKind::UniformNoise, 1000, 3).unwrap();
        let a = estimate_higuchi_fd(&noise, 8, HiguchiNormalization::Reduced).unwrap();
        let b = estimate_higuchi_fd(&noise, 8, HiguchiNormalization::Reduced).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
