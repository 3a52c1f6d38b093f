//! Detrended Fluctuation Analysis (DFA) of a single window.
//!
//! The window is mean-centered and integrated into a profile. For each box
//! size n from a logarithmically spaced set the profile is cut into
//! non-overlapping boxes (trailing remainder dropped), a least-squares line
//! is removed from every box, and the RMS residuals are averaged into F(n).
//! The scaling exponent alpha is the slope of ln F(n) against ln n.
//!
//! Reference values: uncorrelated noise gives alpha near 0.5, a random walk
//! near 1.5.

use crate::{
    config::DEFAULT_DFA_SCALE_GROWTH,
    errors::{FractalResult, FractalVoiceError},
    math_utils::{calculate_segment_fluctuation, float_ops, generate_window_sizes, integrate_series, ols_regression},
};

/// Minimum number of valid box sizes needed to fit the exponent
pub const MIN_DFA_SCALES: usize = 2;

/// Smallest number of boxes a box size must fit into the window
const MIN_BOXES_PER_SCALE: usize = 4;

/// Smallest box that leaves a residual after removing a line
pub const MIN_BOX_SIZE: usize = 3;

/// Box size parameters of the estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DfaParams {
    /// Smallest box size in samples
    pub min_box: usize,
    /// Largest box size in samples, further clipped to N/4
    pub max_box: usize,
    /// Geometric ratio between successive box sizes
    pub growth: f64,
}

impl Default for DfaParams {
    fn default() -> Self {
        let (min_box, max_box) = crate::config::DEFAULT_DFA_BOX_RANGE;
        Self {
            min_box,
            max_box,
            growth: DEFAULT_DFA_SCALE_GROWTH,
        }
    }
}

impl DfaParams {
    /// Check the box range and growth.
    ///
    /// # Errors
    /// `InvalidParameter` unless `MIN_BOX_SIZE <= min_box <= max_box` and
    /// `growth` is finite and above 1.
    pub fn validate(&self) -> FractalResult<()> {
        if self.min_box < MIN_BOX_SIZE || self.max_box < self.min_box {
            return Err(FractalVoiceError::InvalidParameter {
                parameter: "dfa_box_size_range".to_string(),
                value: self.min_box as f64,
                constraint: format!("{} <= min <= max (max = {})", MIN_BOX_SIZE, self.max_box),
            });
        }
        if !self.growth.is_finite() || self.growth <= 1.0 {
            return Err(FractalVoiceError::InvalidParameter {
                parameter: "dfa_scale_growth".to_string(),
                value: self.growth,
                constraint: "finite and > 1".to_string(),
            });
        }
        Ok(())
    }

    /// Box sizes usable on a window of `n` samples.
    pub fn box_sizes(&self, n: usize) -> Vec<usize> {
        let upper = self.max_box.min(n / MIN_BOXES_PER_SCALE);
        generate_window_sizes(self.min_box, upper, self.growth)
    }
}

/// Fluctuation function F(n) for every usable box size.
///
/// Box sizes whose fluctuation is zero (a flat profile) are kept with
/// `F = 0`; [`estimate_dfa_alpha`] drops them before taking logarithms.
pub fn dfa_fluctuations(window: &[f64], params: &DfaParams) -> FractalResult<Vec<(usize, f64)>> {
    params.validate()?;
    let profile = integrate_series(window);

    params
        .box_sizes(window.len())
        .into_iter()
        .map(|box_size| calculate_dfa_fluctuation(&profile, box_size).map(|f| (box_size, f)))
        .collect()
}

/// Average detrended RMS of the profile over boxes of `box_size`.
fn calculate_dfa_fluctuation(profile: &[f64], box_size: usize) -> FractalResult<f64> {
    let num_boxes = profile.len() / box_size;
    if num_boxes == 0 {
        return Err(FractalVoiceError::InsufficientData {
            scale_seconds: 0.0,
            required: box_size,
            actual: profile.len(),
        });
    }

    let total = profile
        .chunks_exact(box_size)
        .map(calculate_segment_fluctuation)
        .sum::<FractalResult<f64>>()?;

    Ok(total / num_boxes as f64)
}

/// DFA scaling exponent of `window`.
///
/// # Errors
/// - `InvalidParameter` when `params` fail [`DfaParams::validate`]
/// - `InsufficientScales` when fewer than [`MIN_DFA_SCALES`] box sizes give a
///   positive fluctuation (window too short, or flat). The window index in
///   the error is 0; callers that know the index re-tag it.
///
/// # Example
/// ```rust
/// use fractal_voice::dfa::{estimate_dfa_alpha, DfaParams};
/// use fractal_voice::generators::{generate_signal, SignalKind};
///
/// let noise = generate_signal(SignalKind::GaussianNoise, 4000, 7).unwrap();
/// let alpha = estimate_dfa_alpha(&noise, &DfaParams::default()).unwrap();
/// assert!((alpha - 0.5).abs() < 0.15);
/// ```
pub fn estimate_dfa_alpha(window: &[f64], params: &DfaParams) -> FractalResult<f64> {
    params.validate()?;

    // Flat window: F(n) = 0 for all n, up to rounding residue of the mean removal
    let (lo, hi) = window
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    if window.is_empty() || float_ops::approx_zero(hi - lo) {
        return Err(FractalVoiceError::InsufficientScales {
            window_index: 0,
            required: MIN_DFA_SCALES,
            actual: 0,
        });
    }

    let fluctuations = dfa_fluctuations(window, params)?;

    let (log_n, log_f): (Vec<f64>, Vec<f64>) = fluctuations
        .iter()
        .filter_map(|&(n, f)| float_ops::safe_ln(f).map(|ln_f| ((n as f64).ln(), ln_f)))
        .unzip();

    if log_f.len() < MIN_DFA_SCALES {
        return Err(FractalVoiceError::InsufficientScales {
            window_index: 0,
            required: MIN_DFA_SCALES,
            actual: log_f.len(),
        });
    }

    let (slope, _) = ols_regression(&log_n, &log_f)?;
    Ok(slope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{generate_signal, SignalKind};

    fn mean_alpha(kind: SignalKind, trials: u64, length: usize) -> f64 {
        let params = DfaParams::default();
        (0..trials)
            .map(|seed| {
                let signal = generate_signal(kind, length, 1000 + seed).unwrap();
                estimate_dfa_alpha(&signal, &params).unwrap()
            })
            .sum::<f64>()
            / trials as f64
    }

    #[test]
    fn test_uncorrelated_noise_alpha_half() {
        let alpha = mean_alpha(SignalKind::GaussianNoise, 20, 4000);
        assert!((alpha - 0.5).abs() < 0.1, "noise alpha {}", alpha);
    }

    #[test]
    fn test_uniform_noise_alpha_half() {
        let alpha = mean_alpha(SignalKind::UniformNoise, 20, 4000);
        assert!((alpha - 0.5).abs() < 0.1, "uniform noise alpha {}", alpha);
    }

    #[test]
    fn test_random_walk_alpha_three_halves() {
        let alpha = mean_alpha(SignalKind::RandomWalk, 20, 4000);
        assert!((alpha - 1.5).abs() < 0.1, "random walk alpha {}", alpha);
    }

    #[test]
    fn test_ramp_has_quadratic_profile() {
        let ramp: Vec<f64> = (0..2000).map(|i| i as f64 * 0.01).collect();
        let alpha = estimate_dfa_alpha(&ramp, &DfaParams::default()).unwrap();
        assert!((alpha - 2.0).abs() < 0.05, "ramp alpha {}", alpha);
    }

    #[test]
    fn test_constant_window_has_no_scales() {
        let flat = vec![0.7; 1000];
        match estimate_dfa_alpha(&flat, &DfaParams::default()) {
            Err(FractalVoiceError::InsufficientScales { required, actual, .. }) => {
                assert_eq!(required, MIN_DFA_SCALES);
                assert_eq!(actual, 0);
            }
            other => panic!("Expected InsufficientScales, got {:?}", other),
        }
    }

    #[test]
    fn test_short_window_has_no_scales() {
        let params = DfaParams::default();
        // N/4 = 4 leaves a single box size
        let noise = generate_signal(SignalKind::GaussianNoise, 16, 1).unwrap();
        assert!(matches!(
            estimate_dfa_alpha(&noise, &params),
            Err(FractalVoiceError::InsufficientScales { actual: 1, .. })
        ));
        // N/4 = 5 gives box sizes 4 and 5
        let noise = generate_signal(SignalKind::GaussianNoise, 20, 1).unwrap();
        assert_eq!(params.box_sizes(20), vec![4, 5]);
        assert!(estimate_dfa_alpha(&noise, &params).is_ok());
    }

    #[test]
    fn test_box_below_three_rejected() {
        let noise = generate_signal(SignalKind::GaussianNoise, 400, 3).unwrap();
        let params = DfaParams {
            min_box: 2,
            ..DfaParams::default()
        };
        assert!(matches!(
            estimate_dfa_alpha(&noise, &params),
            Err(FractalVoiceError::InvalidParameter { value, .. }) if value == 2.0
        ));
        assert!(dfa_fluctuations(&noise, &params).is_err());

        let flat_growth = DfaParams {
            growth: 1.0,
            ..DfaParams::default()
        };
        assert!(matches!(
            estimate_dfa_alpha(&noise, &flat_growth),
            Err(FractalVoiceError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_box_sizes_respect_quarter_length() {
        let params = DfaParams {
            min_box: 4,
            max_box: 10_000,
            growth: 1.5,
        };
        let sizes = params.box_sizes(400);
        assert!(sizes.iter().all(|&n| n <= 100));
        assert_eq!(sizes.first(), Some(&4));
    }

    #[test]
    fn test_fluctuation_averages_over_boxes() {
        let profile: Vec<f64> = vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 5.0, 0.0, 0.0, 0.0];
        // Two boxes of five; the remainder is dropped
        let f = calculate_dfa_fluctuation(&profile, 5).unwrap();
        let first = calculate_segment_fluctuation(&profile[0..5]).unwrap();
        let second = calculate_segment_fluctuation(&profile[5..10]).unwrap();
        assert!((f - (first + second) / 2.0).abs() < 1e-12);
    }
}
