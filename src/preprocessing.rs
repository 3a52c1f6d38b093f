//! Signal preprocessing: clip truncation and fixed-length windowing.
//!
//! Windows are produced lazily and borrow from the caller's sample sequence.
//! A trailing partial window is dropped rather than zero-padded, since
//! padding flattens the tail and biases both fractal estimators.

use crate::errors::{validate_all_finite, FractalResult, FractalVoiceError};

/// Number of samples in a window of `window_seconds` at `sample_rate`.
pub fn window_length_samples(window_seconds: f64, sample_rate: u32) -> FractalResult<usize> {
    if sample_rate == 0 {
        return Err(FractalVoiceError::InvalidParameter {
            parameter: "sample_rate".to_string(),
            value: 0.0,
            constraint: "> 0".to_string(),
        });
    }
    if !window_seconds.is_finite() || window_seconds <= 0.0 {
        return Err(FractalVoiceError::InvalidParameter {
            parameter: "window_seconds".to_string(),
            value: window_seconds,
            constraint: "finite and > 0".to_string(),
        });
    }
    let samples = (window_seconds * sample_rate as f64).round() as usize;
    if samples == 0 {
        return Err(FractalVoiceError::InvalidParameter {
            parameter: "window_seconds".to_string(),
            value: window_seconds,
            constraint: format!("at least one sample at {} Hz", sample_rate),
        });
    }
    Ok(samples)
}

/// Leading part of `samples` no longer than `max_seconds`.
pub fn truncate_to_duration(samples: &[f64], sample_rate: u32, max_seconds: f64) -> &[f64] {
    let limit = (max_seconds * sample_rate as f64).round();
    if limit.is_finite() && limit >= 0.0 && (limit as usize) < samples.len() {
        &samples[..limit as usize]
    } else {
        samples
    }
}

/// Check a decoded sample sequence before analysis.
pub fn validate_samples(samples: &[f64]) -> FractalResult<()> {
    validate_all_finite(samples, "sample sequence")
}

/// A contiguous slice of the sample sequence analysed as one unit.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    /// Position of the window within its scale
    pub index: usize,
    /// Offset of the first sample
    pub start: usize,
    /// Window samples
    pub samples: &'a [f64],
}

impl Window<'_> {
    /// Start time in seconds.
    pub fn start_seconds(&self, sample_rate: u32) -> f64 {
        self.start as f64 / sample_rate as f64
    }
}

/// Geometry of the windows of one scale over one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    /// Window length in samples
    pub window_samples: usize,
    /// Distance between successive window starts
    pub hop_samples: usize,
    /// Number of complete windows
    pub window_count: usize,
}

impl WindowPlan {
    /// Plan windows of `window_seconds` over `len` samples.
    ///
    /// `hop_seconds = None` yields non-overlapping windows.
    ///
    /// # Errors
    /// `InsufficientData` (tagged with the scale) when `len` is shorter than
    /// one window.
    pub fn new(
        len: usize,
        sample_rate: u32,
        window_seconds: f64,
        hop_seconds: Option<f64>,
    ) -> FractalResult<Self> {
        let window_samples = window_length_samples(window_seconds, sample_rate)?;
        let hop_samples = match hop_seconds {
            Some(hop) => window_length_samples(hop, sample_rate).map_err(|_| {
                FractalVoiceError::InvalidParameter {
                    parameter: "hop_seconds".to_string(),
                    value: hop,
                    constraint: format!("at least one sample at {} Hz", sample_rate),
                }
            })?,
            None => window_samples,
        };

        if len < window_samples {
            return Err(FractalVoiceError::InsufficientData {
                scale_seconds: window_seconds,
                required: window_samples,
                actual: len,
            });
        }

        Ok(Self {
            window_samples,
            hop_samples,
            window_count: (len - window_samples) / hop_samples + 1,
        })
    }

    /// Window `index` of `data`. `index` must be below `window_count`.
    pub fn window<'a>(&self, data: &'a [f64], index: usize) -> Window<'a> {
        let start = index * self.hop_samples;
        Window {
            index,
            start,
            samples: &data[start..start + self.window_samples],
        }
    }

    /// Lazy iterator over the windows of `data`.
    pub fn iter<'a>(&self, data: &'a [f64]) -> Windows<'a> {
        Windows {
            data,
            plan: *self,
            next: 0,
        }
    }
}

/// Iterator over the windows of one scale.
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    data: &'a [f64],
    plan: WindowPlan,
    next: usize,
}

impl<'a> Iterator for Windows<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.plan.window_count {
            return None;
        }
        let window = self.plan.window(self.data, self.next);
        self.next += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.plan.window_count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}

/// Windows of `window_seconds` over `data`.
///
/// # Example
/// ```rust
/// use fractal_voice::preprocessing::windows;
///
/// let data = vec![0.0; 250];
/// let starts: Vec<usize> = windows(&data, 100, 1.0, None).unwrap().map(|w| w.start).collect();
/// assert_eq!(starts, vec![0, 100]);
/// ```
pub fn windows(
    data: &[f64],
    sample_rate: u32,
    window_seconds: f64,
    hop_seconds: Option<f64>,
) -> FractalResult<Windows<'_>> {
    Ok(WindowPlan::new(data.len(), sample_rate, window_seconds, hop_seconds)?.iter(data))
}
