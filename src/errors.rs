//! Error types and validation functions for fractal voice analysis.
//!
//! Every failure that concerns a particular scale or window carries the
//! scale (in seconds) and the window index so callers can report exactly
//! what was skipped or rejected.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Error types for fractal voice analysis operations.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum FractalVoiceError {
    /// The sample sequence is shorter than one window at the requested scale.
    #[error("Insufficient data at {scale_seconds}s scale: need at least {required} samples, got {actual}")]
    InsufficientData {
        /// Window scale in seconds (0.0 when not tied to a scale)
        scale_seconds: f64,
        /// Minimum required samples
        required: usize,
        /// Samples actually available
        actual: usize,
    },

    /// DFA could not form enough valid box sizes for a window.
    #[error("Insufficient DFA scales for window {window_index}: need {required} valid box sizes, got {actual}")]
    InsufficientScales {
        /// Index of the offending window within its scale
        window_index: usize,
        /// Minimum number of valid box sizes
        required: usize,
        /// Number of valid box sizes found
        actual: usize,
    },

    /// Invalid parameter value for analysis configuration.
    #[error("Invalid parameter: {parameter} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value provided
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// Numerical computation error.
    #[error("Numerical computation failed: {reason}")]
    NumericalError {
        /// Detailed reason for numerical failure
        reason: String,
    },

    /// Every window at a scale was skipped.
    #[error("No measurements at {scale_seconds}s scale: all {skipped} windows were skipped")]
    EmptySeries {
        /// Window scale in seconds
        scale_seconds: f64,
        /// Number of windows skipped
        skipped: usize,
    },

    /// No configured scale produced a measurement series.
    #[error("All {} configured scales failed: {}", .failures.len(), describe_failures(.failures))]
    AllScalesFailed {
        /// Per-scale failure descriptions
        failures: Vec<ScaleFailure>,
    },

    /// The run was cancelled through its cancellation token.
    #[error("Analysis cancelled at {scale_seconds}s scale before window {window_index}")]
    Cancelled {
        /// Scale being processed when cancellation was observed
        scale_seconds: f64,
        /// Window that would have been processed next
        window_index: usize,
    },

    /// Audio file could not be decoded.
    #[error("Failed to decode audio {path}: {reason}")]
    AudioDecode {
        /// Path of the audio file
        path: String,
        /// Decoder message
        reason: String,
    },

    /// I/O operation error.
    #[error("I/O operation failed: {operation}")]
    IoError {
        /// I/O operation that failed
        operation: String,
        /// Underlying error if available
        #[source]
        source: Option<Arc<std::io::Error>>,
    },
}

/// Result type for fractal voice analysis operations.
pub type FractalResult<T> = Result<T, FractalVoiceError>;

/// A scale that produced no measurement series, with the reason.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScaleFailure {
    /// Window scale in seconds
    pub scale_seconds: f64,
    /// Rendered error message
    pub reason: String,
}

impl ScaleFailure {
    /// Record the failure of `scale_seconds` with `error`.
    pub fn new(scale_seconds: f64, error: &FractalVoiceError) -> Self {
        Self {
            scale_seconds,
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for ScaleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s: {}", self.scale_seconds, self.reason)
    }
}

fn describe_failures(failures: &[ScaleFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl FractalVoiceError {
    /// Wrap an I/O error with the operation that produced it.
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        FractalVoiceError::IoError {
            operation: operation.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Attach the window index to a window-level error.
    pub fn at_window(self, index: usize) -> Self {
        match self {
            FractalVoiceError::InsufficientScales {
                required, actual, ..
            } => FractalVoiceError::InsufficientScales {
                window_index: index,
                required,
                actual,
            },
            FractalVoiceError::NumericalError { reason } => FractalVoiceError::NumericalError {
                reason: format!("window {}: {}", index, reason),
            },
            other => other,
        }
    }

    /// Whether this error only invalidates a single window and may be skipped.
    pub fn is_window_skippable(&self) -> bool {
        matches!(
            self,
            FractalVoiceError::InsufficientScales { .. } | FractalVoiceError::NumericalError { .. }
        )
    }
}

/// Validates that a sample sequence holds at least `min_required` samples.
///
/// # Example
/// ```rust
/// use fractal_voice::errors::validate_data_length;
///
/// let data = vec![1.0, 2.0, 3.0];
/// assert!(validate_data_length(&data, 2, 1.0).is_ok());
/// assert!(validate_data_length(&data, 5, 1.0).is_err());
/// ```
pub fn validate_data_length(
    data: &[f64],
    min_required: usize,
    scale_seconds: f64,
) -> FractalResult<()> {
    if data.len() < min_required {
        Err(FractalVoiceError::InsufficientData {
            scale_seconds,
            required: min_required,
            actual: data.len(),
        })
    } else {
        Ok(())
    }
}

/// Validates that a parameter lies within `[min, max]`.
///
/// # Example
/// ```rust
/// use fractal_voice::errors::validate_parameter;
///
/// assert!(validate_parameter(0.5, 0.0, 1.0, "overlap").is_ok());
/// assert!(validate_parameter(1.5, 0.0, 1.0, "overlap").is_err());
/// ```
pub fn validate_parameter(value: f64, min: f64, max: f64, name: &str) -> FractalResult<()> {
    if value.is_nan() {
        return Err(FractalVoiceError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: "must not be NaN".to_string(),
        });
    }

    if value < min || value > max {
        Err(FractalVoiceError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: format!("[{}, {}]", min, max),
        })
    } else {
        Ok(())
    }
}

/// Validates that all values in a slice are finite.
///
/// Returns on the first non-finite value, naming its index.
pub fn validate_all_finite(data: &[f64], name: &str) -> FractalResult<()> {
    if let Some((i, &value)) = data.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        let value_desc = if value.is_nan() {
            "NaN".to_string()
        } else if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };

        return Err(FractalVoiceError::NumericalError {
            reason: format!(
                "{} contains non-finite value at index {}: {}",
                name, i, value_desc
            ),
        });
    }

    Ok(())
}
