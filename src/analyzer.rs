//! # Multi-Scale Fractal Analyzer
//!
//! This module contains the [`MultiScaleAnalyzer`] which computes an HFD and a
//! DFA value for every window at each configured scale of a clip.
//!
//! ## Key Features
//!
//! - **Independent scales**: each window scale is planned and measured on its
//!   own; one failing scale does not sink the run
//! - **Window-level fault tolerance**: windows whose DFA cannot form enough
//!   box sizes are recorded as skipped instead of aborting the scale
//! - **Cancellation**: a [`CancellationToken`] is checked before every window
//! - **Parallel windows**: with the `parallel` feature windows are measured on
//!   the rayon pool and collected back in window order
//!
//! ## Usage Example
//!
//! ```rust
//! use fractal_voice::{AnalysisConfig, MultiScaleAnalyzer};
//! use fractal_voice::generators::{generate_signal, SignalKind};
//!
//! # fn main() -> Result<(), fractal_voice::FractalVoiceError> {
//! let config = AnalysisConfig {
//!     window_scales_seconds: vec![1.0],
//!     ..AnalysisConfig::standard()
//! };
//! let analyzer = MultiScaleAnalyzer::new(config)?;
//! let clip = generate_signal(SignalKind::UniformNoise, 3 * 16000, 1)?;
//! let analysis = analyzer.analyze(&clip, 16000)?;
//! assert_eq!(analysis.series[0].len(), 3);
//! # Ok(())
//! # }
//! ```

use crate::{
    config::AnalysisConfig,
    dfa::{estimate_dfa_alpha, DfaParams},
    errors::{FractalResult, FractalVoiceError, ScaleFailure},
    higuchi::estimate_higuchi_fd,
    preprocessing::{truncate_to_duration, validate_samples, Window, WindowPlan},
    results::{Measurement, MeasurementSeries, MultiScaleAnalysis, WindowFailure},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that asks a running analysis to stop.
///
/// Clones observe the same flag, so one clone can be handed to another
/// thread and cancelled from there.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// New, not yet cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Computes per-window HFD and DFA series over several window scales.
///
/// The analyzer holds only its configuration and can be shared between
/// threads; every call to [`analyze`](Self::analyze) is independent.
#[derive(Debug, Clone)]
pub struct MultiScaleAnalyzer {
    config: AnalysisConfig,
}

impl MultiScaleAnalyzer {
    /// Create an analyzer after validating `config`.
    pub fn new(config: AnalysisConfig) -> FractalResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse a decoded mono clip.
    pub fn analyze(&self, samples: &[f64], sample_rate: u32) -> FractalResult<MultiScaleAnalysis> {
        self.analyze_with_cancellation(samples, sample_rate, &CancellationToken::new())
    }

    /// Analyse a clip, stopping early if `token` is cancelled.
    ///
    /// # Errors
    /// - `Cancelled` when the token fires; no partial result is returned
    /// - `AllScalesFailed` when no scale produced a series
    /// - `NumericalError` when the samples contain non-finite values
    pub fn analyze_with_cancellation(
        &self,
        samples: &[f64],
        sample_rate: u32,
        token: &CancellationToken,
    ) -> FractalResult<MultiScaleAnalysis> {
        if sample_rate == 0 {
            return Err(FractalVoiceError::InvalidParameter {
                parameter: "sample_rate".to_string(),
                value: 0.0,
                constraint: "> 0".to_string(),
            });
        }
        validate_samples(samples)?;

        let clip = truncate_to_duration(samples, sample_rate, self.config.max_clip_seconds);
        if clip.len() < samples.len() {
            log::info!(
                "Clip truncated from {:.2}s to {:.2}s",
                samples.len() as f64 / sample_rate as f64,
                clip.len() as f64 / sample_rate as f64
            );
        }
        log::info!(
            "Analysing {} samples at {} Hz over scales {:?}",
            clip.len(),
            sample_rate,
            self.config.window_scales_seconds
        );

        let mut series = Vec::with_capacity(self.config.window_scales_seconds.len());
        let mut failed_scales = Vec::new();

        for &scale in &self.config.window_scales_seconds {
            match self.analyze_scale(clip, sample_rate, scale, token) {
                Ok(s) => series.push(s),
                Err(e @ FractalVoiceError::Cancelled { .. }) => return Err(e),
                Err(e) => {
                    log::warn!("Scale {}s failed: {}", scale, e);
                    failed_scales.push(ScaleFailure::new(scale, &e));
                }
            }
        }

        if series.is_empty() {
            return Err(FractalVoiceError::AllScalesFailed {
                failures: failed_scales,
            });
        }

        Ok(MultiScaleAnalysis {
            sample_rate,
            input_samples: samples.len(),
            analyzed_samples: clip.len(),
            series,
            failed_scales,
        })
    }

    /// Measurement series of a single scale.
    ///
    /// # Errors
    /// - `InsufficientData` when the clip is shorter than one window
    /// - `EmptySeries` when every window was skipped
    /// - `Cancelled` when the token fires
    pub fn analyze_scale(
        &self,
        clip: &[f64],
        sample_rate: u32,
        scale_seconds: f64,
        token: &CancellationToken,
    ) -> FractalResult<MeasurementSeries> {
        let plan = WindowPlan::new(clip.len(), sample_rate, scale_seconds, self.config.hop_seconds)?;
        let dfa_params = self.config.dfa_params();

        let measure = |window: Window<'_>| -> FractalResult<Measurement> {
            if token.is_cancelled() {
                return Err(FractalVoiceError::Cancelled {
                    scale_seconds,
                    window_index: window.index,
                });
            }
            self.measure_window(&window, sample_rate, &dfa_params)
                .map_err(|e| e.at_window(window.index))
        };

        #[cfg(feature = "parallel")]
        let outcomes: Vec<FractalResult<Measurement>> = {
            use rayon::prelude::*;

            (0..plan.window_count)
                .into_par_iter()
                .map(|i| measure(plan.window(clip, i)))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<FractalResult<Measurement>> = {
            let mut outcomes = Vec::with_capacity(plan.window_count);
            for window in plan.iter(clip) {
                let outcome = measure(window);
                let cancelled = matches!(outcome, Err(FractalVoiceError::Cancelled { .. }));
                outcomes.push(outcome);
                if cancelled {
                    break;
                }
            }
            outcomes
        };

        let mut measurements = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(m) => measurements.push(m),
                Err(e) if e.is_window_skippable() => {
                    log::warn!("Skipping window {} at {}s scale: {}", index, scale_seconds, e);
                    skipped.push(WindowFailure {
                        window_index: index,
                        start_seconds: (index * plan.hop_samples) as f64 / sample_rate as f64,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if measurements.is_empty() {
            return Err(FractalVoiceError::EmptySeries {
                scale_seconds,
                skipped: skipped.len(),
            });
        }

        log::info!(
            "Scale {}s: {} windows measured, {} skipped",
            scale_seconds,
            measurements.len(),
            skipped.len()
        );

        Ok(MeasurementSeries {
            scale_seconds,
            window_samples: plan.window_samples,
            hop_samples: plan.hop_samples,
            measurements,
            skipped,
        })
    }

    fn measure_window(
        &self,
        window: &Window<'_>,
        sample_rate: u32,
        dfa_params: &DfaParams,
    ) -> FractalResult<Measurement> {
        let hfd = estimate_higuchi_fd(window.samples, self.config.k_max, self.config.hfd_normalization)?;
        let dfa = estimate_dfa_alpha(window.samples, dfa_params)?;

        if !hfd.is_finite() || !dfa.is_finite() {
            return Err(FractalVoiceError::NumericalError {
                reason: format!("non-finite measurement (hfd = {}, dfa = {})", hfd, dfa),
            });
        }

        Ok(Measurement {
            start_seconds: window.start_seconds(sample_rate),
            hfd,
            dfa,
        })
    }
}
