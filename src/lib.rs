//! # Fractal Voice Analysis
//!
//! Multi-scale fractal analysis of voice recordings for telling human speech
//! from synthetic speech.
//!
//! A decoded mono clip is cut into fixed-length windows at one or more time
//! scales. Every window gets two complexity measures: the Higuchi fractal
//! dimension (HFD) and the Detrended Fluctuation Analysis (DFA) scaling
//! exponent. Thresholds are derived from the clip's own measurements, and the
//! clip is labelled by comparing its mean measures against them.
//!
//! ## Key Features
//!
//! - **Higuchi FD**: curve-length scaling with a reduced [0, 1] or classic
//!   [1, 2] normalization
//! - **DFA**: first-order detrending over log-spaced box sizes
//! - **Multi-scale windows**: independent scales with per-window fault tolerance
//! - **Adaptive thresholds**: mean plus an offset of the standard deviation,
//!   combined with an AND or OR rule
//! - **Segment vote**: rolling vote over consecutive windows, with a three-span
//!   retroactive summary
//! - **Audio and reports**: WAV decoding, CSV and JSON export, clip comparison
//!
//! ## Quick Start
//!
//! ```rust
//! use fractal_voice::{classify, AnalysisConfig, CombinationRule, MultiScaleAnalyzer};
//! use fractal_voice::generators::{generate_signal, SignalKind};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig {
//!         window_scales_seconds: vec![1.0],
//!         k_max: 8,
//!         combination_rule: CombinationRule::And,
//!         ..AnalysisConfig::standard()
//!     };
//!     let analyzer = MultiScaleAnalyzer::new(config.clone())?;
//!
//!     let clip = generate_signal(SignalKind::UniformNoise, 5 * 16000, 42)?;
//!     let analysis = analyzer.analyze(&clip, 16000)?;
//!     let result = classify(&analysis, &config)?;
//!
//!     println!("{} (HFD {:.3}, DFA {:.3})", result.label, result.mean_hfd, result.mean_dfa);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! [`MultiScaleAnalyzer`] turns samples into a [`MultiScaleAnalysis`]; the
//! functions in [`classifier`] turn that into labels. The estimators in
//! [`higuchi`] and [`dfa`] can be used on their own.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod analyzer;
pub mod config;
pub mod errors;
pub mod math_utils;
pub mod preprocessing;
pub mod results;

// Estimators
pub mod dfa;
pub mod higuchi;

// Classification and output
pub mod classifier;
pub mod comparison;
pub mod report;

// Input and test signals
pub mod audio;
pub mod generators;

// Re-exports for convenience - main public API
pub use analyzer::{CancellationToken, MultiScaleAnalyzer};
pub use config::{AnalysisConfig, CombinationRule, HiguchiNormalization, SegmentConfig};
pub use errors::{FractalResult, FractalVoiceError, ScaleFailure};
pub use results::{
    AlignedPoint, ClassificationResult, Label, Measurement, MeasurementSeries,
    MultiScaleAnalysis, RetroactiveSegment, ScaleSpanMeans, SegmentClassification, ThresholdSet,
    WindowFailure,
};

// Estimator exports
pub use dfa::{estimate_dfa_alpha, DfaParams};
pub use higuchi::estimate_higuchi_fd;

// Classification exports
pub use classifier::{classify, classify_segments, compute_thresholds, retroactive_analysis};
pub use comparison::{compare_clips, ComparisonSummary, SeriesStatistics};

// Audio and reporting exports
pub use audio::{load_wav, ChannelReduction, DecodedAudio};
pub use report::{write_csv, write_csv_file, ClipReport};
