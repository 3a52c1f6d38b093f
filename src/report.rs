//! Result export.
//!
//! The CSV table has one row per aligned timeline position with the columns
//! `Time`, `Classification` and then `HFD_<s>s`, `DFA_<s>s` for every
//! analysed scale. With the `serde` feature the full [`ClipReport`] can be
//! written as JSON.

use crate::{
    classifier::{classify, classify_segments, compute_thresholds, retroactive_analysis},
    config::AnalysisConfig,
    errors::{FractalResult, FractalVoiceError},
    results::{ClassificationResult, MultiScaleAnalysis, RetroactiveSegment, SegmentClassification},
};
use std::io::Write;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Everything produced for one clip.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClipReport {
    /// Configuration of the run
    pub config: AnalysisConfig,
    /// Per-scale measurement series
    pub analysis: MultiScaleAnalysis,
    /// Clip-level label
    pub classification: ClassificationResult,
    /// Rolling segment vote, absent when the clip is shorter than one run
    pub segments: Option<SegmentClassification>,
    /// Three-span summary of the segment vote
    pub retroactive: Vec<RetroactiveSegment>,
}

impl ClipReport {
    /// Classify an analysed clip.
    pub fn from_analysis(analysis: MultiScaleAnalysis, config: &AnalysisConfig) -> FractalResult<Self> {
        let classification = classify(&analysis, config)?;
        let thresholds = compute_thresholds(&analysis, config)?;

        let segments = match classify_segments(&analysis, &thresholds, &config.segment) {
            Ok(segments) => Some(segments),
            Err(FractalVoiceError::InsufficientData { required, actual, .. }) => {
                log::warn!(
                    "Segment vote skipped: {} aligned measurements, {} needed",
                    actual,
                    required
                );
                None
            }
            Err(e) => return Err(e),
        };
        let retroactive = segments
            .as_ref()
            .map(|s| retroactive_analysis(&analysis, s))
            .unwrap_or_default();

        Ok(Self {
            config: config.clone(),
            analysis,
            classification,
            segments,
            retroactive,
        })
    }

    /// Pretty-printed JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> FractalResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| FractalVoiceError::IoError {
            operation: format!("serialising report: {}", e),
            source: None,
        })
    }

    /// Write the JSON report to `path`.
    #[cfg(feature = "serde")]
    pub fn write_json_file(&self, path: impl AsRef<Path>) -> FractalResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)
            .map_err(|e| FractalVoiceError::io(format!("writing {}", path.display()), e))?;
        log::info!("JSON report written to {}", path.display());
        Ok(())
    }
}

/// Write the aligned timeline as CSV.
///
/// When `segments` is `None` the classification column is left empty.
pub fn write_csv<W: Write>(
    mut out: W,
    analysis: &MultiScaleAnalysis,
    segments: Option<&SegmentClassification>,
) -> std::io::Result<()> {
    let mut timeline = analysis.aligned_timeline();
    if let Some(s) = segments {
        timeline.truncate(s.labels.len());
    }

    write!(out, "Time,Classification")?;
    for series in &analysis.series {
        write!(out, ",HFD_{}s,DFA_{}s", series.scale_seconds, series.scale_seconds)?;
    }
    writeln!(out)?;

    for (i, point) in timeline.iter().enumerate() {
        write!(out, "{}", point.start_seconds)?;
        match segments {
            Some(s) => write!(out, ",{}", s.labels[i])?,
            None => write!(out, ",")?,
        }
        for scale in 0..analysis.series.len() {
            let m = point.measurement(analysis, scale);
            write!(out, ",{},{}", m.hfd, m.dfa)?;
        }
        writeln!(out)?;
    }
    out.flush()
}

/// Write the CSV table to `path`.
pub fn write_csv_file(
    path: impl AsRef<Path>,
    analysis: &MultiScaleAnalysis,
    segments: Option<&SegmentClassification>,
) -> FractalResult<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .map_err(|e| FractalVoiceError::io(format!("creating {}", path.display()), e))?;
    write_csv(std::io::BufWriter::new(file), analysis, segments)
        .map_err(|e| FractalVoiceError::io(format!("writing {}", path.display()), e))?;
    log::info!("Results saved to {}", path.display());
    Ok(())
}
