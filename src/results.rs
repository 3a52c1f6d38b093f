//! # Analysis Results Structures
//!
//! Measurements produced by the multi-scale analyzer and the classification
//! outputs derived from them. All of these are plain values; once produced
//! they are not mutated by the library.

use crate::errors::ScaleFailure;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// HFD and DFA of one window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurement {
    /// Window start time in seconds
    pub start_seconds: f64,
    /// Higuchi fractal dimension
    pub hfd: f64,
    /// DFA scaling exponent
    pub dfa: f64,
}

/// A window whose measurement was omitted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WindowFailure {
    /// Index of the window within its scale
    pub window_index: usize,
    /// Window start time in seconds
    pub start_seconds: f64,
    /// Rendered error message
    pub reason: String,
}

/// Ordered measurements of one scale.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasurementSeries {
    /// Window length in seconds
    pub scale_seconds: f64,
    /// Window length in samples
    pub window_samples: usize,
    /// Distance between window starts in samples
    pub hop_samples: usize,
    /// Measurements in ascending start time
    pub measurements: Vec<Measurement>,
    /// Windows omitted from the series
    pub skipped: Vec<WindowFailure>,
}

impl MeasurementSeries {
    /// Number of measurements.
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    /// Whether the series holds no measurement.
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// HFD values in time order.
    pub fn hfd_values(&self) -> Vec<f64> {
        self.measurements.iter().map(|m| m.hfd).collect()
    }

    /// DFA values in time order.
    pub fn dfa_values(&self) -> Vec<f64> {
        self.measurements.iter().map(|m| m.dfa).collect()
    }

    /// Window start times in seconds.
    pub fn timestamps(&self) -> Vec<f64> {
        self.measurements.iter().map(|m| m.start_seconds).collect()
    }
}

/// A start time shared by every scale.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlignedPoint {
    /// Window start time in seconds
    pub start_seconds: f64,
    /// Index into each series' measurements, in series order
    pub indices: Vec<usize>,
}

impl AlignedPoint {
    /// Measurement of series `scale` at this start time.
    pub fn measurement<'a>(&self, analysis: &'a MultiScaleAnalysis, scale: usize) -> &'a Measurement {
        &analysis.series[scale].measurements[self.indices[scale]]
    }
}

/// Output of one multi-scale analysis run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultiScaleAnalysis {
    /// Sample rate of the analysed sequence
    pub sample_rate: u32,
    /// Samples provided by the caller
    pub input_samples: usize,
    /// Samples analysed after truncation
    pub analyzed_samples: usize,
    /// Successful scales, in configuration order
    pub series: Vec<MeasurementSeries>,
    /// Scales that produced no series
    pub failed_scales: Vec<ScaleFailure>,
}

impl MultiScaleAnalysis {
    /// Whether the input was cut at the clip length limit.
    pub fn was_truncated(&self) -> bool {
        self.analyzed_samples < self.input_samples
    }

    /// Series of a given scale, if that scale succeeded.
    pub fn series_for(&self, scale_seconds: f64) -> Option<&MeasurementSeries> {
        self.series.iter().find(|s| s.scale_seconds == scale_seconds)
    }

    /// Window start times measured at every successful scale, in time order.
    ///
    /// Start times are matched on their sample offset, so a start that one
    /// scale skipped or never reached is absent from the timeline.
    pub fn aligned_timeline(&self) -> Vec<AlignedPoint> {
        let key = |seconds: f64| (seconds * self.sample_rate as f64).round() as u64;

        let lookups: Vec<BTreeMap<u64, usize>> = self
            .series
            .iter()
            .map(|s| {
                s.measurements
                    .iter()
                    .enumerate()
                    .map(|(i, m)| (key(m.start_seconds), i))
                    .collect()
            })
            .collect();

        let first = match self.series.first() {
            Some(first) => first,
            None => return Vec::new(),
        };

        first
            .measurements
            .iter()
            .filter_map(|m| {
                let k = key(m.start_seconds);
                let indices = lookups
                    .iter()
                    .map(|lookup| lookup.get(&k).copied())
                    .collect::<Option<Vec<usize>>>()?;
                Some(AlignedPoint {
                    start_seconds: m.start_seconds,
                    indices,
                })
            })
            .collect()
    }

    /// Length of [`aligned_timeline`](Self::aligned_timeline).
    pub fn aligned_len(&self) -> usize {
        self.aligned_timeline().len()
    }

    /// All HFD values across scales.
    pub fn pooled_hfd(&self) -> Vec<f64> {
        self.series.iter().flat_map(|s| s.hfd_values()).collect()
    }

    /// All DFA values across scales.
    pub fn pooled_dfa(&self) -> Vec<f64> {
        self.series.iter().flat_map(|s| s.dfa_values()).collect()
    }
}

/// Final label of a clip or segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Label {
    /// Human voice
    Human,
    /// AI-generated voice
    AiGenerated,
}

impl Label {
    /// Label for a boolean AI decision.
    pub fn from_ai(is_ai: bool) -> Self {
        if is_ai {
            Label::AiGenerated
        } else {
            Label::Human
        }
    }

    /// Whether this is the AI label.
    pub fn is_ai(self) -> bool {
        self == Label::AiGenerated
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Human => write!(f, "Human"),
            Label::AiGenerated => write!(f, "AI-generated"),
        }
    }
}

/// Decision thresholds derived from a clip's own measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdSet {
    /// HFD threshold
    pub hfd: f64,
    /// DFA threshold
    pub dfa: f64,
}

/// Clip-level classification.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassificationResult {
    /// Final label
    pub label: Label,
    /// Clip mean HFD (mean of per-scale means)
    pub mean_hfd: f64,
    /// Clip mean DFA (mean of per-scale means)
    pub mean_dfa: f64,
    /// Thresholds the means were compared against
    pub thresholds: ThresholdSet,
}

/// Labels of the rolling segment vote and the overall verdict.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentClassification {
    /// Start times of the aligned timeline (first scale)
    pub timestamps: Vec<f64>,
    /// One label per aligned measurement
    pub labels: Vec<Label>,
    /// Fraction of AI labels
    pub ai_fraction: f64,
    /// Majority label
    pub overall: Label,
    /// max(p, 1 - p) of the AI fraction
    pub confidence: f64,
}

/// Mean measures of one scale inside a retroactive span.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScaleSpanMeans {
    /// Window scale in seconds
    pub scale_seconds: f64,
    /// Mean HFD in the span, `None` when the span is empty
    pub mean_hfd: Option<f64>,
    /// Mean DFA in the span, `None` when the span is empty
    pub mean_dfa: Option<f64>,
}

/// One third of the clip timeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RetroactiveSegment {
    /// Span start in seconds (inclusive)
    pub start_seconds: f64,
    /// Span end in seconds (exclusive)
    pub end_seconds: f64,
    /// Per-scale means
    pub scales: Vec<ScaleSpanMeans>,
    /// Fraction of AI segment labels, `None` when the span is empty
    pub ai_fraction: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(scale: f64, values: &[(f64, f64)]) -> MeasurementSeries {
        MeasurementSeries {
            scale_seconds: scale,
            window_samples: 100,
            hop_samples: 100,
            measurements: values
                .iter()
                .enumerate()
                .map(|(i, &(hfd, dfa))| Measurement {
                    start_seconds: i as f64 * scale,
                    hfd,
                    dfa,
                })
                .collect(),
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_pooled_values_and_alignment() {
        let analysis = MultiScaleAnalysis {
            sample_rate: 100,
            input_samples: 500,
            analyzed_samples: 500,
            series: vec![
                series(1.0, &[(0.1, 1.0), (0.2, 1.1), (0.3, 1.2)]),
                series(2.0, &[(0.4, 1.3)]),
            ],
            failed_scales: Vec::new(),
        };
        assert_eq!(analysis.pooled_hfd(), vec![0.1, 0.2, 0.3, 0.4]);
        assert_eq!(analysis.pooled_dfa().len(), 4);
        assert_eq!(analysis.aligned_len(), 1);
        assert!(!analysis.was_truncated());
        assert!(analysis.series_for(2.0).is_some());
        assert!(analysis.series_for(3.0).is_none());
    }

    #[test]
    fn test_timeline_joins_scales_by_start_time() {
        let mut fine = series(1.0, &[(0.0, 0.0), (0.1, 0.0), (0.2, 0.0), (0.3, 0.0), (0.4, 0.0), (0.5, 0.0), (0.6, 0.0)]);
        // 1 s window starting at 3 s was skipped
        fine.measurements.remove(3);
        let coarse = series(3.0, &[(1.0, 0.0), (1.3, 0.0)]);
        let analysis = MultiScaleAnalysis {
            sample_rate: 100,
            input_samples: 700,
            analyzed_samples: 700,
            series: vec![fine, coarse],
            failed_scales: Vec::new(),
        };

        let timeline = analysis.aligned_timeline();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].start_seconds, 0.0);
        assert_eq!(timeline[0].indices, vec![0, 0]);
        assert_eq!(timeline[0].measurement(&analysis, 1).hfd, 1.0);
        assert_eq!(analysis.aligned_len(), 1);
    }

    #[test]
    fn test_timeline_with_shared_hop() {
        let mut coarse = series(3.0, &[(1.0, 0.0), (1.1, 0.0), (1.2, 0.0)]);
        for (i, m) in coarse.measurements.iter_mut().enumerate() {
            m.start_seconds = i as f64;
        }
        let analysis = MultiScaleAnalysis {
            sample_rate: 100,
            input_samples: 500,
            analyzed_samples: 500,
            series: vec![series(1.0, &[(0.0, 0.0); 5]), coarse],
            failed_scales: Vec::new(),
        };
        let timeline = analysis.aligned_timeline();
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[2].indices, vec![2, 2]);
        assert_eq!(timeline[2].measurement(&analysis, 1).hfd, 1.2);
    }

    #[test]
    fn test_label_display() {
        assert_eq!(Label::from_ai(true).to_string(), "AI-generated");
        assert_eq!(Label::from_ai(false).to_string(), "Human");
        assert!(Label::AiGenerated.is_ai());
    }
}
