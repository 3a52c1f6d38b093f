//! Side-by-side comparison of two analysed clips.
//!
//! Both clips are cut to the shorter of their aligned timelines before any statistic
//! is taken, so the summaries and the label agreement cover the same
//! timeline positions.

use crate::{
    errors::{FractalResult, FractalVoiceError},
    math_utils::{float_total_cmp, median},
    results::{AlignedPoint, Label, MultiScaleAnalysis},
};
use statrs::statistics::Statistics;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which fractal measure a row summarises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeasureKind {
    /// Higuchi fractal dimension
    Hfd,
    /// DFA scaling exponent
    Dfa,
}

impl std::fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasureKind::Hfd => write!(f, "HFD"),
            MeasureKind::Dfa => write!(f, "DFA"),
        }
    }
}

/// Summary statistics of one measure series.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeriesStatistics {
    /// Arithmetic mean
    pub mean: f64,
    /// Median
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
}

impl SeriesStatistics {
    /// Statistics of `values`, `None` when empty.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            mean: values.iter().mean(),
            median: median(values),
            std_dev: values.iter().population_std_dev(),
            min: values.iter().copied().min_by(float_total_cmp)?,
            max: values.iter().copied().max_by(float_total_cmp)?,
        })
    }
}

/// One measure at one scale for both clips.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComparisonRow {
    /// Measure summarised
    pub measure: MeasureKind,
    /// Window scale in seconds
    pub scale_seconds: f64,
    /// Statistics of the first clip
    pub first: SeriesStatistics,
    /// Statistics of the second clip
    pub second: SeriesStatistics,
}

/// Result of [`compare_clips`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComparisonSummary {
    /// Timeline positions compared
    pub compared_len: usize,
    /// Rows for every scale present in both clips, HFD rows first
    pub rows: Vec<ComparisonRow>,
    /// Percentage of positions where the segment labels agree
    pub label_agreement_percent: f64,
}

/// Compare two clips and their segment labels.
///
/// # Errors
/// - `InsufficientData` when the clips share no aligned position
/// - `InvalidParameter` when the clips share no scale
pub fn compare_clips(
    first: &MultiScaleAnalysis,
    first_labels: &[Label],
    second: &MultiScaleAnalysis,
    second_labels: &[Label],
) -> FractalResult<ComparisonSummary> {
    let first_timeline = first.aligned_timeline();
    let second_timeline = second.aligned_timeline();
    let compared_len = first_timeline
        .len()
        .min(second_timeline.len())
        .min(first_labels.len())
        .min(second_labels.len());
    if compared_len == 0 {
        return Err(FractalVoiceError::InsufficientData {
            scale_seconds: 0.0,
            required: 1,
            actual: 0,
        });
    }

    let shared: Vec<(f64, usize, usize)> = first
        .series
        .iter()
        .enumerate()
        .filter_map(|(i, a)| {
            second
                .series
                .iter()
                .position(|b| b.scale_seconds == a.scale_seconds)
                .map(|j| (a.scale_seconds, i, j))
        })
        .collect();
    if shared.is_empty() {
        return Err(FractalVoiceError::InvalidParameter {
            parameter: "window scales".to_string(),
            value: f64::NAN,
            constraint: "at least one scale analysed in both clips".to_string(),
        });
    }

    let mut rows = Vec::with_capacity(shared.len() * 2);
    for measure in [MeasureKind::Hfd, MeasureKind::Dfa] {
        for &(scale_seconds, i, j) in &shared {
            let pick = |analysis: &MultiScaleAnalysis, timeline: &[AlignedPoint], scale: usize| -> Vec<f64> {
                timeline[..compared_len]
                    .iter()
                    .map(|point| {
                        let m = point.measurement(analysis, scale);
                        match measure {
                            MeasureKind::Hfd => m.hfd,
                            MeasureKind::Dfa => m.dfa,
                        }
                    })
                    .collect()
            };
            if let (Some(first), Some(second)) = (
                SeriesStatistics::from_values(&pick(first, &first_timeline, i)),
                SeriesStatistics::from_values(&pick(second, &second_timeline, j)),
            ) {
                rows.push(ComparisonRow {
                    measure,
                    scale_seconds,
                    first,
                    second,
                });
            }
        }
    }

    let agreeing = first_labels[..compared_len]
        .iter()
        .zip(&second_labels[..compared_len])
        .filter(|(a, b)| a == b)
        .count();
    let label_agreement_percent = agreeing as f64 / compared_len as f64 * 100.0;

    log::info!(
        "Compared {} positions over {} shared scales: labels agree {:.1}%",
        compared_len,
        shared.len(),
        label_agreement_percent
    );

    Ok(ComparisonSummary {
        compared_len,
        rows,
        label_agreement_percent,
    })
}
