//! # Adaptive Threshold Classification
//!
//! Thresholds are derived from the clip itself: the pooled mean of every
//! measurement across scales plus an offset of the pooled population
//! standard deviation. A clip is labelled by comparing its mean HFD and DFA
//! against those thresholds and combining the two tests with the configured
//! rule.
//!
//! [`classify_segments`] additionally votes on short runs of consecutive
//! measurements, which also penalises runs whose measures fluctuate strongly,
//! and [`retroactive_analysis`] summarises the clip in three equal time spans.

use crate::{
    config::{AnalysisConfig, SegmentConfig},
    errors::{FractalResult, FractalVoiceError},
    results::{
        AlignedPoint, ClassificationResult, Label, Measurement, MultiScaleAnalysis,
        RetroactiveSegment, ScaleSpanMeans, SegmentClassification, ThresholdSet,
    },
};
use statrs::statistics::Statistics;

/// Number of equal spans of the retroactive analysis
pub const RETROACTIVE_SPANS: usize = 3;

/// Weighted vote above which a run is labelled AI
const VOTE_THRESHOLD: f64 = 0.5;

/// Thresholds from the pooled measurements of all successful scales.
///
/// # Errors
/// `InsufficientData` when the analysis holds no measurement.
pub fn compute_thresholds(
    analysis: &MultiScaleAnalysis,
    config: &AnalysisConfig,
) -> FractalResult<ThresholdSet> {
    let hfd = analysis.pooled_hfd();
    let dfa = analysis.pooled_dfa();
    if hfd.is_empty() {
        return Err(FractalVoiceError::InsufficientData {
            scale_seconds: 0.0,
            required: 1,
            actual: 0,
        });
    }

    let thresholds = ThresholdSet {
        hfd: hfd.iter().mean() + config.threshold_offset_hfd * hfd.iter().population_std_dev(),
        dfa: dfa.iter().mean() + config.threshold_offset_dfa * dfa.iter().population_std_dev(),
    };
    log::debug!(
        "Thresholds from {} measurements: HFD {:.4}, DFA {:.4}",
        hfd.len(),
        thresholds.hfd,
        thresholds.dfa
    );
    Ok(thresholds)
}

/// Clip-level label.
///
/// The clip means are the mean of the per-scale means, so every scale
/// counts once whatever its number of windows.
pub fn classify(
    analysis: &MultiScaleAnalysis,
    config: &AnalysisConfig,
) -> FractalResult<ClassificationResult> {
    let thresholds = compute_thresholds(analysis, config)?;

    let mean_hfd = analysis.series.iter().map(|s| s.hfd_values().mean()).mean();
    let mean_dfa = analysis.series.iter().map(|s| s.dfa_values().mean()).mean();

    let is_ai = config
        .combination_rule
        .combine(mean_hfd > thresholds.hfd, mean_dfa > thresholds.dfa);
    let label = Label::from_ai(is_ai);

    log::info!(
        "Clip classified as {} (HFD {:.4} vs {:.4}, DFA {:.4} vs {:.4}, rule {:?})",
        label,
        mean_hfd,
        thresholds.hfd,
        mean_dfa,
        thresholds.dfa,
        config.combination_rule
    );

    Ok(ClassificationResult {
        label,
        mean_hfd,
        mean_dfa,
        thresholds,
    })
}

/// Mean and population std of one run of one measure, averaged over scales.
fn run_level_and_spread<F>(analysis: &MultiScaleAnalysis, run: &[AlignedPoint], measure: F) -> (f64, f64)
where
    F: Fn(&Measurement) -> f64,
{
    let per_scale: Vec<(f64, f64)> = (0..analysis.series.len())
        .map(|scale| {
            let values: Vec<f64> = run
                .iter()
                .map(|point| measure(point.measurement(analysis, scale)))
                .collect();
            (values.iter().mean(), values.iter().population_std_dev())
        })
        .collect();

    (
        per_scale.iter().map(|&(mean, _)| mean).mean(),
        per_scale.iter().map(|&(_, spread)| spread).mean(),
    )
}

/// Rolling vote over runs of `segment_length` consecutive points of the
/// aligned timeline.
///
/// Each run votes per measure: AI when the run's level exceeds the threshold
/// or its spread exceeds the variability limit. The weighted votes decide the
/// run. The last label is repeated so there is one label per aligned
/// start time.
///
/// # Errors
/// `InsufficientData` when the aligned timeline is shorter than one run.
pub fn classify_segments(
    analysis: &MultiScaleAnalysis,
    thresholds: &ThresholdSet,
    segment: &SegmentConfig,
) -> FractalResult<SegmentClassification> {
    let timeline = analysis.aligned_timeline();
    let aligned = timeline.len();
    let run = segment.segment_length;
    if run == 0 || aligned < run {
        return Err(FractalVoiceError::InsufficientData {
            scale_seconds: analysis.series.first().map_or(0.0, |s| s.scale_seconds),
            required: run.max(1),
            actual: aligned,
        });
    }

    let mut labels: Vec<Label> = timeline
        .windows(run)
        .map(|points| {
            let (hfd_level, hfd_spread) = run_level_and_spread(analysis, points, |m| m.hfd);
            let (dfa_level, dfa_spread) = run_level_and_spread(analysis, points, |m| m.dfa);

            let hfd_vote = hfd_level > thresholds.hfd || hfd_spread > segment.hfd_variability_limit;
            let dfa_vote = dfa_level > thresholds.dfa || dfa_spread > segment.dfa_variability_limit;
            let score = segment.hfd_weight * f64::from(u8::from(hfd_vote))
                + segment.dfa_weight * f64::from(u8::from(dfa_vote));
            Label::from_ai(score > VOTE_THRESHOLD)
        })
        .collect();

    let last = labels[labels.len() - 1];
    labels.resize(aligned, last);

    let ai_count = labels.iter().filter(|l| l.is_ai()).count();
    let ai_fraction = ai_count as f64 / aligned as f64;
    let overall = Label::from_ai(ai_fraction > VOTE_THRESHOLD);
    let confidence = ai_fraction.max(1.0 - ai_fraction);

    log::info!(
        "Segment vote: {} of {} labels AI-generated, overall {} ({:.1}% confidence)",
        ai_count,
        aligned,
        overall,
        confidence * 100.0
    );

    Ok(SegmentClassification {
        timestamps: timeline.iter().map(|p| p.start_seconds).collect(),
        labels,
        ai_fraction,
        overall,
        confidence,
    })
}

/// Summaries of three equal spans of the aligned timeline.
///
/// Span boundaries run from 0 to the last aligned start time; the last span
/// includes its end.
pub fn retroactive_analysis(
    analysis: &MultiScaleAnalysis,
    segments: &SegmentClassification,
) -> Vec<RetroactiveSegment> {
    let mut timeline = analysis.aligned_timeline();
    timeline.truncate(segments.labels.len());
    let total = match timeline.last() {
        Some(point) => point.start_seconds,
        None => return Vec::new(),
    };
    let span = total / RETROACTIVE_SPANS as f64;

    (0..RETROACTIVE_SPANS)
        .map(|j| {
            let last_span = j + 1 == RETROACTIVE_SPANS;
            let start = span * j as f64;
            let end = if last_span { total } else { span * (j + 1) as f64 };
            let members: Vec<usize> = timeline
                .iter()
                .enumerate()
                .filter(|&(_, p)| {
                    let t = p.start_seconds;
                    t >= start && (t < end || (last_span && t <= end))
                })
                .map(|(i, _)| i)
                .collect();

            let mean_of = |values: Vec<f64>| (!values.is_empty()).then(|| values.mean());

            let scales = analysis
                .series
                .iter()
                .enumerate()
                .map(|(scale, s)| {
                    let at = |i: usize| timeline[i].measurement(analysis, scale);
                    ScaleSpanMeans {
                        scale_seconds: s.scale_seconds,
                        mean_hfd: mean_of(members.iter().map(|&i| at(i).hfd).collect()),
                        mean_dfa: mean_of(members.iter().map(|&i| at(i).dfa).collect()),
                    }
                })
                .collect();

            let ai_fraction = (!members.is_empty()).then(|| {
                members.iter().filter(|&&i| segments.labels[i].is_ai()).count() as f64
                    / members.len() as f64
            });

            RetroactiveSegment {
                start_seconds: start,
                end_seconds: end,
                scales,
                ai_fraction,
            }
        })
        .collect()
}
