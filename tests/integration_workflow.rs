//! Integration tests for full workflow scenarios
//!
//! These tests run complete clips through analysis, classification and
//! reporting the way the command-line tool does.

use assert_approx_eq::assert_approx_eq;
use fractal_voice::{
    classify, classify_segments, compute_thresholds,
    generators::{generate_signal, SignalKind},
    load_wav, retroactive_analysis, write_csv, AnalysisConfig, ChannelReduction, ClipReport,
    CombinationRule, Label, MultiScaleAnalyzer,
};

const RATE: u32 = 16_000;

fn noise_config() -> AnalysisConfig {
    AnalysisConfig {
        window_scales_seconds: vec![1.0],
        k_max: 8,
        threshold_offset_hfd: 0.0,
        threshold_offset_dfa: 0.0,
        combination_rule: CombinationRule::And,
        ..AnalysisConfig::standard()
    }
}

/// Test scenario: five seconds of uniform noise at a single 1 s scale
///
/// 1. Analyse the clip
/// 2. Check one measurement per second with noise-like values
/// 3. Classify with zero offsets; a single scale sits exactly on its own mean
#[test]
fn test_uniform_noise_single_scale() {
    let clip = generate_signal(SignalKind::UniformNoise, 5 * RATE as usize, 42).unwrap();
    let config = noise_config();
    let analysis = MultiScaleAnalyzer::new(config.clone())
        .unwrap()
        .analyze(&clip, RATE)
        .unwrap();

    let series = &analysis.series[0];
    assert_eq!(series.len(), 5);
    assert_eq!(series.window_samples, RATE as usize);
    for m in &series.measurements {
        assert!((m.hfd - 1.0).abs() < 0.1, "noise HFD {}", m.hfd);
        assert!((m.dfa - 0.5).abs() < 0.15, "noise DFA {}", m.dfa);
    }

    let result = classify(&analysis, &config).unwrap();
    assert_eq!(result.label, Label::Human);
    assert_eq!(result.mean_hfd.to_bits(), result.thresholds.hfd.to_bits());

    let again = classify(&analysis, &config).unwrap();
    assert_eq!(again, result);
}

/// Test scenario: the same clip analysed twice gives bit-identical output
#[test]
fn test_repeated_runs_are_identical() {
    let clip = generate_signal(SignalKind::GaussianNoise, 7 * RATE as usize, 7).unwrap();
    let analyzer = MultiScaleAnalyzer::new(AnalysisConfig::standard()).unwrap();

    let first = analyzer.analyze(&clip, RATE).unwrap();
    let second = analyzer.analyze(&clip, RATE).unwrap();
    assert_eq!(first, second);
    for (a, b) in first.series.iter().zip(&second.series) {
        for (ma, mb) in a.measurements.iter().zip(&b.measurements) {
            assert_eq!(ma.hfd.to_bits(), mb.hfd.to_bits());
            assert_eq!(ma.dfa.to_bits(), mb.dfa.to_bits());
        }
    }
}

/// Test scenario: two non-overlapping scales, segment vote and retroactive summary
///
/// The 1 s and 3 s windows only start together every 3 s, so the joined
/// timeline has one point per coarse window.
#[test]
fn test_two_scale_segment_workflow() {
    let clip = generate_signal(SignalKind::UniformNoise, 12 * RATE as usize, 3).unwrap();
    let config = AnalysisConfig::standard();
    let analysis = MultiScaleAnalyzer::new(config.clone())
        .unwrap()
        .analyze(&clip, RATE)
        .unwrap();

    assert_eq!(analysis.series.len(), 2);
    assert_eq!(analysis.series[0].len(), 12);
    assert_eq!(analysis.series[1].len(), 4);

    let timeline = analysis.aligned_timeline();
    assert_eq!(timeline.len(), 4);
    for (i, point) in timeline.iter().enumerate() {
        assert_approx_eq!(point.start_seconds, 3.0 * i as f64, 1e-12);
        assert_eq!(point.indices, vec![3 * i, i]);
        assert_eq!(
            point.measurement(&analysis, 0).hfd.to_bits(),
            analysis.series[0].measurements[3 * i].hfd.to_bits()
        );
    }

    let thresholds = compute_thresholds(&analysis, &config).unwrap();
    // Five aligned measurements are needed for a run of five
    assert!(classify_segments(&analysis, &thresholds, &config.segment).is_err());

    let short_runs = fractal_voice::SegmentConfig {
        segment_length: 2,
        ..config.segment.clone()
    };
    let segments = classify_segments(&analysis, &thresholds, &short_runs).unwrap();
    assert_eq!(segments.labels.len(), 4);
    assert_eq!(segments.timestamps, vec![0.0, 3.0, 6.0, 9.0]);
    assert!(segments.confidence >= 0.5 && segments.confidence <= 1.0);

    let spans = retroactive_analysis(&analysis, &segments);
    assert_eq!(spans.len(), 3);
    assert_approx_eq!(spans[2].end_seconds, 9.0, 1e-12);
    // t = 0 | 3 | 6, 9
    assert_eq!(
        spans[0].scales[0].mean_hfd,
        Some(analysis.series[0].measurements[0].hfd)
    );
    assert!(spans.iter().all(|s| s.ai_fraction.is_some()));
}

/// Test scenario: two scales sharing the sliding hop
///
/// Every coarse window start is also a fine window start, so the timeline
/// is as long as the coarse series and the default segment vote runs.
#[test]
fn test_sliding_two_scale_workflow() {
    let clip = generate_signal(SignalKind::UniformNoise, 6 * RATE as usize, 13).unwrap();
    let config = AnalysisConfig::sliding();
    let report = ClipReport::from_analysis(
        MultiScaleAnalyzer::new(config.clone())
            .unwrap()
            .analyze(&clip, RATE)
            .unwrap(),
        &config,
    )
    .unwrap();

    let analysis = &report.analysis;
    assert_eq!(analysis.series[0].len(), 51);
    assert_eq!(analysis.series[1].len(), 31);
    let timeline = analysis.aligned_timeline();
    assert_eq!(timeline.len(), 31);
    assert_eq!(timeline[30].indices, vec![30, 30]);

    let segments = report.segments.as_ref().unwrap();
    assert_eq!(segments.labels.len(), 31);
    assert_approx_eq!(segments.timestamps[30], 3.0, 1e-9);
    assert_eq!(report.retroactive.len(), 3);
    assert_approx_eq!(report.retroactive[2].end_seconds, 3.0, 1e-9);
}

/// Test scenario: sliding windows over a clip
#[test]
fn test_sliding_preset_overlaps_windows() {
    let clip = generate_signal(SignalKind::UniformNoise, 2 * RATE as usize, 5).unwrap();
    let config = AnalysisConfig {
        window_scales_seconds: vec![1.0],
        ..AnalysisConfig::sliding()
    };
    let analysis = MultiScaleAnalyzer::new(config).unwrap().analyze(&clip, RATE).unwrap();

    let series = &analysis.series[0];
    assert_eq!(series.hop_samples, 1600);
    assert_eq!(series.len(), 11);
    assert_approx_eq!(series.measurements[10].start_seconds, 1.0, 1e-12);
}

/// Test scenario: WAV file in, CSV out
#[test]
fn test_wav_to_csv_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let wav_path = dir.path().join("voice.wav");

    let clip = generate_signal(SignalKind::UniformNoise, 6 * 8000, 11).unwrap();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&wav_path, spec).unwrap();
    for sample in &clip {
        writer.write_sample((sample * 30000.0) as i16).unwrap();
    }
    writer.finalize().unwrap();

    let audio = load_wav(&wav_path, ChannelReduction::Average).unwrap();
    assert_eq!(audio.sample_rate, 8000);
    assert_eq!(audio.samples.len(), clip.len());

    let config = AnalysisConfig {
        window_scales_seconds: vec![1.0],
        ..AnalysisConfig::standard()
    };
    let analysis = MultiScaleAnalyzer::new(config.clone())
        .unwrap()
        .analyze(&audio.samples, audio.sample_rate)
        .unwrap();
    let report = ClipReport::from_analysis(analysis, &config).unwrap();
    let segments = report.segments.as_ref().unwrap();
    assert_eq!(segments.labels.len(), 6);

    let mut buffer = Vec::new();
    write_csv(&mut buffer, &report.analysis, Some(segments)).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert_eq!(text.lines().count(), 7);
    assert!(text.starts_with("Time,Classification,HFD_1s,DFA_1s\n"));
}
