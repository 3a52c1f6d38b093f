//! Integration tests for error handling across the public API
//!
//! Every error must name what went wrong precisely enough for a caller to
//! report it: the scale, the window, or the offending parameter.

use fractal_voice::{
    audio::{load_wav, ChannelReduction},
    classify,
    dfa::{estimate_dfa_alpha, DfaParams},
    estimate_higuchi_fd,
    generators::{generate_signal, SignalKind},
    AnalysisConfig, FractalVoiceError, HiguchiNormalization, MultiScaleAnalysis,
    MultiScaleAnalyzer,
};

#[test]
fn test_all_scales_failed_lists_each_scale() {
    let clip = vec![0.25; 4000];
    let config = AnalysisConfig {
        window_scales_seconds: vec![1.0, 5.0],
        ..AnalysisConfig::standard()
    };
    let err = MultiScaleAnalyzer::new(config)
        .unwrap()
        .analyze(&clip, 1000)
        .unwrap_err();

    match &err {
        FractalVoiceError::AllScalesFailed { failures } => {
            assert_eq!(failures.len(), 2);
            // 1 s windows exist but are flat; 5 s windows do not fit
            assert!(failures[0].reason.contains("windows were skipped"));
            assert!(failures[1].reason.contains("Insufficient data at 5s scale"));
        }
        other => panic!("Expected AllScalesFailed, got {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains("1s:") && message.contains("5s:"), "{}", message);
}

#[test]
fn test_invalid_configuration_is_rejected_up_front() {
    let cases = vec![
        AnalysisConfig {
            k_max: 0,
            ..AnalysisConfig::standard()
        },
        AnalysisConfig {
            window_scales_seconds: vec![f64::NAN],
            ..AnalysisConfig::standard()
        },
        AnalysisConfig {
            dfa_box_size_range: (2, 100),
            ..AnalysisConfig::standard()
        },
        AnalysisConfig {
            dfa_scale_growth: 1.0,
            ..AnalysisConfig::standard()
        },
        AnalysisConfig {
            max_clip_seconds: 0.0,
            ..AnalysisConfig::standard()
        },
    ];
    for config in cases {
        assert!(
            matches!(
                MultiScaleAnalyzer::new(config.clone()),
                Err(FractalVoiceError::InvalidParameter { .. })
            ),
            "accepted {:?}",
            config
        );
    }
}

#[test]
fn test_estimators_reject_short_windows() {
    assert!(matches!(
        estimate_higuchi_fd(&[0.1, 0.2], 4, HiguchiNormalization::Reduced),
        Err(FractalVoiceError::InsufficientData { required: 3, actual: 2, .. })
    ));

    let noise = generate_signal(SignalKind::GaussianNoise, 12, 9).unwrap();
    assert!(matches!(
        estimate_dfa_alpha(&noise, &DfaParams::default()),
        Err(FractalVoiceError::InsufficientScales { actual: 0, .. })
    ));
}

#[test]
fn test_classify_empty_analysis() {
    let analysis = MultiScaleAnalysis {
        sample_rate: 16000,
        input_samples: 0,
        analyzed_samples: 0,
        series: Vec::new(),
        failed_scales: Vec::new(),
    };
    assert!(matches!(
        classify(&analysis, &AnalysisConfig::standard()),
        Err(FractalVoiceError::InsufficientData { .. })
    ));
}

#[test]
fn test_nan_samples_name_their_position() {
    let mut clip = generate_signal(SignalKind::UniformNoise, 2000, 1).unwrap();
    clip[1234] = f64::NAN;
    let err = MultiScaleAnalyzer::new(AnalysisConfig::standard())
        .unwrap()
        .analyze(&clip, 1000)
        .unwrap_err();
    assert!(err.to_string().contains("index 1234"), "{}", err);
}

#[test]
fn test_audio_errors_carry_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.wav");
    std::fs::write(&path, [0u8; 16]).unwrap();

    match load_wav(&path, ChannelReduction::Average) {
        Err(FractalVoiceError::AudioDecode { path: reported, .. }) => {
            assert!(reported.ends_with("broken.wav"));
        }
        other => panic!("Expected AudioDecode, got {:?}", other),
    }
}

#[test]
fn test_errors_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync + std::error::Error + 'static>() {}
    assert_send_sync::<FractalVoiceError>();
}
