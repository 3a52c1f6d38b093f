//! # Analysis Configuration
//!
//! Configuration is an explicit value handed to the analyzer and the
//! classifiers. Nothing is held in process-wide state, so runs with
//! different configurations may proceed side by side.

use crate::dfa::DfaParams;
use crate::errors::{validate_parameter, FractalResult, FractalVoiceError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default window scales in seconds
pub const DEFAULT_WINDOW_SCALES: [f64; 2] = [1.0, 3.0];
/// Default Higuchi interval cap
pub const DEFAULT_K_MAX: usize = 10;
/// Default DFA box size bounds in samples
pub const DEFAULT_DFA_BOX_RANGE: (usize, usize) = (4, 100);
/// Geometric ratio between successive DFA box sizes
pub const DEFAULT_DFA_SCALE_GROWTH: f64 = 1.1;
/// Threshold offset in standard deviations
pub const DEFAULT_THRESHOLD_OFFSET: f64 = 0.25;
/// Leading audio analysed per clip
pub const DEFAULT_MAX_CLIP_SECONDS: f64 = 60.0;
/// Hop of the sliding preset
pub const SLIDING_HOP_SECONDS: f64 = 0.1;

/// How the HFD and DFA threshold tests combine into one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CombinationRule {
    /// AI only when both measures exceed their thresholds
    And,
    /// AI when either measure exceeds its threshold
    Or,
}

impl CombinationRule {
    /// Combine the two per-measure decisions.
    pub fn combine(self, hfd_exceeds: bool, dfa_exceeds: bool) -> bool {
        match self {
            CombinationRule::And => hfd_exceeds && dfa_exceeds,
            CombinationRule::Or => hfd_exceeds || dfa_exceeds,
        }
    }
}

impl std::str::FromStr for CombinationRule {
    type Err = FractalVoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(CombinationRule::And),
            "or" => Ok(CombinationRule::Or),
            _ => Err(FractalVoiceError::InvalidParameter {
                parameter: format!("combination_rule '{}'", s),
                value: f64::NAN,
                constraint: "one of: and, or".to_string(),
            }),
        }
    }
}

/// Normalization of the Higuchi curve length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HiguchiNormalization {
    /// Length is not divided by the interval a second time; the slope is
    /// D - 1 and lands roughly in [0, 1].
    Reduced,
    /// Classic Higuchi length with the final division by k; D in [1, 2].
    Standard,
}

/// Rolling segment vote parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SegmentConfig {
    /// Consecutive measurements voted on together
    pub segment_length: usize,
    /// Weight of the HFD vote
    pub hfd_weight: f64,
    /// Weight of the DFA vote
    pub dfa_weight: f64,
    /// HFD variability above which a run votes AI regardless of its mean
    pub hfd_variability_limit: f64,
    /// DFA variability above which a run votes AI regardless of its mean
    pub dfa_variability_limit: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            segment_length: 5,
            hfd_weight: 0.7,
            dfa_weight: 0.3,
            hfd_variability_limit: 0.1,
            dfa_variability_limit: 0.05,
        }
    }
}

/// Full configuration of an analysis run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalysisConfig {
    /// Window lengths in seconds, analysed independently
    pub window_scales_seconds: Vec<f64>,
    /// Hop between window starts; `None` means non-overlapping windows
    pub hop_seconds: Option<f64>,
    /// Higuchi interval cap
    pub k_max: usize,
    /// Higuchi length normalization
    pub hfd_normalization: HiguchiNormalization,
    /// DFA box sizes (min, max) in samples; max is further clipped to N/4
    pub dfa_box_size_range: (usize, usize),
    /// Geometric growth between successive DFA box sizes
    pub dfa_scale_growth: f64,
    /// HFD threshold offset in standard deviations
    pub threshold_offset_hfd: f64,
    /// DFA threshold offset in standard deviations
    pub threshold_offset_dfa: f64,
    /// How the two threshold tests combine
    pub combination_rule: CombinationRule,
    /// Leading seconds of the clip to analyse
    pub max_clip_seconds: f64,
    /// Rolling segment vote parameters
    pub segment: SegmentConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl AnalysisConfig {
    /// Standard configuration: non-overlapping 1 s and 3 s windows.
    pub fn standard() -> Self {
        Self {
            window_scales_seconds: DEFAULT_WINDOW_SCALES.to_vec(),
            hop_seconds: None,
            k_max: DEFAULT_K_MAX,
            hfd_normalization: HiguchiNormalization::Reduced,
            dfa_box_size_range: DEFAULT_DFA_BOX_RANGE,
            dfa_scale_growth: DEFAULT_DFA_SCALE_GROWTH,
            threshold_offset_hfd: DEFAULT_THRESHOLD_OFFSET,
            threshold_offset_dfa: DEFAULT_THRESHOLD_OFFSET,
            combination_rule: CombinationRule::Or,
            max_clip_seconds: DEFAULT_MAX_CLIP_SECONDS,
            segment: SegmentConfig::default(),
        }
    }

    /// Sliding configuration: windows advance by 0.1 s.
    pub fn sliding() -> Self {
        Self {
            hop_seconds: Some(SLIDING_HOP_SECONDS),
            ..Self::standard()
        }
    }

    /// DFA box parameters of this configuration.
    pub fn dfa_params(&self) -> DfaParams {
        DfaParams {
            min_box: self.dfa_box_size_range.0,
            max_box: self.dfa_box_size_range.1,
            growth: self.dfa_scale_growth,
        }
    }

    /// Check every field for a usable value.
    pub fn validate(&self) -> FractalResult<()> {
        if self.window_scales_seconds.is_empty() {
            return Err(FractalVoiceError::InvalidParameter {
                parameter: "window_scales_seconds".to_string(),
                value: 0.0,
                constraint: "at least one scale".to_string(),
            });
        }
        for &scale in &self.window_scales_seconds {
            positive(scale, "window_scales_seconds")?;
        }
        if let Some(hop) = self.hop_seconds {
            positive(hop, "hop_seconds")?;
        }
        if self.k_max < 2 {
            return Err(FractalVoiceError::InvalidParameter {
                parameter: "k_max".to_string(),
                value: self.k_max as f64,
                constraint: ">= 2".to_string(),
            });
        }
        self.dfa_params().validate()?;
        validate_parameter(self.threshold_offset_hfd, f64::MIN, f64::MAX, "threshold_offset_hfd")?;
        validate_parameter(self.threshold_offset_dfa, f64::MIN, f64::MAX, "threshold_offset_dfa")?;
        positive(self.max_clip_seconds, "max_clip_seconds")?;
        self.segment.validate()
    }

    /// Load a configuration from a JSON file; absent fields take defaults.
    #[cfg(feature = "serde")]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> FractalResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| FractalVoiceError::io(format!("reading {}", path.display()), e))?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| FractalVoiceError::InvalidParameter {
                parameter: format!("config file {}", path.display()),
                value: f64::NAN,
                constraint: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }
}

impl SegmentConfig {
    /// Check the vote parameters.
    pub fn validate(&self) -> FractalResult<()> {
        if self.segment_length == 0 {
            return Err(FractalVoiceError::InvalidParameter {
                parameter: "segment.segment_length".to_string(),
                value: 0.0,
                constraint: ">= 1".to_string(),
            });
        }
        validate_parameter(self.hfd_weight, 0.0, 1.0, "segment.hfd_weight")?;
        validate_parameter(self.dfa_weight, 0.0, 1.0, "segment.dfa_weight")?;
        validate_parameter(self.hfd_variability_limit, 0.0, f64::MAX, "segment.hfd_variability_limit")?;
        validate_parameter(self.dfa_variability_limit, 0.0, f64::MAX, "segment.dfa_variability_limit")
    }
}

fn positive(value: f64, name: &str) -> FractalResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FractalVoiceError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: "finite and > 0".to_string(),
        })
    }
}
