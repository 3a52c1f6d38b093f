//! WAV decoding into a mono sample sequence.
//!
//! Integer PCM (8, 16, 24 and 32 bit) is scaled by `2^(bits - 1)` into
//! [-1, 1); 32 bit float samples are taken as they are. Multi-channel
//! audio is reduced to one channel before analysis.

use crate::errors::{FractalResult, FractalVoiceError};
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How interleaved channels are reduced to mono.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChannelReduction {
    /// Mean of all channels of a frame
    #[default]
    Average,
    /// First channel only
    Left,
}

/// A decoded clip.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Mono samples
    pub samples: Vec<f64>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the source file
    pub channels: u16,
}

impl DecodedAudio {
    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode a WAV file.
///
/// # Errors
/// - `IoError` when the file cannot be opened
/// - `AudioDecode` for malformed or unsupported WAV data
pub fn load_wav(path: impl AsRef<Path>, reduction: ChannelReduction) -> FractalResult<DecodedAudio> {
    let path = path.as_ref();
    let decode_error = |reason: String| FractalVoiceError::AudioDecode {
        path: path.display().to_string(),
        reason,
    };

    let mut reader = hound::WavReader::open(path).map_err(|err| match err {
        hound::Error::IoError(io) => FractalVoiceError::io(format!("opening {}", path.display()), io),
        other => decode_error(other.to_string()),
    })?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(decode_error("zero channels".to_string()));
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(decode_error(format!(
                    "unsupported float width {} bits",
                    spec.bits_per_sample
                )));
            }
            reader
                .samples::<f32>()
                .map(|sample| sample.map(f64::from).map_err(|err| decode_error(err.to_string())))
                .collect::<FractalResult<_>>()?
        }
        hound::SampleFormat::Int => match spec.bits_per_sample {
            8 | 16 | 24 | 32 => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f64;
                reader
                    .samples::<i32>()
                    .map(|sample| {
                        sample
                            .map(|value| value as f64 / scale)
                            .map_err(|err| decode_error(err.to_string()))
                    })
                    .collect::<FractalResult<_>>()?
            }
            other => {
                return Err(decode_error(format!("unsupported bits per sample {}", other)));
            }
        },
    };

    let samples = downmix(&interleaved, spec.channels as usize, reduction);
    log::info!(
        "Decoded {}: {} Hz, {} channel(s), {:.2}s",
        path.display(),
        spec.sample_rate,
        spec.channels,
        samples.len() as f64 / spec.sample_rate.max(1) as f64
    );

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

fn downmix(interleaved: &[f64], channels: usize, reduction: ChannelReduction) -> Vec<f64> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| match reduction {
            ChannelReduction::Average => frame.iter().sum::<f64>() / channels as f64,
            ChannelReduction::Left => frame[0],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn write_int16(path: &Path, channels: u16, frames: &[&[i16]]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &sample in frame.iter() {
                writer.write_sample(sample).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_mono_int16_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_int16(&path, 1, &[&[0], &[16384], &[-32768], &[32767]]);

        let audio = load_wav(&path, ChannelReduction::Average).unwrap();
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.samples.len(), 4);
        assert_approx_eq!(audio.samples[1], 0.5, 1e-12);
        assert_approx_eq!(audio.samples[2], -1.0, 1e-12);
        assert!(audio.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_stereo_reduction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_int16(&path, 2, &[&[16384, 0], &[-16384, 16384]]);

        let averaged = load_wav(&path, ChannelReduction::Average).unwrap();
        assert_eq!(averaged.samples.len(), 2);
        assert_approx_eq!(averaged.samples[0], 0.25, 1e-12);
        assert_approx_eq!(averaged.samples[1], 0.0, 1e-12);

        let left = load_wav(&path, ChannelReduction::Left).unwrap();
        assert_approx_eq!(left.samples[1], -0.5, 1e-12);
        assert_eq!(left.channels, 2);
    }

    #[test]
    fn test_float_samples_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for value in [0.25f32, -0.75, 1.0] {
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();

        let audio = load_wav(&path, ChannelReduction::Average).unwrap();
        assert_eq!(audio.samples, vec![0.25, -0.75, 1.0]);
        assert_approx_eq!(audio.duration_seconds(), 3.0 / 16000.0, 1e-15);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_wav(dir.path().join("absent.wav"), ChannelReduction::Average);
        assert!(matches!(result, Err(FractalVoiceError::IoError { .. })));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not a RIFF header").unwrap();
        assert!(matches!(
            load_wav(&path, ChannelReduction::Average),
            Err(FractalVoiceError::AudioDecode { .. })
        ));
    }
}
