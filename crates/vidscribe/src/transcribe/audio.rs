use std::path::Path;

use hound::SampleFormat;
use log::debug;

use crate::error::EngineError;

/// Sample rate the speech engine expects; the extractor produces it and
/// direct WAV inputs must already match.
pub const ENGINE_SAMPLE_RATE: u32 = 16_000;

/// Reads a WAV file into normalized f32 mono samples. Stereo input is
/// downmixed by averaging channel pairs.
pub fn read_wav(path: &Path) -> Result<Vec<f32>, EngineError> {
    let reader = hound::WavReader::open(path).map_err(|e| EngineError::AudioRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let spec = reader.spec();
    debug!(
        "Reading WAV {}: {} Hz, {} channel(s), {:?}",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.sample_format
    );

    if spec.sample_rate != ENGINE_SAMPLE_RATE {
        return Err(EngineError::AudioRead {
            path: path.to_path_buf(),
            reason: format!(
                "expected {} Hz input, got {} Hz",
                ENGINE_SAMPLE_RATE, spec.sample_rate
            ),
        });
    }

    if spec.channels == 0 || spec.channels > 2 {
        return Err(EngineError::AudioRead {
            path: path.to_path_buf(),
            reason: format!("unsupported channel count {}", spec.channels),
        });
    }

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| EngineError::AudioRead {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
                .into_iter()
                .map(|s| s as f32 / max)
                .collect()
        }
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EngineError::AudioRead {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?,
    };

    if spec.channels == 2 {
        Ok(samples
            .chunks_exact(2)
            .map(|pair| (pair[0] + pair[1]) / 2.0)
            .collect())
    } else {
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use std::path::PathBuf;

    fn write_wav(path: &PathBuf, sample_rate: u32, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_read_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, ENGINE_SAMPLE_RATE, 1, &[0, 16384, -16384]);

        let samples = read_wav(&path).unwrap();
        assert_eq!(samples.len(), 3);
        assert!(samples[0].abs() < f32::EPSILON);
        assert!((samples[1] - 0.5).abs() < 0.001);
        assert!((samples[2] + 0.5).abs() < 0.001);
    }

    #[test]
    fn test_read_stereo_wav_downmixes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        // Two frames: (0.5, -0.5) and (0.5, 0.5)
        write_wav(&path, ENGINE_SAMPLE_RATE, 2, &[16384, -16384, 16384, 16384]);

        let samples = read_wav(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples[0].abs() < 0.001);
        assert!((samples[1] - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_read_rejects_wrong_sample_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("44k.wav");
        write_wav(&path, 44_100, 1, &[0; 8]);

        let err = read_wav(&path).unwrap_err();
        assert!(matches!(err, EngineError::AudioRead { .. }));
        assert!(err.to_string().contains("44100"));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_wav(Path::new("/nonexistent/audio.wav")).unwrap_err();
        assert!(matches!(err, EngineError::AudioRead { .. }));
    }
}
