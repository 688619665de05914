//! In-memory WAV encoding using hound

use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Peak level automatic gain aims for
const TARGET_PEAK: f32 = 0.9;

/// Upper bound on the gain applied to quiet recordings
const MAX_GAIN: f32 = 8.0;

/// Encodes f32 samples into a 16-bit PCM WAV container
pub struct WavEncoder {
    spec: WavSpec,
}

impl WavEncoder {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            spec: WavSpec {
                channels,
                sample_rate,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
        }
    }

    /// Encode samples into a complete WAV file held in memory
    pub fn encode(&self, samples: &[f32]) -> Result<Vec<u8>, String> {
        let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));

        let mut writer = WavWriter::new(&mut cursor, self.spec)
            .map_err(|e| format!("Failed to create WAV writer: {}", e))?;

        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(value)
                .map_err(|e| format!("Failed to write sample: {}", e))?;
        }

        writer
            .finalize()
            .map_err(|e| format!("Failed to finalize WAV data: {}", e))?;

        Ok(cursor.into_inner())
    }
}

/// Scale samples so the peak reaches the target level
pub fn apply_auto_gain(samples: &mut [f32]) {
    let peak = calculate_peak(samples);
    if peak <= f32::EPSILON {
        return;
    }

    let gain = (TARGET_PEAK / peak).min(MAX_GAIN);
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
}

/// Calculate RMS volume from samples
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Calculate peak volume from samples
pub fn calculate_peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_readable_wav() {
        let samples: Vec<f32> = (0..441).map(|i| (i as f32 / 441.0) - 0.5).collect();
        let bytes = WavEncoder::new(44100, 1).encode(&samples).unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 441);
    }

    #[test]
    fn test_encode_clamps_out_of_range_samples() {
        let bytes = WavEncoder::new(8000, 1).encode(&[2.0, -2.0]).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let values: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(values, vec![i16::MAX, -i16::MAX]);
    }

    #[test]
    fn test_auto_gain_is_capped() {
        let mut samples = vec![0.05, -0.1, 0.02];
        apply_auto_gain(&mut samples);
        assert!((calculate_peak(&samples) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_auto_gain_reaches_target() {
        let mut samples = vec![0.45, -0.3];
        apply_auto_gain(&mut samples);
        assert!((calculate_peak(&samples) - TARGET_PEAK).abs() < 1e-6);
    }

    #[test]
    fn test_auto_gain_leaves_silence_alone() {
        let mut samples = vec![0.0; 16];
        apply_auto_gain(&mut samples);
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_levels() {
        assert_eq!(calculate_rms(&[]), 0.0);
        assert_eq!(calculate_peak(&[0.25, -0.75, 0.5]), 0.75);
        assert!((calculate_rms(&[0.5, -0.5]) - 0.5).abs() < 1e-6);
    }
}
