//! Spectrum analysis: raw samples to byte-scale magnitude snapshots.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use super::extractor::SpectrumSnapshot;
use crate::error::Result;
use crate::params::AnalyzerConfig;

/// Windowed FFT with frame-to-frame magnitude smoothing.
///
/// Magnitudes are reported on a 0-255 scale: smoothed linear magnitude is
/// converted to decibels and `[min_db, max_db]` is mapped linearly onto the
/// byte range.
pub struct SpectrumAnalyzer {
    config: AnalyzerConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;

        let fft_size = config.fft_size;
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();
        let window = (0..fft_size).map(|i| hann_window(i, fft_size)).collect();

        Ok(Self {
            fft,
            window,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            smoothed: vec![0.0; config.bin_count()],
            config,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze the most recent `fft_size` samples.
    ///
    /// Shorter input is zero-padded at the front; non-finite samples count as silence.
    pub fn analyze(&mut self, samples: &[f32], sample_rate_hz: u32) -> SpectrumSnapshot {
        let fft_size = self.config.fft_size;
        let recent = &samples[samples.len().saturating_sub(fft_size)..];
        let padding = fft_size - recent.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < padding { 0.0 } else { recent[i - padding] };
            let sample = if sample.is_finite() { sample } else { 0.0 };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let norm = 1.0 / fft_size as f32;
        let smoothing = self.config.smoothing;
        let db_span = self.config.max_db - self.config.min_db;

        let magnitudes = self
            .smoothed
            .iter_mut()
            .zip(&self.buffer)
            .map(|(smoothed, bin)| {
                *smoothed = *smoothed * smoothing + bin.norm() * norm * (1.0 - smoothing);
                let db = 20.0 * smoothed.log10();
                (255.0 * (db - self.config.min_db) / db_span)
                    .clamp(0.0, 255.0)
                    .floor()
            })
            .collect();

        SpectrumSnapshot {
            magnitudes,
            sample_rate_hz,
        }
    }

    /// Forget the smoothing history (e.g. after switching sources)
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|m| *m = 0.0);
    }
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

#[cfg(test)]
pub(crate) fn sine(frequency_hz: f32, amplitude: f32, sample_rate_hz: u32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (2.0 * PI * frequency_hz * i as f32 / sample_rate_hz as f32).sin() * amplitude)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window() {
        let size = 1024;

        // Hann window should be 0 at edges, 1 at center
        assert!((hann_window(0, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size - 1, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_silence_is_zero() {
        let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let snapshot = analyzer.analyze(&[0.0; 2048], 44100);

        assert_eq!(snapshot.magnitudes.len(), 1024);
        assert!(snapshot.magnitudes.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let samples = sine(440.0, 0.5, 44100, 2048);
        let snapshot = analyzer.analyze(&samples, 44100);

        let (peak_bin, peak) = snapshot
            .magnitudes
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, &m)| if m > best.1 { (i, m) } else { best });

        // 440 Hz / 21.53 Hz per bin ≈ bin 20.4
        assert_eq!(peak_bin, 20);
        assert!(peak > 200.0, "peak {peak}");
        assert!(snapshot.magnitudes.iter().all(|m| (0.0..=255.0).contains(m)));
    }

    #[test]
    fn test_smoothing_rises_over_frames() {
        let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let samples = sine(1000.0, 0.001, 44100, 2048);

        let first = analyzer.analyze(&samples, 44100).magnitudes;
        let second = analyzer.analyze(&samples, 44100).magnitudes;
        let bin = (1000.0f32 / (22050.0 / 1024.0)) as usize;
        assert!(second[bin] > first[bin]);

        analyzer.reset();
        let again = analyzer.analyze(&samples, 44100).magnitudes;
        assert_eq!(again[bin], first[bin]);
    }

    #[test]
    fn test_short_and_corrupt_input() {
        let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let snapshot = analyzer.analyze(&[f32::NAN, f32::INFINITY, 0.2], 48000);

        assert_eq!(snapshot.sample_rate_hz, 48000);
        assert!(snapshot.magnitudes.iter().all(|m| m.is_finite()));
    }
}
