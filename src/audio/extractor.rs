//! Dominant-bin frequency extraction.
//!
//! Picks the single loudest bin as the pitch estimate. This follows the
//! strongest partial, which is enough to steer the field, but it will jump
//! between harmonics on complex or polyphonic input. That is a known
//! limitation of the heuristic, not something to patch over here.

use crate::params::ExtractorConfig;

/// One analysis tick worth of magnitudes, lowest frequency first
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumSnapshot {
    /// Non-negative magnitude per bin (0-255 scale)
    pub magnitudes: Vec<f32>,

    /// Sample rate the spectrum was computed at (Hz)
    pub sample_rate_hz: u32,
}

impl SpectrumSnapshot {
    pub fn bin_count(&self) -> usize {
        self.magnitudes.len()
    }

    /// Frequency (Hz) of a bin; the bins span 0 to Nyquist
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * (self.sample_rate_hz as f32 / 2.0) / self.bin_count() as f32
    }

    /// Loudest bin and its magnitude; ties go to the lowest bin
    pub fn peak(&self) -> Option<(usize, f32)> {
        let mut peak = None;
        let mut loudest = 0.0;
        for (bin, &magnitude) in self.magnitudes.iter().enumerate() {
            if magnitude > loudest {
                loudest = magnitude;
                peak = Some((bin, magnitude));
            }
        }
        peak
    }
}

/// Accepted dominant frequency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyEstimate {
    pub hz: f32,

    /// Magnitude of the winning bin, used as confidence
    pub magnitude: f32,
}

/// Estimate the dominant frequency, or `None` when the snapshot is too quiet
/// or the peak falls outside the accepted band.
///
/// `None` means "keep whatever frequency is currently driving the field".
pub fn extract(snapshot: &SpectrumSnapshot, config: &ExtractorConfig) -> Option<FrequencyEstimate> {
    let (bin, magnitude) = snapshot.peak()?;
    if magnitude <= config.min_magnitude {
        return None;
    }

    let hz = snapshot.bin_frequency(bin);
    if !config.band_hz.contains(&hz) {
        return None;
    }

    Some(FrequencyEstimate { hz, magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_peak(bins: usize, sample_rate_hz: u32, bin: usize, magnitude: f32) -> SpectrumSnapshot {
        let mut magnitudes = vec![5.0; bins];
        magnitudes[bin] = magnitude;
        SpectrumSnapshot {
            magnitudes,
            sample_rate_hz,
        }
    }

    #[test]
    fn test_accepts_loud_peak_in_band() {
        // 44100 Hz, 1024 bins: bin 20 ≈ 430.66 Hz
        let snapshot = snapshot_with_peak(1024, 44100, 20, 120.0);
        let estimate = extract(&snapshot, &ExtractorConfig::default()).unwrap();

        assert!((estimate.hz - 430.664).abs() < 0.01);
        assert_eq!(estimate.magnitude, 120.0);
    }

    #[test]
    fn test_bin_frequency_spans_nyquist() {
        let snapshot = snapshot_with_peak(1024, 44100, 0, 0.0);

        assert_eq!(snapshot.bin_frequency(0), 0.0);
        assert!((snapshot.bin_frequency(20) - 430.66).abs() < 0.01);
        assert_eq!(snapshot.bin_frequency(1024), 22050.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let config = ExtractorConfig::default();
        assert!(extract(&snapshot_with_peak(1024, 44100, 20, 30.0), &config).is_none());
        assert!(extract(&snapshot_with_peak(1024, 44100, 20, 31.0), &config).is_some());
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        let config = ExtractorConfig::default();

        // 40960 Hz / 2 / 1024 = 20 Hz per bin: bin 1 = 20 Hz, bin 100 = 2000 Hz
        assert!(extract(&snapshot_with_peak(1024, 40960, 1, 90.0), &config).is_some());
        assert!(extract(&snapshot_with_peak(1024, 40960, 100, 90.0), &config).is_some());
        assert!(extract(&snapshot_with_peak(1024, 40960, 101, 90.0), &config).is_none());
        assert!(extract(&snapshot_with_peak(1024, 40960, 0, 90.0), &config).is_none());
    }

    #[test]
    fn test_empty_and_silent_spectra() {
        let config = ExtractorConfig::default();
        let empty = SpectrumSnapshot {
            magnitudes: Vec::new(),
            sample_rate_hz: 44100,
        };
        let silent = SpectrumSnapshot {
            magnitudes: vec![0.0; 1024],
            sample_rate_hz: 44100,
        };

        assert!(extract(&empty, &config).is_none());
        assert!(extract(&silent, &config).is_none());
    }

    #[test]
    fn test_ties_resolve_to_lowest_bin() {
        let mut snapshot = snapshot_with_peak(1024, 44100, 30, 100.0);
        snapshot.magnitudes[60] = 100.0;
        assert_eq!(snapshot.peak(), Some((30, 100.0)));
    }
}
