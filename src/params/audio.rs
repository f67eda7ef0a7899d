//! Audio analysis configuration and constants.

use std::ops::RangeInclusive;

use crate::error::{CymaticError, Result};
use crate::params::field::FREQUENCY_RANGE_HZ;

/// Spectrum analysis configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// FFT window size (must be power of 2); the snapshot has half as many bins
    pub fft_size: usize,

    /// Weight of the previous frame in the magnitude average (0 = no smoothing)
    pub smoothing: f32,

    /// Decibel level mapped to magnitude 0
    pub min_db: f32,

    /// Decibel level mapped to magnitude 255
    pub max_db: f32,

    /// Frequency polling interval (milliseconds)
    /// 16 ≈ one read per displayed frame at 60 Hz
    pub poll_interval_ms: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
            poll_interval_ms: 16,
        }
    }
}

impl AnalyzerConfig {
    /// Number of magnitude bins per snapshot
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 2 {
            return Err(CymaticError::InvalidConfig(format!(
                "FFT size must be a power of 2, got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(CymaticError::InvalidConfig(format!(
                "smoothing must be in [0, 1), got {}",
                self.smoothing
            )));
        }
        if self.min_db >= self.max_db {
            return Err(CymaticError::InvalidConfig(format!(
                "decibel window is empty ({}..{})",
                self.min_db, self.max_db
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(CymaticError::InvalidConfig(
                "poll interval must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Acceptance filter for dominant-bin estimates
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Peak must be strictly louder than this (byte magnitude scale, 0-255)
    pub min_magnitude: f32,

    /// Accepted frequency band (Hz, inclusive)
    pub band_hz: RangeInclusive<f32>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_magnitude: 30.0,
            band_hz: FREQUENCY_RANGE_HZ,
        }
    }
}

/// Audio constants (compile-time, match Glicol engine setup)
pub mod audio_constants {
    /// Audio block size (samples per buffer)
    /// 128 = 2.9ms @ 44.1kHz
    pub const BLOCK_SIZE: usize = 128;

    /// Output gain of the synthetic tone
    pub const GENERATOR_GAIN: f32 = 0.05;

    /// Capture buffer ceiling, in FFT windows, before old samples are dropped
    pub const CAPTURE_WINDOWS: usize = 4;
}
