//! Field appearance parameters and layout topology selection.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::{CymaticError, Result};
use crate::field::Rgb;

/// Accepted driving frequency (Hz)
pub const FREQUENCY_RANGE_HZ: RangeInclusive<f32> = 20.0..=2000.0;

/// Displacement amplitude multiplier
pub const SENSITIVITY_RANGE: RangeInclusive<f32> = 0.1..=3.0;

/// Color and size multiplier
pub const GLOW_RANGE: RangeInclusive<f32> = 0.5..=3.0;

/// Global scale applied to every generated radius
pub const SPREAD_RANGE: RangeInclusive<f32> = 0.5..=3.0;

/// Particle buffer size
pub const PARTICLE_COUNT_RANGE: RangeInclusive<usize> = 20_000..=150_000;

/// Particle layout topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutStyle {
    /// Spiral disk plus diffuse halo ("galaxy")
    #[default]
    Organic,
    /// Eight concentric rings ("rings")
    Geometric,
    /// Fibonacci-sphere shells ("sphere")
    Ethereal,
}

impl LayoutStyle {
    pub const ALL: [LayoutStyle; 3] = [Self::Organic, Self::Geometric, Self::Ethereal];

    pub fn name(self) -> &'static str {
        match self {
            Self::Organic => "organic",
            Self::Geometric => "geometric",
            Self::Ethereal => "ethereal",
        }
    }
}

impl fmt::Display for LayoutStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutStyle {
    type Err = CymaticError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "organic" | "galaxy" => Ok(Self::Organic),
            "geometric" | "rings" => Ok(Self::Geometric),
            "ethereal" | "sphere" => Ok(Self::Ethereal),
            other => Err(CymaticError::InvalidConfig(format!(
                "unknown layout style '{}'",
                other
            ))),
        }
    }
}

/// Per-frame field configuration snapshot.
///
/// Read-only while a frame is being computed; changed between frames by
/// whoever owns the settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    /// Driving frequency (Hz)
    pub frequency_hz: f32,

    /// Displacement amplitude multiplier (dimensionless)
    pub sensitivity: f32,

    /// Color and size multiplier (dimensionless)
    pub glow_intensity: f32,

    /// Blend endpoint at wave value -1
    pub color1: Rgb,

    /// Blend endpoint at wave value +1
    pub color2: Rgb,

    /// Scale of all generated radii (dimensionless)
    pub particle_spread: f32,

    pub layout_style: LayoutStyle,

    /// Number of particles; changing it regenerates every buffer
    pub particle_count: usize,

    /// Layout RNG seed (None = fresh entropy on every regeneration)
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 432.0,
            sensitivity: 1.5,
            glow_intensity: 1.2,
            color1: Rgb::new(1.0, 107.0 / 255.0, 157.0 / 255.0), // #ff6b9d
            color2: Rgb::new(192.0 / 255.0, 96.0 / 255.0, 1.0),  // #c060ff
            particle_spread: 1.0,
            layout_style: LayoutStyle::Organic,
            particle_count: 100_000,
            seed: None,
        }
    }
}

impl FieldConfig {
    /// Check every option against its documented range
    pub fn validate(&self) -> Result<()> {
        check_range("frequency", self.frequency_hz, &FREQUENCY_RANGE_HZ)?;
        check_range("sensitivity", self.sensitivity, &SENSITIVITY_RANGE)?;
        check_range("glow intensity", self.glow_intensity, &GLOW_RANGE)?;
        check_range("particle spread", self.particle_spread, &SPREAD_RANGE)?;
        if !PARTICLE_COUNT_RANGE.contains(&self.particle_count) {
            return Err(CymaticError::InvalidConfig(format!(
                "particle count must be in {}..={}, got {}",
                PARTICLE_COUNT_RANGE.start(),
                PARTICLE_COUNT_RANGE.end(),
                self.particle_count
            )));
        }
        Ok(())
    }

    /// Whether moving from `self` to `next` requires rebuilding the particle set
    pub fn needs_regeneration(&self, next: &FieldConfig) -> bool {
        self.particle_count != next.particle_count
            || self.layout_style != next.layout_style
            || self.particle_spread != next.particle_spread
            || self.seed != next.seed
    }
}

fn check_range(name: &str, value: f32, range: &RangeInclusive<f32>) -> Result<()> {
    if value.is_finite() && range.contains(&value) {
        Ok(())
    } else {
        Err(CymaticError::InvalidConfig(format!(
            "{} must be in {}..={}, got {}",
            name,
            range.start(),
            range.end(),
            value
        )))
    }
}

pub(crate) fn clamp_to(value: f32, range: &RangeInclusive<f32>) -> f32 {
    if value.is_nan() {
        return *range.start();
    }
    value.clamp(*range.start(), *range.end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FieldConfig::default().validate().is_ok());
    }

    #[test]
    fn test_layout_style_parsing() {
        assert_eq!("galaxy".parse::<LayoutStyle>().unwrap(), LayoutStyle::Organic);
        assert_eq!("Rings".parse::<LayoutStyle>().unwrap(), LayoutStyle::Geometric);
        assert_eq!("ethereal".parse::<LayoutStyle>().unwrap(), LayoutStyle::Ethereal);
        assert!("spiral".parse::<LayoutStyle>().is_err());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let config = FieldConfig {
            frequency_hz: 15.0,
            ..FieldConfig::default()
        };
        assert!(config.validate().is_err());

        let config = FieldConfig {
            particle_count: 5,
            ..FieldConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_regeneration_triggers() {
        let base = FieldConfig::default();

        let recolored = FieldConfig {
            color1: Rgb::new(0.0, 1.0, 0.0),
            frequency_hz: 528.0,
            ..base.clone()
        };
        assert!(!base.needs_regeneration(&recolored));

        let respread = FieldConfig {
            particle_spread: 2.0,
            ..base.clone()
        };
        assert!(base.needs_regeneration(&respread));

        let restyled = FieldConfig {
            layout_style: LayoutStyle::Ethereal,
            ..base.clone()
        };
        assert!(base.needs_regeneration(&restyled));
    }
}
