//! Endpoint color blending for particles.

use std::str::FromStr;

use crate::error::CymaticError;

/// Linear RGB color with channels in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`
    pub fn from_hex(hex: &str) -> Result<Self, CymaticError> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || CymaticError::InvalidConfig(format!("invalid hex color '{}'", hex));

        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| invalid())
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }
}

impl FromStr for Rgb {
    type Err = CymaticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Interpolate `color1 → color2` at `t`, then dim by `brightness`
pub fn blend(color1: Rgb, color2: Rgb, t: f32, brightness: f32) -> Rgb {
    Rgb::new(
        (color1.r + (color2.r - color1.r) * t) * brightness,
        (color1.g + (color2.g - color1.g) * t) * brightness,
        (color1.b + (color2.b - color1.b) * t) * brightness,
    )
}

/// Distance falloff shared by generation and update, with a caller-chosen cap
pub fn brightness(distance: f32, spread: f32, cap: f32) -> f32 {
    1.0 - (distance / (super::FIELD_RADIUS * spread)).min(cap)
}
