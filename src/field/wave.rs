//! Per-frame cymatic wave field.
//!
//! A single driving frequency is quantized into a rotational mode count and
//! combined with a radial ripple, a spiral term and a global pulse. The three
//! factors multiply, so wherever any of them crosses zero the particle stays
//! put, which draws the nodal lines.

use glam::Vec3;

use super::color::{blend, brightness};
use super::UPDATE_BRIGHTNESS_CAP;
use crate::params::FieldConfig;

/// Time accumulator advance per rendered frame
pub const TIME_STEP: f32 = 0.01;

/// Keeps the outward normal finite for a particle resting on the origin
pub const NORMAL_EPSILON: f32 = 0.001;

/// Frequency that maps to one unit of normalized frequency (Hz)
const FREQUENCY_SCALE_HZ: f32 = 400.0;

const RADIAL_WAVENUMBER: f32 = 0.08;
const SPIRAL_WAVENUMBER: f32 = 0.03;
const DISPLACEMENT_SCALE: f32 = 12.0;

/// Quantities shared by every particle in one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveFrame {
    /// Rotational symmetry order of the spiral term
    pub mode_count: f32,
    /// Phase advance of the travelling terms
    pub wave_speed: f32,
    /// Global breathing factor, `0.7 + 0.3 * sin(wave_speed / 2)`
    pub pulse_gain: f32,
}

impl WaveFrame {
    pub fn new(time: f32, frequency_hz: f32) -> Self {
        let freq_norm = frequency_hz / FREQUENCY_SCALE_HZ;
        let wave_speed = time * freq_norm * 1.5;
        let pulse = (wave_speed * 0.5).sin();

        Self {
            mode_count: (freq_norm * 6.0).floor() + 2.0,
            wave_speed,
            pulse_gain: 0.7 + pulse * 0.3,
        }
    }

    /// Combined wave value in [-1, 1] at a rest position
    pub fn combined(&self, rest: Vec3) -> f32 {
        let dist = rest.length();
        self.combined_at(dist, rest.z.atan2(rest.x))
    }

    fn combined_at(&self, dist: f32, angle_xz: f32) -> f32 {
        let radial = (dist * RADIAL_WAVENUMBER - self.wave_speed).sin();
        let spiral = (angle_xz * self.mode_count + dist * SPIRAL_WAVENUMBER
            - self.wave_speed * 0.8)
            .cos();
        radial * spiral * self.pulse_gain
    }
}

/// Recompute displaced positions, colors and sizes from rest positions.
///
/// Pure function of its inputs: identical rest positions, time and config give
/// bit-identical buffers. All slices must have the same length.
pub fn update_into(
    rest_positions: &[Vec3],
    time: f32,
    config: &FieldConfig,
    positions: &mut [[f32; 3]],
    colors: &mut [[f32; 3]],
    sizes: &mut [f32],
) {
    debug_assert_eq!(rest_positions.len(), positions.len());
    debug_assert_eq!(rest_positions.len(), colors.len());
    debug_assert_eq!(rest_positions.len(), sizes.len());

    let frame = WaveFrame::new(time, config.frequency_hz);
    let amplitude = config.sensitivity * DISPLACEMENT_SCALE;
    let size_gain = 1.5 + config.glow_intensity * 0.3;

    let outputs = positions
        .iter_mut()
        .zip(colors.iter_mut())
        .zip(sizes.iter_mut());

    for (rest, ((position, color), size)) in rest_positions.iter().zip(outputs) {
        let dist = rest.length();
        let combined = frame.combined_at(dist, rest.z.atan2(rest.x));

        // Radial only: push along the outward normal
        let normal = *rest / (dist + NORMAL_EPSILON);
        *position = (*rest + normal * (combined * amplitude)).to_array();

        let glow = brightness(dist, config.particle_spread, UPDATE_BRIGHTNESS_CAP);
        let t = (combined + 1.0) * 0.5;
        *color = blend(config.color1, config.color2, t, glow)
            .scale(config.glow_intensity)
            .to_array();

        *size = (0.8 + combined.abs() * 0.6) * glow * size_gain;
    }
}
