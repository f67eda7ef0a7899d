//! Parallel per-particle buffers.

use glam::Vec3;

use super::wave;
use crate::params::FieldConfig;

/// One particle set: rest positions plus the buffers the renderer samples.
///
/// Index `i` in every buffer refers to the same particle. Rest positions and
/// drift velocities are fixed at generation; positions, colors and sizes are
/// rewritten by every wave update.
#[derive(Debug, Clone)]
pub struct ParticleArena {
    rest_positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    pub(crate) positions: Vec<[f32; 3]>,
    pub(crate) colors: Vec<[f32; 3]>,
    pub(crate) sizes: Vec<f32>,
}

impl ParticleArena {
    pub(crate) fn with_capacity(count: usize) -> Self {
        Self {
            rest_positions: Vec::with_capacity(count),
            velocities: Vec::with_capacity(count),
            positions: Vec::with_capacity(count),
            colors: Vec::with_capacity(count),
            sizes: Vec::with_capacity(count),
        }
    }

    pub(crate) fn push(&mut self, rest: Vec3, color: [f32; 3], size: f32, velocity: Vec3) {
        self.rest_positions.push(rest);
        self.positions.push(rest.to_array());
        self.colors.push(color);
        self.sizes.push(size);
        self.velocities.push(velocity);
    }

    pub fn len(&self) -> usize {
        self.rest_positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rest_positions.is_empty()
    }

    pub fn rest_positions(&self) -> &[Vec3] {
        &self.rest_positions
    }

    /// Per-particle ambient drift, stored for hosts that animate it
    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    /// Position buffer as raw bytes for upload
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Color buffer as raw bytes for upload
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Size buffer as raw bytes for upload
    pub fn size_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.sizes)
    }

    /// Recompute positions, colors and sizes from the rest positions
    pub fn apply_wave(&mut self, time: f32, config: &FieldConfig) {
        wave::update_into(
            &self.rest_positions,
            time,
            config,
            &mut self.positions,
            &mut self.colors,
            &mut self.sizes,
        );
    }
}
