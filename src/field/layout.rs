//! Procedural particle layouts.
//!
//! Three topologies, all scaled by `spread`:
//! - Geometric: eight concentric rings in the XZ plane with slight vertical jitter
//! - Ethereal: Fibonacci-sphere directions on shells of random radius
//! - Organic: 70% logarithmic spiral disk, 30% spherical halo (galaxy silhouette)

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::Rng;

use super::arena::ParticleArena;
use super::color::{blend, brightness, Rgb};
use super::{FIELD_RADIUS, GENERATION_BRIGHTNESS_CAP};
use crate::params::LayoutStyle;

const RING_COUNT: f32 = 8.0;
const RING_BASE_RADIUS: f32 = 10.0;
const RING_STEP: f32 = 15.0;
const RING_JITTER: f32 = 5.0;

const SHELL_MIN_RADIUS: f32 = 30.0;
const SHELL_RADIUS_RANGE: f32 = 50.0;

const DISK_PROBABILITY: f32 = 0.7;
const DISK_TWIST: f32 = 0.03;
const DISK_THICKNESS: f32 = 15.0;
const DISK_HEIGHT_FALLOFF: f32 = 0.008;
const HALO_MIN_RADIUS: f32 = 40.0;
const HALO_RADIUS_RANGE: f32 = 100.0;

const DRIFT_SPEED: f32 = 0.05;

/// Generate `count` particles for `style`.
///
/// Initial colors are a random blend of the two endpoints dimmed by distance,
/// sizes are random and larger near the center.
pub fn generate<R: Rng + ?Sized>(
    count: usize,
    style: LayoutStyle,
    spread: f32,
    color1: Rgb,
    color2: Rgb,
    rng: &mut R,
) -> ParticleArena {
    let mut arena = ParticleArena::with_capacity(count);

    for i in 0..count {
        let rest = match style {
            LayoutStyle::Geometric => ring_position(i, count, spread, rng),
            LayoutStyle::Ethereal => shell_position(i, count, spread, rng),
            LayoutStyle::Organic => galaxy_position(spread, rng),
        };

        let glow = brightness(rest.length(), spread, GENERATION_BRIGHTNESS_CAP);
        let color = blend(color1, color2, rng.gen::<f32>(), glow);
        let size = (rng.gen::<f32>() * 1.5 + 0.3) * (1.0 + glow);
        let velocity = Vec3::new(
            rng.gen::<f32>() - 0.5,
            rng.gen::<f32>() - 0.5,
            rng.gen::<f32>() - 0.5,
        ) * DRIFT_SPEED;

        arena.push(rest, color.to_array(), size, velocity);
    }

    arena
}

/// Upper bound on |rest position| for a style at a given spread
pub fn max_radius(style: LayoutStyle, spread: f32) -> f32 {
    let unscaled = match style {
        LayoutStyle::Geometric => {
            let outer = RING_BASE_RADIUS + (RING_COUNT - 1.0) * RING_STEP;
            outer.hypot(RING_JITTER / 2.0)
        }
        LayoutStyle::Ethereal => SHELL_MIN_RADIUS + SHELL_RADIUS_RANGE,
        LayoutStyle::Organic => FIELD_RADIUS
            .hypot(DISK_THICKNESS / 2.0)
            .max(HALO_MIN_RADIUS + HALO_RADIUS_RANGE),
    };
    unscaled * spread
}

fn ring_position<R: Rng + ?Sized>(i: usize, count: usize, spread: f32, rng: &mut R) -> Vec3 {
    let per_ring = count as f32 / RING_COUNT;
    let ring = (i as f32 / per_ring).floor().min(RING_COUNT - 1.0);
    let angle = (i as f32 % per_ring) / per_ring * TAU;
    let radius = (RING_BASE_RADIUS + ring * RING_STEP) * spread;

    Vec3::new(
        angle.cos() * radius,
        (rng.gen::<f32>() - 0.5) * RING_JITTER * spread,
        angle.sin() * radius,
    )
}

fn shell_position<R: Rng + ?Sized>(i: usize, count: usize, spread: f32, rng: &mut R) -> Vec3 {
    // Equal-area spiral: phi walks cos-uniformly from pole to pole
    let phi = (-1.0 + (2.0 * i as f32) / count as f32).acos();
    let theta = (count as f32 * PI).sqrt() * phi;
    let radius = (SHELL_MIN_RADIUS + rng.gen::<f32>() * SHELL_RADIUS_RANGE) * spread;

    spherical(radius, theta, phi)
}

fn galaxy_position<R: Rng + ?Sized>(spread: f32, rng: &mut R) -> Vec3 {
    if rng.gen::<f32>() < DISK_PROBABILITY {
        let angle = rng.gen::<f32>() * TAU;
        // Fourth root biases mass toward the core
        let radius = rng.gen::<f32>().powf(0.25) * FIELD_RADIUS * spread;
        let spiral = angle + radius * DISK_TWIST;
        let height_falloff = (-radius * DISK_HEIGHT_FALLOFF).exp();

        Vec3::new(
            spiral.cos() * radius,
            (rng.gen::<f32>() - 0.5) * DISK_THICKNESS * height_falloff * spread,
            spiral.sin() * radius,
        )
    } else {
        let phi = (-1.0 + 2.0 * rng.gen::<f32>()).acos();
        let theta = rng.gen::<f32>() * TAU;
        let radius = (HALO_MIN_RADIUS + rng.gen::<f32>() * HALO_RADIUS_RANGE) * spread;

        spherical(radius, theta, phi)
    }
}

fn spherical(radius: f32, theta: f32, phi: f32) -> Vec3 {
    Vec3::new(
        radius * theta.cos() * phi.sin(),
        radius * theta.sin() * phi.sin(),
        radius * phi.cos(),
    )
}
