//! High-level field system: owns the active particle set and the frame clock.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::arena::ParticleArena;
use super::layout::generate;
use super::wave::TIME_STEP;
use crate::error::Result;
use crate::params::{clamp_to, FieldConfig, FREQUENCY_RANGE_HZ};

/// Particle field with its configuration and animation time
pub struct FieldSystem {
    arena: ParticleArena,
    config: FieldConfig,
    time: f32,
}

impl FieldSystem {
    /// Validate the configuration and generate the first particle set
    pub fn new(config: FieldConfig) -> Result<Self> {
        config.validate()?;
        let arena = Self::build_arena(&config);
        Ok(Self {
            arena,
            config,
            time: 0.0,
        })
    }

    pub fn arena(&self) -> &ParticleArena {
        &self.arena
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Accumulated animation time
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn reset_time(&mut self) {
        self.time = 0.0;
    }

    /// Replace the configuration between frames.
    ///
    /// Count, style, spread or seed changes build a complete new particle set
    /// before it replaces the active one. Returns whether that happened.
    pub fn apply_config(&mut self, config: FieldConfig) -> Result<bool> {
        config.validate()?;

        let regenerate = self.config.needs_regeneration(&config);
        if regenerate {
            log::info!(
                "Regenerating field: {} particles, {} layout, spread {:.1}",
                config.particle_count,
                config.layout_style,
                config.particle_spread
            );
            let arena = Self::build_arena(&config);
            self.arena = arena;
        }
        self.config = config;

        Ok(regenerate)
    }

    /// Take a frequency proposed by the audio side (pulled into the accepted band)
    pub fn propose_frequency(&mut self, frequency_hz: f32) {
        self.config.frequency_hz = clamp_to(frequency_hz, &FREQUENCY_RANGE_HZ);
    }

    /// Advance the clock one step and recompute every particle
    pub fn update(&mut self) {
        self.time += TIME_STEP;
        self.arena.apply_wave(self.time, &self.config);
    }

    /// Recompute every particle at an explicit time without touching the clock
    pub fn update_at(&mut self, time: f32) {
        self.arena.apply_wave(time, &self.config);
    }

    fn build_arena(config: &FieldConfig) -> ParticleArena {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        generate(
            config.particle_count,
            config.layout_style,
            config.particle_spread,
            config.color1,
            config.color2,
            &mut rng,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::LayoutStyle;

    fn small_config() -> FieldConfig {
        FieldConfig {
            particle_count: 20_000,
            seed: Some(1),
            ..FieldConfig::default()
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = FieldConfig {
            particle_count: 10,
            ..small_config()
        };
        assert!(FieldSystem::new(config).is_err());
    }

    #[test]
    fn test_update_advances_time() {
        let mut field = FieldSystem::new(small_config()).unwrap();
        field.update();
        field.update();
        assert!((field.time() - 0.02).abs() < 1e-6);

        field.reset_time();
        assert_eq!(field.time(), 0.0);
    }

    #[test]
    fn test_color_change_keeps_particles() {
        let mut field = FieldSystem::new(small_config()).unwrap();
        let before = field.arena().rest_positions().to_vec();

        let recolored = FieldConfig {
            glow_intensity: 2.0,
            frequency_hz: 963.0,
            ..small_config()
        };
        assert!(!field.apply_config(recolored).unwrap());
        assert_eq!(field.arena().rest_positions(), before.as_slice());
    }

    #[test]
    fn test_style_change_regenerates() {
        let mut field = FieldSystem::new(small_config()).unwrap();
        let restyled = FieldConfig {
            layout_style: LayoutStyle::Geometric,
            ..small_config()
        };
        assert!(field.apply_config(restyled).unwrap());
        assert_eq!(field.config().layout_style, LayoutStyle::Geometric);
        assert_eq!(field.arena().len(), 20_000);
    }

    #[test]
    fn test_invalid_update_keeps_previous_state() {
        let mut field = FieldSystem::new(small_config()).unwrap();
        let bad = FieldConfig {
            sensitivity: 50.0,
            ..small_config()
        };
        assert!(field.apply_config(bad).is_err());
        assert_eq!(field.config(), &small_config());
    }

    #[test]
    fn test_proposed_frequency_is_clamped() {
        let mut field = FieldSystem::new(small_config()).unwrap();
        field.propose_frequency(528.0);
        assert_eq!(field.config().frequency_hz, 528.0);
        field.propose_frequency(5.0);
        assert_eq!(field.config().frequency_hz, 20.0);
    }
}
