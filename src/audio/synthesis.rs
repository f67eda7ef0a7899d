//! Synthetic tone composition.

use crate::params::audio_constants::GENERATOR_GAIN;

/// Glicol composition for a plain sine at `frequency_hz`
pub fn tone_composition(frequency_hz: f32) -> String {
    format!("o: sin {:.2} >> mul {}", frequency_hz, GENERATOR_GAIN)
}
