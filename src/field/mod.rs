//! Cymatic particle field: layout topologies, coloring, and the per-frame wave update.

mod arena;
mod color;
mod layout;
mod system;
mod wave;

// Re-export public types
pub use arena::ParticleArena;
pub use color::{blend, brightness, Rgb};
pub use layout::{generate, max_radius};
pub use system::FieldSystem;
pub use wave::{update_into, WaveFrame, NORMAL_EPSILON, TIME_STEP};

/// Radius (before spread) at which the brightness falloff saturates
pub const FIELD_RADIUS: f32 = 250.0;

/// Brightness cap used when a particle set is generated
pub const GENERATION_BRIGHTNESS_CAP: f32 = 0.7;

/// Brightness cap used by the per-frame update (punchier than generation)
pub const UPDATE_BRIGHTNESS_CAP: f32 = 0.6;
