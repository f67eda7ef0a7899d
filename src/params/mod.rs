//! Parameter definitions with units and documented ranges.
//!
//! All tunable numbers live here with:
//! - Units (Hz, milliseconds, dimensionless multipliers)
//! - Documented ranges and meanings
//! - Type safety where possible

mod audio;
mod field;

// Re-export all types
pub use audio::{audio_constants, AnalyzerConfig, ExtractorConfig};
pub use field::{
    FieldConfig, LayoutStyle, FREQUENCY_RANGE_HZ, GLOW_RANGE, PARTICLE_COUNT_RANGE,
    SENSITIVITY_RANGE, SPREAD_RANGE,
};
pub(crate) use field::clamp_to;
