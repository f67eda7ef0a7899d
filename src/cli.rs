//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

use crate::audio::AudioSource;
use crate::error::{CymaticError, Result};
use crate::field::Rgb;
use crate::params::{FieldConfig, LayoutStyle};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "cymatic-field")]
#[command(about = "Audio-reactive cymatic particle field", long_about = None)]
pub struct Args {
    /// Driving frequency in Hz (20-2000); live sources override it
    #[arg(long, value_name = "HZ", default_value = "432")]
    pub frequency: f32,

    /// Displacement amplitude multiplier (0.1-3)
    #[arg(long, default_value = "1.5")]
    pub sensitivity: f32,

    /// Color and size multiplier (0.5-3)
    #[arg(long, default_value = "1.2")]
    pub glow: f32,

    /// Wave-trough color
    #[arg(long, value_name = "HEX", default_value = "#ff6b9d")]
    pub color1: String,

    /// Wave-crest color
    #[arg(long, value_name = "HEX", default_value = "#c060ff")]
    pub color2: String,

    /// Global radius scale (0.5-3)
    #[arg(long, default_value = "1.0")]
    pub spread: f32,

    /// Layout: organic (galaxy), geometric (rings), ethereal (sphere)
    #[arg(long, value_name = "STYLE", default_value = "organic")]
    pub style: String,

    /// Particle count (20000-150000)
    #[arg(long, value_name = "COUNT", default_value = "100000")]
    pub particles: usize,

    /// Layout seed for reproducible particle sets
    #[arg(long)]
    pub seed: Option<u64>,

    /// Audio source: generator (default), microphone, file
    #[arg(long, value_name = "SOURCE", default_value = "generator")]
    pub source: String,

    /// Input device name for the microphone source
    #[arg(long, value_name = "NAME")]
    pub device: Option<String>,

    /// WAV file for the file source
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Frames to run before exiting (runs until interrupted when omitted)
    #[arg(long)]
    pub frames: Option<u64>,

    /// Frame rate of the update loop
    #[arg(long, default_value = "60")]
    pub fps: u32,

    /// Write the final position, color and size buffers to this file
    #[arg(long, value_name = "PATH")]
    pub dump: Option<PathBuf>,

    /// List audio input devices and exit
    #[arg(long)]
    pub list_devices: bool,
}

impl Args {
    /// Build the field configuration from command-line arguments
    pub fn field_config(&self) -> Result<FieldConfig> {
        let config = FieldConfig {
            frequency_hz: self.frequency,
            sensitivity: self.sensitivity,
            glow_intensity: self.glow,
            color1: Rgb::from_hex(&self.color1)?,
            color2: Rgb::from_hex(&self.color2)?,
            particle_spread: self.spread,
            layout_style: self.style.parse::<LayoutStyle>()?,
            particle_count: self.particles,
            seed: self.seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse audio source from command-line arguments
    pub fn audio_source(&self) -> Result<AudioSource> {
        match self.source.to_lowercase().as_str() {
            "generator" => Ok(AudioSource::Generator),
            "microphone" | "mic" => Ok(AudioSource::Microphone {
                device: self.device.clone(),
            }),
            "file" => self
                .file
                .clone()
                .map(|path| AudioSource::File { path })
                .ok_or_else(|| {
                    CymaticError::InvalidConfig("--source file requires --file".to_string())
                }),
            other => Err(CymaticError::InvalidConfig(format!(
                "unknown audio source '{}'",
                other
            ))),
        }
    }
}
