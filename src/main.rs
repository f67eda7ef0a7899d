//! Cymatic Field - audio-reactive particle field
//!
//! Runs the field engine at display cadence without a window: every frame
//! picks up the tracked frequency, recomputes the particle buffers and, once
//! per second, logs a summary of the field. A renderer would sample the same
//! buffers the `--dump` option writes out.

use anyhow::Context;
use clap::Parser;
use glam::Vec3;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use cymatic_field::audio::{list_input_devices, AudioSource, AudioSystem, SharedFrequency};
use cymatic_field::cli::Args;
use cymatic_field::field::{FieldSystem, ParticleArena};
use cymatic_field::params::{AnalyzerConfig, ExtractorConfig};

/// Main application state
struct App {
    field: FieldSystem,
    audio: AudioSystem,
    frequency: SharedFrequency,
    frame_interval: Duration,
    frames_rendered: u64,
    last_report: Instant,
}

impl App {
    fn new(args: &Args) -> anyhow::Result<Self> {
        let config = args.field_config()?;
        let field = FieldSystem::new(config.clone()).context("Failed to build particle field")?;
        let audio = AudioSystem::new(
            AnalyzerConfig::default(),
            ExtractorConfig::default(),
            config.frequency_hz,
        )?;
        let frequency = audio.frequency();

        log::info!(
            "Field: {} particles, {} layout, {:.0} Hz",
            field.arena().len(),
            config.layout_style,
            config.frequency_hz
        );

        Ok(Self {
            field,
            audio,
            frequency,
            frame_interval: Duration::from_secs_f64(1.0 / args.fps.max(1) as f64),
            frames_rendered: 0,
            last_report: Instant::now(),
        })
    }

    /// Start the requested source, falling back to the generator, then to silence
    fn start_audio(&mut self, source: AudioSource) {
        let frequency_hz = self.field.config().frequency_hz;
        let live = source.is_live();

        if let Err(e) = self.audio.start(source, frequency_hz) {
            if live {
                log::warn!("{}; falling back to the synthetic generator", e);
                if let Err(e) = self.audio.start(AudioSource::Generator, frequency_hz) {
                    log::warn!("{}; continuing without audio output", e);
                }
            } else {
                log::warn!("{}; continuing without audio output", e);
            }
        }
    }

    /// Render a single frame
    fn render_frame(&mut self) {
        if self.audio.is_tracking() {
            let tracked = self.frequency.load();
            if tracked != self.field.config().frequency_hz {
                self.field.propose_frequency(tracked);
                log::debug!("Driving frequency -> {:.0} Hz", tracked);
            }
        }

        self.field.update();
        self.frames_rendered += 1;

        if self.last_report.elapsed() >= Duration::from_secs(1) {
            self.report();
            self.last_report = Instant::now();
        }
    }

    fn report(&self) {
        let arena = self.field.arena();
        let (displacement, size) = field_summary(arena);
        log::info!(
            "t={:.2} freq={:.0}Hz audio={:?} mean displacement={:.3} mean size={:.3}",
            self.field.time(),
            self.field.config().frequency_hz,
            self.audio.state(),
            displacement,
            size
        );
    }

    fn run(&mut self, frames: Option<u64>) {
        while frames.map_or(true, |limit| self.frames_rendered < limit) {
            let frame_start = Instant::now();
            self.render_frame();
            if let Some(rest) = self.frame_interval.checked_sub(frame_start.elapsed()) {
                thread::sleep(rest);
            }
        }
    }
}

/// Mean radial displacement and mean particle size
fn field_summary(arena: &ParticleArena) -> (f32, f32) {
    if arena.is_empty() {
        return (0.0, 0.0);
    }
    let count = arena.len() as f32;
    let displacement: f32 = arena
        .rest_positions()
        .iter()
        .zip(arena.positions())
        .map(|(rest, pos)| Vec3::from_array(*pos).distance(*rest))
        .sum();
    let size: f32 = arena.sizes().iter().sum();
    (displacement / count, size / count)
}

/// Write particle count followed by the position, color and size buffers
fn dump_buffers(arena: &ParticleArena, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    out.write_all(&(arena.len() as u32).to_le_bytes())?;
    out.write_all(arena.position_bytes())?;
    out.write_all(arena.color_bytes())?;
    out.write_all(arena.size_bytes())?;
    out.flush()?;

    log::info!("Wrote {} particles to {}", arena.len(), path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.list_devices {
        for name in list_input_devices()? {
            println!("{}", name);
        }
        return Ok(());
    }

    let source = args.audio_source()?;
    let mut app = App::new(&args)?;
    app.start_audio(source);
    app.run(args.frames);
    app.audio.stop();

    if let Some(path) = &args.dump {
        dump_buffers(app.field.arena(), path)?;
    }
    Ok(())
}
