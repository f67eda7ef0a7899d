//! Audio source management: synthetic tone, live capture and WAV playback.
//!
//! The system moves `Idle → Acquiring → Streaming` when a source starts and
//! back to `Idle` when it stops. A live source that cannot be acquired drops
//! back to `Idle` with the synthetic generator selected.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Sample;
use glicol::Engine;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::synthesis::tone_composition;
use super::tracker::{CaptureBuffer, FrequencyTracker, SharedFrequency, Worker};
use crate::error::{CymaticError, Result};
use crate::params::audio_constants::{BLOCK_SIZE, CAPTURE_WINDOWS};
use crate::params::{AnalyzerConfig, ExtractorConfig};

/// WAV playback pacing (milliseconds per pushed chunk)
const FILE_CHUNK_MS: u64 = 10;

/// Where the driving frequency comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AudioSource {
    /// Sine tone at the configured frequency; bypasses extraction
    #[default]
    Generator,
    /// Live input device (default device when `None`)
    Microphone { device: Option<String> },
    /// WAV file streamed in real time and looped
    File { path: PathBuf },
}

impl AudioSource {
    /// Whether this source feeds the frequency extractor
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Generator)
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generator => f.write_str("generator"),
            Self::Microphone { device: None } => f.write_str("microphone (default)"),
            Self::Microphone { device: Some(name) } => write!(f, "microphone ({})", name),
            Self::File { path } => write!(f, "file ({})", path.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    Idle,
    Acquiring,
    Streaming,
}

/// Resources held while a source is streaming; dropping them releases the device
enum ActiveSource {
    Generator {
        engine: Arc<Mutex<Engine<BLOCK_SIZE>>>,
        _stream: cpal::Stream,
    },
    Capture {
        _stream: cpal::Stream,
        tracker: FrequencyTracker,
    },
    File {
        player: Worker,
        tracker: FrequencyTracker,
    },
}

impl ActiveSource {
    fn shutdown(self) {
        match self {
            Self::Generator { .. } => {}
            Self::Capture { mut tracker, .. } => tracker.stop(),
            Self::File {
                mut player,
                mut tracker,
            } => {
                player.stop();
                tracker.stop();
            }
        }
    }
}

/// Audio system owning the active source and the shared frequency cell
pub struct AudioSystem {
    analyzer_config: AnalyzerConfig,
    extractor_config: ExtractorConfig,
    frequency: SharedFrequency,
    mode: AudioSource,
    state: AudioState,
    active: Option<ActiveSource>,
}

impl AudioSystem {
    pub fn new(
        analyzer_config: AnalyzerConfig,
        extractor_config: ExtractorConfig,
        initial_frequency_hz: f32,
    ) -> Result<Self> {
        analyzer_config.validate()?;

        Ok(Self {
            analyzer_config,
            extractor_config,
            frequency: SharedFrequency::new(initial_frequency_hz),
            mode: AudioSource::Generator,
            state: AudioState::Idle,
            active: None,
        })
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    pub fn mode(&self) -> &AudioSource {
        &self.mode
    }

    /// Reader handle for the frequency published by live sources
    pub fn frequency(&self) -> SharedFrequency {
        self.frequency.clone()
    }

    /// Whether a live source is currently feeding the extractor
    pub fn is_tracking(&self) -> bool {
        self.state == AudioState::Streaming && self.mode.is_live()
    }

    /// Stop whatever is running and start `source`.
    ///
    /// On failure the state returns to `Idle` and the mode reverts to the
    /// generator; the error is returned for the caller to surface.
    pub fn start(&mut self, source: AudioSource, frequency_hz: f32) -> Result<()> {
        self.stop();

        self.mode = source.clone();
        self.state = AudioState::Acquiring;
        self.frequency.store(frequency_hz);
        log::info!("Starting audio source: {}", source);

        let started = match &source {
            AudioSource::Generator => start_generator(frequency_hz),
            AudioSource::Microphone { device } => self.start_microphone(device.as_deref()),
            AudioSource::File { path } => self.start_file(path),
        };

        match started {
            Ok(active) => {
                self.active = Some(active);
                self.state = AudioState::Streaming;
                Ok(())
            }
            Err(e) => {
                self.state = AudioState::Idle;
                self.mode = AudioSource::Generator;
                log::error!("Audio source '{}' unavailable: {}", source, e);
                Err(e)
            }
        }
    }

    /// Release the active source; no-op when already idle
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.shutdown();
            log::info!("Audio source stopped: {}", self.mode);
        }
        self.state = AudioState::Idle;
    }

    /// Retune the synthetic tone; ignored unless the generator is playing
    pub fn set_generator_frequency(&mut self, frequency_hz: f32) -> Result<()> {
        self.frequency.store(frequency_hz);

        if let Some(ActiveSource::Generator { engine, .. }) = &self.active {
            let mut engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
            engine.update_with_code(&tone_composition(frequency_hz));
            engine
                .update()
                .map_err(|e| CymaticError::Generator(format!("{:?}", e)))?;
        }
        Ok(())
    }

    fn start_microphone(&self, device_name: Option<&str>) -> Result<ActiveSource> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => host
                .input_devices()
                .map_err(|e| acquisition(format!("Failed to enumerate input devices: {}", e)))?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| acquisition(format!("No input device named '{}'", name)))?,
            None => host
                .default_input_device()
                .ok_or_else(|| acquisition("No audio input device found".to_string()))?,
        };

        let config = device
            .default_input_config()
            .map_err(|e| acquisition(format!("Failed to get input config: {}", e)))?;
        let sample_rate_hz = config.sample_rate().0;
        let channels = config.channels() as usize;
        log::info!(
            "Audio input: {} @ {}Hz, {} channel(s)",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate_hz,
            channels
        );

        let capture = CaptureBuffer::new(self.analyzer_config.fft_size * CAPTURE_WINDOWS);
        let sample_format = config.sample_format();
        let stream_config: cpal::StreamConfig = config.into();

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_capture_stream::<f32>(&device, &stream_config, channels, capture.clone())
            }
            cpal::SampleFormat::I16 => {
                build_capture_stream::<i16>(&device, &stream_config, channels, capture.clone())
            }
            cpal::SampleFormat::U16 => {
                build_capture_stream::<u16>(&device, &stream_config, channels, capture.clone())
            }
            other => {
                return Err(acquisition(format!(
                    "Unsupported input sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| acquisition(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| acquisition(format!("Failed to start input stream: {}", e)))?;

        let tracker = self.spawn_tracker(sample_rate_hz, capture)?;
        Ok(ActiveSource::Capture {
            _stream: stream,
            tracker,
        })
    }

    fn start_file(&self, path: &Path) -> Result<ActiveSource> {
        let (samples, sample_rate_hz) = read_wav_mono(path)?;
        if samples.is_empty() {
            return Err(acquisition(format!("'{}' contains no audio", path.display())));
        }
        log::info!(
            "Audio file: {} @ {}Hz, {:.1}s",
            path.display(),
            sample_rate_hz,
            samples.len() as f32 / sample_rate_hz as f32
        );

        let capture = CaptureBuffer::new(self.analyzer_config.fft_size * CAPTURE_WINDOWS);
        let chunk = ((sample_rate_hz as u64 * FILE_CHUNK_MS / 1000) as usize).max(1);
        let feed = capture.clone();
        let mut cursor = 0;

        let player = Worker::spawn("wav-player", Duration::from_millis(FILE_CHUNK_MS), move || {
            let end = (cursor + chunk).min(samples.len());
            feed.push(&samples[cursor..end]);
            cursor = if end == samples.len() { 0 } else { end };
        })?;

        let tracker = self.spawn_tracker(sample_rate_hz, capture)?;
        Ok(ActiveSource::File { player, tracker })
    }

    fn spawn_tracker(&self, sample_rate_hz: u32, capture: CaptureBuffer) -> Result<FrequencyTracker> {
        FrequencyTracker::spawn(
            self.analyzer_config.clone(),
            self.extractor_config.clone(),
            sample_rate_hz,
            capture,
            self.frequency.clone(),
        )
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop();
    }
}

fn acquisition(message: String) -> CymaticError {
    CymaticError::DeviceAcquisition(message)
}

fn build_capture_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    capture: CaptureBuffer,
) -> std::result::Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let mut converted = Vec::new();
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            push_converted(&capture, data, channels, &mut converted);
        },
        |err| log::error!("Audio input stream error: {}", err),
        None,
    )
}

/// Convert device samples to f32 and push them as one interleaved block
fn push_converted<T>(capture: &CaptureBuffer, data: &[T], channels: usize, scratch: &mut Vec<f32>)
where
    T: cpal::Sample,
    f32: cpal::FromSample<T>,
{
    scratch.clear();
    scratch.extend(data.iter().map(|&s| s.to_sample::<f32>()));
    capture.push_interleaved(scratch, channels);
}

fn start_generator(frequency_hz: f32) -> Result<ActiveSource> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| acquisition("No audio output device found".to_string()))?;

    let config = device
        .default_output_config()
        .map_err(|e| acquisition(format!("Failed to get audio config: {}", e)))?;
    let channels = config.channels() as usize;

    log::info!(
        "Audio output: {} @ {}Hz",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        config.sample_rate().0
    );

    let mut engine = Engine::<BLOCK_SIZE>::new();
    engine.set_sr(config.sample_rate().0 as usize);
    engine.update_with_code(&tone_composition(frequency_hz));
    engine
        .update()
        .map_err(|e| CymaticError::Generator(format!("{:?}", e)))?;

    let engine = Arc::new(Mutex::new(engine));
    let engine_callback = Arc::clone(&engine);

    let stream = device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut engine = engine_callback
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);

                let frames_needed = data.len() / channels;
                let mut frame_idx = 0;

                // Generate multiple blocks if needed to fill the entire buffer
                while frame_idx < frames_needed {
                    let (buffers, _) = engine.next_block(vec![]);
                    let samples_to_copy = (frames_needed - frame_idx).min(BLOCK_SIZE);

                    for i in 0..samples_to_copy {
                        let left = buffers[0][i];
                        let right = buffers[1][i];
                        let frame = &mut data[(frame_idx + i) * channels..][..channels];
                        for (ch, out) in frame.iter_mut().enumerate() {
                            *out = if ch % 2 == 0 { left } else { right };
                        }
                    }

                    frame_idx += samples_to_copy;
                }
            },
            |err| log::error!("Audio output stream error: {}", err),
            None,
        )
        .map_err(|e| acquisition(format!("Failed to build output stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| acquisition(format!("Failed to start output stream: {}", e)))?;

    Ok(ActiveSource::Generator {
        engine,
        _stream: stream,
    })
}

/// Decode a WAV file to mono f32 samples in [-1, 1]
pub fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let mono = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    Ok((mono, spec.sample_rate))
}

/// Names of the host's audio input devices
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| acquisition(format!("Failed to enumerate input devices: {}", e)))?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::fft::sine;
    use std::time::Instant;

    fn temp_wav(name: &str, spec: hound::WavSpec, samples: &[f32]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("cymatic-{}-{}.wav", name, std::process::id()));
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for &s in samples {
            match spec.sample_format {
                hound::SampleFormat::Float => writer.write_sample(s).unwrap(),
                hound::SampleFormat::Int => writer.write_sample((s * i16::MAX as f32) as i16).unwrap(),
            }
        }
        writer.finalize().unwrap();
        path
    }

    fn system() -> AudioSystem {
        let analyzer = AnalyzerConfig {
            poll_interval_ms: 2,
            ..AnalyzerConfig::default()
        };
        AudioSystem::new(analyzer, ExtractorConfig::default(), 432.0).unwrap()
    }

    #[test]
    fn test_read_wav_mono_mixes_channels() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let path = temp_wav("stereo", spec, &[0.5, -0.5, 1.0, 0.0]);
        let (mono, rate) = read_wav_mono(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(rate, 8000);
        assert_eq!(mono, vec![0.0, 0.5]);
    }

    #[test]
    fn test_read_wav_scales_integer_samples() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let path = temp_wav("int16", spec, &[1.0, -0.5]);
        let (mono, _) = read_wav_mono(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert!((mono[0] - 1.0).abs() < 1e-3);
        assert!((mono[1] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_integer_input_samples_are_normalized() {
        let capture = CaptureBuffer::new(16);
        let mut scratch = Vec::new();

        push_converted(&capture, &[i16::MIN, 0, 16384, 16384], 2, &mut scratch);
        assert_eq!(capture.latest(2).unwrap(), vec![-0.5, 0.5]);

        push_converted(&capture, &[0u16, 32768], 1, &mut scratch);
        assert_eq!(capture.latest(2).unwrap(), vec![-1.0, 0.0]);

        push_converted(&capture, &[0.25f32, 0.75], 2, &mut scratch);
        assert_eq!(capture.latest(1).unwrap(), vec![0.5]);
    }

    #[test]
    fn test_missing_file_falls_back_to_generator() {
        let mut audio = system();
        let source = AudioSource::File {
            path: PathBuf::from("/nonexistent/cymatic.wav"),
        };

        assert!(audio.start(source, 432.0).is_err());
        assert_eq!(audio.state(), AudioState::Idle);
        assert_eq!(audio.mode(), &AudioSource::Generator);
        assert!(!audio.is_tracking());
    }

    #[test]
    fn test_file_source_drives_frequency() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let path = temp_wav("tone", spec, &sine(440.0, 0.5, 44100, 44100));

        let mut audio = system();
        audio
            .start(AudioSource::File { path: path.clone() }, 432.0)
            .unwrap();
        assert_eq!(audio.state(), AudioState::Streaming);
        assert!(audio.is_tracking());

        let frequency = audio.frequency();
        let deadline = Instant::now() + Duration::from_secs(5);
        while frequency.load() != 431.0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(frequency.load(), 431.0);

        audio.stop();
        assert_eq!(audio.state(), AudioState::Idle);
        audio.stop();
        assert_eq!(audio.state(), AudioState::Idle);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_generator_retune_updates_shared_frequency() {
        let mut audio = system();
        // No generator running: only the shared value changes
        audio.set_generator_frequency(639.0).unwrap();
        assert_eq!(audio.frequency().load(), 639.0);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(AudioSource::Generator.to_string(), "generator");
        assert!(!AudioSource::Generator.is_live());
        assert!(AudioSource::Microphone { device: None }.is_live());
    }
}
