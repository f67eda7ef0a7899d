//! Audio input, spectrum analysis and dominant-frequency tracking.
//!
//! Live sources (microphone, WAV file) feed a capture buffer that a polling
//! thread analyzes; accepted estimates land in a shared frequency cell the
//! render loop reads. The synthetic generator only plays a tone.

mod extractor;
mod fft;
mod synthesis;
mod system;
mod tracker;

// Re-export public types
pub use extractor::{extract, FrequencyEstimate, SpectrumSnapshot};
pub use fft::{hann_window, SpectrumAnalyzer};
pub use synthesis::tone_composition;
pub use system::{list_input_devices, read_wav_mono, AudioSource, AudioState, AudioSystem};
pub use tracker::{CaptureBuffer, FrequencyTracker, SharedFrequency};
