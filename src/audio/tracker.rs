//! Live frequency tracking: capture buffer, shared frequency cell and the
//! polling loop that connects them.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use super::extractor::extract;
use super::fft::SpectrumAnalyzer;
use crate::error::Result;
use crate::params::{AnalyzerConfig, ExtractorConfig};

/// Driving frequency shared between the audio side (writer) and the render
/// loop (reader). Stored as raw f32 bits so reads never see a torn value.
#[derive(Debug, Clone)]
pub struct SharedFrequency(Arc<AtomicU32>);

impl SharedFrequency {
    pub fn new(frequency_hz: f32) -> Self {
        Self(Arc::new(AtomicU32::new(frequency_hz.to_bits())))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, frequency_hz: f32) {
        self.0.store(frequency_hz.to_bits(), Ordering::Release);
    }
}

/// Mono sample FIFO filled by an audio callback and drained by the tracker
#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    samples: Arc<Mutex<Vec<f32>>>,
    capacity: usize,
}

impl CaptureBuffer {
    /// Keep at most `capacity` of the newest samples
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Arc::new(Mutex::new(Vec::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, samples: &[f32]) {
        let mut buf = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        buf.extend_from_slice(samples);
        self.trim(&mut buf);
    }

    /// Push interleaved frames, averaging channels down to mono
    pub fn push_interleaved(&self, data: &[f32], channels: usize) {
        if channels <= 1 {
            self.push(data);
            return;
        }
        let mut buf = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        buf.extend(
            data.chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
        self.trim(&mut buf);
    }

    /// Copy of the newest `count` samples, or `None` until that many arrived
    pub fn latest(&self, count: usize) -> Option<Vec<f32>> {
        let buf = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        (buf.len() >= count).then(|| buf[buf.len() - count..].to_vec())
    }

    pub fn len(&self) -> usize {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn trim(&self, buf: &mut Vec<f32>) {
        if buf.len() > self.capacity {
            let excess = buf.len() - self.capacity;
            buf.drain(..excess);
        }
    }
}

/// Background loop that runs `tick` at a fixed interval until stopped.
///
/// `stop` blocks until the thread has exited.
pub(crate) struct Worker {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Worker {
    pub(crate) fn spawn<F>(name: &str, interval: Duration, mut tick: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while flag.load(Ordering::Acquire) {
                    tick();
                    thread::sleep(interval);
                }
            })?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub(crate) fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub(crate) fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("audio worker thread panicked");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Polls the capture buffer, extracts the dominant frequency and publishes
/// accepted estimates (rounded to whole Hz) to the shared frequency cell.
pub struct FrequencyTracker {
    worker: Worker,
}

impl FrequencyTracker {
    pub fn spawn(
        analyzer_config: AnalyzerConfig,
        extractor_config: ExtractorConfig,
        sample_rate_hz: u32,
        capture: CaptureBuffer,
        frequency: SharedFrequency,
    ) -> Result<Self> {
        let interval = Duration::from_millis(analyzer_config.poll_interval_ms);
        let fft_size = analyzer_config.fft_size;
        let mut analyzer = SpectrumAnalyzer::new(analyzer_config)?;
        let mut ticks: u64 = 0;

        let worker = Worker::spawn("frequency-tracker", interval, move || {
            let Some(samples) = capture.latest(fft_size) else {
                return;
            };
            let snapshot = analyzer.analyze(&samples, sample_rate_hz);
            ticks += 1;

            match extract(&snapshot, &extractor_config) {
                Some(estimate) => {
                    let rounded = estimate.hz.round();
                    if rounded != frequency.load() {
                        log::debug!(
                            "Dominant frequency {:.0} Hz (magnitude {:.0})",
                            rounded,
                            estimate.magnitude
                        );
                    }
                    frequency.store(rounded);
                }
                None if ticks % 60 == 0 => {
                    log::trace!("No frequency estimate, holding {:.0} Hz", frequency.load());
                }
                None => {}
            }
        })?;

        log::info!("Frequency tracking started @ {}Hz", sample_rate_hz);
        Ok(Self { worker })
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    /// Stop polling and join the thread; no-op when already stopped
    pub fn stop(&mut self) {
        if self.worker.is_running() {
            self.worker.stop();
            log::info!("Frequency tracking stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::fft::sine;
    use std::time::Instant;

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn fast_config() -> AnalyzerConfig {
        AnalyzerConfig {
            poll_interval_ms: 2,
            ..AnalyzerConfig::default()
        }
    }

    #[test]
    fn test_shared_frequency_round_trips_bits() {
        let cell = SharedFrequency::new(432.0);
        let reader = cell.clone();
        cell.store(528.5);
        assert_eq!(reader.load(), 528.5);
    }

    #[test]
    fn test_capture_buffer_keeps_newest() {
        let capture = CaptureBuffer::new(4);
        capture.push(&[1.0, 2.0, 3.0]);
        assert!(capture.latest(4).is_none());

        capture.push(&[4.0, 5.0]);
        assert_eq!(capture.len(), 4);
        assert_eq!(capture.latest(2), Some(vec![4.0, 5.0]));
        assert_eq!(capture.latest(4), Some(vec![2.0, 3.0, 4.0, 5.0]));

        capture.clear();
        assert!(capture.is_empty());
    }

    #[test]
    fn test_capture_buffer_mixes_to_mono() {
        let capture = CaptureBuffer::new(16);
        capture.push_interleaved(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2);
        assert_eq!(capture.latest(3), Some(vec![0.5, 0.5, 0.0]));
    }

    #[test]
    fn test_tracker_follows_tone() {
        let capture = CaptureBuffer::new(8192);
        let frequency = SharedFrequency::new(432.0);
        let mut tracker = FrequencyTracker::spawn(
            fast_config(),
            ExtractorConfig::default(),
            44100,
            capture.clone(),
            frequency.clone(),
        )
        .unwrap();

        capture.push(&sine(440.0, 0.5, 44100, 4096));

        // Bin 20 of 1024 at 44.1 kHz = 430.66 Hz, rounded
        assert!(wait_for(|| frequency.load() == 431.0));

        tracker.stop();
        assert!(!tracker.is_running());
        tracker.stop();
    }

    #[test]
    fn test_tracker_holds_frequency_on_silence() {
        let capture = CaptureBuffer::new(8192);
        let frequency = SharedFrequency::new(528.0);
        let mut tracker = FrequencyTracker::spawn(
            fast_config(),
            ExtractorConfig::default(),
            44100,
            capture.clone(),
            frequency.clone(),
        )
        .unwrap();

        capture.push(&vec![0.0; 4096]);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(frequency.load(), 528.0);

        tracker.stop();
    }

    #[test]
    fn test_stop_halts_publishing() {
        let capture = CaptureBuffer::new(8192);
        let frequency = SharedFrequency::new(432.0);
        let mut tracker = FrequencyTracker::spawn(
            fast_config(),
            ExtractorConfig::default(),
            44100,
            capture.clone(),
            frequency.clone(),
        )
        .unwrap();
        tracker.stop();

        capture.push(&sine(1000.0, 0.5, 44100, 4096));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(frequency.load(), 432.0);
    }
}
