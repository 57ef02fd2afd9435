//! A synchronous, caller-driven backend, per spec.md §6's
//! `alcLoopbackOpenDeviceSOFT`/`alcRenderSamplesSOFT` semantics.
//!
//! Unlike [`crate::CpalBackend`], nothing runs on its own thread: `start`
//! and `stop` just flip a flag, and output written via `write_output`
//! accumulates in an internal buffer the caller drains with
//! [`LoopbackBackend::take_output`]. This is the backend
//! [`aural_engine::render_block`] is driven against in tests and offline
//! rendering (e.g. mixing straight to a WAV file).

use aural_engine::{Backend, BackendError, ClockLatency};

/// A caller-driven backend: opens/closes instantly, and output samples
/// pushed via `write_output` accumulate until drained.
#[derive(Default)]
pub struct LoopbackBackend {
    open: bool,
    running: bool,
    sample_rate: u32,
    channels: u16,
    output: Vec<f32>,
    frames_rendered: u64,
}

impl LoopbackBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes and clears the accumulated interleaved output buffer.
    pub fn take_output(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.output)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Backend for LoopbackBackend {
    fn open(&mut self, _device_name: Option<&str>, sample_rate: u32, channels: u16) -> Result<(), BackendError> {
        if self.open {
            return Err(BackendError::AlreadyOpen);
        }
        self.open = true;
        self.sample_rate = sample_rate;
        self.channels = channels;
        Ok(())
    }

    fn close(&mut self) -> Result<(), BackendError> {
        if !self.open {
            return Err(BackendError::NotOpen);
        }
        self.open = false;
        self.running = false;
        Ok(())
    }

    fn reset(&mut self, sample_rate: u32, channels: u16) -> Result<(), BackendError> {
        self.sample_rate = sample_rate;
        self.channels = channels;
        Ok(())
    }

    fn start(&mut self) -> Result<(), BackendError> {
        if !self.open {
            return Err(BackendError::NotOpen);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        self.running = false;
        Ok(())
    }

    fn lock(&mut self) {}

    fn unlock(&mut self) {}

    fn available_samples(&self) -> usize {
        0
    }

    fn capture_samples(&mut self, dst: &mut [f32], _channels: u16) -> usize {
        dst.fill(0.0);
        0
    }

    fn write_output(&mut self, interleaved: &[f32]) {
        if !self.running {
            return;
        }
        self.output.extend_from_slice(interleaved);
        self.frames_rendered += (interleaved.len() / usize::from(self.channels.max(1))) as u64;
    }

    fn get_clock_latency(&self) -> ClockLatency {
        let clock_ns = (self.frames_rendered as i64).saturating_mul(1_000_000_000) / i64::from(self.sample_rate.max(1));
        ClockLatency { clock_ns, latency_ns: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_output_accumulates_only_while_running() {
        let mut backend = LoopbackBackend::new();
        backend.open(None, 44100, 2).unwrap();
        backend.write_output(&[1.0, 2.0]);
        assert!(backend.take_output().is_empty());

        backend.start().unwrap();
        backend.write_output(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(backend.take_output(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn double_open_is_rejected() {
        let mut backend = LoopbackBackend::new();
        backend.open(None, 44100, 2).unwrap();
        assert!(matches!(backend.open(None, 44100, 2), Err(BackendError::AlreadyOpen)));
    }

    #[test]
    fn clock_latency_tracks_frames_written() {
        let mut backend = LoopbackBackend::new();
        backend.open(None, 44100, 2).unwrap();
        backend.start().unwrap();
        backend.write_output(&vec![0.0; 44100 * 2]);
        let latency = backend.get_clock_latency();
        assert_eq!(latency.clock_ns, 1_000_000_000);
    }
}
