//! cpal-based realtime backend implementation.
//!
//! [`CpalBackend`] implements [`aural_engine::Backend`], the pull-model
//! contract the device render loop drives. cpal itself is push-model (it
//! invokes our callback on its own real-time thread), so the two models are
//! bridged with a lock-free SPSC ring buffer: `write_output` (called after
//! each render block) pushes interleaved samples in; the cpal output
//! callback drains them, filling any shortfall with silence rather than
//! blocking the audio thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use aural_engine::{Backend, BackendError, ClockLatency};
use cpal::Host;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam::queue::ArrayQueue;

use crate::stream::device_name;

/// Ring buffer depth, in samples, cpal's callback can drain from before
/// underrunning into silence. Sized for a handful of render blocks of
/// slack at typical block sizes (256-1024 frames, up to 8 channels).
const RING_CAPACITY: usize = 1 << 15;

/// cpal-backed realtime [`aural_engine::Backend`].
pub struct CpalBackend {
    host: Host,
    stream: Option<cpal::Stream>,
    ring: Arc<ArrayQueue<f32>>,
    channels: u16,
    clock_ns: Arc<AtomicI64>,
}

impl CpalBackend {
    pub fn new() -> Self {
        tracing::info!(host = cpal::default_host().id().name(), "cpal backend created");
        Self {
            host: cpal::default_host(),
            stream: None,
            ring: Arc::new(ArrayQueue::new(RING_CAPACITY)),
            channels: 2,
            clock_ns: Arc::new(AtomicI64::new(0)),
        }
    }

    fn find_output_device(&self, name: Option<&str>) -> Result<cpal::Device, BackendError> {
        match name {
            Some(search) => {
                let search_lower = search.to_lowercase();
                let devices = self.host.output_devices().map_err(|e| BackendError::Driver(e.to_string()))?;
                for device in devices {
                    if let Ok(dev_name) = device_name(&device)
                        && dev_name.to_lowercase().contains(search_lower.as_str())
                    {
                        return Ok(device);
                    }
                }
                Err(BackendError::NoSuchDevice(search.to_string()))
            }
            None => self.host.default_output_device().ok_or(BackendError::NoSuchDevice("default".to_string())),
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for CpalBackend {
    fn open(&mut self, device_name: Option<&str>, sample_rate: u32, channels: u16) -> Result<(), BackendError> {
        if self.stream.is_some() {
            return Err(BackendError::AlreadyOpen);
        }
        let device = self.find_output_device(device_name)?;
        let config = cpal::StreamConfig { channels, sample_rate: cpal::SampleRate(sample_rate), buffer_size: cpal::BufferSize::Default };

        let ring = Arc::clone(&self.ring);
        let clock_ns = Arc::clone(&self.clock_ns);
        let frame_ns = 1_000_000_000i64 / i64::from(sample_rate).max(1);
        let stream_channels = i64::from(channels).max(1);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for sample in data.iter_mut() {
                        *sample = ring.pop().unwrap_or(0.0);
                    }
                    clock_ns.fetch_add(frame_ns * (data.len() as i64 / stream_channels), Ordering::Relaxed);
                },
                move |err| tracing::error!(%err, "cpal output stream error"),
                None,
            )
            .map_err(|e| BackendError::Driver(e.to_string()))?;

        self.channels = channels;
        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) -> Result<(), BackendError> {
        if self.stream.take().is_none() {
            return Err(BackendError::NotOpen);
        }
        Ok(())
    }

    fn reset(&mut self, sample_rate: u32, channels: u16) -> Result<(), BackendError> {
        self.close()?;
        self.open(None, sample_rate, channels)
    }

    fn start(&mut self) -> Result<(), BackendError> {
        let Some(stream) = &self.stream else { return Err(BackendError::NotOpen) };
        stream.play().map_err(|e| BackendError::Driver(e.to_string()))
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        let Some(stream) = &self.stream else { return Err(BackendError::NotOpen) };
        stream.pause().map_err(|e| BackendError::Driver(e.to_string()))
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
        for &sample in interleaved {
            // Ring is sized generously; an overrun (UI thread outpacing the
            // audio callback) drops the oldest unread sample rather than
            // blocking the caller.
            if self.ring.is_full() {
                self.ring.pop();
            }
            let _ = self.ring.push(sample);
        }
    }

    fn get_clock_latency(&self) -> ClockLatency {
        ClockLatency { clock_ns: self.clock_ns.load(Ordering::Relaxed), latency_ns: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_open_is_rejected() {
        let mut backend = CpalBackend::new();
        // Device availability depends on the test host; only check the
        // already-open guard when the first open actually succeeds.
        if backend.open(None, 44100, 2).is_ok() {
            assert!(matches!(backend.open(None, 44100, 2), Err(BackendError::AlreadyOpen)));
        }
    }

    #[test]
    fn close_without_open_is_rejected() {
        let mut backend = CpalBackend::new();
        assert!(matches!(backend.close(), Err(BackendError::NotOpen)));
    }
}
