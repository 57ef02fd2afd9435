//! The device backend contract: a pull-model trait the render loop drives,
//! per spec.md §6.
//!
//! This is deliberately shaped differently from `aural-io`'s
//! `AudioBackend` (a push-model trait built around boxed output/input
//! callbacks the platform stream invokes): OpenAL's mixer owns its own
//! render loop and *pulls* samples from (or pushes them to) the backend on
//! its own schedule, it is never itself invoked from inside the platform
//! callback. `aural-io::CpalBackend` adapts to this by running the pull
//! loop inside the boxed callback it hands to cpal.
use thiserror::Error;

/// Errors a backend operation can raise. Kept separate from [`crate::error::AlcError`]
/// since these are host/driver failures, not application misuse.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no such device: {0}")]
    NoSuchDevice(String),
    #[error("device is already open")]
    AlreadyOpen,
    #[error("device is not open")]
    NotOpen,
    #[error("backend driver error: {0}")]
    Driver(String),
}

/// Clock/latency pair for `alcGetInteger64vSOFT(ALC_DEVICE_CLOCK_SOFT, ...)`-style
/// queries: the device's current monotonic sample clock, and the backend's
/// estimate of its own output latency, both in nanoseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockLatency {
    pub clock_ns: i64,
    pub latency_ns: i64,
}

/// Pull-model backend contract: the render loop calls `lock`, fills
/// `available_samples` of audio (via the render loop, not the backend),
/// and calls `unlock`; capture backends are driven by `capture_samples`
/// instead. Implementations own the platform stream and must be safe to
/// call from the single mixer thread (never concurrently).
pub trait Backend: Send {
    /// Opens the named device (`None` selects the default), negotiating
    /// sample rate and channel count as close to the requested values as
    /// the driver allows.
    fn open(&mut self, device_name: Option<&str>, sample_rate: u32, channels: u16) -> Result<(), BackendError>;

    /// Closes the device, releasing any platform stream.
    fn close(&mut self) -> Result<(), BackendError>;

    /// Reconfigures an already-open device's format/update size without a
    /// full close/open cycle.
    fn reset(&mut self, sample_rate: u32, channels: u16) -> Result<(), BackendError>;

    /// Starts the platform stream (output begins flowing / capture begins
    /// filling its ring buffer).
    fn start(&mut self) -> Result<(), BackendError>;

    /// Stops the platform stream without releasing it.
    fn stop(&mut self) -> Result<(), BackendError>;

    /// Acquires exclusive access to the backend's output buffer for the
    /// duration of one render call, paralleling the reference's internal
    /// device mutex.
    fn lock(&mut self);

    /// Releases the lock taken by `lock`.
    fn unlock(&mut self);

    /// Number of sample frames currently available to read from a capture
    /// device's ring buffer.
    fn available_samples(&self) -> usize;

    /// Reads up to `dst.len() / channels` frames of interleaved capture
    /// audio into `dst`, returning the number of frames written.
    fn capture_samples(&mut self, dst: &mut [f32], channels: u16) -> usize;

    /// Hands one render block's worth of interleaved output samples to the
    /// backend. Real-time backends buffer these for their platform stream's
    /// pull callback to drain; synchronous/loopback backends store them for
    /// the caller to retrieve directly. Default is a no-op, for
    /// capture-only backends.
    fn write_output(&mut self, _interleaved: &[f32]) {}

    /// Current clock/latency estimate, for `alcGetInteger64vSOFT`.
    fn get_clock_latency(&self) -> ClockLatency;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A deterministic in-memory backend used by render-loop tests:
    /// `lock`/`unlock` are no-ops, capture always reports silence.
    #[derive(Default)]
    struct NullBackend {
        open: bool,
    }

    impl Backend for NullBackend {
        fn open(&mut self, _device_name: Option<&str>, _sample_rate: u32, _channels: u16) -> Result<(), BackendError> {
            if self.open {
                return Err(BackendError::AlreadyOpen);
            }
            self.open = true;
            Ok(())
        }
        fn close(&mut self) -> Result<(), BackendError> {
            if !self.open {
                return Err(BackendError::NotOpen);
            }
            self.open = false;
            Ok(())
        }
        fn reset(&mut self, _sample_rate: u32, _channels: u16) -> Result<(), BackendError> {
            Ok(())
        }
        fn start(&mut self) -> Result<(), BackendError> {
            Ok(())
        }
        fn stop(&mut self) -> Result<(), BackendError> {
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
        fn get_clock_latency(&self) -> ClockLatency {
            ClockLatency::default()
        }
    }

    #[test]
    fn double_open_is_rejected() {
        let mut backend = NullBackend::default();
        backend.open(None, 44100, 2).unwrap();
        assert!(matches!(backend.open(None, 44100, 2), Err(BackendError::AlreadyOpen)));
    }

    #[test]
    fn close_without_open_is_rejected() {
        let mut backend = NullBackend::default();
        assert!(matches!(backend.close(), Err(BackendError::NotOpen)));
    }
}
