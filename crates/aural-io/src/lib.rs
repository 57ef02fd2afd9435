//! Backend integration for the aural 3D positional audio rendering core.
//!
//! This crate provides:
//!
//! - **Device enumeration**: [`list_devices`]/[`default_device`] over cpal's
//!   host APIs.
//! - **A realtime backend**: [`CpalBackend`], implementing
//!   [`aural_engine::Backend`] over a cpal output stream.
//! - **A synchronous backend**: [`LoopbackBackend`], a caller-driven
//!   implementation for offline rendering (`alcRenderSamplesSOFT`-style).
//! - **WAV file I/O**: [`read_wav`]/[`write_wav`] for loading/saving the
//!   planar sample data [`aural_engine::Buffer`] expects.

mod cpal_backend;
mod loopback;
mod stream;
mod wav;

pub use cpal_backend::CpalBackend;
pub use loopback::LoopbackBackend;
pub use stream::{AudioDevice, default_device, list_devices};
pub use wav::{WavInfo, WavSpec, read_wav, read_wav_info, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
