//! The device: sample format, mix buffer sets, post-processors, and the
//! contexts it renders, per spec.md §3's Device entity.
//!
//! Grounded on the "own the buffers, own the effect chain" shape the
//! reference engine's device owns, generalized to OpenAL's render
//! pipeline. Unlike
//! a textbook ambisonic renderer, there is no separate first-order-
//! ambisonic intermediate buffer: the decode matrix is baked directly
//! into each `Generic`-mode voice's per-channel dry gains (see
//! [`MixBuffers`]'s doc comment), so voices pan straight into the
//! device's real-output buffers.

use aural_spatial::BformatDecoder;

use crate::backend::Backend;
use crate::context::Context;

/// How the device's post-ambisonic output reaches the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Two channels, no ambisonic decode (voices pan directly via
    /// `PanningMode::StereoPair` or `PanningMode::Hrtf`).
    Stereo,
    /// N output channels via a fixed ambisonic decode matrix (speaker
    /// layouts larger than stereo).
    Multichannel { decoder_channels: usize },
}

/// Device-owned sample buffers, reset whenever the format or update size
/// changes. Per spec.md §4.8's panning paragraph the ambisonic decode
/// matrix is baked directly into each voice's per-channel dry gains
/// (see [`crate::params::update_voice_mono`]'s `Generic` path), so there
/// is one buffer per final output channel rather than a separate
/// first-order-ambisonic intermediate.
pub struct MixBuffers {
    /// Final device-channel output, post-decode, pre-format-conversion.
    pub real_out: Vec<Vec<f32>>,
}

impl MixBuffers {
    fn new(update_size: usize, output_channels: usize) -> Self {
        Self {
            real_out: (0..output_channels).map(|_| vec![0.0; update_size]).collect(),
        }
    }

    fn clear(&mut self) {
        for ch in &mut self.real_out {
            ch.fill(0.0);
        }
    }
}

/// A single playback device: owns the backend, the mix buffers, and the
/// set of contexts rendered each block.
pub struct Device {
    pub sample_rate: u32,
    pub update_size: usize,
    pub output_mode: OutputMode,
    pub mix_buffers: MixBuffers,
    /// Per-output-channel ambisonic decode row (`[W, X, Y, Z]`), used by
    /// [`crate::params::update_voice_mono`]'s `Generic` path.
    pub panning_matrix: Vec<[f32; 4]>,
    pub decoder: Option<BformatDecoder>,
    pub contexts: Vec<Context>,
    backend: Box<dyn Backend>,
}

impl Device {
    pub fn new(backend: Box<dyn Backend>, sample_rate: u32, update_size: usize, output_mode: OutputMode) -> Self {
        let output_channels = match output_mode {
            OutputMode::Stereo => 2,
            OutputMode::Multichannel { decoder_channels } => decoder_channels,
        };
        let panning_matrix = match output_mode {
            OutputMode::Stereo => vec![
                [core::f32::consts::FRAC_1_SQRT_2, -0.5, 0.0, 0.0],
                [core::f32::consts::FRAC_1_SQRT_2, 0.5, 0.0, 0.0],
            ],
            OutputMode::Multichannel { decoder_channels } => {
                vec![[core::f32::consts::FRAC_1_SQRT_2, 0.0, 0.0, 0.0]; decoder_channels]
            }
        };
        Self {
            sample_rate,
            update_size,
            output_mode,
            mix_buffers: MixBuffers::new(update_size, output_channels),
            panning_matrix,
            decoder: None,
            contexts: Vec::new(),
            backend,
        }
    }

    /// Opens the backend, negotiating the device's configured format.
    pub fn open(&mut self, device_name: Option<&str>) -> Result<(), crate::backend::BackendError> {
        let channels = self.mix_buffers.real_out.len() as u16;
        self.backend.open(device_name, self.sample_rate, channels)?;
        self.backend.start()
    }

    pub fn close(&mut self) -> Result<(), crate::backend::BackendError> {
        self.backend.stop()?;
        self.backend.close()
    }

    /// Changes the update size (and therefore reallocates the mix
    /// buffers), matching `alcResetDeviceSOFT`'s "no close/open needed"
    /// contract.
    pub fn set_update_size(&mut self, update_size: usize) {
        self.update_size = update_size;
        let channels = self.mix_buffers.real_out.len();
        self.mix_buffers = MixBuffers::new(update_size, channels);
    }

    pub fn add_context(&mut self, max_sources: usize, max_effect_slots: usize) -> usize {
        self.contexts.push(Context::new(max_sources, max_effect_slots));
        self.contexts.len() - 1
    }

    pub fn remove_context(&mut self, index: usize) {
        if index < self.contexts.len() {
            self.contexts.remove(index);
        }
    }

    pub fn backend_mut(&mut self) -> &mut dyn Backend {
        self.backend.as_mut()
    }

    pub fn clear_buffers(&mut self) {
        self.mix_buffers.clear();
    }
}
