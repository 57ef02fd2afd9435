//! Aural Spatial - 3D spatialization parameter derivation.
//!
//! Everything a positional source needs to turn a listener/source pair
//! into mixer-ready gains, delays, and filter coefficients: distance
//! attenuation and air absorption, Doppler pitch shift, sound cones,
//! spread-angle widening, listener orientation, ambisonic panning, HRTF
//! convolution, and the B-format decoder that turns ambisonic mix buses
//! into speaker feeds.
//!
//! # Modules
//!
//! - [`distance`] - distance models, air absorption, wet-path decay
//!   compensation
//! - [`doppler`] - Doppler pitch shift and pitch-to-resample-step
//!   conversion
//! - [`cone`] - directional sound cones and spread-angle derivation
//! - [`rotation`] - listener world→local orientation
//! - [`panning`] - ambisonic encode and the `StereoPair` shortcut
//! - [`hrtf`] - per-ear HRTF convolution
//! - [`bformat`] - B-format decode/upsample for speaker output
//!
//! Built on [`aural_core`] for delay lines, filtering, and numeric
//! utilities; has no dependency on any particular audio backend.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod bformat;
pub mod cone;
pub mod distance;
pub mod doppler;
pub mod hrtf;
pub mod panning;
pub mod rotation;

pub use bformat::{BandSplitter, BformatDecoder, ChannelSpec, DecoderConfig};
pub use cone::{Cone, cone_gains, spread_angle, wet_cone_area_scale};
pub use distance::{DistanceModel, DistanceParams, air_absorption_gain_hf, attenuation, wet_decay_compensation};
pub use doppler::{MAX_PITCH, doppler_pitch, pitch_to_step};
pub use hrtf::{HRIR_LEN, HRIR_MASK, HRTF_CROSSFADE_LEN, HRTF_HISTORY_LEN, HRTF_HISTORY_MASK, IR_LEN, HrtfCoeffs, HrtfState};
pub use panning::{Bformat1, ambisonic_encode, stereo_pair_gains};
pub use rotation::{Orientation, length};
