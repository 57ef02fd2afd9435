//! Aural Core - DSP primitives for the 3D positional audio rendering path.
//!
//! Foundational, allocation-free-on-the-hot-path building blocks shared by
//! the spatialization (`aural-spatial`) and entity/render (`aural-engine`)
//! layers: sample decoding, fractional-rate resampling, biquad filtering,
//! the mix kernel, and the lock-free property mailbox.
//!
//! # Modules
//!
//! - [`sample`] - per-format sample decode (`load`)
//! - [`resampler`] - point/linear/cubic/sinc interpolation over the
//!   fixed-point position walk
//! - [`biquad`] - direct-form-I biquad, RBJ cookbook coefficients
//! - [`mixer`] - gain-ramped mix kernel (`mix_ramped`) and matrix-row mix
//!   (`mix_row`)
//! - [`delay`] - interpolated delay lines (distance compensation, HRTF
//!   history)
//! - [`propagation`] - `Mailbox<T>` / `FreeList<T>`, the lock-free
//!   snapshot handoff entities use to publish property updates to the
//!   mixer thread
//! - [`math`] - level conversions and small numeric utilities
//!
//! # no_std support
//!
//! `no_std` + `alloc` by default; the `std` feature (default-enabled) pulls
//! in `std` for convenience in host-side crates. Disable it for embedded
//! targets:
//!
//! ```toml
//! [dependencies]
//! aural-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod delay;
#[cfg(feature = "std")]
pub mod error;
pub mod math;
pub mod mixer;
// Unsafe pointer swaps are the point of a lock-free mailbox/free-list.
#[allow(unsafe_code)]
pub mod propagation;
pub mod resampler;
pub mod sample;

pub use biquad::{Biquad, FilterType, calc_rcp_q_from_slope};
pub use delay::{FixedDelayLine, InterpolatedDelay, Interpolation};
#[cfg(feature = "std")]
pub use error::Error;
pub use math::{clamp, db_to_linear, flush_denormal, hz_to_omega, lerp, linear_to_db, ms_to_samples, samples_to_ms};
pub use mixer::{SILENCE_THRESHOLD, mix_ramped, mix_row};
pub use propagation::{FreeList, Mailbox};
pub use resampler::{FRACTIONBITS, FRACTIONMASK, FRACTIONONE, MAX_POST_SAMPLES, MAX_PRE_SAMPLES, Resampler, ResamplerKind, add_frac};
pub use sample::{SampleFormat, load};
