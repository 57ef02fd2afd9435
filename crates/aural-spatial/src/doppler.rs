//! Doppler pitch shift and the per-voice fixed-point step derived from it.
//!
//! Grounded on spec.md §4.8's Doppler formula: `pitch *= clamp(c - VLS) /
//! clamp(c - VSS)`. Sign convention fixed here (undocumented by spec.md
//! itself, recorded as an Open Question decision in DESIGN.md): both
//! velocity terms are the line-of-sight component measured positive when
//! *approaching* the other party, giving the textbook moving-source/moving-
//! observer formula `f' = f * (c + v_observer) / (c - v_source)`.

use aural_core::FRACTIONONE;

/// Caps the resampler step so a single voice can never demand more than
/// this many whole samples per output sample (guards against runaway
/// Doppler velocities producing an unbounded resample rate).
pub const MAX_PITCH: f32 = 10.0;

/// Scales `pitch` by the Doppler ratio.
///
/// * `velocity_along_los_listener` - listener's velocity component toward
///   the source, positive when the listener is approaching.
/// * `velocity_along_los_source` - source's velocity component toward the
///   listener, positive when the source is approaching.
///
/// Both are pre-scaled by `doppler_factor` before entering the clamp, so a
/// factor of 0 disables the effect entirely.
pub fn doppler_pitch(
    pitch: f32,
    speed_of_sound: f32,
    doppler_factor: f32,
    velocity_along_los_listener: f32,
    velocity_along_los_source: f32,
) -> f32 {
    let vls = velocity_along_los_listener * doppler_factor;
    let vss = velocity_along_los_source * doppler_factor;

    let numer = (speed_of_sound + vls).clamp(1.0, speed_of_sound * 2.0 - 1.0);
    let denom = (speed_of_sound - vss).clamp(1.0, speed_of_sound * 2.0 - 1.0);
    pitch * numer / denom
}

/// Converts an effective pitch ratio into the resampler's fixed-point
/// step, given the source buffer's native sample rate and the device's
/// output sample rate.
pub fn pitch_to_step(pitch: f32, buffer_freq: f32, device_freq: f32) -> u32 {
    let p = (pitch * buffer_freq / device_freq).min(MAX_PITCH);
    ((p * FRACTIONONE as f32 + 0.5) as u32).max(1)
}
