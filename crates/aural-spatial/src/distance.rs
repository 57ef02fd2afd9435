//! Distance attenuation, air absorption, and wet-path decay-time
//! compensation.
//!
//! Grounded on the reference parameter engine's `CalcAttenuation` /
//! `CalcListenerParams` region (the distance-model switch, air-absorption
//! exponent, and the `0.001^(distance/decay_distance)` wet compensation),
//! transcribed from spec.md §4.8 and verified against testable property 9.

use libm::powf;

/// Which curve maps source/listener distance to attenuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceModel {
    Disable,
    Inverse { clamped: bool },
    Linear { clamped: bool },
    Exponent { clamped: bool },
}

/// Parameters shared by every distance-model curve.
#[derive(Debug, Clone, Copy)]
pub struct DistanceParams {
    pub distance: f32,
    pub min_dist: f32,
    pub max_dist: f32,
    pub rolloff: f32,
}

/// Computes the linear gain attenuation for `params` under `model`.
///
/// `Disable` returns unity gain unconditionally (matches `AL_NONE`).
pub fn attenuation(model: DistanceModel, params: DistanceParams) -> f32 {
    let DistanceParams {
        distance,
        min_dist,
        max_dist,
        rolloff,
    } = params;

    match model {
        DistanceModel::Disable => 1.0,
        DistanceModel::Inverse { clamped } => {
            let d = if clamped {
                distance.clamp(min_dist, max_dist)
            } else {
                distance
            };
            if min_dist == 0.0 {
                1.0
            } else {
                min_dist / (min_dist + rolloff * (d - min_dist)).max(0.0).max(f32::MIN_POSITIVE)
            }
        }
        DistanceModel::Linear { clamped } => {
            let d = if clamped {
                distance.clamp(min_dist, max_dist)
            } else {
                distance
            };
            let denom = max_dist - min_dist;
            if denom <= 0.0 {
                1.0
            } else {
                (1.0 - rolloff * (d - min_dist) / denom).max(0.0)
            }
        }
        DistanceModel::Exponent { clamped } => {
            let d = if clamped {
                distance.clamp(min_dist, max_dist)
            } else {
                distance
            };
            if min_dist == 0.0 || d == 0.0 {
                1.0
            } else {
                powf(d / min_dist, -rolloff)
            }
        }
    }
}

/// Linear attenuation of the dry-path HF gain from air absorption over the
/// distance beyond `min_dist`: `dry_hf *= AIR_ABSORB_GAIN_HF ^
/// (air_absorption_factor * meters_beyond_min)`.
pub fn air_absorption_gain_hf(air_absorb_gain_hf: f32, air_absorption_factor: f32, meters_beyond_min: f32) -> f32 {
    if air_absorption_factor <= 0.0 || meters_beyond_min <= 0.0 {
        1.0
    } else {
        powf(air_absorb_gain_hf, air_absorption_factor * meters_beyond_min)
    }
}

/// Compensates a per-send wet gain for the reverb's decay time: sends
/// scale toward the reverb's natural decay curve so a source far from a
/// reflective surface doesn't sound unnaturally loud in the wet mix.
/// `decay_distance` is `decay_time * speed_of_sound` i.e. the distance
/// sound travels during one decay-time-constant, per room.
pub fn wet_decay_compensation(wet_gain: f32, apparent_distance: f32, decay_distance: f32) -> f32 {
    if decay_distance <= 0.0 {
        wet_gain
    } else {
        wet_gain * powf(0.001, apparent_distance / decay_distance)
    }
}
