//! The parameter engine: per-block recomputation of listener, effect-slot,
//! and per-voice mixer parameters from their published property snapshots.
//!
//! Grounded on spec.md §4.8. Listener and effect-slot updates are plain
//! mailbox exchanges (already implemented on [`crate::listener::ListenerSlot`]
//! and [`crate::effect_slot::EffectSlot`]); this module is the third and
//! most involved procedure, the per-voice update, split into the
//! attenuated (mono, positioned) path and the non-attenuated (multichannel,
//! already-spatialized) path spec.md distinguishes by source channel count.

use aural_core::{FilterType, calc_rcp_q_from_slope};
use aural_spatial::{
    Cone, DistanceModel, DistanceParams, Orientation, ambisonic_encode, air_absorption_gain_hf, attenuation,
    cone_gains, doppler_pitch, pitch_to_step, rotation::length, spread_angle, stereo_pair_gains, wet_decay_compensation,
};

use crate::source::SourceProps;
use crate::voice::{MAX_OUTPUT_CHANNELS, MAX_SENDS, PanningMode, Voice};

/// Resolved per-send target the per-voice update needs to turn a source's
/// [`crate::source::AuxSend`] binding into a wet gain/filter: the bound
/// effect slot's own properties, looked up by the caller (this module
/// doesn't hold the effect-slot pool itself). `None` means the send is
/// unbound or targets a slot that isn't in use.
#[derive(Debug, Clone, Copy)]
pub struct SendTarget {
    pub gain: f32,
    pub room_rolloff_factor: f32,
    pub decay_time: f32,
    pub air_absorption_gain_hf: f32,
}

/// Context-wide parameters the per-voice update reads but does not own:
/// the listener's mixer-side state plus the distance/doppler settings
/// that live on [`crate::context::Context`].
#[derive(Debug, Clone, Copy)]
pub struct ListenerContext<'a> {
    pub orientation: &'a Orientation,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub gain: f32,
    pub meters_per_unit: f32,
    pub distance_model: DistanceModel,
    pub doppler_factor: f32,
    pub speed_of_sound: f32,
}

/// Device-side parameters the update needs to turn an ambisonic encode or
/// native sample rate into concrete gains/resample steps.
#[derive(Debug, Clone, Copy)]
pub struct DeviceContext<'a> {
    pub sample_rate: u32,
    /// The playing source's current buffer's native sample rate, used
    /// alongside `sample_rate` to turn pitch into a resample step.
    pub buffer_freq: u32,
    /// Per-output-channel ambisonic decode row (`[W, X, Y, Z]` weights),
    /// used by [`PanningMode::Generic`].
    pub panning_matrix: &'a [[f32; 4]],
}

/// Fixed HF/LF reference frequencies the direct- and send-path shelf
/// filters normalize against, matching the reference mixer's
/// `LOWPASSFREQREF` / `HIGHPASSFREQREF`.
const HF_REFERENCE_HZ: f32 = 5000.0;
const LF_REFERENCE_HZ: f32 = 250.0;

/// Runs the attenuated (mono, positioned) per-voice update: distance
/// attenuation, air absorption, cone, Doppler, and panning, all derived
/// from the source's world-space position relative to the listener.
/// `sends[i]` is the resolved target of the source's `i`th aux send
/// (`None` if unbound), used to derive each send's wet gain/filter.
pub fn update_voice_mono(
    voice: &mut Voice,
    props: &SourceProps,
    listener: ListenerContext,
    device: DeviceContext,
    sends: &[Option<SendTarget>; MAX_SENDS],
) {
    let relative = if props.head_relative {
        props.position
    } else {
        [
            props.position[0] - listener.position[0],
            props.position[1] - listener.position[1],
            props.position[2] - listener.position[2],
        ]
    };
    let local = if props.head_relative { relative } else { listener.orientation.rotate(relative) };
    let distance = length(local) * listener.meters_per_unit;

    let model = props.distance_model.unwrap_or(listener.distance_model);
    let dist_params = DistanceParams {
        distance,
        min_dist: props.reference_distance,
        max_dist: props.max_distance,
        rolloff: props.rolloff_factor,
    };
    let mut gain = attenuation(model, dist_params) * listener.gain * props.gain;
    let mut gain_hf = air_absorption_gain_hf(props.outer_gain_hf.max(0.994), 1.0, (distance - props.reference_distance).max(0.0));

    let direction = if length(local).abs() > 1e-6 { normalize(local) } else { [0.0, 0.0, -1.0] };
    let facing_angle = if length(props.direction) > 1e-6 {
        let facing = normalize(props.direction);
        let to_listener = [-direction[0], -direction[1], -direction[2]];
        angle_between(facing, to_listener)
    } else {
        0.0
    };
    let cone = Cone {
        inner_angle: props.inner_cone_angle,
        outer_angle: props.outer_cone_angle,
        outer_gain: props.outer_gain,
        outer_gain_hf: props.outer_gain_hf,
    };
    let (cone_gain, cone_gain_hf) = cone_gains(cone, facing_angle);
    gain *= cone_gain;
    gain_hf *= cone_gain_hf;

    let spread = spread_angle(props.radius, distance.max(1e-3));

    let relative_velocity = [
        props.velocity[0] - listener.velocity[0],
        props.velocity[1] - listener.velocity[1],
        props.velocity[2] - listener.velocity[2],
    ];
    let los = if length(local) > 1e-6 { normalize(local) } else { [0.0; 3] };
    let closing_speed = -(relative_velocity[0] * los[0] + relative_velocity[1] * los[1] + relative_velocity[2] * los[2]);
    let pitch = doppler_pitch(props.pitch, listener.speed_of_sound, listener.doppler_factor, 0.0, -closing_speed);
    voice.set_increment(pitch_to_step(pitch, device.buffer_freq as f32, device.sample_rate as f32));

    apply_hf_shelf(&mut voice.direct[0], gain_hf, device.sample_rate);

    match voice.panning_mode {
        PanningMode::StereoPair => {
            let (left, right) = stereo_pair_gains(direction[0]);
            let mut targets = [0.0f32; MAX_OUTPUT_CHANNELS];
            targets[0] = left * gain;
            if targets.len() > 1 {
                targets[1] = right * gain;
            }
            voice.direct[0].gains_target = targets;
        }
        PanningMode::Generic => {
            let encoded = ambisonic_encode(direction, spread);
            let mut targets = [0.0f32; MAX_OUTPUT_CHANNELS];
            for (row, target) in device.panning_matrix.iter().zip(targets.iter_mut()) {
                *target = gain * (row[0] * encoded[0] + row[1] * encoded[1] + row[2] * encoded[2] + row[3] * encoded[3]);
            }
            voice.direct[0].gains_target = targets;
        }
        PanningMode::Hrtf => {
            // HRIR coefficient selection from a head-related dataset is out of
            // scope; the caller is expected to set `voice.direct[0].hrtf`
            // directly once it has looked up coefficients for `direction`.
        }
    }

    for (send_idx, target) in sends.iter().enumerate() {
        let Some(send_chan) = voice.sends[0].get_mut(send_idx) else { continue };
        let Some(target) = target else {
            send_chan.gain_target = 0.0;
            continue;
        };
        let room_params = DistanceParams {
            distance,
            min_dist: props.reference_distance,
            max_dist: props.max_distance,
            rolloff: target.room_rolloff_factor,
        };
        let room_gain = attenuation(model, room_params) * listener.gain * props.gain * props.sends[send_idx].gain * target.gain;
        let decay_distance = target.decay_time * listener.speed_of_sound;
        send_chan.gain_target = wet_decay_compensation(room_gain, distance, decay_distance);
        apply_send_hf_shelf(send_chan, target.air_absorption_gain_hf.max(0.994), device.sample_rate);
    }
}

/// Runs the non-attenuated (multichannel) per-voice update: no distance
/// attenuation, cone, or Doppler — the source's channels are already
/// spatialized (e.g. a B-format or surround recording) and route straight
/// through a fixed per-channel layout, scaled only by listener/source gain.
pub fn update_voice_multichannel(voice: &mut Voice, props: &SourceProps, listener_gain: f32, layout: &[[f32; MAX_OUTPUT_CHANNELS]]) {
    let gain = listener_gain * props.gain;
    voice.set_increment(aural_core::FRACTIONONE);
    for (channel, row) in voice.direct.iter_mut().zip(layout.iter()) {
        let mut targets = *row;
        for t in targets.iter_mut() {
            *t *= gain;
        }
        channel.gains_target = targets;
        channel.filter_type = FilterType::None;
    }
}

/// Builds the fixed per-source-channel routing [`update_voice_multichannel`]
/// needs: source channel `c` routes unity gain to output channel
/// `c % output_channels`, matching the reference mixer's direct
/// channel-order mapping for non-attenuated (already-spatialized) sources.
pub fn fixed_passthrough_layout(source_channels: usize, output_channels: usize) -> Vec<[f32; MAX_OUTPUT_CHANNELS]> {
    (0..source_channels)
        .map(|chan| {
            let mut row = [0.0f32; MAX_OUTPUT_CHANNELS];
            if output_channels > 0 {
                row[chan % output_channels] = 1.0;
            }
            row
        })
        .collect()
}

fn apply_hf_shelf(channel: &mut crate::voice::DirectChannelParams, gain_hf: f32, sample_rate: u32) {
    if gain_hf >= 0.9999 {
        channel.filter_type = FilterType::None;
        return;
    }
    channel.filter_type = FilterType::HighShelf;
    let rcp_q = calc_rcp_q_from_slope(gain_hf, 0.75);
    channel.lowpass.set_params(FilterType::HighShelf, gain_hf, HF_REFERENCE_HZ / sample_rate as f32, rcp_q);
    let _ = LF_REFERENCE_HZ;
}

fn apply_send_hf_shelf(channel: &mut crate::voice::SendChannelParams, gain_hf: f32, sample_rate: u32) {
    if gain_hf >= 0.9999 {
        channel.filter_type = FilterType::None;
        return;
    }
    channel.filter_type = FilterType::HighShelf;
    let rcp_q = calc_rcp_q_from_slope(gain_hf, 0.75);
    channel.lowpass.set_params(FilterType::HighShelf, gain_hf, HF_REFERENCE_HZ / sample_rate as f32, rcp_q);
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = length(v);
    if len > 1e-8 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        v
    }
}

fn angle_between(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dot = (a[0] * b[0] + a[1] * b[1] + a[2] * b[2]).clamp(-1.0, 1.0);
    libm::acosf(dot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aural_core::ResamplerKind;

    fn listener_ctx(orientation: &Orientation) -> ListenerContext<'_> {
        ListenerContext {
            orientation,
            position: [0.0, 0.0, 0.0],
            velocity: [0.0, 0.0, 0.0],
            gain: 1.0,
            meters_per_unit: 1.0,
            distance_model: DistanceModel::Inverse { clamped: true },
            doppler_factor: 1.0,
            speed_of_sound: 343.3,
        }
    }

    fn default_props() -> SourceProps {
        SourceProps {
            pitch: 1.0,
            gain: 1.0,
            inner_cone_angle: std::f32::consts::PI * 2.0,
            outer_cone_angle: std::f32::consts::PI * 2.0,
            outer_gain: 0.0,
            outer_gain_hf: 1.0,
            reference_distance: 1.0,
            max_distance: 1000.0,
            rolloff_factor: 1.0,
            position: [1.0, 0.0, 0.0],
            velocity: [0.0; 3],
            direction: [0.0; 3],
            head_relative: false,
            distance_model: None,
            radius: 0.0,
            stereo_pan: 0.0,
            sends: [crate::source::AuxSend::default(); MAX_SENDS],
        }
    }

    fn no_sends() -> [Option<SendTarget>; MAX_SENDS] {
        Default::default()
    }

    #[test]
    fn farther_source_has_lower_gain() {
        let orientation = Orientation::identity();
        let listener = listener_ctx(&orientation);
        let panning = vec![[1.0, 0.0, 0.0, 0.0]; 1];
        let device = DeviceContext { sample_rate: 44100, buffer_freq: 44100, panning_matrix: &panning };

        let mut near = Voice::new(1, ResamplerKind::Point, PanningMode::Generic);
        update_voice_mono(&mut near, &default_props(), listener, device, &no_sends());

        let mut far_props = default_props();
        far_props.position = [10.0, 0.0, 0.0];
        let mut far = Voice::new(1, ResamplerKind::Point, PanningMode::Generic);
        update_voice_mono(&mut far, &far_props, listener, device, &no_sends());

        assert!(far.direct[0].gains_target[0] < near.direct[0].gains_target[0]);
    }

    #[test]
    fn stereo_pair_routes_left_source_to_left_channel() {
        let orientation = Orientation::identity();
        let listener = listener_ctx(&orientation);
        let panning: Vec<[f32; 4]> = vec![];
        let device = DeviceContext { sample_rate: 44100, buffer_freq: 44100, panning_matrix: &panning };

        let mut props = default_props();
        props.position = [-5.0, 0.0, 0.0];
        let mut voice = Voice::new(1, ResamplerKind::Point, PanningMode::StereoPair);
        update_voice_mono(&mut voice, &props, listener, device, &no_sends());

        assert!(voice.direct[0].gains_target[0] > voice.direct[0].gains_target[1]);
    }

    #[test]
    fn bound_send_gets_a_nonzero_wet_gain_and_unbound_sends_stay_silent() {
        let orientation = Orientation::identity();
        let listener = listener_ctx(&orientation);
        let panning = vec![[1.0, 0.0, 0.0, 0.0]; 1];
        let device = DeviceContext { sample_rate: 44100, buffer_freq: 44100, panning_matrix: &panning };

        let mut voice = Voice::new(1, ResamplerKind::Point, PanningMode::Generic);
        let mut sends = no_sends();
        sends[0] = Some(SendTarget { gain: 1.0, room_rolloff_factor: 1.0, decay_time: 1.49, air_absorption_gain_hf: 0.994 });
        update_voice_mono(&mut voice, &default_props(), listener, device, &sends);

        assert!(voice.sends[0][0].gain_target > 0.0);
        assert_eq!(voice.sends[0][1].gain_target, 0.0);
    }

    #[test]
    fn multichannel_path_skips_doppler_and_uses_fixed_layout() {
        let layout = vec![[1.0; MAX_OUTPUT_CHANNELS]; 1];
        let mut voice = Voice::new(1, ResamplerKind::Point, PanningMode::Generic);
        update_voice_multichannel(&mut voice, &default_props(), 0.5, &layout);
        assert_eq!(voice.direct[0].gains_target[0], 0.5);
    }

    #[test]
    fn fixed_passthrough_layout_routes_each_source_channel_to_its_own_output() {
        let layout = fixed_passthrough_layout(2, 2);
        assert_eq!(layout[0][0], 1.0);
        assert_eq!(layout[0][1], 0.0);
        assert_eq!(layout[1][1], 1.0);
        assert_eq!(layout[1][0], 0.0);
    }

    #[test]
    fn fixed_passthrough_layout_wraps_when_source_has_more_channels_than_output() {
        let layout = fixed_passthrough_layout(3, 2);
        assert_eq!(layout[2][0], 1.0);
    }
}
