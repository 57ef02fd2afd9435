//! The device render loop: per spec.md §4.9/§9, one call per output
//! block runs every context's parameter updates, mixes every playing
//! voice, processes every effect slot's wet buffer, and leaves the
//! device's `real_out` buffers ready for format conversion.

use std::collections::HashMap;

use crate::context::Context;
use crate::device::Device;
use crate::params::{self, DeviceContext, ListenerContext, SendTarget};
use crate::source::SourceState;
use crate::voice::{MAX_SENDS, PanningMode, Voice};

/// Runs one render block. `frames` must not exceed `device.update_size`.
/// Stopped voices are retired (freeing their `Voice` slot) in the same
/// pass that drains them, matching the reference mixer's
/// "detect end-of-data, then deallocate" ordering.
pub fn render_block(device: &mut Device, frames: usize) {
    device.clear_buffers();

    let sample_rate = device.sample_rate;
    let panning_matrix = device.panning_matrix.clone();

    for context in &mut device.contexts {
        run_context(context, sample_rate, &panning_matrix, &mut device.mix_buffers.real_out, frames);
    }
}

fn run_context(context: &mut Context, sample_rate: u32, panning_matrix: &[[f32; 4]], real_out: &mut [Vec<f32>], frames: usize) {
    // Per spec.md's deferred-update semantics: while updates are held, the
    // mailboxes keep whatever was last published, untouched, so a later
    // `resume_updates` sees the full batch land on the next render together.
    let held = context.updates_held();

    let listener_changed = if held { false } else { context.listener_slot.update() };

    if !held {
        for slot in &mut context.effect_slots {
            slot.value.update();
        }

        for idx in 0..context.sources.len() {
            if !context.sources[idx].in_use {
                continue;
            }
            let Some(update) = context.sources[idx].value.take_update() else {
                if !listener_changed {
                    continue;
                }
                refresh_voice(context, idx, sample_rate, panning_matrix);
                continue;
            };
            let props = *update;
            context.sources[idx].value.recycle(props);
            apply_voice_update(context, idx, &props, sample_rate, panning_matrix);
        }
    }

    for slot in &mut context.effect_slots {
        if slot.in_use {
            slot.value.clear_wet_buffer();
        }
    }

    let mut finished = Vec::new();
    for idx in 0..context.sources.len() {
        if !context.sources[idx].in_use || context.sources[idx].value.state() != SourceState::Playing {
            continue;
        }
        let Some(voice) = context.voices[idx].as_mut() else { continue };

        let mut dry_refs: Vec<&mut [f32]> = real_out.iter_mut().map(|ch| &mut ch[..frames]).collect();
        let wanted: Vec<usize> = context.sources[idx]
            .value
            .sends
            .iter()
            .filter_map(|send| send.slot)
            .filter(|&slot_idx| context.effect_slots.get(slot_idx).is_some_and(|s| s.in_use))
            .collect();
        let mut wet_by_slot: HashMap<usize, &mut [f32]> = context
            .effect_slots
            .iter_mut()
            .enumerate()
            .filter(|(slot_idx, _)| wanted.contains(slot_idx))
            .map(|(slot_idx, slot)| (slot_idx, &mut slot.value.wet_buffer[..frames]))
            .collect();
        let mut sends: [Option<&mut [f32]>; MAX_SENDS] = Default::default();
        for (send_idx, send) in context.sources[idx].value.sends.iter().enumerate() {
            if let Some(slot_idx) = send.slot {
                sends[send_idx] = wet_by_slot.remove(&slot_idx);
            }
        }

        let still_playing = voice.process_block(&mut context.sources[idx].value, &mut dry_refs, None, &mut sends, frames);

        if !still_playing {
            finished.push(idx);
        }
    }

    for idx in finished {
        context.sources[idx].value.stop_from_mixer();
        context.voices[idx] = None;
    }

    for slot in &mut context.effect_slots {
        if !slot.in_use {
            continue;
        }
        let mut out_refs: Vec<&mut [f32]> = real_out.iter_mut().map(|ch| &mut ch[..frames]).collect();
        slot.value.state.process(&slot.value.wet_buffer[..frames], &mut out_refs);
    }
}

fn apply_voice_update(context: &mut Context, idx: usize, props: &crate::source::SourceProps, sample_rate: u32, panning_matrix: &[[f32; 4]]) {
    if context.voices[idx].is_none() {
        let channels = context.sources[idx].value.current_buffer().map_or(1, |b| b.channels() as usize).max(1);
        context.voices[idx] = Some(Voice::new(channels, aural_core::ResamplerKind::Linear, PanningMode::Generic));
    }
    refresh_voice_with(context, idx, props, sample_rate, panning_matrix);
}

fn refresh_voice(context: &mut Context, idx: usize, sample_rate: u32, panning_matrix: &[[f32; 4]]) {
    let props = context.sources[idx].value.snapshot();
    refresh_voice_with(context, idx, &props, sample_rate, panning_matrix);
}

fn refresh_voice_with(context: &mut Context, idx: usize, props: &crate::source::SourceProps, sample_rate: u32, panning_matrix: &[[f32; 4]]) {
    let orientation = context.listener_slot.params.orientation;
    let listener = ListenerContext {
        orientation: &orientation,
        position: context.listener_slot.params.position,
        velocity: context.listener_slot.params.velocity,
        gain: context.listener_slot.params.gain,
        meters_per_unit: context.listener_slot.params.meters_per_unit,
        distance_model: context.distance_model,
        doppler_factor: context.doppler_factor,
        speed_of_sound: context.speed_of_sound,
    };
    let buffer_freq = context.sources[idx].value.current_buffer().map_or(sample_rate, |b| b.frequency());
    let device = DeviceContext { sample_rate, buffer_freq, panning_matrix };
    let send_targets = resolve_send_targets(context, props);
    let Some(voice) = context.voices[idx].as_mut() else { return };
    if voice.channel_count() > 1 {
        // Already-spatialized multichannel content (e.g. a surround or
        // B-format recording) skips distance/cone/Doppler entirely and
        // routes through a fixed per-channel layout, per spec.md §4.8's
        // non-attenuated path.
        let layout = params::fixed_passthrough_layout(voice.channel_count(), panning_matrix.len());
        params::update_voice_multichannel(voice, props, listener.gain, &layout);
    } else {
        params::update_voice_mono(voice, props, listener, device, &send_targets);
    }
}

/// Turns a source's [`crate::source::AuxSend`] bindings into the resolved
/// per-send parameters the panning/gain update needs, by looking each bound
/// slot index up in the context's effect-slot pool. An unbound send, or one
/// pointing at a freed slot, resolves to `None`.
fn resolve_send_targets(context: &Context, props: &crate::source::SourceProps) -> [Option<SendTarget>; MAX_SENDS] {
    let mut targets: [Option<SendTarget>; MAX_SENDS] = Default::default();
    for (send_idx, send) in props.sends.iter().enumerate() {
        let Some(slot_idx) = send.slot else { continue };
        let Some(slot) = context.effect_slots.get(slot_idx).filter(|s| s.in_use) else { continue };
        targets[send_idx] = Some(SendTarget {
            gain: slot.value.props.gain,
            room_rolloff_factor: slot.value.props.room_rolloff_factor,
            decay_time: slot.value.props.decay_time,
            air_absorption_gain_hf: slot.value.props.air_absorption_gain_hf,
        });
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, BackendError, ClockLatency};
    use crate::buffer::Buffer;
    use crate::device::{Device, OutputMode};
    use aural_core::SampleFormat;

    #[derive(Default)]
    struct SilentBackend;
    impl Backend for SilentBackend {
        fn open(&mut self, _: Option<&str>, _: u32, _: u16) -> Result<(), BackendError> {
            Ok(())
        }
        fn close(&mut self) -> Result<(), BackendError> {
            Ok(())
        }
        fn reset(&mut self, _: u32, _: u16) -> Result<(), BackendError> {
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
    fn silence_in_silence_out() {
        let mut device = Device::new(Box::new(SilentBackend), 44100, 64, OutputMode::Stereo);
        device.add_context(4, 0);
        render_block(&mut device, 64);
        for ch in &device.mix_buffers.real_out {
            assert!(ch.iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn stereo_source_routes_through_multichannel_path_without_panning() {
        let mut device = Device::new(Box::new(SilentBackend), 44100, 64, OutputMode::Stereo);
        let ctx_idx = device.add_context(4, 0);
        let ctx = &mut device.contexts[ctx_idx];
        let src_idx = ctx.gen_source().unwrap();
        let left: Vec<f32> = (0..256).map(|i| (i as f32 * 0.05).sin()).collect();
        let right: Vec<f32> = vec![0.0; 256];
        let buf = Buffer::new(44100, SampleFormat::F32, vec![left, right], 0, 256).unwrap();
        {
            let source = ctx.source_mut(src_idx).unwrap();
            source.queue_buffers([buf]).unwrap();
            source.play(0);
            source.publish();
        }
        render_block(&mut device, 64);
        assert!(device.mix_buffers.real_out[0].iter().any(|&s| s.abs() > 0.0));
        assert!(device.mix_buffers.real_out[1].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn playing_source_produces_nonsilent_output_and_retires_on_exhaustion() {
        let mut device = Device::new(Box::new(SilentBackend), 44100, 64, OutputMode::Stereo);
        let ctx_idx = device.add_context(4, 0);
        let ctx = &mut device.contexts[ctx_idx];
        let src_idx = ctx.gen_source().unwrap();
        let samples: Vec<f32> = (0..256).map(|i| (i as f32 * 0.05).sin()).collect();
        let buf = Buffer::new(44100, SampleFormat::F32, vec![samples], 0, 256).unwrap();
        {
            let source = ctx.source_mut(src_idx).unwrap();
            source.queue_buffers([buf]).unwrap();
            source.position = [0.0, 0.0, -1.0];
            source.play(0);
            source.publish();
        }
        render_block(&mut device, 64);
        let any_nonzero = device.mix_buffers.real_out.iter().any(|ch| ch.iter().any(|&s| s.abs() > 0.0));
        assert!(any_nonzero);
    }

    #[test]
    fn suspended_context_ignores_updates_until_resumed() {
        let mut device = Device::new(Box::new(SilentBackend), 44100, 64, OutputMode::Stereo);
        let ctx_idx = device.add_context(4, 0);
        let ctx = &mut device.contexts[ctx_idx];
        let src_idx = ctx.gen_source().unwrap();
        let samples: Vec<f32> = (0..256).map(|i| (i as f32 * 0.05).sin()).collect();
        let buf = Buffer::new(44100, SampleFormat::F32, vec![samples], 0, 256).unwrap();
        {
            let source = ctx.source_mut(src_idx).unwrap();
            source.queue_buffers([buf]).unwrap();
            source.position = [0.0, 0.0, -1.0];
            source.publish();
        }
        ctx.suspend_updates();
        {
            let source = ctx.source_mut(src_idx).unwrap();
            source.play(0);
            source.publish();
        }
        render_block(&mut device, 64);
        for ch in &device.mix_buffers.real_out {
            assert!(ch.iter().all(|&s| s == 0.0));
        }

        device.contexts[ctx_idx].resume_updates();
        render_block(&mut device, 64);
        let any_nonzero = device.mix_buffers.real_out.iter().any(|ch| ch.iter().any(|&s| s.abs() > 0.0));
        assert!(any_nonzero);
    }

    #[test]
    fn source_bound_to_an_effect_slot_produces_wet_output() {
        let mut device = Device::new(Box::new(SilentBackend), 44100, 64, OutputMode::Stereo);
        let ctx_idx = device.add_context(4, 1);
        let ctx = &mut device.contexts[ctx_idx];
        let slot_idx = ctx.gen_effect_slot(64).unwrap();
        let src_idx = ctx.gen_source().unwrap();
        let samples: Vec<f32> = (0..256).map(|i| (i as f32 * 0.05).sin()).collect();
        let buf = Buffer::new(44100, SampleFormat::F32, vec![samples], 0, 256).unwrap();
        {
            let source = ctx.source_mut(src_idx).unwrap();
            source.queue_buffers([buf]).unwrap();
            source.position = [0.0, 0.0, -1.0];
            source.set_aux_send(0, Some(slot_idx), 1.0).unwrap();
            source.play(0);
            source.publish();
        }
        render_block(&mut device, 64);
        let slot = device.contexts[ctx_idx].effect_slot(slot_idx).unwrap();
        assert!(slot.wet_buffer.iter().any(|&s| s.abs() > 0.0));
    }
}
