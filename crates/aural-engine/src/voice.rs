//! Per-voice mixer state and the per-block load → resample → filter →
//! mix algorithm, per spec.md §4.7.
//!
//! Grounded on `aural-core`'s resampler/biquad/mixer primitives and
//! `aural-spatial`'s HRTF convolver, orchestrated the way
//! `sonido-core`'s per-file DSP modules are composed by a host rather
//! than folded into one another.

use aural_core::resampler::{FRACTIONMASK, FRACTIONONE, MAX_POST_SAMPLES, MAX_PRE_SAMPLES};
use aural_core::{Biquad, FilterType, Resampler, ResamplerKind, mix_ramped};
use aural_spatial::hrtf::{HrtfCoeffs, HrtfState, IR_LEN};

use crate::source::Source;

/// Largest scratch buffer a single sub-block may fill, per spec.md §4.7.
pub const BUFFERSIZE: usize = 1024;
/// Auxiliary sends per source, per spec.md §6's `ALC_MAX_AUXILIARY_SENDS`.
pub const MAX_SENDS: usize = 4;
/// Device channels a single voice can pan directly into (dry path).
pub const MAX_OUTPUT_CHANNELS: usize = 8;

/// How a voice routes its direct path to the device's real output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanningMode {
    /// Binaural convolution into the device's two real-output channels.
    Hrtf,
    /// Clamp-and-split shortcut between the first two output channels.
    StereoPair,
    /// Ambisonic encode then decode through the device's panning matrix.
    #[default]
    Generic,
}

/// Per-(source-channel) direct-path mix state: the biquad chain, dry
/// gains toward each device channel, and (in HRTF mode) the convolution
/// state.
pub struct DirectChannelParams {
    pub filter_type: FilterType,
    pub lowpass: Biquad,
    pub highpass: Biquad,
    pub gains_current: [f32; MAX_OUTPUT_CHANNELS],
    pub gains_target: [f32; MAX_OUTPUT_CHANNELS],
    pub hrtf: Option<HrtfChannelState>,
}

impl DirectChannelParams {
    fn new() -> Self {
        Self {
            filter_type: FilterType::None,
            lowpass: Biquad::new(),
            highpass: Biquad::new(),
            gains_current: [0.0; MAX_OUTPUT_CHANNELS],
            gains_target: [0.0; MAX_OUTPUT_CHANNELS],
            hrtf: None,
        }
    }

    /// Applies this channel's filter chain in place. "None" is a
    /// passthrough (advances biquad history without changing samples);
    /// "BandPass" chains low then high through `scratch`.
    fn apply_filter(&mut self, dst: &mut [f32], scratch: &mut [f32]) {
        match self.filter_type {
            FilterType::None => self.lowpass.passthrough(dst),
            FilterType::LowPass | FilterType::LowShelf | FilterType::HighShelf | FilterType::Peaking => {
                self.lowpass.process(scratch, dst)
            }
            FilterType::HighPass => self.highpass.process(scratch, dst),
            FilterType::BandPass => {
                self.lowpass.process(scratch, dst);
                self.highpass.process(scratch, scratch.to_vec().as_slice());
            }
        }
        if !matches!(self.filter_type, FilterType::None) {
            dst.copy_from_slice(&scratch[..dst.len()]);
        }
    }
}

/// Per-channel HRTF convolution state: current/target coefficient sets
/// and the cross-fade gain pair spec.md §4.5 describes.
pub struct HrtfChannelState {
    pub conv: HrtfState,
    pub current: HrtfCoeffs,
    pub target: HrtfCoeffs,
    pub current_gain: f32,
    pub target_gain: f32,
    pub needs_crossfade: bool,
}

impl HrtfChannelState {
    pub fn new() -> Self {
        let silent = HrtfCoeffs {
            coeffs: [[0.0; 2]; IR_LEN],
            delay: [0, 0],
            ir_size: 0,
        };
        Self {
            conv: HrtfState::new(),
            current: silent,
            target: silent,
            current_gain: 0.0,
            target_gain: 0.0,
            needs_crossfade: false,
        }
    }
}

/// Per-(source-channel, send) wet-path mix state.
pub struct SendChannelParams {
    pub filter_type: FilterType,
    pub lowpass: Biquad,
    pub highpass: Biquad,
    pub gain_current: f32,
    pub gain_target: f32,
}

impl SendChannelParams {
    fn new() -> Self {
        Self {
            filter_type: FilterType::None,
            lowpass: Biquad::new(),
            highpass: Biquad::new(),
            gain_current: 0.0,
            gain_target: 0.0,
        }
    }
}

/// Mixer-private per-voice state. Allocated lazily when a source enters
/// PLAYING, reclaimed when it leaves PLAYING/PAUSED.
pub struct Voice {
    source_channels: usize,
    frac: u32,
    increment: u32,
    resampler: Resampler,
    history: Vec<[f32; MAX_PRE_SAMPLES]>,
    pub direct: Vec<DirectChannelParams>,
    pub sends: Vec<Vec<SendChannelParams>>,
    pub panning_mode: PanningMode,
    pub is_hrtf: bool,
    moving: bool,
}

impl Voice {
    pub fn new(source_channels: usize, resampler_kind: ResamplerKind, panning_mode: PanningMode) -> Self {
        let is_hrtf = panning_mode == PanningMode::Hrtf;
        let direct = (0..source_channels)
            .map(|_| {
                let mut p = DirectChannelParams::new();
                if is_hrtf {
                    p.hrtf = Some(HrtfChannelState::new());
                }
                p
            })
            .collect();
        let sends = (0..source_channels).map(|_| (0..MAX_SENDS).map(|_| SendChannelParams::new()).collect()).collect();
        Self {
            source_channels,
            frac: 0,
            increment: FRACTIONONE,
            resampler: Resampler::new(resampler_kind),
            history: vec![[0.0; MAX_PRE_SAMPLES]; source_channels],
            direct,
            sends,
            panning_mode,
            is_hrtf,
            moving: false,
        }
    }

    pub fn set_increment(&mut self, increment: u32) {
        self.increment = increment.max(1);
    }

    pub fn moving(&self) -> bool {
        self.moving
    }

    pub fn channel_count(&self) -> usize {
        self.source_channels
    }

    /// Loads `needed` output frames worth of source audio from `source`,
    /// resamples, filters, and mixes into `dry_out` (and, if routed
    /// through HRTF, `real_out`), plus any active sends. Returns `false`
    /// once the source's queue is exhausted and it isn't looping (the
    /// caller should stop the voice).
    #[allow(clippy::too_many_arguments)]
    pub fn process_block(
        &mut self,
        source: &mut Source,
        dry_out: &mut [&mut [f32]],
        real_out: Option<(&mut [f32], &mut [f32])>,
        send_outs: &mut [Option<&mut [f32]>],
        frames_needed: usize,
    ) -> bool {
        let mut real_out = real_out;
        let mut out_pos = 0usize;
        let mut still_playing = true;

        while out_pos < frames_needed && still_playing {
            let needed = frames_needed - out_pos;

            let src_buffer_size = {
                let numerator = u64::from(needed as u32) * u64::from(self.increment) + u64::from(self.frac) + u64::from(FRACTIONMASK);
                let n = (numerator / u64::from(FRACTIONONE)) as usize;
                (n + MAX_PRE_SAMPLES + MAX_POST_SAMPLES).min(BUFFERSIZE)
            };
            let avail_src = src_buffer_size.saturating_sub(MAX_PRE_SAMPLES + MAX_POST_SAMPLES).max(1);
            let dst_buffer_size = {
                let numerator = (avail_src as u64) * u64::from(FRACTIONONE);
                let numerator = numerator.saturating_sub(u64::from(self.frac));
                let d = (numerator / u64::from(self.increment)) as usize;
                let mut d = d.min(needed).max(1);
                if d > 4 && d < needed {
                    d -= d % 4;
                }
                d
            };

            // The number of whole source samples `dst_buffer_size` destination
            // samples actually consumes, at this sub-block's frac/increment.
            // `dst_buffer_size` is rounded down from the amount `avail_src` was
            // sized for, so this is usually <= avail_src: pulling a full
            // `avail_src` worth of fresh samples from `source` regardless would
            // permanently skip the left-over tail next sub-block, since
            // `source`'s read position only moves forward by what it's asked to
            // fill. Read exactly `advance` fresh samples instead.
            let (new_frac, advance) = {
                let total = u64::from(self.frac) + u64::from(self.increment) * dst_buffer_size as u64;
                let advance = (total / u64::from(FRACTIONONE)) as usize;
                let new_frac = (total % u64::from(FRACTIONONE)) as u32;
                (new_frac, advance.max(1))
            };
            let fill_target = (MAX_PRE_SAMPLES + advance).min(src_buffer_size - MAX_POST_SAMPLES);

            for chan in 0..self.source_channels {
                let mut scratch = vec![0.0f32; src_buffer_size];
                scratch[..MAX_PRE_SAMPLES].copy_from_slice(&self.history[chan]);

                let mut filled = MAX_PRE_SAMPLES;
                while filled < fill_target {
                    let n = source.read_into(chan, &mut scratch[filled..fill_target]);
                    filled += n;
                    if n == 0 {
                        if !source.advance_queue() {
                            still_playing = false;
                            break;
                        }
                    }
                }

                // Carry the last MAX_PRE_SAMPLES real samples forward as history for
                // the next sub-block's resample window; zero-pad the front until enough
                // real samples have accumulated.
                let real_end = filled.min(fill_target);
                let take = real_end.min(MAX_PRE_SAMPLES);
                let mut new_history = [0.0f32; MAX_PRE_SAMPLES];
                new_history[MAX_PRE_SAMPLES - take..].copy_from_slice(&scratch[real_end - take..real_end]);
                self.history[chan] = new_history;

                let mut resampled = vec![0.0f32; dst_buffer_size];
                self.resampler.resample(&scratch, self.frac, self.increment, &mut resampled);

                let channel = &mut self.direct[chan];
                let mut filter_scratch = vec![0.0f32; dst_buffer_size];
                channel.apply_filter(&mut resampled, &mut filter_scratch);

                match self.panning_mode {
                    PanningMode::Hrtf => {
                        if let (Some(hrtf_state), Some((left, right))) = (channel.hrtf.as_mut(), real_out.as_mut()) {
                            let left_slice = &mut left[out_pos..out_pos + dst_buffer_size];
                            let right_slice = &mut right[out_pos..out_pos + dst_buffer_size];
                            if hrtf_state.needs_crossfade {
                                hrtf_state.conv.mix_blend(
                                    left_slice,
                                    right_slice,
                                    &resampled,
                                    &hrtf_state.current,
                                    &hrtf_state.target,
                                    hrtf_state.current_gain,
                                    hrtf_state.target_gain,
                                );
                                hrtf_state.current = hrtf_state.target;
                                hrtf_state.current_gain = hrtf_state.target_gain;
                                hrtf_state.needs_crossfade = false;
                            } else {
                                let step = (hrtf_state.target_gain - hrtf_state.current_gain) / dst_buffer_size.max(1) as f32;
                                hrtf_state.current_gain =
                                    hrtf_state.conv.mix(left_slice, right_slice, &resampled, &hrtf_state.current, hrtf_state.current_gain, step);
                            }
                        }
                    }
                    PanningMode::StereoPair | PanningMode::Generic => {
                        let counter = if self.moving { dst_buffer_size } else { 0 };
                        let mut out_refs: Vec<&mut [f32]> = dry_out.iter_mut().map(|b| &mut b[out_pos..out_pos + dst_buffer_size]).collect();
                        mix_ramped(&resampled, &mut out_refs, &mut channel.gains_current, &channel.gains_target, counter, 0);
                    }
                }

                for send_idx in 0..MAX_SENDS {
                    let Some(Some(send_out)) = send_outs.get_mut(send_idx) else { continue };
                    let send = &mut self.sends[chan][send_idx];
                    if send.gain_target < aural_core::SILENCE_THRESHOLD && send.gain_current < aural_core::SILENCE_THRESHOLD {
                        continue;
                    }
                    let mut wet = resampled.clone();
                    let mut wet_scratch = vec![0.0f32; dst_buffer_size];
                    match send.filter_type {
                        FilterType::None => send.lowpass.passthrough(&wet),
                        _ => {
                            send.lowpass.process(&mut wet_scratch, &wet);
                            wet.copy_from_slice(&wet_scratch);
                        }
                    }
                    let counter = if self.moving { dst_buffer_size } else { 0 };
                    let mut current = [send.gain_current];
                    let target = [send.gain_target];
                    let mut out_ref: [&mut [f32]; 1] = [&mut send_out[out_pos..out_pos + dst_buffer_size]];
                    mix_ramped(&wet, &mut out_ref, &mut current, &target, counter, 0);
                    send.gain_current = current[0];
                }
            }

            self.frac = new_frac;

            self.moving = true;
            out_pos += dst_buffer_size;

            if !still_playing {
                break;
            }
        }

        still_playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aural_core::SampleFormat;
    use crate::buffer::Buffer;

    fn sine_source(len: usize) -> Source {
        let samples: Vec<f32> = (0..len).map(|i| (i as f32 * 0.1).sin()).collect();
        let buf = Buffer::new(44100, SampleFormat::F32, vec![samples], 0, len).unwrap();
        let mut src = Source::new();
        src.queue_buffers([buf]).unwrap();
        src
    }

    #[test]
    fn identity_resample_reproduces_input_through_generic_panning() {
        let mut voice = Voice::new(1, ResamplerKind::Point, PanningMode::Generic);
        voice.direct[0].gains_target = {
            let mut g = [0.0; MAX_OUTPUT_CHANNELS];
            g[0] = 1.0;
            g
        };
        voice.direct[0].gains_current = voice.direct[0].gains_target;
        voice.moving = true;

        let mut source = sine_source(64);
        let mut ch0 = vec![0.0f32; 32];
        let mut sends: [Option<&mut [f32]>; 0] = [];
        {
            let mut dry: [&mut [f32]; 1] = [&mut ch0];
            let still_playing = voice.process_block(&mut source, &mut dry, None, &mut sends, 32);
            assert!(still_playing);
        }
        assert!(ch0.iter().any(|&s| s.abs() > 0.0));
    }

    #[test]
    fn voice_stops_when_queue_exhausted_without_looping() {
        let mut voice = Voice::new(1, ResamplerKind::Point, PanningMode::Generic);
        voice.moving = true;
        let mut source = sine_source(8);
        let mut ch0 = vec![0.0f32; 64];
        let mut sends: [Option<&mut [f32]>; 0] = [];
        let mut dry: [&mut [f32]; 1] = [&mut ch0];
        let still_playing = voice.process_block(&mut source, &mut dry, None, &mut sends, 64);
        assert!(!still_playing);
    }
}
