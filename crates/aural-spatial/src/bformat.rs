//! B-format (ambisonic) decoder and first-order upsampler.
//!
//! Grounded on the reference's `bformatdec.c`: an all-pass-derived
//! phase-matched band splitter, per-speaker distance-compensation delay
//! lines, and single-band/dual-band decode matrices. The band splitter
//! here is the classic complementary-allpass-pair construction (`lp =
//! (x+ap)/2`, `hp = (x-ap)/2`, both phase-matched since they share one
//! first-order allpass) configured from `bandsplit_init`'s cutoff-angle
//! coefficient; the reference's own per-sample loop body was not available
//! in the retrieval pack beyond its `init`, so this processing loop is a
//! reconstruction from that coefficient and the standard allpass
//! decomposition it implies — recorded as an Open Question decision in
//! DESIGN.md.

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::f32::consts::TAU;
use libm::{cosf, sinf};

use aural_core::{InterpolatedDelay, flush_denormal};

/// Speed of sound in m/s, used to convert a speaker distance difference
/// into a compensation delay in samples.
pub const SPEED_OF_SOUND: f32 = 343.3;

/// Single-pole allpass coefficient plus the complementary low/high band
/// splitter state built from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct BandSplitter {
    coeff: f32,
    z1: f32,
}

impl BandSplitter {
    /// `freq_mult` is the normalized cutoff (`freq / sample_rate`).
    pub fn new(freq_mult: f32) -> Self {
        let w = freq_mult * TAU;
        let cw = cosf(w);
        let coeff = if cw > f32::EPSILON { (sinf(w) - 1.0) / cw } else { cw * -0.5 };
        Self { coeff, z1: 0.0 }
    }

    /// Splits `input` into phase-matched low/high bands: `hp[i] + lp[i] ==
    /// input[i]` for every sample (up to floating-point rounding).
    pub fn process(&mut self, hp_out: &mut [f32], lp_out: &mut [f32], input: &[f32]) {
        for i in 0..input.len() {
            let x = input[i];
            let ap_y = self.coeff * x + self.z1;
            self.z1 = flush_denormal(x - self.coeff * ap_y);

            lp_out[i] = 0.5 * (x + ap_y);
            hp_out[i] = 0.5 * (x - ap_y);
        }
    }
}

/// Per-output-channel decode configuration: its ambisonic weight row(s)
/// and its distance-compensation delay/gain.
struct ChannelConfig {
    enabled: bool,
    single_band: Vec<f32>,
    hf_band: Vec<f32>,
    lf_band: Vec<f32>,
    delay: InterpolatedDelay,
    delay_samples: f32,
    distance_gain: f32,
}

/// Ambisonic decoder configuration passed to [`BformatDecoder::reset`].
pub struct DecoderConfig<'a> {
    pub sample_rate: f32,
    pub dual_band: bool,
    pub band_split_hz: f32,
    /// One entry per output channel: `(enabled, speaker_distance,
    /// single_band_weights, hf_weights, lf_weights)`.
    pub channels: &'a [ChannelSpec],
}

/// Per-output-channel speaker spec fed into [`BformatDecoder::reset`].
pub struct ChannelSpec {
    pub enabled: bool,
    pub speaker_distance: f32,
    pub single_band: Vec<f32>,
    pub hf: Vec<f32>,
    pub lf: Vec<f32>,
}

pub struct BformatDecoder {
    channels: Vec<ChannelConfig>,
    splitters: Vec<BandSplitter>,
    dual_band: bool,
    in_channels: usize,
    distance_compensation: bool,
}

impl BformatDecoder {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
            splitters: Vec::new(),
            dual_band: false,
            in_channels: 4,
            distance_compensation: true,
        }
    }

    /// Reconfigures the decoder for a new ambisonic order / speaker layout.
    pub fn reset(&mut self, conf: &DecoderConfig) {
        self.dual_band = conf.dual_band;
        self.in_channels = conf.channels.first().map_or(4, |c| c.single_band.len().max(c.hf.len()));
        self.splitters = vec![BandSplitter::new(conf.band_split_hz / conf.sample_rate); self.in_channels];

        let max_distance = conf
            .channels
            .iter()
            .filter(|c| c.enabled)
            .map(|c| c.speaker_distance)
            .fold(0.0f32, f32::max);

        self.channels = conf
            .channels
            .iter()
            .map(|spec| {
                let delay_samples = if self.distance_compensation && max_distance > 0.0 {
                    ((max_distance - spec.speaker_distance) * conf.sample_rate / SPEED_OF_SOUND).max(0.0)
                } else {
                    0.0
                };
                let distance_gain = if max_distance > 0.0 {
                    spec.speaker_distance / max_distance
                } else {
                    1.0
                };
                ChannelConfig {
                    enabled: spec.enabled,
                    single_band: spec.single_band.clone(),
                    hf_band: spec.hf.clone(),
                    lf_band: spec.lf.clone(),
                    delay: InterpolatedDelay::from_time(conf.sample_rate, (delay_samples / conf.sample_rate).max(1e-4)),
                    delay_samples,
                    distance_gain,
                }
            })
            .collect();
    }

    /// Decodes `samples` frames of `in_channels`-wide ambisonic input in
    /// `input` (one `&[f32]` per input channel) into `out` (one `&mut
    /// [f32]` per output channel, accumulated additively).
    pub fn process(&mut self, out: &mut [&mut [f32]], input: &[&[f32]], samples: usize) {
        if self.dual_band {
            let mut hf: Vec<Vec<f32>> = vec![vec![0.0; samples]; input.len()];
            let mut lf: Vec<Vec<f32>> = vec![vec![0.0; samples]; input.len()];
            for (c, chan_in) in input.iter().enumerate() {
                self.splitters[c].process(&mut hf[c], &mut lf[c], &chan_in[..samples]);
            }

            for (out_ch, out_buf) in out.iter_mut().enumerate() {
                let cfg = &mut self.channels[out_ch];
                if !cfg.enabled {
                    continue;
                }
                let mut scratch = vec![0.0f32; samples];
                for c in 0..input.len() {
                    let hf_w = cfg.hf_band.get(c).copied().unwrap_or(0.0);
                    let lf_w = cfg.lf_band.get(c).copied().unwrap_or(0.0);
                    for i in 0..samples {
                        scratch[i] += hf[c][i] * hf_w + lf[c][i] * lf_w;
                    }
                }
                apply_delay_and_gain(out_buf, &scratch, &mut cfg.delay, cfg.delay_samples, cfg.distance_gain);
            }
        } else {
            for (out_ch, out_buf) in out.iter_mut().enumerate() {
                let cfg = &mut self.channels[out_ch];
                if !cfg.enabled {
                    continue;
                }
                let mut scratch = vec![0.0f32; samples];
                for (c, chan_in) in input.iter().enumerate() {
                    let w = cfg.single_band.get(c).copied().unwrap_or(0.0);
                    if w == 0.0 {
                        continue;
                    }
                    for i in 0..samples {
                        scratch[i] += chan_in[i] * w;
                    }
                }
                apply_delay_and_gain(out_buf, &scratch, &mut cfg.delay, cfg.delay_samples, cfg.distance_gain);
            }
        }
    }

    /// Converts first-order ambisonic input into this decoder's internal
    /// (possibly higher) order, by band-splitting each first-order channel
    /// then applying a fixed first-order→target gain matrix.
    pub fn upsample(&mut self, out: &mut [Vec<f32>], input: &[&[f32]], samples: usize, upsample_matrix: &[Vec<f32>]) {
        for row in out.iter_mut() {
            row.iter_mut().take(samples).for_each(|s| *s = 0.0);
        }
        for (c, chan_in) in input.iter().enumerate() {
            let mut hf = vec![0.0f32; samples];
            let mut lf = vec![0.0f32; samples];
            if c < self.splitters.len() {
                self.splitters[c].process(&mut hf, &mut lf, &chan_in[..samples]);
            } else {
                lf.copy_from_slice(&chan_in[..samples]);
            }
            for (out_ch, row) in upsample_matrix.iter().enumerate() {
                let w = row.get(c).copied().unwrap_or(0.0);
                if w == 0.0 {
                    continue;
                }
                for i in 0..samples {
                    out[out_ch][i] += (hf[i] + lf[i]) * w;
                }
            }
        }
    }
}

impl Default for BformatDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_delay_and_gain(out: &mut [f32], scratch: &[f32], delay: &mut InterpolatedDelay, delay_samples: f32, gain: f32) {
    for i in 0..scratch.len() {
        let delayed = delay.read_write(scratch[i], delay_samples);
        out[i] += delayed * gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_splitter_bands_sum_to_input() {
        let mut splitter = BandSplitter::new(400.0 / 44100.0);
        let input = [1.0f32, 0.5, -0.3, 0.2, 0.0, -1.0];
        let mut hp = [0.0f32; 6];
        let mut lp = [0.0f32; 6];
        splitter.process(&mut hp, &mut lp, &input);
        for i in 0..6 {
            assert!((hp[i] + lp[i] - input[i]).abs() < 1e-4);
        }
    }

    #[test]
    fn single_band_decode_routes_weighted_sum() {
        let mut dec = BformatDecoder::new();
        let specs = [
            ChannelSpec {
                enabled: true,
                speaker_distance: 1.0,
                single_band: vec![1.0, 0.5],
                hf: vec![],
                lf: vec![],
            },
            ChannelSpec {
                enabled: true,
                speaker_distance: 1.0,
                single_band: vec![1.0, -0.5],
                hf: vec![],
                lf: vec![],
            },
        ];
        let conf = DecoderConfig {
            sample_rate: 44100.0,
            dual_band: false,
            band_split_hz: 400.0,
            channels: &specs,
        };
        dec.reset(&conf);

        let w = [1.0f32; 4];
        let x = [1.0f32; 4];
        let input: [&[f32]; 2] = [&w, &x];
        let mut ch0 = [0.0f32; 4];
        let mut ch1 = [0.0f32; 4];
        {
            let mut out: [&mut [f32]; 2] = [&mut ch0, &mut ch1];
            dec.process(&mut out, &input, 4);
        }
        // Equal speaker distances -> zero compensation delay, unity gain.
        assert!((ch0[3] - 1.5).abs() < 1e-3);
        assert!((ch1[3] - 0.5).abs() < 1e-3);
    }
}
