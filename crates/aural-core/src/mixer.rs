//! The mix kernel: per-channel gain-ramped accumulation into an output
//! buffer, plus the non-ramped matrix-row variant used for ambisonic panning
//! and B-format decode matrices.
//!
//! Grounded directly on the reference mixer's `Mix_C` / `MixRow_C`: this is
//! the one piece of the whole system transcribed near-verbatim, since the
//! spec pins the exact per-sample arithmetic as a testable property.

/// Below this magnitude a channel's gain is treated as inaudible and the
/// mixer skips writing to it entirely (same order of magnitude as the
/// reference mixer's `GAIN_SILENCE_THRESHOLD`, -100 dB).
pub const SILENCE_THRESHOLD: f32 = 0.00001;

/// Mixes `src` into every output channel in `out`, ramping each channel's
/// gain from `current[c]` toward `target[c]` over the first
/// `min(n, counter)` samples, then holding `target[c]` steady.
///
/// * `out[c]` is an output channel slice at least `out_pos + n` long; the
///   mixer reads/writes `out[c][out_pos..out_pos+n]`.
/// * `current` is updated in place to reflect the gain each channel ends
///   this call at, so the next call ramps from where this one left off.
/// * `counter` is the number of samples over which the ramp from `current`
///   to `target` should complete; `counter == 0` means "no ramp, use
///   `target` as a steady gain immediately".
pub fn mix_ramped(
    src: &[f32],
    out: &mut [&mut [f32]],
    current: &mut [f32],
    target: &[f32],
    counter: usize,
    out_pos: usize,
) {
    let n = src.len();
    let delta = if counter > 0 { 1.0 / counter as f32 } else { 0.0 };

    for c in 0..out.len() {
        let mut gain = current[c];
        let step = (target[c] - gain) * delta;
        let mut pos = 0usize;

        if step.abs() > f32::EPSILON {
            let min_size = n.min(counter);
            while pos < min_size {
                out[c][out_pos + pos] += src[pos] * gain;
                gain += step;
                pos += 1;
            }
            if pos == counter {
                gain = target[c];
            }
            current[c] = gain;
        }

        if gain.abs() <= SILENCE_THRESHOLD {
            continue;
        }
        while pos < n {
            out[c][out_pos + pos] += src[pos] * gain;
            pos += 1;
        }
    }
}

/// Applies a precomputed, non-ramped gain row: `out[i] += Σ_c gains[c] *
/// in_buffers[c][in_pos+i]`, skipping input channels whose gain is below
/// [`SILENCE_THRESHOLD`]. Used for ambisonic decode and the generic panning
/// matrix, where the gain set is already steady for the block.
pub fn mix_row(out: &mut [f32], gains: &[f32], in_buffers: &[&[f32]], in_pos: usize) {
    for (c, &gain) in gains.iter().enumerate() {
        if gain.abs() <= SILENCE_THRESHOLD {
            continue;
        }
        let src = &in_buffers[c][in_pos..in_pos + out.len()];
        for (o, &i) in out.iter_mut().zip(src.iter()) {
            *o += i * gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_reaches_target_when_n_covers_counter() {
        let src = [1.0f32; 8];
        let mut ch0 = [0.0f32; 8];
        let mut current = [0.0f32];
        let target = [1.0f32];
        {
            let mut out: [&mut [f32]; 1] = [&mut ch0];
            mix_ramped(&src, &mut out, &mut current, &target, 4, 0);
        }
        // Ramp over first 4 samples: 0, 0.25, 0.5, 0.75, then steady 1.0.
        assert!((ch0[0] - 0.0).abs() < 1e-6);
        assert!((ch0[3] - 0.75).abs() < 1e-6);
        assert!((ch0[4] - 1.0).abs() < 1e-6);
        assert_eq!(current[0], 1.0);
    }

    #[test]
    fn steady_gain_used_when_counter_zero() {
        let src = [2.0f32; 4];
        let mut ch0 = [0.0f32; 4];
        let mut current = [0.5f32];
        let target = [0.5f32];
        {
            let mut out: [&mut [f32]; 1] = [&mut ch0];
            mix_ramped(&src, &mut out, &mut current, &target, 0, 0);
        }
        assert_eq!(ch0, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn silent_gain_is_skipped() {
        let src = [1.0f32; 4];
        let mut ch0 = [5.0f32; 4];
        let mut current = [0.0f32];
        let target = [0.0f32];
        {
            let mut out: [&mut [f32]; 1] = [&mut ch0];
            mix_ramped(&src, &mut out, &mut current, &target, 0, 0);
        }
        assert_eq!(ch0, [5.0, 5.0, 5.0, 5.0]);
    }

    #[test]
    fn mix_row_skips_silent_channels() {
        let in0 = [1.0f32; 4];
        let in1 = [1.0f32; 4];
        let bufs: [&[f32]; 2] = [&in0, &in1];
        let gains = [1.0f32, 0.0];
        let mut out = [0.0f32; 4];
        mix_row(&mut out, &gains, &bufs, 0);
        assert_eq!(out, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn mix_row_accumulates_into_existing_output() {
        let in0 = [1.0f32; 2];
        let bufs: [&[f32]; 1] = [&in0];
        let gains = [2.0f32];
        let mut out = [10.0f32; 2];
        mix_row(&mut out, &gains, &bufs, 0);
        assert_eq!(out, [12.0, 12.0]);
    }
}
