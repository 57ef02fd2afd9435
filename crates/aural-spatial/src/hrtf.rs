//! HRTF convolution: per-ear delay, a power-of-two ring buffer for the
//! in-flight convolution accumulator, and a longer history buffer feeding
//! the per-ear delay taps.
//!
//! Grounded near-verbatim on the reference's `MixHrtf` / `MixHrtfBlend` /
//! `MixDirectHrtf` (`mixer_inc.c`): per-sample append to `History`, per-tap
//! accumulation into a ring-buffered `Values[][2]`, emit-then-zero the
//! slot at the current offset.

/// Longest HRIR this convolver supports (spec.md doesn't pin a value;
/// fixed here at a size consistent with a low-latency HRTF set).
pub const IR_LEN: usize = 64;
/// Ring buffer length for the in-flight convolution accumulator; must be a
/// power of two at least `IR_LEN` so `& HRIR_MASK` wraps correctly.
pub const HRIR_LEN: usize = 128;
pub const HRIR_MASK: usize = HRIR_LEN - 1;
/// History ring length, sized to cover the widest per-ear delay plus
/// `IR_LEN`.
pub const HRTF_HISTORY_LEN: usize = 1024;
pub const HRTF_HISTORY_MASK: usize = HRTF_HISTORY_LEN - 1;
/// Cross-fade block length applied at the start of the first mix after an
/// HRIR coefficient-set change.
pub const HRTF_CROSSFADE_LEN: usize = 128;

/// One ear's coefficient set and delay for a given HRIR.
#[derive(Debug, Clone, Copy)]
pub struct HrtfCoeffs {
    pub coeffs: [[f32; 2]; IR_LEN],
    pub delay: [usize; 2],
    pub ir_size: usize,
}

/// Per-voice-channel convolution state: the ring buffer, the input
/// history, and the running sample offset.
#[derive(Clone)]
pub struct HrtfState {
    values: [[f32; 2]; HRIR_LEN],
    history: [f32; HRTF_HISTORY_LEN],
    offset: usize,
}

impl HrtfState {
    pub fn new() -> Self {
        Self {
            values: [[0.0; 2]; HRIR_LEN],
            history: [0.0; HRTF_HISTORY_LEN],
            offset: 0,
        }
    }

    /// Steady-state convolution with a single coefficient set and a
    /// linearly-interpolated gain from `gain` to `gain + gain_step * n`.
    pub fn mix(&mut self, left_out: &mut [f32], right_out: &mut [f32], data: &[f32], coeffs: &HrtfCoeffs, gain: f32, gain_step: f32) -> f32 {
        let mut gain = gain;
        for i in 0..data.len() {
            self.history[self.offset & HRTF_HISTORY_MASK] = data[i];

            let left_in = self.history[self.offset.wrapping_sub(coeffs.delay[0]) & HRTF_HISTORY_MASK] * gain;
            let right_in = self.history[self.offset.wrapping_sub(coeffs.delay[1]) & HRTF_HISTORY_MASK] * gain;

            let tail = (self.offset + coeffs.ir_size - 1) & HRIR_MASK;
            self.values[tail] = [0.0, 0.0];
            self.apply_coeffs(coeffs, left_in, right_in);

            let slot = self.offset & HRIR_MASK;
            left_out[i] += self.values[slot][0];
            right_out[i] += self.values[slot][1];

            gain += gain_step;
            self.offset += 1;
        }
        gain
    }

    /// Cross-fade block: the outgoing coefficient set ramps its gain from
    /// `old_gain` to 0 while the incoming set ramps from 0 toward
    /// `new_gain`, both accumulated into the same ring buffer in the same
    /// pass so the listener hears a single continuous blend rather than
    /// two sequential convolutions.
    pub fn mix_blend(
        &mut self,
        left_out: &mut [f32],
        right_out: &mut [f32],
        data: &[f32],
        old: &HrtfCoeffs,
        new: &HrtfCoeffs,
        old_gain: f32,
        new_gain: f32,
    ) {
        let n = data.len().min(HRTF_CROSSFADE_LEN);
        let old_step = -old_gain / n as f32;
        let new_step = new_gain / n as f32;

        let mut old_g = old_gain;
        let mut new_g = 0.0f32;
        for i in 0..n {
            self.history[self.offset & HRTF_HISTORY_MASK] = data[i];

            let tail = (self.offset + old.ir_size.max(new.ir_size) - 1) & HRIR_MASK;
            self.values[tail] = [0.0, 0.0];

            let old_left = self.history[self.offset.wrapping_sub(old.delay[0]) & HRTF_HISTORY_MASK] * old_g;
            let old_right = self.history[self.offset.wrapping_sub(old.delay[1]) & HRTF_HISTORY_MASK] * old_g;
            self.apply_coeffs(old, old_left, old_right);

            let new_left = self.history[self.offset.wrapping_sub(new.delay[0]) & HRTF_HISTORY_MASK] * new_g;
            let new_right = self.history[self.offset.wrapping_sub(new.delay[1]) & HRTF_HISTORY_MASK] * new_g;
            self.apply_coeffs(new, new_left, new_right);

            let slot = self.offset & HRIR_MASK;
            left_out[i] += self.values[slot][0];
            right_out[i] += self.values[slot][1];

            old_g += old_step;
            new_g += new_step;
            self.offset += 1;
        }
    }

    /// Direct-HRTF mix for already-spatialized (ambisonic decode) input: no
    /// per-ear delay, the same coefficient array applied symmetrically to
    /// both ears.
    pub fn mix_direct(&mut self, left_out: &mut [f32], right_out: &mut [f32], data: &[f32], coeffs: &HrtfCoeffs, gain: f32) {
        for i in 0..data.len() {
            self.offset += 1;
            let sample = data[i] * gain;

            let tail = (self.offset + coeffs.ir_size - 1) & HRIR_MASK;
            self.values[tail] = [0.0, 0.0];
            self.apply_coeffs(coeffs, sample, sample);

            let slot = self.offset & HRIR_MASK;
            left_out[i] += self.values[slot][0];
            right_out[i] += self.values[slot][1];
        }
    }

    fn apply_coeffs(&mut self, coeffs: &HrtfCoeffs, left_in: f32, right_in: f32) {
        for c in 0..coeffs.ir_size {
            let idx = (self.offset + c) & HRIR_MASK;
            self.values[idx][0] += coeffs.coeffs[c][0] * left_in;
            self.values[idx][1] += coeffs.coeffs[c][1] * right_in;
        }
    }
}

impl Default for HrtfState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse_coeffs(ir_size: usize, left_delay: usize, right_delay: usize) -> HrtfCoeffs {
        let mut coeffs = [[0.0; 2]; IR_LEN];
        coeffs[0] = [1.0, 1.0];
        HrtfCoeffs {
            coeffs,
            delay: [left_delay, right_delay],
            ir_size,
        }
    }

    #[test]
    fn direct_impulse_reproduces_coefficient_pair() {
        let mut state = HrtfState::new();
        let c = impulse_coeffs(1, 0, 0);
        let data = [1.0f32];
        let mut left = [0.0f32; 1];
        let mut right = [0.0f32; 1];
        state.mix_direct(&mut left, &mut right, &data, &c, 1.0);
        assert!((left[0] - 1.0).abs() < 1e-6);
        assert!((right[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn per_ear_delay_shifts_output_sample() {
        let mut state = HrtfState::new();
        let c = impulse_coeffs(1, 2, 0);
        let data = [1.0f32, 0.0, 0.0, 0.0];
        let mut left = [0.0f32; 4];
        let mut right = [0.0f32; 4];
        state.mix(&mut left, &mut right, &data, &c, 1.0, 0.0);
        // Left ear reads 2 samples behind the input (longer delay => later
        // response); right ear has zero delay, responds immediately.
        assert!(right[0].abs() > 0.0);
        assert!(left[0].abs() < 1e-6);
        assert!(left[2].abs() > 0.0);
    }

    #[test]
    fn gain_ramps_linearly_across_block() {
        let mut state = HrtfState::new();
        let c = impulse_coeffs(1, 0, 0);
        let data = [1.0f32; 4];
        let mut left = [0.0f32; 4];
        let mut right = [0.0f32; 4];
        let end_gain = state.mix(&mut left, &mut right, &data, &c, 0.0, 0.25);
        assert!((end_gain - 1.0).abs() < 1e-6);
        assert!(left[0].abs() < 1e-6);
        assert!(left[3] > left[1]);
    }
}
