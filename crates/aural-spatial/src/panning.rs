//! Panning coefficient derivation: ambisonic (B-format) encoding of a
//! source direction, the direct `StereoPair` shortcut, and the spread-angle
//! blend that widens a point source into an extended one.
//!
//! Grounded on spec.md §4.8's panning paragraph: "Build panning
//! coefficients from direction and spread... Route through HRTF (set HRIR
//! coeffs/delay), StereoPair (clamp x to [-½,½] and split between first two
//! channels), or generic panning (ambisonic encode then decode via device's
//! panning gains)."

/// First-order ambisonic (B-format) encoding coefficients: `[W, X, Y, Z]`,
/// ACN-ordered with SN3D-equivalent normalization on the first-order set
/// (`W` carries the standard `1/sqrt(2)` reference gain).
pub type Bformat1 = [f32; 4];

const W_GAIN: f32 = core::f32::consts::FRAC_1_SQRT_2;

/// Encodes a (normalized) direction vector into first-order B-format
/// coefficients, widened by `spread` (radians, `0` = point source, `2*PI`
/// = fully omnidirectional).
///
/// As spread grows the directional (X/Y/Z) terms shrink and energy moves
/// into the omnidirectional `W` term, matching an extended source that
/// subtends a wide angle at the listener losing directional clarity.
pub fn ambisonic_encode(direction: [f32; 3], spread: f32) -> Bformat1 {
    let half_spread = (spread * 0.5).clamp(0.0, core::f32::consts::PI);
    let directional_scale = (half_spread).cos().max(0.0);

    [
        W_GAIN,
        direction[0] * directional_scale,
        direction[1] * directional_scale,
        direction[2] * directional_scale,
    ]
}

/// `StereoPair` shortcut: clamps the direction's x-component to
/// `[-0.5, 0.5]` and splits the source between the first two output
/// channels (left/right), bypassing ambisonic encode/decode entirely.
pub fn stereo_pair_gains(direction_x: f32) -> (f32, f32) {
    let x = direction_x.clamp(-0.5, 0.5);
    // x = -0.5 -> full left, x = 0.5 -> full right, x = 0 -> centered.
    let right = 0.5 + x;
    let left = 1.0 - right;
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_source_has_full_directional_gain() {
        let b = ambisonic_encode([1.0, 0.0, 0.0], 0.0);
        assert!((b[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn fully_spread_source_loses_directionality() {
        let b = ambisonic_encode([1.0, 0.0, 0.0], core::f32::consts::PI * 2.0);
        assert!(b[1].abs() < 1e-5);
        assert!((b[0] - W_GAIN).abs() < 1e-5);
    }

    #[test]
    fn stereo_pair_center_is_equal_power() {
        let (l, r) = stereo_pair_gains(0.0);
        assert!((l - 0.5).abs() < 1e-5);
        assert!((r - 0.5).abs() < 1e-5);
    }

    #[test]
    fn stereo_pair_clamps_beyond_unit_range() {
        let (l, r) = stereo_pair_gains(10.0);
        assert_eq!(l, 0.0);
        assert_eq!(r, 1.0);
    }
}
