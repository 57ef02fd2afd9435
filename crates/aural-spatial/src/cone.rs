//! Sound cones: directional gain/HF rolloff outside a source's inner cone
//! angle, plus the wet-path cone-area scale and the spread angle a source's
//! radius subtends at the listener.
//!
//! Grounded on spec.md §4.8's cone paragraph.

use libm::asinf;
use core::f32::consts::PI;

/// A source's directional cone: gain and (optionally HF) taper between the
/// inner and outer angles.
#[derive(Debug, Clone, Copy)]
pub struct Cone {
    pub inner_angle: f32,
    pub outer_angle: f32,
    pub outer_gain: f32,
    pub outer_gain_hf: f32,
}

/// Dry-path cone attenuation for the angle (radians) between the source's
/// facing direction and the source→listener vector.
///
/// Returns `(gain_scale, hf_gain_scale)`: both are 1.0 inside the inner
/// cone, interpolate linearly with the angle between inner and outer, and
/// hold at `(outer_gain, outer_gain_hf)` beyond the outer angle.
pub fn cone_gains(cone: Cone, angle: f32) -> (f32, f32) {
    let inner = cone.inner_angle.min(cone.outer_angle);
    let outer = cone.outer_angle.max(cone.inner_angle);

    if angle <= inner {
        return (1.0, 1.0);
    }
    if angle >= outer || outer <= inner {
        return (cone.outer_gain, cone.outer_gain_hf);
    }

    let t = (angle - inner) / (outer - inner);
    (
        1.0 + (cone.outer_gain - 1.0) * t,
        1.0 + (cone.outer_gain_hf - 1.0) * t,
    )
}

/// Wet-path cone attenuation: the reverb send uses the cone's *area*
/// (proportional to `1 - cos(half-angle)`) rather than a linear angle
/// interpolation, since the reflected energy a microphone-like receiver
/// picks up scales with subtended solid angle, not angular distance.
pub fn wet_cone_area_scale(cone: Cone, angle: f32) -> f32 {
    let inner = cone.inner_angle.min(cone.outer_angle);
    let outer = cone.outer_angle.max(cone.inner_angle);

    if angle <= inner {
        return 1.0;
    }
    if angle >= outer || outer <= inner {
        return cone.outer_gain;
    }

    let area = |a: f32| 1.0 - (a * 0.5).cos();
    let t = (area(angle) - area(inner)) / (area(outer) - area(inner)).max(1e-6);
    1.0 + (cone.outer_gain - 1.0) * t
}

/// Angular half-width (radians) a source of `radius` subtends at a point
/// `distance` away, per spec.md §4.8: `2*asin(radius/distance)` when the
/// listener is outside the source's radius, else the complementary wrap
/// `2*pi - pi*distance/radius` (the listener is "inside" the source, so
/// the source fills more than a hemisphere of its own directionality).
pub fn spread_angle(radius: f32, distance: f32) -> f32 {
    if distance > radius && radius > 0.0 {
        2.0 * asinf((radius / distance).min(1.0))
    } else if radius > 0.0 {
        2.0 * PI - PI * distance / radius
    } else {
        0.0
    }
}
