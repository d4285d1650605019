//! Warps from the unit square to directions and discrete choices.
//!
//! Every routine is a pure function of its uniform inputs so that
//! low-discrepancy points flow through unchanged.

use crate::shading::{safe_sqrt, sqr};
use crate::{Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

pub const INV_PI: f32 = 1.0 / PI;
pub const INV_4PI: f32 = 1.0 / (4.0 * PI);

/// Polar mapping onto the unit disk.
pub fn sample_uniform_disk_polar(u: Vec2) -> Vec2 {
    let r = u.x.sqrt();
    let theta = TAU * u.y;
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Shirley-Chiu concentric mapping onto the unit disk.
pub fn sample_uniform_disk_concentric(u: Vec2) -> Vec2 {
    let offset = 2.0 * u - Vec2::ONE;
    if offset.x == 0.0 && offset.y == 0.0 {
        return Vec2::ZERO;
    }
    let (r, theta) = if offset.x.abs() > offset.y.abs() {
        (offset.x, FRAC_PI_4 * (offset.y / offset.x))
    } else {
        (offset.y, FRAC_PI_2 - FRAC_PI_4 * (offset.x / offset.y))
    };
    r * Vec2::new(theta.cos(), theta.sin())
}

/// Cosine-weighted direction about +Z.
pub fn sample_cosine_hemisphere(u: Vec2) -> Vec3 {
    let d = sample_uniform_disk_concentric(u);
    let z = safe_sqrt(1.0 - d.x * d.x - d.y * d.y);
    Vec3::new(d.x, d.y, z)
}

#[inline]
pub fn cosine_hemisphere_pdf(cos_theta: f32) -> f32 {
    cos_theta * INV_PI
}

pub fn sample_uniform_sphere(u: Vec2) -> Vec3 {
    let z = 1.0 - 2.0 * u.x;
    let r = safe_sqrt(1.0 - z * z);
    let phi = TAU * u.y;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

#[inline]
pub fn uniform_sphere_pdf() -> f32 {
    INV_4PI
}

pub fn sample_uniform_hemisphere(u: Vec2) -> Vec3 {
    let z = u.x;
    let r = safe_sqrt(1.0 - z * z);
    let phi = TAU * u.y;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

#[inline]
pub fn uniform_hemisphere_pdf() -> f32 {
    1.0 / TAU
}

/// Direction inside the cone subtended by a sphere of `radius` seen from
/// `distance_squared` away, about +Z.
pub fn sample_cone_to_sphere(radius: f32, distance_squared: f32, u: Vec2) -> Vec3 {
    let cos_theta_max = safe_sqrt(1.0 - radius * radius / distance_squared);
    let z = 1.0 + u.x * (cos_theta_max - 1.0);
    let phi = TAU * u.y;
    let r = safe_sqrt(1.0 - z * z);
    Vec3::new(phi.cos() * r, phi.sin() * r, z)
}

/// Picks an index proportionally to `weights`.
///
/// Returns `(index, pmf, u_remapped)` where `u_remapped` is `u` rescaled to
/// `[0, 1)` inside the chosen bucket so it can drive a second decision.
/// `None` when every weight is zero.
pub fn sample_discrete(weights: &[f32], u: f32) -> Option<(usize, f32, f32)> {
    let sum: f32 = weights.iter().sum();
    if weights.is_empty() || sum <= 0.0 {
        return None;
    }

    let up = u * sum;
    let up = if up == sum { next_float_down(up) } else { up };

    let mut running = 0.0;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        last_positive = i;
        if up < running + w {
            let remapped = ((up - running) / w).min(ONE_MINUS_EPSILON);
            return Some((i, w / sum, remapped));
        }
        running += w;
    }

    // Rounding pushed `up` past the last bucket.
    let w = weights[last_positive];
    Some((last_positive, w / sum, ONE_MINUS_EPSILON))
}

pub const ONE_MINUS_EPSILON: f32 = 1.0 - f32::EPSILON / 2.0;

fn next_float_down(x: f32) -> f32 {
    if x > 0.0 {
        f32::from_bits(x.to_bits() - 1)
    } else {
        x
    }
}

#[inline]
pub fn logistic(x: f32, s: f32) -> f32 {
    let x = x.abs();
    (-x / s).exp() / (s * sqr(1.0 + (-x / s).exp()))
}

#[inline]
pub fn logistic_cdf(x: f32, s: f32) -> f32 {
    1.0 / (1.0 + (-x / s).exp())
}

/// Logistic density renormalised to `[a, b]`.
pub fn trimmed_logistic(x: f32, s: f32, a: f32, b: f32) -> f32 {
    logistic(x, s) / (logistic_cdf(b, s) - logistic_cdf(a, s))
}

/// Inverts the CDF of `trimmed_logistic` on `[a, b]`.
pub fn sample_trimmed_logistic(u: f32, s: f32, a: f32, b: f32) -> f32 {
    let k = logistic_cdf(b, s) - logistic_cdf(a, s);
    let x = -s * (1.0 / (u * k + logistic_cdf(a, s)) - 1.0).ln();
    x.clamp(a, b)
}

/// Henyey-Greenstein phase function value for the angle between `wo` and
/// `wi`, both pointing away from the scattering point.
pub fn henyey_greenstein(cos_theta: f32, g: f32) -> f32 {
    let denom = 1.0 + sqr(g) + 2.0 * g * cos_theta;
    INV_4PI * (1.0 - sqr(g)) / (denom * safe_sqrt(denom))
}

/// Samples an incident direction for Henyey-Greenstein scattering of `wo`.
/// The returned direction points away from the scattering point.
pub fn sample_henyey_greenstein(wo: Vec3, g: f32, u: Vec2) -> Vec3 {
    let cos_theta = if g.abs() < 1e-3 {
        1.0 - 2.0 * u.x
    } else {
        -1.0 / (2.0 * g) * (1.0 + sqr(g) - sqr((1.0 - sqr(g)) / (1.0 + g - 2.0 * g * u.x)))
    };
    let sin_theta = safe_sqrt(1.0 - sqr(cos_theta));
    let phi = TAU * u.y;

    let frame = crate::Onb::from_w(wo);
    let local = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);
    frame.to_world(local)
}
