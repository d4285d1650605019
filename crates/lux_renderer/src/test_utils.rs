//! Monte-Carlo helpers shared by the unit tests.

use lux_math::sampling::{sample_uniform_sphere, uniform_sphere_pdf};
use lux_math::{Color, Ray, Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::hittable::HitRecord;
use crate::material::{Material, ScatterOptions, TransportMode};
use crate::pdf::Pdf;

macro_rules! assert_approx {
    ($actual:expr, $expected:expr, $tol:expr) => {{
        let (actual, expected, tol) = ($actual as f32, $expected as f32, $tol as f32);
        assert!(
            (actual - expected).abs() <= tol,
            "expected {} to be within {} of {}",
            actual,
            tol,
            expected
        );
    }};
}
pub(crate) use assert_approx;

pub fn random_u2(rng: &mut StdRng) -> Vec2 {
    Vec2::new(rng.gen(), rng.gen())
}

/// Estimates the integral of `pdf.at` over the sphere with uniform samples.
pub fn estimate_pdf_integral(pdf: &dyn Pdf, samples: usize, seed: u64) -> f32 {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sum = 0.0f64;
    for _ in 0..samples {
        let w = sample_uniform_sphere(random_u2(&mut rng));
        let p = pdf.at(w);
        assert!(p >= 0.0 && p.is_finite(), "density {p} at {w:?}");
        sum += (p / uniform_sphere_pdf()) as f64;
    }
    (sum / samples as f64) as f32
}

/// A front-facing hit at the origin with the given normal.
pub fn hit_with_normal(normal: Vec3) -> HitRecord {
    HitRecord {
        p: Vec3::ZERO,
        normal: normal.normalize(),
        t: 1.0,
        front_face: true,
        ..HitRecord::default()
    }
}

/// A ray arriving at the origin that leaves along `wo`.
pub fn ray_towards_origin(wo: Vec3) -> Ray {
    Ray::new(wo.normalize(), -wo.normalize())
}

/// Draws `samples` scatters and checks that every continuous one reports a
/// density matching both its pdf object and `scatter_pdf`. Returns how many
/// continuous samples were checked.
pub fn check_sampling_consistency(
    material: &dyn Material,
    hit: &HitRecord,
    wo: Vec3,
    samples: usize,
    seed: u64,
) -> usize {
    let mut rng = StdRng::seed_from_u64(seed);
    let ray = ray_towards_origin(wo);
    let options = ScatterOptions::default();
    let mut checked = 0;
    for _ in 0..samples {
        let Some(rec) = material.scatter(&ray, hit, rng.gen(), random_u2(&mut rng), &options) else {
            continue;
        };
        let Some(pdf) = &rec.pdf else {
            assert_eq!(rec.pdf_val, 0.0);
            continue;
        };
        let wi = rec.ray.direction.normalize();
        let from_pdf = pdf.at(wi);
        let from_material = material.scatter_pdf(wo.normalize(), wi, hit, &options);
        let tol = 1e-3 * rec.pdf_val.max(1.0);
        assert!(
            (from_pdf - rec.pdf_val).abs() <= tol,
            "pdf object {from_pdf} vs stored {}",
            rec.pdf_val
        );
        assert!(
            (from_material - rec.pdf_val).abs() <= tol,
            "scatter_pdf {from_material} vs stored {}",
            rec.pdf_val
        );
        assert!(rec.attenuation.min_element() >= 0.0);
        checked += 1;
    }
    checked
}

/// Reflected fraction of uniform white illumination: the integral of
/// `f * |cos|` over the sphere.
pub fn furnace(material: &dyn Material, hit: &HitRecord, wo: Vec3, samples: usize, seed: u64) -> Color {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sum = Color::ZERO;
    for _ in 0..samples {
        let wi = sample_uniform_sphere(random_u2(&mut rng));
        let f = material.f(wo.normalize(), wi, hit, TransportMode::Radiance);
        assert!(f.min_element() >= 0.0, "negative f {f:?}");
        sum += f * wi.dot(hit.normal).abs() / uniform_sphere_pdf();
    }
    sum / samples as f32
}
