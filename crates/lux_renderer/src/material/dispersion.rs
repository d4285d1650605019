//! Dispersive glass: a different index of refraction per colour channel.

use lux_math::shading::{reflect, refract, sqr};
use lux_math::{Color, Ray, Vec2, Vec3};

use super::specular::{relative_eta, scatter_smooth_dielectric};
use super::{BxdfFlags, Material, ScatterOptions, ScatterRecord, SplitRays, TransportMode};
use crate::hittable::HitRecord;

/// Representative wavelengths of the red, green and blue channels, in micrometres.
const CHANNEL_WAVELENGTHS: [f32; 3] = [0.65, 0.532, 0.45];

const CHANNELS: [Color; 3] = [Color::X, Color::Y, Color::Z];

/// Per-channel indices from Cauchy's equation `n = a + b / lambda^2`.
pub fn cauchy_ior(a: f32, b: f32) -> Color {
    Color::from_array(CHANNEL_WAVELENGTHS.map(|lambda| a + b / sqr(lambda)))
}

/// Refracts each colour channel separately, producing three child rays
/// that each carry one channel. A channel that cannot refract reflects.
#[derive(Clone, Debug)]
pub struct RaySplitDispersion {
    ior: Color,
}

impl RaySplitDispersion {
    pub fn new(ior_r: f32, ior_g: f32, ior_b: f32) -> Self {
        Self {
            ior: Color::new(ior_r, ior_g, ior_b),
        }
    }

    pub fn cauchy(a: f32, b: f32) -> Self {
        Self { ior: cauchy_ior(a, b) }
    }

    pub fn ior(&self) -> Color {
        self.ior
    }
}

impl Material for RaySplitDispersion {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        _uc: f32,
        _u: Vec2,
        options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        let wo = -ray_in.direction().normalize();
        let reflected = hit.spawn_ray(ray_in, reflect(wo, hit.normal));

        let mut rays = [reflected; 3];
        let mut weights = CHANNELS;
        let mut refracted_any = false;
        for (c, channel) in CHANNELS.iter().enumerate() {
            let eta = relative_eta(self.ior[c], hit);
            if let Some((wi, etap)) = refract(wo, hit.normal, eta) {
                rays[c] = hit.spawn_ray(ray_in, wi);
                if options.mode == TransportMode::Radiance {
                    weights[c] = *channel / sqr(etap);
                }
                refracted_any = true;
            }
        }

        if !refracted_any {
            return Some(ScatterRecord::specular(
                reflected,
                BxdfFlags::SPECULAR_REFLECTION,
                Color::ONE,
            ));
        }

        let mut record = ScatterRecord::specular(rays[0], BxdfFlags::SPECULAR_TRANSMISSION, Color::ONE);
        record.split = Some(SplitRays {
            rays,
            weights,
            valid: [true; 3],
        });
        Some(record)
    }

    fn name(&self) -> &'static str {
        "ray-split dispersion"
    }
}

/// Dispersive glass that follows one randomly chosen colour channel per
/// scatter, weighting it by three to stay unbiased.
#[derive(Clone, Debug)]
pub struct SimpleDispersion {
    ior: Color,
}

impl SimpleDispersion {
    pub fn new(ior: Color) -> Self {
        Self { ior }
    }

    pub fn cauchy(a: f32, b: f32) -> Self {
        Self { ior: cauchy_ior(a, b) }
    }
}

impl Material for SimpleDispersion {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        uc: f32,
        _u: Vec2,
        options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        let scaled = uc * 3.0;
        let channel = (scaled as usize).min(2);
        let uc = (scaled - channel as f32).clamp(0.0, 1.0 - f32::EPSILON);
        let eta = relative_eta(self.ior[channel], hit);
        let tint = CHANNELS[channel] * 3.0;
        scatter_smooth_dielectric(ray_in, hit, eta, uc, options, tint, tint)
    }

    fn name(&self) -> &'static str {
        "simple dispersion"
    }
}
