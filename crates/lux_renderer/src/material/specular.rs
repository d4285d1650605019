//! Perfectly smooth reflectors and refractors.

use lux_math::sampling::sample_uniform_sphere;
use lux_math::shading::{reflect, refract, sqr};
use lux_math::{Color, Ray, Vec2, Vec3};

use super::{
    fresnel_dielectric, Albedo, BxdfFlags, BxdfReflTransFlags, Material, ScatterOptions,
    ScatterRecord, SplitRays, TransportMode,
};
use crate::hittable::HitRecord;

/// Which delta branch a Fresnel-weighted coin flip picked, with the path
/// weight that keeps the choice unbiased.
pub(super) enum DeltaBranch {
    Reflect(f32),
    Transmit(f32),
}

/// Chooses between reflection and transmission in proportion to `r` and
/// `t`, restricted to what `flags` allows.
pub(super) fn choose_delta_branch(r: f32, t: f32, flags: BxdfReflTransFlags, uc: f32) -> Option<DeltaBranch> {
    let pr = if flags.allows_reflection() { r } else { 0.0 };
    let pt = if flags.allows_transmission() { t } else { 0.0 };
    if pr <= 0.0 && pt <= 0.0 {
        return None;
    }
    let p_reflect = pr / (pr + pt);
    if uc < p_reflect {
        Some(DeltaBranch::Reflect(r / p_reflect))
    } else {
        Some(DeltaBranch::Transmit(t / (1.0 - p_reflect)))
    }
}

/// Interface index ratio seen by a ray hitting the side `hit` describes.
pub(super) fn relative_eta(ior: f32, hit: &HitRecord) -> f32 {
    if hit.front_face {
        ior
    } else {
        1.0 / ior
    }
}

/// Samples a smooth dielectric interface; shared by every glass-like model.
pub(super) fn scatter_smooth_dielectric(
    ray_in: &Ray,
    hit: &HitRecord,
    eta: f32,
    uc: f32,
    options: &ScatterOptions,
    reflect_tint: Color,
    transmit_tint: Color,
) -> Option<ScatterRecord> {
    let wo = -ray_in.direction().normalize();
    let r = fresnel_dielectric(wo.dot(hit.normal), eta);
    match choose_delta_branch(r, 1.0 - r, options.flags, uc)? {
        DeltaBranch::Reflect(weight) => Some(ScatterRecord::specular(
            hit.spawn_ray(ray_in, reflect(wo, hit.normal)),
            BxdfFlags::SPECULAR_REFLECTION,
            reflect_tint * weight,
        )),
        DeltaBranch::Transmit(weight) => {
            let (wi, etap) = refract(wo, hit.normal, eta)?;
            let weight = match options.mode {
                TransportMode::Radiance => weight / sqr(etap),
                TransportMode::Importance => weight,
            };
            Some(ScatterRecord::specular(
                hit.spawn_ray(ray_in, wi),
                BxdfFlags::SPECULAR_TRANSMISSION,
                transmit_tint * weight,
            ))
        }
    }
}

/// Mirror reflection, optionally blurred by jittering the reflected
/// direction inside a sphere of radius `fuzz`.
#[derive(Clone, Debug)]
pub struct Mirror {
    albedo: Albedo,
    fuzz: f32,
}

impl Mirror {
    pub fn new(albedo: impl Into<Albedo>, fuzz: f32) -> Self {
        Self {
            albedo: albedo.into(),
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }
}

impl Material for Mirror {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        _uc: f32,
        u: Vec2,
        options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        if !options.flags.allows_reflection() {
            return None;
        }
        let wo = -ray_in.direction().normalize();
        let mut wi = reflect(wo, hit.normal);
        if self.fuzz > 0.0 {
            wi = (wi + self.fuzz * sample_uniform_sphere(u)).try_normalize()?;
        }
        if wi.dot(hit.normal) <= 0.0 {
            return None;
        }
        Some(ScatterRecord::specular(
            hit.spawn_ray(ray_in, wi),
            BxdfFlags::SPECULAR_REFLECTION,
            self.albedo.value(hit.uv),
        ))
    }

    fn name(&self) -> &'static str {
        "mirror"
    }
}

/// Smooth glass: Fresnel decides between mirror reflection and refraction.
#[derive(Clone, Debug)]
pub struct Dielectric {
    ior: f32,
}

impl Dielectric {
    pub fn new(ior: f32) -> Self {
        Self { ior }
    }

    pub fn ior(&self) -> f32 {
        self.ior
    }
}

impl Material for Dielectric {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        uc: f32,
        _u: Vec2,
        options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        let eta = relative_eta(self.ior, hit);
        scatter_smooth_dielectric(ray_in, hit, eta, uc, options, Color::ONE, Color::ONE)
    }

    fn name(&self) -> &'static str {
        "dielectric"
    }
}

/// A sheet of glass with parallel faces. Light leaves undeviated and the
/// interreflections between the two faces fold into one reflectance.
///
/// In split mode a scatter reports both branches at once, weighted by
/// their reflectance and transmittance, instead of choosing one.
#[derive(Clone, Debug)]
pub struct ThinDielectric {
    eta: f32,
    split: bool,
}

impl ThinDielectric {
    pub fn new(eta: f32) -> Self {
        Self { eta, split: false }
    }

    pub fn split(eta: f32) -> Self {
        Self { eta, split: true }
    }

    /// Reflectance and transmittance including every internal bounce.
    pub fn reflectance(&self, abs_cos: f32) -> (f32, f32) {
        let mut r = fresnel_dielectric(abs_cos, self.eta);
        let mut t = 1.0 - r;
        if r < 1.0 {
            r += sqr(t) * r / (1.0 - sqr(r));
            t = 1.0 - r;
        }
        (r, t)
    }
}

impl Material for ThinDielectric {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        uc: f32,
        _u: Vec2,
        options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        let wo = -ray_in.direction().normalize();
        let (r, t) = self.reflectance(wo.dot(hit.normal).abs());
        let reflected = reflect(wo, hit.normal);

        if self.split && options.flags == BxdfReflTransFlags::ALL && r > 0.0 && t > 0.0 {
            let reflect_ray = hit.spawn_ray(ray_in, reflected);
            let transmit_ray = hit.spawn_ray(ray_in, -wo);
            let mut record = ScatterRecord::specular(
                reflect_ray,
                BxdfFlags::SPECULAR_REFLECTION | BxdfFlags::SPECULAR_TRANSMISSION,
                Color::ONE,
            );
            record.split = Some(SplitRays {
                rays: [reflect_ray, transmit_ray, transmit_ray],
                weights: [Color::splat(r), Color::splat(t), Color::ZERO],
                valid: [true, true, false],
            });
            return Some(record);
        }

        match choose_delta_branch(r, t, options.flags, uc)? {
            DeltaBranch::Reflect(weight) => Some(ScatterRecord::specular(
                hit.spawn_ray(ray_in, reflected),
                BxdfFlags::SPECULAR_REFLECTION,
                Color::splat(weight),
            )),
            DeltaBranch::Transmit(weight) => Some(ScatterRecord::specular(
                hit.spawn_ray(ray_in, -wo),
                BxdfFlags::SPECULAR_TRANSMISSION,
                Color::splat(weight),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "thin dielectric"
    }
}
