use std::sync::Arc;

use lux_core::Texture;
use lux_math::sampling::INV_PI;
use lux_math::{Color, Ray, Vec2, Vec3};

use super::{Albedo, BxdfFlags, Material, ScatterOptions, ScatterRecord, TransportMode};
use crate::hittable::HitRecord;
use crate::pdf::{CosinePdf, Pdf};

/// Ideal diffuse reflector.
#[derive(Clone, Debug)]
pub struct Lambertian {
    albedo: Albedo,
}

impl Lambertian {
    pub fn new(albedo: Color) -> Self {
        Self {
            albedo: Albedo::Solid(albedo),
        }
    }

    pub fn textured(texture: Arc<Texture>) -> Self {
        Self {
            albedo: Albedo::Texture(texture),
        }
    }
}

impl Material for Lambertian {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        uc: f32,
        u: Vec2,
        options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        if !options.flags.allows_reflection() {
            return None;
        }
        let pdf = CosinePdf::new(hit.normal);
        let wi = pdf.get(uc, u)?;
        let pdf_val = pdf.at(wi);
        if pdf_val <= 0.0 {
            return None;
        }
        let wo = -ray_in.direction().normalize();
        let f = self.f(wo, wi, hit, options.mode);
        Some(ScatterRecord::continuous(
            hit.spawn_ray(ray_in, wi),
            BxdfFlags::DIFFUSE_REFLECTION,
            f,
            pdf_val,
            pdf.into(),
        ))
    }

    fn f(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, _mode: TransportMode) -> Color {
        if wo.dot(hit.normal) <= 0.0 || wi.dot(hit.normal) <= 0.0 {
            return Color::ZERO;
        }
        self.albedo.value(hit.uv) * INV_PI
    }

    fn scatter_pdf(&self, _wo: Vec3, wi: Vec3, hit: &HitRecord, options: &ScatterOptions) -> f32 {
        if !options.flags.allows_reflection() {
            return 0.0;
        }
        CosinePdf::new(hit.normal).at(wi)
    }

    fn name(&self) -> &'static str {
        "lambertian"
    }
}
