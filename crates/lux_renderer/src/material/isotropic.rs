use std::sync::Arc;

use lux_core::Texture;
use lux_math::sampling::henyey_greenstein;
use lux_math::{Color, Ray, Vec2, Vec3};

use super::{Albedo, BxdfFlags, Material, ScatterOptions, ScatterRecord, TransportMode};
use crate::hittable::HitRecord;
use crate::pdf::{HenyeyGreensteinPdf, Pdf};

/// Phase-function material for scattering inside a volume. With `g = 0`
/// light leaves in every direction with equal probability.
#[derive(Clone, Debug)]
pub struct Isotropic {
    albedo: Albedo,
    g: f32,
}

impl Isotropic {
    pub fn new(albedo: Color) -> Self {
        Self::henyey_greenstein(albedo, 0.0)
    }

    pub fn textured(texture: Arc<Texture>) -> Self {
        Self {
            albedo: Albedo::Texture(texture),
            g: 0.0,
        }
    }

    /// Forward (`g > 0`) or backward (`g < 0`) scattering.
    pub fn henyey_greenstein(albedo: Color, g: f32) -> Self {
        Self {
            albedo: Albedo::Solid(albedo),
            g: g.clamp(-0.99, 0.99),
        }
    }
}

impl Material for Isotropic {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        uc: f32,
        u: Vec2,
        options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        let wo = -ray_in.direction().normalize();
        let pdf = HenyeyGreensteinPdf::new(wo, self.g);
        let wi = pdf.get(uc, u)?;
        let pdf_val = pdf.at(wi);
        if pdf_val <= 0.0 {
            return None;
        }
        let f = self.f(wo, wi, hit, options.mode);
        let ray = Ray::new(hit.p, wi)
            .with_medium(ray_in.medium)
            .with_intensity(ray_in.intensity);
        Some(ScatterRecord::continuous(
            ray,
            BxdfFlags::DIFFUSE_REFLECTION | BxdfFlags::DIFFUSE_TRANSMISSION,
            f,
            pdf_val,
            pdf.into(),
        ))
    }

    fn f(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, _mode: TransportMode) -> Color {
        self.albedo.value(hit.uv) * henyey_greenstein(wo.dot(wi), self.g)
    }

    fn scatter_pdf(&self, wo: Vec3, wi: Vec3, _hit: &HitRecord, _options: &ScatterOptions) -> f32 {
        HenyeyGreensteinPdf::new(wo, self.g).at(wi)
    }

    fn is_volumetric(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "isotropic"
    }
}
