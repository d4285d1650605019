use lux_math::{Color, Onb, Ray, Vec2, Vec3};

use super::half_vector;
use crate::hittable::HitRecord;
use crate::material::{
    eta_to_r0, fresnel_schlick, BxdfFlags, ClearcoatDistribution, Material, ScatterOptions, ScatterRecord,
    TransportMode,
};
use crate::pdf::{ClearcoatPdf, Pdf};

/// Index of refraction of the coating layer.
const COAT_IOR: f32 = 1.5;

/// Thin varnish layer with a long-tailed highlight, white and uncoloured.
#[derive(Clone, Debug)]
pub struct DisneyClearcoat {
    distribution: ClearcoatDistribution,
}

impl DisneyClearcoat {
    /// `gloss` runs from satin (0) to a sharp lacquer (1).
    pub fn new(gloss: f32) -> Self {
        Self {
            distribution: ClearcoatDistribution::from_gloss(gloss),
        }
    }

    pub(super) fn pdf(&self, hit: &HitRecord, wo: Vec3, options: &ScatterOptions) -> ClearcoatPdf {
        ClearcoatPdf::new(Onb::from_w(hit.normal), wo, self.distribution, options.rejection.clone())
    }
}

impl Material for DisneyClearcoat {
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
        let wo = -ray_in.direction().normalize();
        let pdf = self.pdf(hit, wo, options);
        let wi = pdf.get(uc, u)?;
        if wi.dot(hit.normal) <= 0.0 {
            return None;
        }
        let pdf_val = pdf.at(wi);
        if pdf_val <= 0.0 {
            return None;
        }
        let f = self.f(wo, wi, hit, options.mode);
        Some(ScatterRecord::continuous(
            hit.spawn_ray(ray_in, wi),
            BxdfFlags::GLOSSY_REFLECTION,
            f,
            pdf_val,
            pdf.into(),
        ))
    }

    fn f(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, _mode: TransportMode) -> Color {
        let frame = Onb::from_w(hit.normal);
        let (wo, wi) = (frame.to_local(wo), frame.to_local(wi));
        if wo.z <= 0.0 || wi.z <= 0.0 {
            return Color::ZERO;
        }
        let Some(wh) = half_vector(wo, wi) else {
            return Color::ZERO;
        };
        let fresnel = fresnel_schlick(wh.dot(wi).abs(), Color::splat(eta_to_r0(COAT_IOR)));
        let d = self.distribution.d(wh);
        let g = self.distribution.g(wo, wi);
        fresnel * d * g / (4.0 * wo.z * wi.z)
    }

    fn scatter_pdf(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, options: &ScatterOptions) -> f32 {
        if !options.flags.allows_reflection() {
            return 0.0;
        }
        self.pdf(hit, wo, options).at(wi)
    }

    fn name(&self) -> &'static str {
        "disney clearcoat"
    }
}
