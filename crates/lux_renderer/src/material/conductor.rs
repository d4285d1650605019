use lux_math::shading::reflect;
use lux_math::{Color, Onb, Ray, Vec2, Vec3};

use super::{
    fresnel_complex, BxdfFlags, Material, ScatterOptions, ScatterRecord, TransportMode,
    TrowbridgeReitz,
};
use crate::hittable::HitRecord;
use crate::pdf::{MicrofacetPdf, Pdf};

/// Metal described by a complex index of refraction `eta + i k` per channel.
/// Below the smoothness threshold it is a perfect mirror, otherwise a
/// Trowbridge-Reitz microfacet lobe.
#[derive(Clone, Debug)]
pub struct Conductor {
    eta: Color,
    k: Color,
    distribution: TrowbridgeReitz,
}

impl Conductor {
    pub fn new(eta: Color, k: Color, alpha_x: f32, alpha_y: f32) -> Self {
        Self {
            eta,
            k,
            distribution: TrowbridgeReitz::new(alpha_x, alpha_y),
        }
    }

    pub fn gold(alpha_x: f32, alpha_y: f32) -> Self {
        Self::new(
            Color::new(0.14, 0.43, 1.38),
            Color::new(4.54, 2.455, 1.914),
            alpha_x,
            alpha_y,
        )
    }

    pub fn is_smooth(&self) -> bool {
        self.distribution.effectively_smooth()
    }

    fn pdf(&self, hit: &HitRecord, wo: Vec3, options: &ScatterOptions) -> MicrofacetPdf {
        MicrofacetPdf::new(Onb::from_w(hit.normal), wo, self.distribution, options.rejection.clone())
    }
}

impl Material for Conductor {
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

        if self.is_smooth() {
            let wi = reflect(wo, hit.normal);
            let weight = fresnel_complex(wi.dot(hit.normal).abs(), self.eta, self.k);
            return Some(ScatterRecord::specular(
                hit.spawn_ray(ray_in, wi),
                BxdfFlags::SPECULAR_REFLECTION,
                weight,
            ));
        }

        let pdf = self.pdf(hit, wo, options);
        let wi = pdf.get(uc, u)?;
        let pdf_val = pdf.at(wi);
        if pdf_val <= 0.0 || wi.dot(hit.normal) <= 0.0 {
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
        if self.is_smooth() {
            return Color::ZERO;
        }
        let frame = Onb::from_w(hit.normal);
        let (wo, wi) = (frame.to_local(wo), frame.to_local(wi));
        if wo.z <= 0.0 || wi.z <= 0.0 {
            return Color::ZERO;
        }
        let Some(wm) = (wo + wi).try_normalize() else {
            return Color::ZERO;
        };
        let fresnel = fresnel_complex(wo.dot(wm).abs(), self.eta, self.k);
        fresnel * self.distribution.d(wm) * self.distribution.g(wo, wi) / (4.0 * wo.z * wi.z)
    }

    fn scatter_pdf(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, options: &ScatterOptions) -> f32 {
        if self.is_smooth() || !options.flags.allows_reflection() {
            return 0.0;
        }
        self.pdf(hit, wo, options).at(wi)
    }

    fn name(&self) -> &'static str {
        "conductor"
    }
}
