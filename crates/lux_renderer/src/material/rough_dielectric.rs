use lux_math::shading::{face_forward, sqr};
use lux_math::{Color, Onb, Ray, Vec2, Vec3};

use super::specular::{relative_eta, scatter_smooth_dielectric};
use super::{
    fresnel_dielectric, BxdfFlags, Material, ScatterOptions, ScatterRecord, TransportMode,
    TrowbridgeReitz,
};
use crate::hittable::HitRecord;
use crate::pdf::{MfDielectricPdf, Pdf};

/// Generalized-half-vector BSDF of a rough dielectric interface in the local
/// frame, with separate tints for the reflected and transmitted parts.
pub(super) fn microfacet_dielectric_f(
    distribution: &TrowbridgeReitz,
    eta: f32,
    reflect_tint: Color,
    transmit_tint: Color,
    wo: Vec3,
    wi: Vec3,
    mode: TransportMode,
) -> Color {
    let (cos_o, cos_i) = (wo.z, wi.z);
    if cos_o == 0.0 || cos_i == 0.0 {
        return Color::ZERO;
    }
    let reflect = cos_o * cos_i > 0.0;
    let etap = match (reflect, cos_o > 0.0) {
        (true, _) => 1.0,
        (false, true) => eta,
        (false, false) => 1.0 / eta,
    };
    let Some(wm) = (wi * etap + wo).try_normalize() else {
        return Color::ZERO;
    };
    let wm = face_forward(wm, Vec3::Z);
    if wm.dot(wi) * cos_i < 0.0 || wm.dot(wo) * cos_o < 0.0 {
        return Color::ZERO;
    }

    let fresnel = fresnel_dielectric(wo.dot(wm), eta);
    let dg = distribution.d(wm) * distribution.g(wo, wi);
    if reflect {
        return reflect_tint * dg * fresnel / (4.0 * cos_i * cos_o).abs();
    }

    let denom = sqr(wi.dot(wm) + wo.dot(wm) / etap) * cos_i * cos_o;
    if denom == 0.0 {
        return Color::ZERO;
    }
    let mut ft = dg * (1.0 - fresnel) * (wi.dot(wm) * wo.dot(wm) / denom).abs();
    if mode == TransportMode::Radiance {
        ft /= sqr(etap);
    }
    transmit_tint * ft
}

/// Dielectric interface with Trowbridge-Reitz roughness. Falls back to the
/// smooth Fresnel choice when the distribution is effectively smooth or the
/// interface is index-matched.
#[derive(Clone, Debug)]
pub struct RoughDielectric {
    ior: f32,
    distribution: TrowbridgeReitz,
}

impl RoughDielectric {
    pub fn new(ior: f32, alpha_x: f32, alpha_y: f32) -> Self {
        Self {
            ior,
            distribution: TrowbridgeReitz::new(alpha_x, alpha_y),
        }
    }

    pub fn is_smooth(&self) -> bool {
        self.ior == 1.0 || self.distribution.effectively_smooth()
    }

    fn pdf(&self, hit: &HitRecord, wo: Vec3, options: &ScatterOptions) -> MfDielectricPdf {
        MfDielectricPdf::new(
            Onb::from_w(hit.normal),
            wo,
            relative_eta(self.ior, hit),
            self.distribution,
            options.flags,
            options.rejection.clone(),
        )
    }
}

impl Material for RoughDielectric {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        uc: f32,
        u: Vec2,
        options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        let eta = relative_eta(self.ior, hit);
        if self.is_smooth() {
            return scatter_smooth_dielectric(ray_in, hit, eta, uc, options, Color::ONE, Color::ONE);
        }

        let wo = -ray_in.direction().normalize();
        let pdf = self.pdf(hit, wo, options);
        let wi = pdf.get(uc, u)?;
        let pdf_val = pdf.at(wi);
        if pdf_val <= 0.0 {
            return None;
        }
        let flags = if wi.dot(hit.normal) > 0.0 {
            BxdfFlags::GLOSSY_REFLECTION
        } else {
            BxdfFlags::GLOSSY_TRANSMISSION
        };
        let f = self.f(wo, wi, hit, options.mode);
        Some(ScatterRecord::continuous(hit.spawn_ray(ray_in, wi), flags, f, pdf_val, pdf.into()))
    }

    fn f(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, mode: TransportMode) -> Color {
        if self.is_smooth() {
            return Color::ZERO;
        }
        let frame = Onb::from_w(hit.normal);
        microfacet_dielectric_f(
            &self.distribution,
            relative_eta(self.ior, hit),
            Color::ONE,
            Color::ONE,
            frame.to_local(wo),
            frame.to_local(wi),
            mode,
        )
    }

    fn scatter_pdf(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, options: &ScatterOptions) -> f32 {
        if self.is_smooth() {
            return 0.0;
        }
        self.pdf(hit, wo, options).at(wi)
    }

    fn name(&self) -> &'static str {
        "rough dielectric"
    }
}
