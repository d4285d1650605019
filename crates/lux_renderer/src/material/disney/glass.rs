use lux_math::{Color, Onb, Ray, Vec2, Vec3};

use crate::hittable::HitRecord;
use crate::material::rough_dielectric::microfacet_dielectric_f;
use crate::material::specular::{relative_eta, scatter_smooth_dielectric};
use crate::material::{Albedo, BxdfFlags, Material, ScatterOptions, ScatterRecord, TransportMode, TrowbridgeReitz};
use crate::pdf::{MfDielectricPdf, Pdf};

/// Tinted rough glass. Reflection takes the base colour; transmission its
/// square root, so the colour after entering and leaving matches the base.
#[derive(Clone, Debug)]
pub struct DisneyGlass {
    albedo: Albedo,
    distribution: TrowbridgeReitz,
    eta: f32,
}

impl DisneyGlass {
    pub fn new(albedo: impl Into<Albedo>, roughness: f32, anisotropic: f32, eta: f32) -> Self {
        Self {
            albedo: albedo.into(),
            distribution: TrowbridgeReitz::from_roughness_anisotropic(roughness, anisotropic),
            eta,
        }
    }

    pub fn is_smooth(&self) -> bool {
        self.eta == 1.0 || self.distribution.effectively_smooth()
    }

    fn tints(&self, hit: &HitRecord) -> (Color, Color) {
        let color = self.albedo.value(hit.uv);
        (color, Color::new(color.x.sqrt(), color.y.sqrt(), color.z.sqrt()))
    }

    pub(super) fn pdf(&self, hit: &HitRecord, wo: Vec3, options: &ScatterOptions) -> MfDielectricPdf {
        MfDielectricPdf::new(
            Onb::from_w(hit.normal),
            wo,
            relative_eta(self.eta, hit),
            self.distribution,
            options.flags,
            options.rejection.clone(),
        )
    }
}

impl Material for DisneyGlass {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        uc: f32,
        u: Vec2,
        options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        if self.is_smooth() {
            let (reflect_tint, transmit_tint) = self.tints(hit);
            let eta = relative_eta(self.eta, hit);
            return scatter_smooth_dielectric(ray_in, hit, eta, uc, options, reflect_tint, transmit_tint);
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
        let (reflect_tint, transmit_tint) = self.tints(hit);
        microfacet_dielectric_f(
            &self.distribution,
            relative_eta(self.eta, hit),
            reflect_tint,
            transmit_tint,
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
        "disney glass"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::RoughDielectric;
    use crate::test_utils::{assert_approx, check_sampling_consistency, hit_with_normal, ray_towards_origin};

    #[test]
    fn test_white_glass_matches_rough_dielectric() {
        let disney = DisneyGlass::new(Color::ONE, 0.5, 0.0, 1.5);
        let alpha = 0.25;
        let plain = RoughDielectric::new(1.5, alpha, alpha);
        let hit = hit_with_normal(Vec3::Z);
        let wo = Vec3::new(0.3, 0.0, 1.0).normalize();
        for wi in [Vec3::new(-0.2, 0.1, 1.0), Vec3::new(-0.1, 0.0, -1.0)] {
            let wi = wi.normalize();
            let a = disney.f(wo, wi, &hit, TransportMode::Radiance);
            let b = plain.f(wo, wi, &hit, TransportMode::Radiance);
            assert_approx!(a.x, b.x, 1e-4 * b.x.max(1.0));
        }
    }

    #[test]
    fn test_transmission_takes_square_root_tint() {
        let glass = DisneyGlass::new(Color::new(0.25, 1.0, 1.0), 0.0, 0.0, 1.5);
        assert!(glass.is_smooth());
        let hit = hit_with_normal(Vec3::Z);
        let rec = glass
            .scatter(&ray_towards_origin(Vec3::Z), &hit, 0.99, Vec2::ZERO, &ScatterOptions::default())
            .unwrap();
        assert!(rec.flags.is_specular_transmission());
        assert_approx!(rec.attenuation.x / rec.attenuation.y, 0.5, 1e-5);
    }

    #[test]
    fn test_rough_glass_consistency_from_inside() {
        let glass = DisneyGlass::new(Color::splat(0.9), 0.4, 0.3, 1.45);
        let mut hit = hit_with_normal(Vec3::Z);
        hit.front_face = false;
        let checked = check_sampling_consistency(&glass, &hit, Vec3::new(0.2, 0.1, 1.0), 2_000, 42);
        assert!(checked > 1_000);
    }
}
