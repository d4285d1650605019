use lux_math::shading::reflect;
use lux_math::{Color, Onb, Ray, Vec2, Vec3};

use super::half_vector;
use crate::hittable::HitRecord;
use crate::material::{
    fresnel_schlick, Albedo, BxdfFlags, Material, ScatterOptions, ScatterRecord, TransportMode, TrowbridgeReitz,
};
use crate::pdf::{MicrofacetPdf, Pdf};

/// Anisotropic GGX reflection with Schlick Fresnel toward the base colour.
#[derive(Clone, Debug)]
pub struct DisneyMetal {
    albedo: Albedo,
    distribution: TrowbridgeReitz,
}

impl DisneyMetal {
    pub fn new(albedo: impl Into<Albedo>, roughness: f32, anisotropic: f32) -> Self {
        Self {
            albedo: albedo.into(),
            distribution: TrowbridgeReitz::from_roughness_anisotropic(roughness, anisotropic),
        }
    }

    pub fn is_smooth(&self) -> bool {
        self.distribution.effectively_smooth()
    }

    pub(super) fn pdf(&self, hit: &HitRecord, wo: Vec3, options: &ScatterOptions) -> MicrofacetPdf {
        MicrofacetPdf::new(Onb::from_w(hit.normal), wo, self.distribution, options.rejection.clone())
    }

    /// Samples the lobe with `f0` as normal-incidence reflectance.
    pub(super) fn scatter_with_f0(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        u: Vec2,
        options: &ScatterOptions,
        f0: Color,
    ) -> Option<ScatterRecord> {
        if !options.flags.allows_reflection() {
            return None;
        }
        let wo = -ray_in.direction().normalize();

        if self.is_smooth() {
            let wi = reflect(wo, hit.normal);
            if wi.dot(hit.normal) <= 0.0 {
                return None;
            }
            return Some(ScatterRecord::specular(
                hit.spawn_ray(ray_in, wi),
                BxdfFlags::SPECULAR_REFLECTION,
                fresnel_schlick(wi.dot(hit.normal), f0),
            ));
        }

        let pdf = self.pdf(hit, wo, options);
        let wi = pdf.get(0.0, u)?;
        if wi.dot(hit.normal) <= 0.0 {
            return None;
        }
        let pdf_val = pdf.at(wi);
        if pdf_val <= 0.0 {
            return None;
        }
        Some(ScatterRecord::continuous(
            hit.spawn_ray(ray_in, wi),
            BxdfFlags::GLOSSY_REFLECTION,
            self.f_with_f0(wo, wi, hit, f0),
            pdf_val,
            pdf.into(),
        ))
    }

    pub(super) fn f_with_f0(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, f0: Color) -> Color {
        if self.is_smooth() {
            return Color::ZERO;
        }
        let frame = Onb::from_w(hit.normal);
        let (wo, wi) = (frame.to_local(wo), frame.to_local(wi));
        if wo.z <= 0.0 || wi.z <= 0.0 {
            return Color::ZERO;
        }
        let Some(wh) = half_vector(wo, wi) else {
            return Color::ZERO;
        };
        let fresnel = fresnel_schlick(wh.dot(wi).abs(), f0);
        fresnel * self.distribution.d(wh) * self.distribution.g(wo, wi) / (4.0 * wo.z * wi.z)
    }
}

impl Material for DisneyMetal {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        _uc: f32,
        u: Vec2,
        options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        self.scatter_with_f0(ray_in, hit, u, options, self.albedo.value(hit.uv))
    }

    fn f(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, _mode: TransportMode) -> Color {
        self.f_with_f0(wo, wi, hit, self.albedo.value(hit.uv))
    }

    fn scatter_pdf(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, options: &ScatterOptions) -> f32 {
        if self.is_smooth() || !options.flags.allows_reflection() {
            return 0.0;
        }
        self.pdf(hit, wo, options).at(wi)
    }

    fn name(&self) -> &'static str {
        "disney metal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{check_sampling_consistency, furnace, hit_with_normal, ray_towards_origin};

    #[test]
    fn test_smooth_metal_is_tinted_mirror() {
        let metal = DisneyMetal::new(Color::new(0.9, 0.6, 0.2), 0.0, 0.0);
        assert!(metal.is_smooth());
        let hit = hit_with_normal(Vec3::Z);
        let rec = metal
            .scatter(&ray_towards_origin(Vec3::Z), &hit, 0.5, Vec2::splat(0.5), &ScatterOptions::default())
            .unwrap();
        assert!(rec.is_specular());
        assert!((rec.attenuation - Color::new(0.9, 0.6, 0.2)).length() < 1e-5);
    }

    #[test]
    fn test_anisotropic_metal_consistency() {
        let metal = DisneyMetal::new(Color::splat(0.9), 0.5, 0.8);
        let hit = hit_with_normal(Vec3::new(0.2, 0.0, 1.0));
        let checked = check_sampling_consistency(&metal, &hit, Vec3::new(0.5, 0.2, 1.0), 2_000, 42);
        assert!(checked > 1_500);
    }

    #[test]
    fn test_white_metal_bounded_by_one() {
        let metal = DisneyMetal::new(Color::ONE, 0.6, 0.0);
        let hit = hit_with_normal(Vec3::Z);
        let reflected = furnace(&metal, &hit, Vec3::new(0.3, 0.0, 1.0), 200_000, 42);
        assert!(reflected.x < 1.02 && reflected.x > 0.7, "{reflected:?}");
    }
}
