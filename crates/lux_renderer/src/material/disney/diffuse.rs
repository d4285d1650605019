use lux_math::sampling::INV_PI;
use lux_math::{Color, Onb, Ray, Vec2, Vec3};

use super::{half_vector, scatter_cosine};
use crate::hittable::HitRecord;
use crate::material::{schlick_weight_to, Albedo, BxdfFlags, Material, ScatterOptions, ScatterRecord, TransportMode};
use crate::pdf::{CosinePdf, Pdf};

/// Burley's retro-reflective diffuse, blended toward the Hanrahan-Krueger
/// style subsurface approximation by `subsurface`.
#[derive(Clone, Debug)]
pub struct DisneyDiffuse {
    albedo: Albedo,
    roughness: f32,
    subsurface: f32,
}

impl DisneyDiffuse {
    pub fn new(albedo: impl Into<Albedo>, roughness: f32, subsurface: f32) -> Self {
        Self {
            albedo: albedo.into(),
            roughness: roughness.clamp(0.0, 1.0),
            subsurface: subsurface.clamp(0.0, 1.0),
        }
    }
}

impl Material for DisneyDiffuse {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        uc: f32,
        u: Vec2,
        options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        scatter_cosine(self, ray_in, hit, uc, u, options, BxdfFlags::DIFFUSE_REFLECTION)
    }

    fn f(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, _mode: TransportMode) -> Color {
        let frame = Onb::from_w(hit.normal);
        let (wo, wi) = (frame.to_local(wo), frame.to_local(wi));
        if wo.z <= 0.0 || wi.z <= 0.0 {
            return Color::ZERO;
        }
        let base = self.albedo.value(hit.uv);
        let cos_h = half_vector(wo, wi).map_or(1.0, |wh| wh.dot(wi).abs());

        let fd90 = 0.5 + 2.0 * self.roughness * cos_h * cos_h;
        let diffuse = schlick_weight_to(wi.z, fd90) * schlick_weight_to(wo.z, fd90);

        let fss90 = self.roughness * cos_h * cos_h;
        let fss = schlick_weight_to(wi.z, fss90) * schlick_weight_to(wo.z, fss90);
        let subsurface = 1.25 * (fss * (1.0 / (wi.z + wo.z) - 0.5) + 0.5);

        base * INV_PI * ((1.0 - self.subsurface) * diffuse + self.subsurface * subsurface)
    }

    fn scatter_pdf(&self, _wo: Vec3, wi: Vec3, hit: &HitRecord, options: &ScatterOptions) -> f32 {
        if !options.flags.allows_reflection() {
            return 0.0;
        }
        CosinePdf::new(hit.normal).at(wi)
    }

    fn name(&self) -> &'static str {
        "disney diffuse"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_approx, check_sampling_consistency, furnace, hit_with_normal};

    #[test]
    fn test_smooth_diffuse_darkens_at_grazing() {
        let material = DisneyDiffuse::new(Color::ONE, 0.0, 0.0);
        let hit = hit_with_normal(Vec3::Z);
        let mode = TransportMode::Radiance;
        let head_on = material.f(Vec3::Z, Vec3::Z, &hit, mode).x;
        let grazing = material.f(Vec3::new(1.0, 0.0, 0.05).normalize(), Vec3::Z, &hit, mode).x;
        assert_approx!(head_on, INV_PI, 1e-5);
        assert!(grazing < head_on);
    }

    #[test]
    fn test_diffuse_consistency_and_energy() {
        let material = DisneyDiffuse::new(Color::splat(0.8), 0.5, 0.3);
        let hit = hit_with_normal(Vec3::Y);
        let checked = check_sampling_consistency(&material, &hit, Vec3::new(0.3, 1.0, 0.2), 1_000, 42);
        assert_eq!(checked, 1_000);

        let reflected = furnace(&material, &hit, Vec3::new(0.0, 1.0, 0.3), 100_000, 42);
        assert!(reflected.x > 0.5 && reflected.x < 1.0, "{reflected:?}");
    }

    #[test]
    fn test_below_surface_is_black() {
        let material = DisneyDiffuse::new(Color::ONE, 0.5, 0.5);
        let hit = hit_with_normal(Vec3::Z);
        let f = material.f(Vec3::Z, -Vec3::Z, &hit, TransportMode::Radiance);
        assert_eq!(f, Color::ZERO);
    }
}
