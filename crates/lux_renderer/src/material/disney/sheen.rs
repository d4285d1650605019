use lux_math::{Color, Onb, Ray, Vec2, Vec3};

use super::{half_vector, scatter_cosine, tint};
use crate::hittable::HitRecord;
use crate::material::{Albedo, BxdfFlags, Material, ScatterOptions, ScatterRecord, TransportMode};
use crate::pdf::{CosinePdf, Pdf};

/// Grazing-angle retro-reflection for cloth, optionally tinted toward the
/// hue of the base colour.
#[derive(Clone, Debug)]
pub struct DisneySheen {
    color: Albedo,
    tint: f32,
}

impl DisneySheen {
    pub fn new(color: impl Into<Albedo>, tint: f32) -> Self {
        Self {
            color: color.into(),
            tint: tint.clamp(0.0, 1.0),
        }
    }
}

impl Material for DisneySheen {
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
        let Some(wh) = half_vector(wo, wi) else {
            return Color::ZERO;
        };
        let sheen = Color::ONE.lerp(tint(self.color.value(hit.uv)), self.tint);
        sheen * (1.0 - wh.dot(wi).abs()).powi(5)
    }

    fn scatter_pdf(&self, _wo: Vec3, wi: Vec3, hit: &HitRecord, options: &ScatterOptions) -> f32 {
        if !options.flags.allows_reflection() {
            return 0.0;
        }
        CosinePdf::new(hit.normal).at(wi)
    }

    fn name(&self) -> &'static str {
        "disney sheen"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{check_sampling_consistency, hit_with_normal};

    #[test]
    fn test_sheen_peaks_at_grazing() {
        let sheen = DisneySheen::new(Color::new(0.8, 0.2, 0.2), 0.0);
        let hit = hit_with_normal(Vec3::Z);
        let mode = TransportMode::Radiance;
        assert_eq!(sheen.f(Vec3::Z, Vec3::Z, &hit, mode), Color::ZERO);
        let grazing = sheen.f(Vec3::new(1.0, 0.0, 0.1).normalize(), Vec3::new(-1.0, 0.0, 0.1).normalize(), &hit, mode);
        assert!(grazing.x > 0.5);
        // Untinted sheen is white.
        assert_eq!(grazing.x, grazing.z);
    }

    #[test]
    fn test_tinted_sheen_follows_hue() {
        let sheen = DisneySheen::new(Color::new(0.8, 0.2, 0.2), 1.0);
        let hit = hit_with_normal(Vec3::Z);
        let f = sheen.f(Vec3::new(1.0, 0.0, 0.1).normalize(), Vec3::new(-1.0, 0.0, 0.1).normalize(), &hit, TransportMode::Radiance);
        assert!(f.x > f.z);
        let checked = check_sampling_consistency(&sheen, &hit, Vec3::new(0.2, 0.1, 1.0), 500, 42);
        assert_eq!(checked, 500);
    }
}
