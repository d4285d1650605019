//! Microfacet distributions in the local shading frame (normal = +Z).

use std::f32::consts::PI;

use lux_math::sampling::sample_uniform_disk_polar;
use lux_math::shading::{abs_cos_theta, cos2_theta, cos_phi, lerp, safe_sqrt, sin_phi, sqr, tan2_theta};
use lux_math::{Vec2, Vec3};

/// Anisotropic Trowbridge-Reitz (GGX).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrowbridgeReitz {
    alpha_x: f32,
    alpha_y: f32,
}

impl TrowbridgeReitz {
    pub fn new(alpha_x: f32, alpha_y: f32) -> Self {
        let mut d = Self { alpha_x, alpha_y };
        if !d.effectively_smooth() {
            d.alpha_x = d.alpha_x.max(1e-4);
            d.alpha_y = d.alpha_y.max(1e-4);
        }
        d
    }

    /// Perceptual roughness squared, stretched by the anisotropy aspect.
    pub fn from_roughness_anisotropic(roughness: f32, anisotropic: f32) -> Self {
        let aspect = (1.0 - 0.9 * anisotropic.clamp(0.0, 1.0)).sqrt();
        let r2 = sqr(roughness);
        Self {
            alpha_x: (r2 / aspect).max(1e-4),
            alpha_y: (r2 * aspect).max(1e-4),
        }
    }

    pub fn roughness_to_alpha(roughness: f32) -> f32 {
        roughness.sqrt()
    }

    pub fn alpha_x(&self) -> f32 {
        self.alpha_x
    }

    pub fn alpha_y(&self) -> f32 {
        self.alpha_y
    }

    pub fn effectively_smooth(&self) -> bool {
        self.alpha_x.max(self.alpha_y) < 1e-3
    }

    /// Widens a near-specular lobe so later bounces stay sampleable.
    pub fn regularize(&mut self) {
        if self.alpha_x < 0.3 {
            self.alpha_x = (2.0 * self.alpha_x).clamp(0.1, 0.3);
        }
        if self.alpha_y < 0.3 {
            self.alpha_y = (2.0 * self.alpha_y).clamp(0.1, 0.3);
        }
    }

    /// Normal distribution `D(wm)`.
    pub fn d(&self, wm: Vec3) -> f32 {
        let tan2 = tan2_theta(wm);
        if tan2.is_infinite() || tan2.is_nan() {
            return 0.0;
        }
        let cos4 = sqr(cos2_theta(wm));
        if cos4 < 1e-16 {
            return 0.0;
        }
        let e = tan2 * (sqr(cos_phi(wm) / self.alpha_x) + sqr(sin_phi(wm) / self.alpha_y));
        1.0 / (PI * self.alpha_x * self.alpha_y * cos4 * sqr(1.0 + e))
    }

    pub fn lambda(&self, w: Vec3) -> f32 {
        let tan2 = tan2_theta(w);
        if tan2.is_infinite() || tan2.is_nan() {
            return 0.0;
        }
        let alpha2 = sqr(cos_phi(w) * self.alpha_x) + sqr(sin_phi(w) * self.alpha_y);
        ((1.0 + alpha2 * tan2).sqrt() - 1.0) / 2.0
    }

    pub fn g1(&self, w: Vec3) -> f32 {
        1.0 / (1.0 + self.lambda(w))
    }

    pub fn g(&self, wo: Vec3, wi: Vec3) -> f32 {
        1.0 / (1.0 + self.lambda(wo) + self.lambda(wi))
    }

    /// Distribution of normals visible from `w`.
    pub fn d_visible(&self, w: Vec3, wm: Vec3) -> f32 {
        let cos = abs_cos_theta(w);
        if cos == 0.0 {
            return 0.0;
        }
        self.g1(w) / cos * self.d(wm) * w.dot(wm).abs()
    }

    pub fn pdf(&self, w: Vec3, wm: Vec3) -> f32 {
        self.d_visible(w, wm)
    }

    /// Samples a visible microfacet normal as seen from `w`.
    pub fn sample_wm(&self, w: Vec3, u: Vec2) -> Vec3 {
        let mut wh = Vec3::new(self.alpha_x * w.x, self.alpha_y * w.y, w.z).normalize();
        if wh.z < 0.0 {
            wh = -wh;
        }

        let t1 = if wh.z < 0.99999 {
            Vec3::Z.cross(wh).normalize()
        } else {
            Vec3::X
        };
        let t2 = wh.cross(t1);

        let mut p = sample_uniform_disk_polar(u);
        let h = (1.0 - sqr(p.x)).sqrt();
        p.y = lerp((1.0 + wh.z) / 2.0, h, p.y);

        let pz = (1.0 - p.length_squared()).max(0.0).sqrt();
        let nh = p.x * t1 + p.y * t2 + pz * wh;
        Vec3::new(self.alpha_x * nh.x, self.alpha_y * nh.y, nh.z.max(1e-6)).normalize()
    }
}

/// Distribution used by the clearcoat layer, parameterized by gloss.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearcoatDistribution {
    alpha: f32,
}

impl ClearcoatDistribution {
    pub fn from_gloss(gloss: f32) -> Self {
        let gloss = gloss.clamp(0.0, 1.0);
        Self {
            alpha: (1.0 - gloss) * 0.1 + gloss * 0.001,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn d(&self, wh: Vec3) -> f32 {
        let a2 = sqr(self.alpha);
        (a2 - 1.0) / (PI * a2.ln() * (1.0 + (a2 - 1.0) * sqr(wh.z)))
    }

    /// Smith masking with the layer's fixed 0.25 roughness.
    pub fn lambda(&self, w: Vec3) -> f32 {
        let tan2 = tan2_theta(w);
        if tan2.is_infinite() || tan2.is_nan() {
            return 0.0;
        }
        ((1.0 + sqr(0.25) * tan2).sqrt() - 1.0) / 2.0
    }

    pub fn g(&self, wo: Vec3, wi: Vec3) -> f32 {
        1.0 / (1.0 + self.lambda(wo)) * 1.0 / (1.0 + self.lambda(wi))
    }

    /// Samples a half vector in the upper hemisphere.
    pub fn sample_wh(&self, u: Vec2) -> Vec3 {
        let a2 = sqr(self.alpha);
        let cos_theta = safe_sqrt((1.0 - a2.powf(1.0 - u.x)) / (1.0 - a2));
        let sin_theta = safe_sqrt(1.0 - sqr(cos_theta));
        let phi = 2.0 * PI * u.y;
        Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lux_math::sampling::sample_uniform_sphere;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Integrates `D(wm) cos(wm)` over the hemisphere by uniform sampling.
    fn projected_area(d: impl Fn(Vec3) -> f32) -> f32 {
        let mut rng = StdRng::seed_from_u64(3);
        let n = 200_000;
        let mut sum = 0.0;
        for _ in 0..n {
            let w = sample_uniform_sphere(Vec2::new(rng.gen(), rng.gen()));
            if w.z > 0.0 {
                sum += d(w) * w.z;
            }
        }
        sum * 4.0 * PI / n as f32
    }

    #[test]
    fn test_ggx_normalized() {
        let ggx = TrowbridgeReitz::new(0.5, 0.5);
        let area = projected_area(|w| ggx.d(w));
        assert!((area - 1.0).abs() < 0.03, "projected area {area}");
    }

    #[test]
    fn test_anisotropic_ggx_normalized() {
        let ggx = TrowbridgeReitz::from_roughness_anisotropic(0.7, 0.8);
        assert!(ggx.alpha_x() > ggx.alpha_y());
        let area = projected_area(|w| ggx.d(w));
        assert!((area - 1.0).abs() < 0.05, "projected area {area}");
    }

    #[test]
    fn test_clearcoat_normalized() {
        let cc = ClearcoatDistribution::from_gloss(0.2);
        let area = projected_area(|w| cc.d(w));
        assert!((area - 1.0).abs() < 0.05, "projected area {area}");
    }

    #[test]
    fn test_smoothness() {
        assert!(TrowbridgeReitz::new(1e-4, 1e-4).effectively_smooth());
        let mut rough = TrowbridgeReitz::new(0.01, 0.01);
        assert!(!rough.effectively_smooth());
        rough.regularize();
        assert!(rough.alpha_x() >= 0.1);
    }

    #[test]
    fn test_sampled_normals_face_viewer() {
        let ggx = TrowbridgeReitz::new(0.3, 0.6);
        let mut rng = StdRng::seed_from_u64(11);
        let wo = Vec3::new(0.4, -0.2, 0.8).normalize();
        for _ in 0..1000 {
            let wm = ggx.sample_wm(wo, Vec2::new(rng.gen(), rng.gen()));
            assert!(wm.z > 0.0);
            assert!((wm.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_masking_bounds() {
        let ggx = TrowbridgeReitz::new(0.4, 0.4);
        assert!((ggx.g1(Vec3::Z) - 1.0).abs() < 1e-6);
        let grazing = Vec3::new(0.99, 0.0, 0.141).normalize();
        assert!(ggx.g1(grazing) < 1.0);
        assert!(ggx.g(grazing, grazing) <= ggx.g1(grazing));
    }
}
