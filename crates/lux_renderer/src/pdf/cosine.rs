use lux_math::sampling::{
    cosine_hemisphere_pdf, sample_cosine_hemisphere, sample_uniform_sphere, uniform_sphere_pdf,
};
use lux_math::{Onb, Vec2, Vec3};

use super::Pdf;

/// Cosine-weighted hemisphere about a normal.
#[derive(Clone, Debug)]
pub struct CosinePdf {
    frame: Onb,
}

impl CosinePdf {
    pub fn new(normal: Vec3) -> Self {
        Self {
            frame: Onb::from_w(normal),
        }
    }
}

impl Pdf for CosinePdf {
    fn get(&self, _uc: f32, u: Vec2) -> Option<Vec3> {
        Some(self.frame.to_world(sample_cosine_hemisphere(u)))
    }

    fn at(&self, direction: Vec3) -> f32 {
        let cos = direction.normalize_or_zero().dot(self.frame.w());
        cosine_hemisphere_pdf(cos.max(0.0))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UniformSpherePdf;

impl Pdf for UniformSpherePdf {
    fn get(&self, _uc: f32, u: Vec2) -> Option<Vec3> {
        Some(sample_uniform_sphere(u))
    }

    fn at(&self, _direction: Vec3) -> f32 {
        uniform_sphere_pdf()
    }
}
