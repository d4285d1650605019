use lux_math::{Onb, Vec2, Vec3};

use super::Pdf;
use crate::material::FiberLobes;

/// Importance sampling of the fiber lobes, in the frame whose x axis runs
/// along the fiber.
#[derive(Clone, Debug)]
pub struct FiberPdf {
    frame: Onb,
    wo: Vec3,
    lobes: FiberLobes,
}

impl FiberPdf {
    pub fn new(frame: Onb, wo: Vec3, lobes: FiberLobes) -> Self {
        Self {
            wo: frame.to_local(wo.normalize()),
            frame,
            lobes,
        }
    }
}

impl Pdf for FiberPdf {
    fn get(&self, uc: f32, u: Vec2) -> Option<Vec3> {
        let wi = self.lobes.sample(self.wo, uc, u)?;
        Some(self.frame.to_world(wi))
    }

    fn at(&self, direction: Vec3) -> f32 {
        let wi = self.frame.to_local(direction.normalize_or_zero());
        self.lobes.pdf(self.wo, wi)
    }
}
