use lux_math::sampling::{henyey_greenstein, sample_henyey_greenstein};
use lux_math::{Vec2, Vec3};

use super::Pdf;

/// Henyey-Greenstein phase function sampling for volume scattering.
#[derive(Clone, Debug)]
pub struct HenyeyGreensteinPdf {
    wo: Vec3,
    g: f32,
}

impl HenyeyGreensteinPdf {
    /// `wo` points away from the scattering point, back along the incoming ray.
    pub fn new(wo: Vec3, g: f32) -> Self {
        Self {
            wo: wo.normalize(),
            g,
        }
    }
}

impl Pdf for HenyeyGreensteinPdf {
    fn get(&self, _uc: f32, u: Vec2) -> Option<Vec3> {
        Some(sample_henyey_greenstein(self.wo, self.g, u))
    }

    fn at(&self, direction: Vec3) -> f32 {
        henyey_greenstein(self.wo.dot(direction.normalize_or_zero()), self.g)
    }
}
