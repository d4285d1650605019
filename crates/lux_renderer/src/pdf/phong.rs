use std::f32::consts::{PI, TAU};

use lux_math::shading::safe_sqrt;
use lux_math::{Onb, Vec2, Vec3};

use super::Pdf;

/// Normalized `cos^n` lobe about a reflection axis.
#[derive(Clone, Debug)]
pub struct PhongLobePdf {
    frame: Onb,
    exponent: f32,
}

impl PhongLobePdf {
    pub fn new(axis: Vec3, exponent: f32) -> Self {
        Self {
            frame: Onb::from_w(axis),
            exponent: exponent.max(0.0),
        }
    }

    pub fn exponent(&self) -> f32 {
        self.exponent
    }
}

impl Pdf for PhongLobePdf {
    fn get(&self, _uc: f32, u: Vec2) -> Option<Vec3> {
        let cos_theta = u.x.powf(1.0 / (self.exponent + 1.0));
        let sin_theta = safe_sqrt(1.0 - cos_theta * cos_theta);
        let phi = TAU * u.y;
        let local = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);
        Some(self.frame.to_world(local))
    }

    fn at(&self, direction: Vec3) -> f32 {
        let cos = direction.normalize_or_zero().dot(self.frame.w());
        if cos <= 0.0 {
            return 0.0;
        }
        (self.exponent + 1.0) / (2.0 * PI) * cos.powf(self.exponent)
    }
}
