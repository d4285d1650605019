use lux_math::{Vec2, Vec3};

use super::Pdf;
use crate::scene::{PrimitiveId, Scene};

/// Directions from `origin` toward a scene primitive.
pub struct ShapePdf<'a> {
    scene: &'a Scene,
    target: PrimitiveId,
    origin: Vec3,
}

impl<'a> ShapePdf<'a> {
    pub fn new(scene: &'a Scene, target: PrimitiveId, origin: Vec3) -> Self {
        Self { scene, target, origin }
    }
}

impl Pdf for ShapePdf<'_> {
    fn get(&self, _uc: f32, u: Vec2) -> Option<Vec3> {
        self.scene
            .sample_direction(self.target, self.origin, u)
            .try_normalize()
    }

    fn at(&self, direction: Vec3) -> f32 {
        self.scene.pdf_value(self.target, self.origin, direction)
    }
}
