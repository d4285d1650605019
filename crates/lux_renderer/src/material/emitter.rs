use std::sync::Arc;

use lux_core::Texture;
use lux_math::{Color, Ray, Vec2};

use super::{Albedo, Material};
use crate::hittable::HitRecord;

/// One-sided area emitter. Radiance leaves only through the side the
/// outward normal points to; the back face is black.
#[derive(Clone, Debug)]
pub struct DiffuseEmitter {
    color: Albedo,
    intensity: f32,
}

impl DiffuseEmitter {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color: Albedo::Solid(color),
            intensity,
        }
    }

    pub fn textured(texture: Arc<Texture>, intensity: f32) -> Self {
        Self {
            color: Albedo::Texture(texture),
            intensity,
        }
    }
}

impl Material for DiffuseEmitter {
    fn emit(&self, _ray_in: &Ray, hit: &HitRecord) -> Color {
        if !hit.front_face {
            return Color::ZERO;
        }
        self.emission(hit.uv)
    }

    fn emission(&self, uv: Vec2) -> Color {
        self.color.value(uv) * self.intensity
    }

    fn is_emitter(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "diffuse emitter"
    }
}
