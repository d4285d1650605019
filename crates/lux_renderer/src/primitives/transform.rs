//! Decorators that place a child primitive without copying it.
//!
//! Each decorator holds the child's arena index. The scene follows the chain
//! when intersecting and when turning an emissive primitive into a light.

use super::rect::Axis;
use crate::hittable::HitRecord;
use crate::scene::PrimitiveId;
use lux_math::{Aabb, Affine3A, Affine3Ext, Quat, Ray, Vec3};

#[derive(Clone, Debug)]
pub struct Translate {
    pub child: PrimitiveId,
    pub offset: Vec3,
}

impl Translate {
    pub fn new(child: PrimitiveId, offset: Vec3) -> Self {
        Self { child, offset }
    }

    pub fn to_object(&self, ray: &Ray) -> Ray {
        Ray {
            origin: ray.origin - self.offset,
            ..*ray
        }
    }

    pub fn to_world(&self, mut rec: HitRecord) -> HitRecord {
        rec.p += self.offset;
        rec
    }

    pub fn bounding_box(&self, child: &Aabb) -> Aabb {
        child.translate(self.offset)
    }

    pub fn affine(&self) -> Affine3A {
        Affine3A::from_translation(self.offset)
    }
}

/// Rotation by `angle` radians about a coordinate axis through the origin.
#[derive(Clone, Debug)]
pub struct Rotate {
    pub child: PrimitiveId,
    pub axis: Axis,
    pub angle: f32,
    rotation: Quat,
    inverse: Quat,
}

impl Rotate {
    pub fn new(child: PrimitiveId, axis: Axis, angle: f32) -> Self {
        let rotation = axis.rotation(angle);
        Self {
            child,
            axis,
            angle,
            rotation,
            inverse: rotation.inverse(),
        }
    }

    pub fn to_object(&self, ray: &Ray) -> Ray {
        Ray {
            origin: self.inverse * ray.origin,
            direction: self.inverse * ray.direction,
            ..*ray
        }
    }

    /// Rotating the ray and the surface together keeps the facing, so
    /// `front_face` carries over unchanged.
    pub fn to_world(&self, mut rec: HitRecord) -> HitRecord {
        rec.p = self.rotation * rec.p;
        rec.normal = self.rotation * rec.normal;
        rec.tangent = self.rotation * rec.tangent;
        rec
    }

    pub fn rotate_point(&self, p: Vec3) -> Vec3 {
        self.rotation * p
    }

    pub fn unrotate_point(&self, p: Vec3) -> Vec3 {
        self.inverse * p
    }

    pub fn bounding_box(&self, child: &Aabb) -> Aabb {
        self.affine().transform_aabb(child)
    }

    pub fn affine(&self) -> Affine3A {
        Affine3A::from_quat(self.rotation)
    }
}

/// Swaps which side of the child counts as its front.
#[derive(Clone, Debug)]
pub struct FlipFace {
    pub child: PrimitiveId,
}

impl FlipFace {
    pub fn new(child: PrimitiveId) -> Self {
        Self { child }
    }

    pub fn to_world(&self, mut rec: HitRecord) -> HitRecord {
        rec.front_face = !rec.front_face;
        rec
    }
}
