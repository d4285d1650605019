//! Transform helpers for placing primitives and lights.
//!
//! `glam::Affine3A` already carries points and vectors; this adds boxes and
//! normals.

use crate::{Aabb, Vec3};
use glam::Affine3A;

pub trait Affine3Ext {
    /// Box around the eight transformed corners of `aabb`.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// Normals go through the inverse transpose of the linear part.
    fn transform_normal(&self, normal: Vec3) -> Vec3;
}

impl Affine3Ext for Affine3A {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        Aabb::enclosing(aabb.corners().into_iter().map(|c| self.transform_point3(c)))
    }

    fn transform_normal(&self, normal: Vec3) -> Vec3 {
        let linear = glam::Mat3::from(self.matrix3);
        (linear.inverse().transpose() * normal).normalize()
    }
}
