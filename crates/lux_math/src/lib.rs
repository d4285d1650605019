//! Geometry and sampling primitives shared by the lux crates.
//!
//! Re-exports `glam` so downstream crates agree on one vector type.

pub use glam::*;

mod aabb;
mod interval;
mod onb;
mod ray;
pub mod sampling;
pub mod shading;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use onb::Onb;
pub use ray::Ray;
pub use transform::Affine3Ext;

/// Linear RGB triple.
pub type Color = Vec3;
