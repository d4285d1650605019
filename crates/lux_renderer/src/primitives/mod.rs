//! Geometric primitives and the shape tagged union the scene stores.

mod cuboid;
mod curve;
mod mesh;
mod mesh_bvh;
mod rect;
mod sphere;
mod transform;

pub use cuboid::Cuboid;
pub use curve::Curve;
pub use mesh::TriangleMesh;
pub use mesh_bvh::{hit_triangle, MeshBvhNode, TriangleHit};
pub use rect::{AaRect, Axis};
pub use sphere::Sphere;
pub use transform::{FlipFace, Rotate, Translate};

use crate::error::RenderResult;
use crate::medium::MediumInterface;
use crate::scene::{MaterialId, PrimitiveId};
use lux_core::Mesh;
use lux_math::Vec3;

/// Every kind of geometry the scene can hold.
pub enum Shape {
    Sphere(Sphere),
    Rect(AaRect),
    Mesh(TriangleMesh),
    Cuboid(Cuboid),
    Curve(Curve),
    Translate(Translate),
    Rotate(Rotate),
    FlipFace(FlipFace),
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Sphere(_) => "sphere",
            Shape::Rect(_) => "rectangle",
            Shape::Mesh(_) => "triangle mesh",
            Shape::Cuboid(_) => "box",
            Shape::Curve(_) => "curve",
            Shape::Translate(_) => "translate",
            Shape::Rotate(_) => "rotate",
            Shape::FlipFace(_) => "flip-face",
        }
    }

    /// The wrapped primitive, for decorators.
    pub fn child(&self) -> Option<PrimitiveId> {
        match self {
            Shape::Translate(t) => Some(t.child),
            Shape::Rotate(r) => Some(r.child),
            Shape::FlipFace(f) => Some(f.child),
            _ => None,
        }
    }
}

/// A shape plus what it is made of. Decorators take material and medium
/// from the primitive they wrap.
pub struct Primitive {
    pub shape: Shape,
    pub material: Option<MaterialId>,
    pub medium: Option<MediumInterface>,
}

impl Primitive {
    pub fn new(shape: Shape, material: MaterialId) -> Self {
        Self {
            shape,
            material: Some(material),
            medium: None,
        }
    }

    pub fn with_medium(mut self, medium: MediumInterface) -> Self {
        self.medium = Some(medium);
        self
    }

    pub fn sphere(center: Vec3, radius: f32, material: MaterialId) -> Self {
        Self::new(Shape::Sphere(Sphere::new(center, radius)), material)
    }

    pub fn rect(rect: AaRect, material: MaterialId) -> Self {
        Self::new(Shape::Rect(rect), material)
    }

    pub fn cuboid(a: Vec3, b: Vec3, material: MaterialId) -> Self {
        Self::new(Shape::Cuboid(Cuboid::new(a, b)), material)
    }

    pub fn curve(control_points: [Vec3; 4], width0: f32, width1: f32, material: MaterialId) -> Self {
        Self::new(Shape::Curve(Curve::new(control_points, width0, width1)), material)
    }

    pub fn mesh(mesh: Mesh, material: MaterialId) -> RenderResult<Self> {
        Ok(Self::new(Shape::Mesh(TriangleMesh::new(mesh)?), material))
    }

    fn decorator(shape: Shape) -> Self {
        Self {
            shape,
            material: None,
            medium: None,
        }
    }

    pub fn translate(child: PrimitiveId, offset: Vec3) -> Self {
        Self::decorator(Shape::Translate(Translate::new(child, offset)))
    }

    pub fn rotate(child: PrimitiveId, axis: Axis, angle: f32) -> Self {
        Self::decorator(Shape::Rotate(Rotate::new(child, axis, angle)))
    }

    pub fn flip_face(child: PrimitiveId) -> Self {
        Self::decorator(Shape::FlipFace(FlipFace::new(child)))
    }
}
