//! The scene arena: primitives, materials and media addressed by index.
//!
//! Primitives live in one `Vec`; decorators refer to their child by
//! [`PrimitiveId`]. Only *root* primitives are intersected directly (and
//! placed in the BVH); children are reached through their decorators.

use std::sync::Arc;

use crate::error::{RenderError, RenderResult};
use crate::hittable::{HitRecord, Hittable};
use crate::material::Material;
use crate::medium::HomogeneousMedium;
use crate::primitives::{Primitive, Shape};
use lux_core::Texture;
use lux_math::sampling::{sample_uniform_sphere, uniform_sphere_pdf};
use lux_math::{Aabb, Affine3A, Color, Interval, Ray, Vec2, Vec3};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(pub usize);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub usize);

/// An image-based environment surrounding the scene.
#[derive(Clone, Debug)]
pub struct Environment {
    pub texture: Arc<Texture>,
    pub intensity: f32,
}

/// Geometry of an emitter after resolving its decorator chain.
pub struct ResolvedShape<'a> {
    /// The undecorated shape at the end of the chain
    pub base: PrimitiveId,
    pub shape: &'a Shape,
    /// Object-to-world placement accumulated from the decorators
    pub transform: Affine3A,
    /// An odd number of face flips along the chain
    pub flipped: bool,
}

#[derive(Default)]
pub struct Scene {
    primitives: Vec<Primitive>,
    roots: Vec<PrimitiveId>,
    materials: Vec<Arc<dyn Material>>,
    media: Vec<HomogeneousMedium>,
    global_medium: Option<usize>,
    environment: Option<Environment>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_material(&mut self, material: impl Material + 'static) -> MaterialId {
        self.materials.push(Arc::new(material));
        MaterialId(self.materials.len() - 1)
    }

    pub fn add_medium(&mut self, medium: HomogeneousMedium) -> usize {
        self.media.push(medium);
        self.media.len() - 1
    }

    /// Medium that fills space outside every closed surface.
    pub fn set_global_medium(&mut self, medium: Option<usize>) {
        self.global_medium = medium;
    }

    pub fn set_environment(&mut self, texture: Arc<Texture>, intensity: f32) {
        self.environment = Some(Environment { texture, intensity });
    }

    /// Store a primitive without making it directly visible, e.g. as the
    /// child of a decorator.
    pub fn push(&mut self, primitive: Primitive) -> PrimitiveId {
        self.primitives.push(primitive);
        PrimitiveId(self.primitives.len() - 1)
    }

    /// Store a primitive and make it a root of the scene.
    pub fn add(&mut self, primitive: Primitive) -> PrimitiveId {
        let id = self.push(primitive);
        self.roots.push(id);
        id
    }

    pub fn primitive(&self, id: PrimitiveId) -> &Primitive {
        &self.primitives[id.0]
    }

    pub fn material(&self, id: MaterialId) -> &dyn Material {
        self.materials[id.0].as_ref()
    }

    pub fn medium(&self, index: usize) -> Option<&HomogeneousMedium> {
        self.media.get(index)
    }

    pub fn global_medium(&self) -> Option<usize> {
        self.global_medium
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    pub fn roots(&self) -> &[PrimitiveId] {
        &self.roots
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Check every index the arena holds before a render starts.
    pub fn validate(&self) -> RenderResult<()> {
        if self.roots.is_empty() {
            return Err(RenderError::EmptyScene);
        }
        for (i, primitive) in self.primitives.iter().enumerate() {
            let invalid = |reason: String| RenderError::InvalidPrimitive { primitive: i, reason };
            if let Some(material) = primitive.material {
                if material.0 >= self.materials.len() {
                    return Err(invalid(format!("material {} does not exist", material.0)));
                }
            }
            if let Some(interface) = primitive.medium {
                for medium in [interface.inside, interface.outside].into_iter().flatten() {
                    if medium >= self.media.len() {
                        return Err(invalid(format!("medium {} does not exist", medium)));
                    }
                }
            }
            self.underlying_shape(PrimitiveId(i))?;
        }
        if let Some(medium) = self.global_medium {
            if medium >= self.media.len() {
                return Err(RenderError::InvalidPrimitive {
                    primitive: usize::MAX,
                    reason: format!("global medium {} does not exist", medium),
                });
            }
        }
        Ok(())
    }

    /// Follow decorators down to the geometric shape they wrap.
    pub fn underlying_shape(&self, id: PrimitiveId) -> RenderResult<PrimitiveId> {
        Ok(self.resolve(id)?.base)
    }

    /// Follow decorators down to the base shape, accumulating the placement.
    pub fn resolve(&self, id: PrimitiveId) -> RenderResult<ResolvedShape<'_>> {
        let mut current = id;
        let mut transform = Affine3A::IDENTITY;
        let mut flipped = false;

        for _ in 0..=self.primitives.len() {
            let primitive = self.primitives.get(current.0).ok_or_else(|| RenderError::InvalidPrimitive {
                primitive: id.0,
                reason: format!("refers to missing primitive {}", current.0),
            })?;
            match &primitive.shape {
                Shape::Translate(t) => {
                    transform = transform * t.affine();
                    current = t.child;
                }
                Shape::Rotate(r) => {
                    transform = transform * r.affine();
                    current = r.child;
                }
                Shape::FlipFace(f) => {
                    flipped = !flipped;
                    current = f.child;
                }
                shape => {
                    return Ok(ResolvedShape {
                        base: current,
                        shape,
                        transform,
                        flipped,
                    })
                }
            }
        }

        Err(RenderError::InvalidPrimitive {
            primitive: id.0,
            reason: "decorator chain forms a cycle".to_string(),
        })
    }

    /// Material a primitive is drawn with, looking through decorators.
    pub fn material_of(&self, id: PrimitiveId) -> Option<MaterialId> {
        let mut current = id;
        for _ in 0..=self.primitives.len() {
            let primitive = self.primitives.get(current.0)?;
            if primitive.material.is_some() {
                return primitive.material;
            }
            current = primitive.shape.child()?;
        }
        None
    }

    pub fn bounding_box(&self, id: PrimitiveId) -> Aabb {
        match &self.primitives[id.0].shape {
            Shape::Sphere(s) => s.bounding_box(),
            Shape::Rect(r) => r.bounding_box(),
            Shape::Mesh(m) => m.bounding_box(),
            Shape::Cuboid(c) => c.bounding_box(),
            Shape::Curve(c) => c.bounding_box(),
            Shape::Translate(t) => t.bounding_box(&self.bounding_box(t.child)),
            Shape::Rotate(r) => r.bounding_box(&self.bounding_box(r.child)),
            Shape::FlipFace(f) => self.bounding_box(f.child),
        }
    }

    /// Intersect one primitive (and whatever it decorates).
    pub fn hit_primitive(&self, id: PrimitiveId, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let primitive = &self.primitives[id.0];
        let rec = match &primitive.shape {
            Shape::Sphere(s) => s.hit(ray, ray_t),
            Shape::Rect(r) => r.hit(ray, ray_t),
            Shape::Mesh(m) => m.hit(ray, ray_t),
            Shape::Cuboid(c) => c.hit(ray, ray_t),
            Shape::Curve(c) => c.hit(ray, ray_t),
            Shape::Translate(t) => {
                return self
                    .hit_primitive(t.child, &t.to_object(ray), ray_t)
                    .map(|rec| t.to_world(rec))
            }
            Shape::Rotate(r) => {
                return self
                    .hit_primitive(r.child, &r.to_object(ray), ray_t)
                    .map(|rec| r.to_world(rec))
            }
            Shape::FlipFace(f) => {
                return self.hit_primitive(f.child, ray, ray_t).map(|rec| f.to_world(rec))
            }
        };
        rec.map(|mut rec| {
            rec.material = primitive.material.unwrap_or_default();
            rec.medium = primitive.medium;
            rec.primitive = id;
            rec
        })
    }

    /// Intersect a root primitive; the record names the root.
    pub fn hit_root(&self, id: PrimitiveId, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        self.hit_primitive(id, ray, ray_t).map(|mut rec| {
            rec.primitive = id;
            rec
        })
    }

    /// Closest hit by testing every root in turn.
    pub fn hit_brute_force(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let mut closest = None;
        let mut interval = ray_t;
        for &id in &self.roots {
            if let Some(rec) = self.hit_root(id, ray, interval) {
                interval = interval.with_max(rec.t);
                closest = Some(rec);
            }
        }
        closest
    }

    /// Solid-angle density of sampling `direction` from `origin` toward a
    /// primitive. Shapes without a targeted sampler fall back to the
    /// uniform sphere.
    pub fn pdf_value(&self, id: PrimitiveId, origin: Vec3, direction: Vec3) -> f32 {
        match &self.primitives[id.0].shape {
            Shape::Sphere(s) => s.pdf_value(origin, direction),
            Shape::Rect(r) => r.pdf_value(origin, direction),
            Shape::Translate(t) => self.pdf_value(t.child, origin - t.offset, direction),
            Shape::Rotate(r) => {
                self.pdf_value(r.child, r.unrotate_point(origin), r.unrotate_point(direction))
            }
            Shape::FlipFace(f) => self.pdf_value(f.child, origin, direction),
            Shape::Mesh(_) | Shape::Cuboid(_) | Shape::Curve(_) => uniform_sphere_pdf(),
        }
    }

    /// Direction from `origin` toward a sampled point of a primitive.
    pub fn sample_direction(&self, id: PrimitiveId, origin: Vec3, u: Vec2) -> Vec3 {
        match &self.primitives[id.0].shape {
            Shape::Sphere(s) => s.sample_direction(origin, u),
            Shape::Rect(r) => r.sample_direction(origin, u),
            Shape::Translate(t) => self.sample_direction(t.child, origin - t.offset, u),
            Shape::Rotate(r) => r.rotate_point(self.sample_direction(r.child, r.unrotate_point(origin), u)),
            Shape::FlipFace(f) => self.sample_direction(f.child, origin, u),
            Shape::Mesh(_) | Shape::Cuboid(_) | Shape::Curve(_) => sample_uniform_sphere(u),
        }
    }

    /// Radiance arriving from the environment along `direction`, or
    /// `background` when there is none.
    pub fn environment_radiance(&self, direction: Vec3, background: Color) -> Color {
        match &self.environment {
            Some(env) => {
                let uv = crate::light::direction_to_equirect(direction);
                env.texture.sample(uv.x, uv.y) * env.intensity
            }
            None => background,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Lambertian;
    use crate::primitives::{AaRect, Axis};

    fn scene_with_box() -> (Scene, PrimitiveId) {
        let mut scene = Scene::new();
        let white = scene.add_material(Lambertian::new(Color::splat(0.73)));
        let cuboid = scene.push(Primitive::cuboid(Vec3::ZERO, Vec3::ONE, white));
        let rotated = scene.push(Primitive::rotate(cuboid, Axis::Y, 0.5));
        let placed = scene.add(Primitive::translate(rotated, Vec3::new(5.0, 0.0, 0.0)));
        (scene, placed)
    }

    #[test]
    fn test_underlying_shape_follows_chain() {
        let (scene, placed) = scene_with_box();
        assert_eq!(scene.underlying_shape(placed).unwrap(), PrimitiveId(0));
        assert_eq!(scene.material_of(placed), Some(MaterialId(0)));
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_decorated_hit_reports_root() {
        let (scene, placed) = scene_with_box();
        let ray = Ray::new(Vec3::new(5.3, 0.5, 10.0), Vec3::NEG_Z);
        let rec = scene.hit_brute_force(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert_eq!(rec.primitive, placed);
        assert_eq!(rec.material, MaterialId(0));
        assert!(rec.front_face);
    }

    #[test]
    fn test_cycle_detected() {
        let mut scene = Scene::new();
        scene.add(Primitive::flip_face(PrimitiveId(0)));
        assert!(matches!(
            scene.validate(),
            Err(RenderError::InvalidPrimitive { .. })
        ));
    }

    #[test]
    fn test_empty_scene_rejected() {
        assert!(matches!(Scene::new().validate(), Err(RenderError::EmptyScene)));
    }

    #[test]
    fn test_dangling_material_rejected() {
        let mut scene = Scene::new();
        scene.add(Primitive::sphere(Vec3::ZERO, 1.0, MaterialId(4)));
        assert!(matches!(
            scene.validate(),
            Err(RenderError::InvalidPrimitive { primitive: 0, .. })
        ));
    }

    #[test]
    fn test_resolve_accumulates_transform() {
        let mut scene = Scene::new();
        let light = scene.add_material(Lambertian::new(Color::ONE));
        let rect = scene.push(Primitive::rect(AaRect::xz((0.0, 1.0), (0.0, 1.0), 0.0), light));
        let flipped = scene.push(Primitive::flip_face(rect));
        let moved = scene.add(Primitive::translate(flipped, Vec3::new(0.0, 2.0, 0.0)));

        let resolved = scene.resolve(moved).unwrap();
        assert_eq!(resolved.base, rect);
        assert!(resolved.flipped);
        let p = resolved.transform.transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_translated_pdf_matches_untranslated() {
        let mut scene = Scene::new();
        let m = scene.add_material(Lambertian::new(Color::ONE));
        let base = scene.add(Primitive::sphere(Vec3::ZERO, 1.0, m));
        let child = scene.push(Primitive::sphere(Vec3::ZERO, 1.0, m));
        let moved = scene.add(Primitive::translate(child, Vec3::new(0.0, 0.0, -3.0)));

        let direct = scene.pdf_value(base, Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z);
        let through = scene.pdf_value(moved, Vec3::ZERO, Vec3::NEG_Z);
        assert!((direct - through).abs() < 1e-4);
    }
}
