use std::collections::HashMap;

use super::{EnvironmentLight, Light, QuadLight, SphereLight};
use crate::error::{RenderError, RenderResult};
use crate::primitives::Shape;
use crate::scene::{PrimitiveId, Scene};
use lux_math::Vec2;

/// The lights of one render, picked uniformly by the integrators.
#[derive(Clone, Debug, Default)]
pub struct LightList {
    lights: Vec<Light>,
    by_primitive: HashMap<PrimitiveId, usize>,
}

impl LightList {
    pub fn new(lights: Vec<Light>) -> Self {
        let by_primitive = lights
            .iter()
            .enumerate()
            .filter_map(|(i, light)| light.primitive().map(|p| (p, i)))
            .collect();
        Self { lights, by_primitive }
    }

    /// Turn every emissive root of `scene` into a light, plus the scene's
    /// environment if it has one.
    ///
    /// Quads and spheres become area lights with their decorator placement
    /// applied. Other emissive shapes are skipped with a warning, or
    /// rejected when `strict` is set. Emissive curves are always rejected.
    pub fn discover(scene: &Scene, strict: bool) -> RenderResult<Self> {
        let mut lights = Vec::new();

        for &root in scene.roots() {
            let Some(material_id) = scene.material_of(root) else {
                continue;
            };
            let material = scene.material(material_id);
            if !material.is_emitter() {
                continue;
            }
            if material.emission(Vec2::splat(0.5)).max_element() <= 0.0 {
                log::debug!("Primitive {} has a black emitter; not sampled as a light", root.0);
                continue;
            }

            let resolved = scene.resolve(root)?;
            let light = match resolved.shape {
                Shape::Rect(rect) => Light::Quad(QuadLight::from_rect(
                    rect,
                    resolved.transform,
                    resolved.flipped,
                    material_id,
                    root,
                )),
                Shape::Sphere(sphere) => Light::Sphere(SphereLight::from_sphere(
                    sphere,
                    resolved.transform,
                    resolved.flipped,
                    material_id,
                    root,
                )),
                Shape::Curve(_) => return Err(RenderError::CurveLightQuery { primitive: root.0 }),
                other => {
                    if strict {
                        return Err(RenderError::UnsupportedLightShape {
                            primitive: root.0,
                            shape: other.name(),
                        });
                    }
                    log::warn!(
                        "Emissive primitive {} is a {}; it is visible but not sampled as a light",
                        root.0,
                        other.name()
                    );
                    continue;
                }
            };
            lights.push(light);
        }

        if let Some(env) = scene.environment() {
            lights.push(Light::Environment(EnvironmentLight {
                texture: env.texture.clone(),
                intensity: env.intensity,
            }));
        }

        log::debug!("Discovered {} lights", lights.len());
        Ok(Self::new(lights))
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Light> {
        self.lights.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter()
    }

    /// Uniformly chosen light and the probability of choosing it.
    pub fn uniform_pick(&self, u: f32) -> Option<(&Light, f32)> {
        if self.lights.is_empty() {
            return None;
        }
        let n = self.lights.len();
        let index = ((u * n as f32) as usize).min(n - 1);
        Some((&self.lights[index], 1.0 / n as f32))
    }

    /// The light discovered from a scene root.
    pub fn for_primitive(&self, primitive: PrimitiveId) -> Option<&Light> {
        self.by_primitive.get(&primitive).map(|&i| &self.lights[i])
    }

    pub fn environment(&self) -> Option<&Light> {
        self.lights.iter().find(|light| light.is_environment())
    }

    pub fn has_environment(&self) -> bool {
        self.environment().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{DiffuseEmitter, Lambertian};
    use crate::primitives::{AaRect, Axis, Primitive};
    use lux_core::Texture;
    use lux_math::{Color, Vec3};
    use std::sync::Arc;

    #[test]
    fn test_discovers_rect_and_sphere() {
        let mut scene = Scene::new();
        let light = scene.add_material(DiffuseEmitter::new(Color::ONE, 5.0));
        let white = scene.add_material(Lambertian::new(Color::splat(0.5)));
        scene.add(Primitive::sphere(Vec3::ZERO, 1.0, white));
        let rect = scene.add(Primitive::rect(AaRect::xz((0.0, 1.0), (0.0, 1.0), 3.0), light));
        let ball = scene.add(Primitive::sphere(Vec3::new(0.0, 5.0, 0.0), 0.5, light));

        let lights = LightList::discover(&scene, true).unwrap();
        assert_eq!(lights.len(), 2);
        assert_eq!(lights.for_primitive(rect).map(Light::kind), Some("quad"));
        assert_eq!(lights.for_primitive(ball).map(Light::kind), Some("sphere"));
        assert!(!lights.has_environment());
    }

    #[test]
    fn test_decorated_light_is_placed_and_flipped() {
        let mut scene = Scene::new();
        let light = scene.add_material(DiffuseEmitter::new(Color::ONE, 1.0));
        let rect = scene.push(Primitive::rect(AaRect::xz((0.0, 1.0), (0.0, 1.0), 0.0), light));
        let flipped = scene.push(Primitive::flip_face(rect));
        let rotated = scene.push(Primitive::rotate(flipped, Axis::Z, std::f32::consts::PI));
        let placed = scene.add(Primitive::translate(rotated, Vec3::new(0.0, 4.0, 0.0)));

        let lights = LightList::discover(&scene, false).unwrap();
        let quad = lights.for_primitive(placed).unwrap();
        // Flipped to -Y, then turned upside down by the rotation.
        assert!((quad.get_normal_at(Vec3::ZERO) - Vec3::Y).length() < 1e-4);
        let p = quad.get_sample(Vec2::ZERO).p;
        assert!((p.y - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_unsupported_shape_warns_or_fails() {
        let mut scene = Scene::new();
        let light = scene.add_material(DiffuseEmitter::new(Color::ONE, 1.0));
        scene.add(Primitive::cuboid(Vec3::ZERO, Vec3::ONE, light));

        assert!(LightList::discover(&scene, false).unwrap().is_empty());
        assert!(matches!(
            LightList::discover(&scene, true),
            Err(RenderError::UnsupportedLightShape { primitive: 0, shape: "box" })
        ));
    }

    #[test]
    fn test_emissive_curve_rejected() {
        let mut scene = Scene::new();
        let light = scene.add_material(DiffuseEmitter::new(Color::ONE, 1.0));
        let points = [Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0)];
        scene.add(Primitive::curve(points, 0.1, 0.1, light));
        assert!(matches!(
            LightList::discover(&scene, false),
            Err(RenderError::CurveLightQuery { primitive: 0 })
        ));
    }

    #[test]
    fn test_environment_and_uniform_pick() {
        let mut scene = Scene::new();
        let light = scene.add_material(DiffuseEmitter::new(Color::ONE, 1.0));
        scene.add(Primitive::rect(AaRect::xy((0.0, 1.0), (0.0, 1.0), 0.0), light));
        scene.set_environment(Arc::new(Texture::solid_color(Color::ONE)), 1.0);

        let lights = LightList::discover(&scene, false).unwrap();
        assert_eq!(lights.len(), 2);
        assert!(lights.has_environment());
        let (first, pmf) = lights.uniform_pick(0.0).unwrap();
        assert_eq!(first.kind(), "quad");
        assert_eq!(pmf, 0.5);
        assert!(lights.uniform_pick(0.999_999).unwrap().0.is_environment());
        assert!(LightList::default().uniform_pick(0.5).is_none());
    }
}
