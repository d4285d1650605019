//! lux renderer - Monte-Carlo light transport.
//!
//! Scenes are arenas of primitives and materials addressed by index.
//! A render discovers the scene's lights, optionally builds a BVH over the
//! root primitives and estimates radiance per pixel with one of the
//! integrators, bucket by bucket in parallel.
//!
//! ```no_run
//! use lux_core::RenderSettings;
//! use lux_math::{Color, Vec3};
//! use lux_renderer::{render, AaRect, Camera, DiffuseEmitter, Lambertian, Primitive, Scene};
//!
//! let mut scene = Scene::new();
//! let white = scene.add_material(Lambertian::new(Color::splat(0.7)));
//! let light = scene.add_material(DiffuseEmitter::new(Color::ONE, 4.0));
//! scene.add(Primitive::sphere(Vec3::new(0.0, 0.0, -3.0), 1.0, white));
//! let panel = scene.push(Primitive::rect(AaRect::xz((-1.0, 1.0), (-2.0, 0.0), 3.0), light));
//! scene.add(Primitive::flip_face(panel));
//!
//! let settings = RenderSettings::default();
//! let framebuffer = render(&scene, &Camera::new(), &settings)?;
//! let rgb = framebuffer.to_rgb8(settings.gamma);
//! # Ok::<(), lux_renderer::RenderError>(())
//! ```

pub mod bucket;
pub mod bvh;
pub mod camera;
pub mod error;
pub mod hittable;
pub mod integrator;
pub mod light;
pub mod material;
pub mod medium;
pub mod pdf;
pub mod primitives;
pub mod renderer;
pub mod sampler;
pub mod scene;

#[cfg(test)]
mod test_utils;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult};
pub use bvh::BvhNode;
pub use camera::{Camera, RayGenerator};
pub use error::{RenderError, RenderResult};
pub use hittable::{HitRecord, Hittable};
pub use integrator::{integrator_for, Integrator, PathIntegrator, RenderContext, VolumeIntegrator};
pub use light::{Light, LightList};
pub use material::{
    Conductor, Dielectric, DiffuseEmitter, DisneyPrincipled, Fiber, Isotropic, Lambertian, Material, Mirror,
    Phong, PhongLike, RaySplitDispersion, RoughDielectric, ScatterOptions, ScatterRecord, SimpleDispersion,
    ThinDielectric,
};
pub use medium::{HomogeneousMedium, MediumInterface};
pub use pdf::{MixturePdf, Pdf, ScatterPdf};
pub use primitives::{AaRect, Axis, Primitive, Shape};
pub use renderer::{render, Framebuffer};
pub use sampler::Sampler;
pub use scene::{MaterialId, PrimitiveId, Scene};
