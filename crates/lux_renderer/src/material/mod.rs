//! Surface and volume scattering models.
//!
//! Every model implements [`Material`]. Directions handed to `f` and
//! `scatter_pdf` are world-space unit vectors pointing away from the hit:
//! `wo` toward where the ray came from, `wi` toward where light arrives.
//! Shading happens in a local frame whose `w` axis is `hit.normal`, which
//! always faces the incoming ray.

mod conductor;
mod disney;
mod dispersion;
mod emitter;
mod fiber;
mod flags;
mod fresnel;
mod isotropic;
mod lambertian;
mod microfacet;
mod phong;
mod rough_dielectric;
mod specular;

use std::sync::Arc;

pub use conductor::Conductor;
pub use disney::{DisneyClearcoat, DisneyDiffuse, DisneyGlass, DisneyMetal, DisneyPrincipled, DisneySheen};
pub use dispersion::{RaySplitDispersion, SimpleDispersion};
pub use emitter::DiffuseEmitter;
pub use fiber::{Fiber, FiberLobes};
pub use flags::{
    BxdfFlags, BxdfReflTransFlags, RejectionPolicy, RejectionTally, ScatterOptions, ScatterRecord, SplitRays,
    TransportMode,
};
pub use fresnel::{eta_to_r0, fresnel_complex, fresnel_dielectric, fresnel_schlick, schlick_weight_to};
pub use isotropic::Isotropic;
pub use lambertian::Lambertian;
pub use microfacet::{ClearcoatDistribution, TrowbridgeReitz};
pub use phong::{Phong, PhongLike};
pub use rough_dielectric::RoughDielectric;
pub use specular::{Dielectric, Mirror, ThinDielectric};

use crate::hittable::HitRecord;
use lux_core::Texture;
use lux_math::{Color, Ray, Vec2, Vec3};

/// The scattering contract shared by every surface and volume model.
///
/// Materials are immutable once built and shared across worker threads, so
/// all randomness arrives through the `uc`/`u` arguments.
pub trait Material: Send + Sync {
    /// Samples an outgoing direction. `None` means the path is absorbed.
    fn scatter(
        &self,
        _ray_in: &Ray,
        _hit: &HitRecord,
        _uc: f32,
        _u: Vec2,
        _options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        None
    }

    /// BSDF value for an explicit direction pair. Delta lobes contribute
    /// nothing here.
    fn f(&self, _wo: Vec3, _wi: Vec3, _hit: &HitRecord, _mode: TransportMode) -> Color {
        Color::ZERO
    }

    /// Solid-angle density with which `scatter` produces `wi`.
    fn scatter_pdf(&self, _wo: Vec3, _wi: Vec3, _hit: &HitRecord, _options: &ScatterOptions) -> f32 {
        0.0
    }

    /// Radiance leaving the surface toward the ray origin.
    fn emit(&self, _ray_in: &Ray, _hit: &HitRecord) -> Color {
        Color::ZERO
    }

    /// Radiance emitted from the front side at texture coordinate `uv`,
    /// regardless of viewing direction. Lights sample this.
    fn emission(&self, _uv: Vec2) -> Color {
        Color::ZERO
    }

    fn is_emitter(&self) -> bool {
        false
    }

    /// Phase functions scatter in all directions and take no cosine factor.
    fn is_volumetric(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str;
}

/// A colour that is either constant or looked up in a texture.
#[derive(Clone, Debug)]
pub enum Albedo {
    Solid(Color),
    Texture(Arc<Texture>),
}

impl Albedo {
    pub fn value(&self, uv: Vec2) -> Color {
        match self {
            Albedo::Solid(color) => *color,
            Albedo::Texture(texture) => texture.sample(uv.x, uv.y),
        }
    }
}

impl From<Color> for Albedo {
    fn from(color: Color) -> Self {
        Albedo::Solid(color)
    }
}

impl From<Arc<Texture>> for Albedo {
    fn from(texture: Arc<Texture>) -> Self {
        Albedo::Texture(texture)
    }
}

/// Rec. 709 luminance.
pub fn luminance(color: Color) -> f32 {
    color.dot(Color::new(0.2126, 0.7152, 0.0722))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_albedo_texture_lookup() {
        let texture = Texture::new(
            2,
            1,
            vec![Color::new(1.0, 0.0, 0.0), Color::new(0.0, 0.0, 1.0)],
            "stripes",
        )
        .unwrap();
        let albedo = Albedo::from(Arc::new(texture));
        let solid = Albedo::from(Color::splat(0.5));
        assert_eq!(solid.value(Vec2::new(0.9, 0.1)), Color::splat(0.5));
        assert!(albedo.value(Vec2::new(0.0, 0.5)).x > 0.5);
    }

    #[test]
    fn test_luminance_of_white_is_one() {
        assert!((luminance(Color::ONE) - 1.0).abs() < 1e-6);
    }
}
