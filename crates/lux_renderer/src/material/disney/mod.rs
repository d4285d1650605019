//! Disney Principled BSDF.
//!
//! Based on the 2012 Disney paper "Physically Based Shading at Disney"
//! and the 2015 extension for transmission, clearcoat and sheen. Each lobe
//! is also a [`Material`] of its own.

mod clearcoat;
mod diffuse;
mod glass;
mod metal;
mod sheen;

pub use clearcoat::DisneyClearcoat;
pub use diffuse::DisneyDiffuse;
pub use glass::DisneyGlass;
pub use metal::DisneyMetal;
pub use sheen::DisneySheen;

use lux_math::sampling::sample_discrete;
use lux_math::{Color, Ray, Vec2, Vec3};

use super::{eta_to_r0, luminance, BxdfFlags, Material, ScatterOptions, ScatterRecord, TransportMode};
use crate::hittable::HitRecord;
use crate::pdf::{CosinePdf, Pdf, ScatterPdf};

fn half_vector(wo: Vec3, wi: Vec3) -> Option<Vec3> {
    (wo + wi).try_normalize()
}

/// Hue of `base` with its luminance normalized away.
fn tint(base: Color) -> Color {
    let lum = luminance(base);
    if lum > 0.0 {
        base / lum
    } else {
        Color::ONE
    }
}

/// Cosine-weighted sampling shared by the diffuse-shaped lobes.
fn scatter_cosine(
    material: &dyn Material,
    ray_in: &Ray,
    hit: &HitRecord,
    uc: f32,
    u: Vec2,
    options: &ScatterOptions,
    flags: BxdfFlags,
) -> Option<ScatterRecord> {
    if !options.flags.allows_reflection() {
        return None;
    }
    let pdf = CosinePdf::new(hit.normal);
    let wi = pdf.get(uc, u)?;
    let pdf_val = pdf.at(wi);
    if pdf_val <= 0.0 {
        return None;
    }
    let wo = -ray_in.direction().normalize();
    let f = material.f(wo, wi, hit, options.mode);
    Some(ScatterRecord::continuous(hit.spawn_ray(ray_in, wi), flags, f, pdf_val, pdf.into()))
}

/// Disney Principled BSDF material.
///
/// A physically-based material with intuitive artist-friendly parameters,
/// blending diffuse, metal, glass, clearcoat and sheen lobes.
///
/// A back-face hit counts as inside the object, and from inside only the
/// glass lobe scatters, whatever the lobe weights. Opaque settings on
/// open geometry, such as a one-sided [`AaRect`](crate::AaRect) seen from
/// behind, therefore transmit light. Close the surface or wrap it in
/// [`Primitive::flip_face`](crate::Primitive::flip_face) to keep it opaque.
#[derive(Clone, Debug)]
pub struct DisneyPrincipled {
    /// Base color (albedo for dielectrics, reflectance for metals)
    pub base_color: Color,

    /// Metallic: 0 = dielectric, 1 = metal
    pub metallic: f32,

    /// Roughness: 0 = smooth/glossy, 1 = rough/diffuse
    pub roughness: f32,

    /// Specular: scales the dielectric Fresnel reflectance at normal incidence
    pub specular: f32,

    /// Specular tint: tints the dielectric specular towards base_color
    pub specular_tint: f32,

    /// Specular transmission: 0 = opaque, 1 = glass
    pub specular_transmission: f32,

    /// Sheen: additional grazing component for cloth-like materials
    pub sheen: f32,

    /// Sheen tint: tints the sheen towards base_color
    pub sheen_tint: f32,

    /// Clearcoat: second specular lobe for car paint, lacquered wood
    pub clearcoat: f32,

    /// Clearcoat gloss: 0 = satin, 1 = gloss
    pub clearcoat_gloss: f32,

    /// Subsurface: blend to subsurface approximation
    pub subsurface: f32,

    /// Anisotropic: aspect ratio for anisotropic reflection
    pub anisotropic: f32,

    /// Index of refraction of the dielectric and glass lobes
    pub eta: f32,
}

impl Default for DisneyPrincipled {
    fn default() -> Self {
        Self {
            base_color: Color::new(0.8, 0.8, 0.8),
            metallic: 0.0,
            roughness: 0.5,
            specular: 0.5,
            specular_tint: 0.0,
            specular_transmission: 0.0,
            sheen: 0.0,
            sheen_tint: 0.5,
            clearcoat: 0.0,
            clearcoat_gloss: 1.0,
            subsurface: 0.0,
            anisotropic: 0.0,
            eta: 1.5,
        }
    }
}

/// The lobes of one parameter set.
struct Lobes {
    diffuse: DisneyDiffuse,
    metal: DisneyMetal,
    glass: DisneyGlass,
    clearcoat: DisneyClearcoat,
    sheen: DisneySheen,
}

impl DisneyPrincipled {
    /// Create a new Disney BSDF with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a simple diffuse material.
    pub fn diffuse(color: Color) -> Self {
        Self {
            base_color: color,
            metallic: 0.0,
            roughness: 1.0,
            specular: 0.0,
            ..Default::default()
        }
    }

    /// Create a metallic material.
    pub fn metal(color: Color, roughness: f32) -> Self {
        Self {
            base_color: color,
            metallic: 1.0,
            roughness,
            specular: 1.0,
            ..Default::default()
        }
    }

    /// Create a glossy plastic-like material.
    pub fn plastic(color: Color, roughness: f32) -> Self {
        Self {
            base_color: color,
            metallic: 0.0,
            roughness,
            specular: 0.5,
            ..Default::default()
        }
    }

    /// Create a transmissive glass-like material.
    pub fn glass(color: Color, roughness: f32, eta: f32) -> Self {
        Self {
            base_color: color,
            roughness,
            specular_transmission: 1.0,
            eta,
            ..Default::default()
        }
    }

    /// Builder method to set base color.
    pub fn with_base_color(mut self, color: Color) -> Self {
        self.base_color = color;
        self
    }

    /// Builder method to set metallic.
    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic.clamp(0.0, 1.0);
        self
    }

    /// Builder method to set roughness.
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    /// Builder method to set specular.
    pub fn with_specular(mut self, specular: f32) -> Self {
        self.specular = specular.clamp(0.0, 1.0);
        self
    }

    pub fn with_specular_transmission(mut self, amount: f32) -> Self {
        self.specular_transmission = amount.clamp(0.0, 1.0);
        self
    }

    pub fn with_clearcoat(mut self, amount: f32, gloss: f32) -> Self {
        self.clearcoat = amount.max(0.0);
        self.clearcoat_gloss = gloss.clamp(0.0, 1.0);
        self
    }

    pub fn with_sheen(mut self, amount: f32, tint: f32) -> Self {
        self.sheen = amount.max(0.0);
        self.sheen_tint = tint.clamp(0.0, 1.0);
        self
    }

    pub fn with_subsurface(mut self, subsurface: f32) -> Self {
        self.subsurface = subsurface.clamp(0.0, 1.0);
        self
    }

    pub fn with_anisotropic(mut self, anisotropic: f32) -> Self {
        self.anisotropic = anisotropic.clamp(0.0, 1.0);
        self
    }

    fn lobes(&self) -> Lobes {
        Lobes {
            diffuse: DisneyDiffuse::new(self.base_color, self.roughness, self.subsurface),
            metal: DisneyMetal::new(self.base_color, self.roughness, self.anisotropic),
            glass: DisneyGlass::new(self.base_color, self.roughness, self.anisotropic, self.eta),
            clearcoat: DisneyClearcoat::new(self.clearcoat_gloss),
            sheen: DisneySheen::new(self.base_color, self.sheen_tint),
        }
    }

    /// Sampling weights of the diffuse, metal, glass and clearcoat lobes.
    /// They also scale each lobe in `f`.
    pub fn lobe_weights(&self) -> [f32; 4] {
        let (m, st) = (self.metallic, self.specular_transmission);
        [
            (1.0 - m) * (1.0 - st),
            1.0 - st * (1.0 - m),
            (1.0 - m) * st,
            0.25 * self.clearcoat,
        ]
    }

    /// Sheen adds to `f` but is never sampled on its own.
    fn sheen_weight(&self) -> f32 {
        (1.0 - self.metallic) * self.sheen
    }

    /// Normal-incidence reflectance of the metal lobe: a dielectric
    /// highlight for `metallic = 0`, the base colour for `metallic = 1`.
    fn metal_f0(&self) -> Color {
        let ks = Color::ONE.lerp(self.base_color, self.specular_tint);
        self.specular * eta_to_r0(self.eta) * (1.0 - self.metallic) * ks + self.metallic * self.base_color
    }

    /// Only the glass lobe is reachable from inside, or when reflection is
    /// masked off.
    fn glass_only(&self, hit: &HitRecord, options: &ScatterOptions) -> bool {
        hit.is_inside() || !options.flags.allows_reflection()
    }

    fn glass_reachable(&self, hit: &HitRecord, options: &ScatterOptions) -> bool {
        hit.is_inside() || (options.flags.allows_transmission() && self.lobe_weights()[2] > 0.0)
    }

    /// One-sample mixture over the continuous lobes, scaled by the chance
    /// that a continuous lobe was picked at all.
    fn mixture_pdf(&self, lobes: &Lobes, hit: &HitRecord, wo: Vec3, options: &ScatterOptions) -> Option<ScatterPdf> {
        let weights = self.lobe_weights();
        let total: f32 = weights.iter().sum();
        if total <= 0.0 {
            return None;
        }
        let [diffuse, metal, glass, clearcoat] = weights;
        let mut parts: Vec<(f32, ScatterPdf)> = Vec::with_capacity(4);
        if diffuse > 0.0 {
            parts.push((diffuse, CosinePdf::new(hit.normal).into()));
        }
        if metal > 0.0 && !lobes.metal.is_smooth() {
            parts.push((metal, lobes.metal.pdf(hit, wo, options).into()));
        }
        if glass > 0.0 && !lobes.glass.is_smooth() {
            parts.push((glass, lobes.glass.pdf(hit, wo, options).into()));
        }
        if clearcoat > 0.0 {
            parts.push((clearcoat, lobes.clearcoat.pdf(hit, wo, options).into()));
        }
        if parts.is_empty() {
            return None;
        }
        let continuous: f32 = parts.iter().map(|(w, _)| w).sum();
        Some(ScatterPdf::Scaled(continuous / total, Box::new(ScatterPdf::Weighted(parts))))
    }
}

impl Material for DisneyPrincipled {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        uc: f32,
        u: Vec2,
        options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        let lobes = self.lobes();
        if self.glass_only(hit, options) {
            if !self.glass_reachable(hit, options) {
                return None;
            }
            return lobes.glass.scatter(ray_in, hit, uc, u, options);
        }

        let weights = self.lobe_weights();
        let (index, _, uc) = sample_discrete(&weights, uc)?;
        let mut rec = match index {
            0 => lobes.diffuse.scatter(ray_in, hit, uc, u, options),
            1 => lobes.metal.scatter_with_f0(ray_in, hit, u, options, self.metal_f0()),
            2 => lobes.glass.scatter(ray_in, hit, uc, u, options),
            _ => lobes.clearcoat.scatter(ray_in, hit, uc, u, options),
        }?;

        if rec.is_specular() {
            // A delta lobe carries weight w_i, picked with probability
            // w_i / total.
            rec.attenuation *= weights.iter().sum::<f32>();
            return Some(rec);
        }

        let wo = -ray_in.direction().normalize();
        let wi = rec.ray.direction.normalize();
        let pdf = self.mixture_pdf(&lobes, hit, wo, options)?;
        let pdf_val = pdf.at(wi);
        if pdf_val <= 0.0 {
            return None;
        }
        rec.attenuation = self.f(wo, wi, hit, options.mode);
        rec.pdf_val = pdf_val;
        rec.pdf = Some(pdf);
        Some(rec)
    }

    fn f(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, mode: TransportMode) -> Color {
        let lobes = self.lobes();
        if hit.is_inside() {
            return lobes.glass.f(wo, wi, hit, mode);
        }
        let [diffuse, metal, glass, clearcoat] = self.lobe_weights();
        let mut f = Color::ZERO;
        if diffuse > 0.0 {
            f += diffuse * lobes.diffuse.f(wo, wi, hit, mode);
        }
        if metal > 0.0 {
            f += metal * lobes.metal.f_with_f0(wo, wi, hit, self.metal_f0());
        }
        if glass > 0.0 {
            f += glass * lobes.glass.f(wo, wi, hit, mode);
        }
        if clearcoat > 0.0 {
            f += clearcoat * lobes.clearcoat.f(wo, wi, hit, mode);
        }
        let sheen = self.sheen_weight();
        if sheen > 0.0 {
            f += sheen * lobes.sheen.f(wo, wi, hit, mode);
        }
        f
    }

    fn scatter_pdf(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, options: &ScatterOptions) -> f32 {
        let lobes = self.lobes();
        if self.glass_only(hit, options) {
            if !self.glass_reachable(hit, options) {
                return 0.0;
            }
            return lobes.glass.scatter_pdf(wo, wi, hit, options);
        }
        self.mixture_pdf(&lobes, hit, wo, options)
            .map_or(0.0, |pdf| pdf.at(wi))
    }

    fn name(&self) -> &'static str {
        "disney principled"
    }
}
