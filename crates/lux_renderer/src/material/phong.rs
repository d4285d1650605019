//! Phong-style glossy materials.

use std::f32::consts::PI;

use lux_math::sampling::{sample_uniform_sphere, INV_PI};
use lux_math::shading::reflect;
use lux_math::{Color, Ray, Vec2, Vec3};

use super::{BxdfFlags, Material, ScatterOptions, ScatterRecord, TransportMode};
use crate::hittable::HitRecord;
use crate::pdf::{CosinePdf, Pdf, PhongLobePdf, ScatterPdf};

fn average(c: Color) -> f32 {
    (c.x + c.y + c.z) / 3.0
}

/// Energy-normalized modified Phong: a diffuse lobe plus a `cos^n` lobe
/// about the mirror direction, each sampled in proportion to its albedo.
#[derive(Clone, Debug)]
pub struct Phong {
    diffuse: Color,
    specular: Color,
    ambient: Color,
    shininess: f32,
    specular_probability: f32,
}

impl Phong {
    pub fn new(diffuse: Color, specular: Color, ambient: Color, shininess: f32) -> Self {
        let (spec, diff) = (average(specular), average(diffuse));
        let specular_probability = if spec + diff > 0.0 { spec / (spec + diff) } else { 0.0 };
        Self {
            diffuse,
            specular,
            ambient,
            shininess: shininess.max(0.0),
            specular_probability,
        }
    }

    pub fn specular_probability(&self) -> f32 {
        self.specular_probability
    }

    fn pdf(&self, hit: &HitRecord, wo: Vec3) -> ScatterPdf {
        let mirror = reflect(wo, hit.normal);
        ScatterPdf::Weighted(vec![
            (self.specular_probability, PhongLobePdf::new(mirror, self.shininess).into()),
            (1.0 - self.specular_probability, CosinePdf::new(hit.normal).into()),
        ])
    }
}

impl Material for Phong {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        uc: f32,
        u: Vec2,
        options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        if !options.flags.allows_reflection() {
            return None;
        }
        let wo = -ray_in.direction().normalize();
        let pdf = self.pdf(hit, wo);
        let wi = pdf.get(uc, u)?;
        if wi.dot(hit.normal) <= 0.0 {
            return None;
        }
        let pdf_val = pdf.at(wi);
        if pdf_val <= 0.0 {
            return None;
        }
        let f = self.f(wo, wi, hit, options.mode);
        Some(ScatterRecord::continuous(
            hit.spawn_ray(ray_in, wi),
            BxdfFlags::GLOSSY_REFLECTION | BxdfFlags::DIFFUSE_REFLECTION,
            f,
            pdf_val,
            pdf,
        ))
    }

    fn f(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, _mode: TransportMode) -> Color {
        if wo.dot(hit.normal) <= 0.0 || wi.dot(hit.normal) <= 0.0 {
            return Color::ZERO;
        }
        let cos_alpha = reflect(wo, hit.normal).dot(wi).max(0.0);
        let lobe = (self.shininess + 2.0) / (2.0 * PI) * cos_alpha.powf(self.shininess);
        let p = self.specular_probability;
        p * self.specular * lobe + (1.0 - p) * (self.diffuse + self.ambient) * INV_PI
    }

    fn scatter_pdf(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, options: &ScatterOptions) -> f32 {
        if !options.flags.allows_reflection() || wi.dot(hit.normal) <= 0.0 {
            return 0.0;
        }
        self.pdf(hit, wo).at(wi)
    }

    fn name(&self) -> &'static str {
        "phong"
    }
}

/// A stochastic blend of a (possibly blurred) mirror and a diffuse lobe.
/// The mirror branch is taken with probability `specular_probability`.
#[derive(Clone, Debug)]
pub struct PhongLike {
    diffuse: Color,
    specular: Color,
    ambient: Color,
    specular_probability: f32,
    fuzz: f32,
}

impl PhongLike {
    pub fn new(diffuse: Color, specular: Color, ambient: Color, specular_probability: f32, fuzz: f32) -> Self {
        Self {
            diffuse,
            specular,
            ambient,
            specular_probability: specular_probability.clamp(0.0, 1.0),
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }

    fn diffuse_pdf(&self, hit: &HitRecord) -> ScatterPdf {
        ScatterPdf::Scaled(
            1.0 - self.specular_probability,
            Box::new(CosinePdf::new(hit.normal).into()),
        )
    }
}

impl Material for PhongLike {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        uc: f32,
        u: Vec2,
        options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        if !options.flags.allows_reflection() {
            return None;
        }
        let wo = -ray_in.direction().normalize();

        if uc < self.specular_probability {
            let mut wi = reflect(wo, hit.normal);
            if self.fuzz > 0.0 {
                wi = (wi + self.fuzz * sample_uniform_sphere(u)).try_normalize()?;
            }
            if wi.dot(hit.normal) <= 0.0 {
                return None;
            }
            return Some(ScatterRecord::specular(
                hit.spawn_ray(ray_in, wi),
                BxdfFlags::SPECULAR_REFLECTION,
                self.specular + self.ambient,
            ));
        }

        let pdf = self.diffuse_pdf(hit);
        let wi = pdf.get(uc, u)?;
        let pdf_val = pdf.at(wi);
        if pdf_val <= 0.0 {
            return None;
        }
        let f = self.f(wo, wi, hit, options.mode);
        Some(ScatterRecord::continuous(
            hit.spawn_ray(ray_in, wi),
            BxdfFlags::DIFFUSE_REFLECTION,
            f,
            pdf_val,
            pdf,
        ))
    }

    fn f(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, _mode: TransportMode) -> Color {
        if wo.dot(hit.normal) <= 0.0 || wi.dot(hit.normal) <= 0.0 {
            return Color::ZERO;
        }
        (1.0 - self.specular_probability) * (self.diffuse + self.ambient) * INV_PI
    }

    fn scatter_pdf(&self, _wo: Vec3, wi: Vec3, hit: &HitRecord, options: &ScatterOptions) -> f32 {
        if !options.flags.allows_reflection() {
            return 0.0;
        }
        self.diffuse_pdf(hit).at(wi)
    }

    fn name(&self) -> &'static str {
        "phong-like"
    }
}
