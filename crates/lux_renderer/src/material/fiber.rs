//! Marschner-style hair scattering with the azimuthal and longitudinal
//! lobe decomposition of d'Eon et al. and the energy-conserving residual
//! term of Chiang et al.
//!
//! The local frame puts `x` along the fiber and `z` along the surface
//! normal, so `wo.x` is `sin(theta_o)` and the azimuth is measured in the
//! `yz` plane.

use std::f32::consts::{PI, TAU};

use lux_math::sampling::{sample_discrete, sample_trimmed_logistic, trimmed_logistic};
use lux_math::shading::{safe_asin, safe_sqrt, sqr};
use lux_math::{Color, Onb, Ray, Vec2, Vec3};

use super::{fresnel_dielectric, BxdfFlags, Material, ScatterOptions, ScatterRecord, TransportMode};
use crate::hittable::HitRecord;
use crate::pdf::{FiberPdf, Pdf};

/// Number of explicitly modelled bounces: `R`, `TT` and `TRT`. Index
/// `P_MAX` holds the residual of all longer paths.
const P_MAX: usize = 3;

const SQRT_PI_OVER_8: f32 = 0.626_657_07;

/// Modified Bessel function of the first kind, order zero.
fn i0(x: f32) -> f32 {
    let mut val = 0.0;
    let mut x2i = 1.0;
    let mut ifact = 1.0f32;
    let mut i4 = 1.0;
    for i in 0..10 {
        if i > 1 {
            ifact *= i as f32;
        }
        val += x2i / (i4 * sqr(ifact));
        x2i *= x * x;
        i4 *= 4.0;
    }
    val
}

fn log_i0(x: f32) -> f32 {
    if x > 12.0 {
        x + 0.5 * (-(TAU).ln() + (1.0 / x).ln() + 1.0 / (8.0 * x))
    } else {
        i0(x).ln()
    }
}

/// Longitudinal scattering function.
fn mp(cos_theta_i: f32, cos_theta_o: f32, sin_theta_i: f32, sin_theta_o: f32, v: f32) -> f32 {
    let a = cos_theta_i * cos_theta_o / v;
    let b = sin_theta_i * sin_theta_o / v;
    if v <= 0.1 {
        (log_i0(a) - b - 1.0 / v + 0.6931 + (1.0 / (2.0 * v)).ln()).exp()
    } else {
        ((-b).exp() * i0(a)) / ((1.0 / v).sinh() * 2.0 * v)
    }
}

/// Attenuation of each lobe: Fresnel at the entry point and absorption
/// `t` along every internal segment.
fn ap(cos_theta_o: f32, eta: f32, h: f32, t: Color) -> [Color; P_MAX + 1] {
    let cos_gamma_o = safe_sqrt(1.0 - sqr(h));
    let cos_theta = cos_theta_o * cos_gamma_o;
    let f = fresnel_dielectric(cos_theta, eta);

    let mut ap = [Color::ZERO; P_MAX + 1];
    ap[0] = Color::splat(f);
    ap[1] = sqr(1.0 - f) * t;
    for p in 2..P_MAX {
        ap[p] = ap[p - 1] * t * f;
    }
    let denom = Color::ONE - t * f;
    if denom.min_element() > 0.0 {
        ap[P_MAX] = ap[P_MAX - 1] * f * t / denom;
    }
    ap
}

/// Net azimuthal deflection of lobe `p`.
fn phi(p: usize, gamma_o: f32, gamma_t: f32) -> f32 {
    let p = p as f32;
    2.0 * p * gamma_t - 2.0 * gamma_o + p * PI
}

/// Azimuthal scattering function.
fn np(dphi: f32, p: usize, s: f32, gamma_o: f32, gamma_t: f32) -> f32 {
    let mut d = dphi - phi(p, gamma_o, gamma_t);
    while d > PI {
        d -= TAU;
    }
    while d < -PI {
        d += TAU;
    }
    trimmed_logistic(d, s, -PI, PI)
}

/// Angles shared by evaluation, sampling and density queries for one `wo`.
struct Outgoing {
    sin_theta: f32,
    cos_theta: f32,
    phi: f32,
    gamma_o: f32,
    gamma_t: f32,
    /// Absorption along one internal segment.
    t: Color,
}

/// Parameters of a fiber: absorption, index of refraction, longitudinal
/// and azimuthal roughness, and the tilt of its cuticle scales.
#[derive(Clone, Copy, Debug)]
pub struct Fiber {
    sigma_a: Color,
    eta: f32,
    v: [f32; P_MAX + 1],
    s: f32,
    sin_2k_alpha: [f32; P_MAX],
    cos_2k_alpha: [f32; P_MAX],
}

impl Fiber {
    pub fn new(sigma_a: Color, eta: f32, beta_m: f32, beta_n: f32, alpha_degrees: f32) -> Self {
        let v0 = sqr(0.726 * beta_m + 0.812 * sqr(beta_m) + 3.7 * beta_m.powi(20));
        let mut v = [v0; P_MAX + 1];
        v[1] = 0.25 * v0;
        v[2] = 4.0 * v0;
        for vp in v.iter_mut().skip(3) {
            *vp = 4.0 * v0;
        }

        let s = SQRT_PI_OVER_8 * (0.265 * beta_n + 1.194 * sqr(beta_n) + 5.372 * beta_n.powi(22));

        let mut sin_2k_alpha = [0.0; P_MAX];
        let mut cos_2k_alpha = [0.0; P_MAX];
        sin_2k_alpha[0] = alpha_degrees.to_radians().sin();
        cos_2k_alpha[0] = safe_sqrt(1.0 - sqr(sin_2k_alpha[0]));
        for i in 1..P_MAX {
            sin_2k_alpha[i] = 2.0 * cos_2k_alpha[i - 1] * sin_2k_alpha[i - 1];
            cos_2k_alpha[i] = sqr(cos_2k_alpha[i - 1]) - sqr(sin_2k_alpha[i - 1]);
        }

        Self {
            sigma_a,
            eta,
            v,
            s,
            sin_2k_alpha,
            cos_2k_alpha,
        }
    }

    /// Brown hair with moderate roughness.
    pub fn brown() -> Self {
        Self::new(Color::new(0.419, 0.697, 1.37), 1.55, 0.7, 0.5, 2.0)
    }

    /// Lobes for a ray that crossed the fiber at offset `h` in `[-1, 1]`
    /// from its axis.
    pub fn lobes(&self, h: f32) -> FiberLobes {
        FiberLobes {
            fiber: *self,
            h: h.clamp(-1.0, 1.0),
        }
    }

    fn frame(hit: &HitRecord) -> Onb {
        if hit.tangent.length_squared() > 0.0 {
            Onb::from_tangent(hit.tangent, hit.normal)
        } else {
            Onb::from_tangent(Onb::from_w(hit.normal).u(), hit.normal)
        }
    }

    /// Offset across the fiber at which `wo` (in the fiber frame) sees the
    /// shading normal.
    fn offset(wo: Vec3) -> f32 {
        let across = (sqr(wo.y) + sqr(wo.z)).sqrt();
        if across < 1e-6 {
            return 0.0;
        }
        (-wo.y / across).clamp(-0.999, 0.999)
    }

    fn pdf(&self, hit: &HitRecord, wo: Vec3) -> (FiberPdf, FiberLobes, Onb) {
        let frame = Self::frame(hit);
        let lobes = self.lobes(Self::offset(frame.to_local(wo.normalize())));
        (FiberPdf::new(frame, wo, lobes.clone()), lobes, frame)
    }
}

/// A [`Fiber`] evaluated at a fixed offset across its width.
#[derive(Clone, Debug)]
pub struct FiberLobes {
    fiber: Fiber,
    h: f32,
}

impl FiberLobes {
    fn outgoing(&self, wo: Vec3) -> Option<Outgoing> {
        let fiber = &self.fiber;
        let sin_theta = wo.x.clamp(-1.0, 1.0);
        let cos_theta = safe_sqrt(1.0 - sqr(sin_theta));
        if cos_theta < 1e-6 {
            return None;
        }

        let sin_theta_t = sin_theta / fiber.eta;
        let cos_theta_t = safe_sqrt(1.0 - sqr(sin_theta_t));
        let etap = safe_sqrt(sqr(fiber.eta) - sqr(sin_theta)) / cos_theta;
        let sin_gamma_t = self.h / etap;
        let cos_gamma_t = safe_sqrt(1.0 - sqr(sin_gamma_t));
        let path = 2.0 * cos_gamma_t / cos_theta_t;
        let t = Color::new(
            (-fiber.sigma_a.x * path).exp(),
            (-fiber.sigma_a.y * path).exp(),
            (-fiber.sigma_a.z * path).exp(),
        );

        Some(Outgoing {
            sin_theta,
            cos_theta,
            phi: wo.z.atan2(wo.y),
            gamma_o: safe_asin(self.h),
            gamma_t: safe_asin(sin_gamma_t),
            t,
        })
    }

    /// `(sin, cos)` of the outgoing elevation tilted by the cuticle angle
    /// for lobe `p`.
    fn tilted(&self, p: usize, sin_theta_o: f32, cos_theta_o: f32) -> (f32, f32) {
        let (sin2k, cos2k) = (&self.fiber.sin_2k_alpha, &self.fiber.cos_2k_alpha);
        let (sin_p, cos_p) = match p {
            0 => (
                sin_theta_o * cos2k[1] - cos_theta_o * sin2k[1],
                cos_theta_o * cos2k[1] + sin_theta_o * sin2k[1],
            ),
            1 => (
                sin_theta_o * cos2k[0] + cos_theta_o * sin2k[0],
                cos_theta_o * cos2k[0] - sin_theta_o * sin2k[0],
            ),
            2 => (
                sin_theta_o * cos2k[2] + cos_theta_o * sin2k[2],
                cos_theta_o * cos2k[2] - sin_theta_o * sin2k[2],
            ),
            _ => (sin_theta_o, cos_theta_o),
        };
        (sin_p, cos_p.abs())
    }

    /// Probability of sampling each lobe, proportional to its attenuation.
    fn lobe_pdf(&self, out: &Outgoing) -> [f32; P_MAX + 1] {
        let ap = ap(out.cos_theta, self.fiber.eta, self.h, out.t);
        let sum: f32 = ap.iter().map(|a| (a.x + a.y + a.z) / 3.0).sum();
        if sum <= 0.0 {
            return [0.0; P_MAX + 1];
        }
        ap.map(|a| (a.x + a.y + a.z) / 3.0 / sum)
    }

    /// BSDF value in the fiber frame, already divided by `|cos theta_i|`.
    pub fn f(&self, wo: Vec3, wi: Vec3) -> Color {
        let Some(out) = self.outgoing(wo) else {
            return Color::ZERO;
        };
        let fiber = &self.fiber;
        let sin_theta_i = wi.x.clamp(-1.0, 1.0);
        let cos_theta_i = safe_sqrt(1.0 - sqr(sin_theta_i));
        let dphi = wi.z.atan2(wi.y) - out.phi;

        let ap = ap(out.cos_theta, fiber.eta, self.h, out.t);
        let mut f = Color::ZERO;
        for (p, ap_p) in ap.iter().enumerate().take(P_MAX) {
            let (sin_op, cos_op) = self.tilted(p, out.sin_theta, out.cos_theta);
            f += *ap_p
                * mp(cos_theta_i, cos_op, sin_theta_i, sin_op, fiber.v[p])
                * np(dphi, p, fiber.s, out.gamma_o, out.gamma_t);
        }
        f += ap[P_MAX] * mp(cos_theta_i, out.cos_theta, sin_theta_i, out.sin_theta, fiber.v[P_MAX]) / TAU;

        let abs_cos_i = wi.z.abs();
        if abs_cos_i > 0.0 {
            f /= abs_cos_i;
        }
        f
    }

    /// Samples `wi` in the fiber frame: a lobe by attenuation, then its
    /// longitudinal and azimuthal distributions.
    pub fn sample(&self, wo: Vec3, uc: f32, u: Vec2) -> Option<Vec3> {
        let out = self.outgoing(wo)?;
        let fiber = &self.fiber;
        let (p, _, uc) = sample_discrete(&self.lobe_pdf(&out), uc)?;
        let (sin_op, cos_op) = self.tilted(p, out.sin_theta, out.cos_theta);

        let v = fiber.v[p];
        let cos_theta = 1.0 + v * (u.x.max(1e-5) + (1.0 - u.x) * (-2.0 / v).exp()).ln();
        let sin_theta = safe_sqrt(1.0 - sqr(cos_theta));
        let cos_phi = (TAU * u.y).cos();
        let sin_theta_i = -cos_theta * sin_op + sin_theta * cos_phi * cos_op;
        let cos_theta_i = safe_sqrt(1.0 - sqr(sin_theta_i));

        let dphi = if p < P_MAX {
            phi(p, out.gamma_o, out.gamma_t) + sample_trimmed_logistic(uc, fiber.s, -PI, PI)
        } else {
            TAU * uc
        };
        let phi_i = out.phi + dphi;
        Some(Vec3::new(sin_theta_i, cos_theta_i * phi_i.cos(), cos_theta_i * phi_i.sin()))
    }

    /// Density of `sample` producing `wi`, both in the fiber frame.
    pub fn pdf(&self, wo: Vec3, wi: Vec3) -> f32 {
        let Some(out) = self.outgoing(wo) else {
            return 0.0;
        };
        let fiber = &self.fiber;
        let sin_theta_i = wi.x.clamp(-1.0, 1.0);
        let cos_theta_i = safe_sqrt(1.0 - sqr(sin_theta_i));
        let dphi = wi.z.atan2(wi.y) - out.phi;

        let lobe_pdf = self.lobe_pdf(&out);
        let mut pdf = 0.0;
        for (p, weight) in lobe_pdf.iter().enumerate().take(P_MAX) {
            let (sin_op, cos_op) = self.tilted(p, out.sin_theta, out.cos_theta);
            pdf += weight
                * mp(cos_theta_i, cos_op, sin_theta_i, sin_op, fiber.v[p])
                * np(dphi, p, fiber.s, out.gamma_o, out.gamma_t);
        }
        pdf += lobe_pdf[P_MAX]
            * mp(cos_theta_i, out.cos_theta, sin_theta_i, out.sin_theta, fiber.v[P_MAX])
            / TAU;
        pdf
    }
}

impl Material for Fiber {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        uc: f32,
        u: Vec2,
        _options: &ScatterOptions,
    ) -> Option<ScatterRecord> {
        let wo = -ray_in.direction().normalize();
        let (pdf, lobes, frame) = self.pdf(hit, wo);
        let wi = pdf.get(uc, u)?;
        let pdf_val = pdf.at(wi);
        if pdf_val <= 0.0 {
            return None;
        }
        let f = lobes.f(frame.to_local(wo), frame.to_local(wi));
        Some(ScatterRecord::continuous(
            hit.spawn_ray(ray_in, wi),
            BxdfFlags::GLOSSY_REFLECTION | BxdfFlags::GLOSSY_TRANSMISSION,
            f,
            pdf_val,
            pdf.into(),
        ))
    }

    fn f(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, _mode: TransportMode) -> Color {
        let frame = Self::frame(hit);
        let wo = frame.to_local(wo.normalize());
        self.lobes(Self::offset(wo)).f(wo, frame.to_local(wi.normalize()))
    }

    fn scatter_pdf(&self, wo: Vec3, wi: Vec3, hit: &HitRecord, _options: &ScatterOptions) -> f32 {
        self.pdf(hit, wo).0.at(wi)
    }

    fn name(&self) -> &'static str {
        "fiber"
    }
}
