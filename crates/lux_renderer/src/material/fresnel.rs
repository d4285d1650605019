//! Fresnel reflectance terms.

use lux_math::shading::{safe_sqrt, sqr};
use lux_math::Color;

/// Unpolarized reflectance at a dielectric interface. `cos_theta_i` below
/// zero means the light arrives from inside.
pub fn fresnel_dielectric(cos_theta_i: f32, eta: f32) -> f32 {
    let mut cos_theta_i = cos_theta_i.clamp(-1.0, 1.0);
    let mut eta = eta;
    if cos_theta_i < 0.0 {
        eta = 1.0 / eta;
        cos_theta_i = -cos_theta_i;
    }

    let sin2_theta_i = 1.0 - sqr(cos_theta_i);
    let sin2_theta_t = sin2_theta_i / sqr(eta);
    if sin2_theta_t >= 1.0 {
        return 1.0;
    }
    let cos_theta_t = safe_sqrt(1.0 - sin2_theta_t);

    let r_parl = (eta * cos_theta_i - cos_theta_t) / (eta * cos_theta_i + cos_theta_t);
    let r_perp = (cos_theta_i - eta * cos_theta_t) / (cos_theta_i + eta * cos_theta_t);
    (sqr(r_parl) + sqr(r_perp)) / 2.0
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Complex {
    re: f32,
    im: f32,
}

impl Complex {
    fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    fn add(self, o: Self) -> Self {
        Self::new(self.re + o.re, self.im + o.im)
    }

    fn sub(self, o: Self) -> Self {
        Self::new(self.re - o.re, self.im - o.im)
    }

    fn mul(self, o: Self) -> Self {
        Self::new(self.re * o.re - self.im * o.im, self.re * o.im + self.im * o.re)
    }

    fn scale(self, s: f32) -> Self {
        Self::new(self.re * s, self.im * s)
    }

    fn norm(self) -> f32 {
        self.re * self.re + self.im * self.im
    }

    fn div(self, o: Self) -> Self {
        let d = o.norm();
        Self::new(
            (self.re * o.re + self.im * o.im) / d,
            (self.im * o.re - self.re * o.im) / d,
        )
    }

    fn sqrt(self) -> Self {
        let n = self.norm().sqrt();
        if n == 0.0 {
            return Self::new(0.0, 0.0);
        }
        let t1 = (0.5 * (n + self.re.abs())).sqrt();
        let t2 = 0.5 * self.im / t1;
        if self.re >= 0.0 {
            Self::new(t1, t2)
        } else {
            Self::new(t2.abs(), t1.copysign(self.im))
        }
    }
}

/// Reflectance of a conductor with complex index `eta + i k`.
fn fresnel_complex_scalar(cos_theta_i: f32, eta: f32, k: f32) -> f32 {
    let cos_theta_i = cos_theta_i.clamp(0.0, 1.0);
    let eta = Complex::new(eta, k);
    let sin2_theta_i = 1.0 - sqr(cos_theta_i);
    let sin2_theta_t = Complex::new(sin2_theta_i, 0.0).div(eta.mul(eta));
    let cos_theta_t = Complex::new(1.0, 0.0).sub(sin2_theta_t).sqrt();

    let ci = Complex::new(cos_theta_i, 0.0);
    let r_parl = eta.scale(cos_theta_i).sub(cos_theta_t).div(eta.scale(cos_theta_i).add(cos_theta_t));
    let r_perp = ci.sub(eta.mul(cos_theta_t)).div(ci.add(eta.mul(cos_theta_t)));
    (r_parl.norm() + r_perp.norm()) / 2.0
}

/// Per-channel conductor reflectance.
pub fn fresnel_complex(cos_theta_i: f32, eta: Color, k: Color) -> Color {
    Color::new(
        fresnel_complex_scalar(cos_theta_i, eta.x, k.x),
        fresnel_complex_scalar(cos_theta_i, eta.y, k.y),
        fresnel_complex_scalar(cos_theta_i, eta.z, k.z),
    )
}

pub fn fresnel_schlick(abs_cos_theta: f32, f0: Color) -> Color {
    f0 + (Color::ONE - f0) * (1.0 - abs_cos_theta).clamp(0.0, 1.0).powi(5)
}

/// Schlick's curve between 1 at normal incidence and `f90` at grazing.
pub fn schlick_weight_to(abs_cos_theta: f32, f90: f32) -> f32 {
    1.0 + (f90 - 1.0) * (1.0 - abs_cos_theta).clamp(0.0, 1.0).powi(5)
}

/// Normal-incidence reflectance for a relative index of refraction.
pub fn eta_to_r0(eta: f32) -> f32 {
    sqr((eta - 1.0) / (eta + 1.0))
}
