//! Homogeneous participating media and the interfaces that bound them.

use lux_math::sampling::{henyey_greenstein, sample_henyey_greenstein};
use lux_math::{Color, Vec2, Vec3};

/// Media on either side of a surface, as indices into the scene's media.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MediumInterface {
    pub inside: Option<usize>,
    pub outside: Option<usize>,
}

impl MediumInterface {
    pub fn new(inside: Option<usize>, outside: Option<usize>) -> Self {
        Self { inside, outside }
    }

    /// The same medium on both sides.
    pub fn uniform(medium: Option<usize>) -> Self {
        Self::new(medium, medium)
    }

    pub fn is_transition(&self) -> bool {
        self.inside != self.outside
    }
}

/// Constant absorption, scattering and emission with a Henyey-Greenstein
/// phase function.
#[derive(Clone, Debug)]
pub struct HomogeneousMedium {
    sigma_a: Color,
    sigma_s: Color,
    le: Color,
    g: f32,
}

impl HomogeneousMedium {
    pub fn new(sigma_a: Color, sigma_s: Color, sigma_scale: f32, le: Color, le_scale: f32, g: f32) -> Self {
        Self {
            sigma_a: sigma_a * sigma_scale,
            sigma_s: sigma_s * sigma_scale,
            le: le * le_scale,
            g: g.clamp(-0.99, 0.99),
        }
    }

    pub fn sigma_a(&self) -> Color {
        self.sigma_a
    }

    pub fn sigma_s(&self) -> Color {
        self.sigma_s
    }

    pub fn sigma_t(&self) -> Color {
        self.sigma_a + self.sigma_s
    }

    /// Single scalar bound on `sigma_t` used for free-flight sampling.
    pub fn sigma_maj(&self) -> f32 {
        self.sigma_t().max_element()
    }

    pub fn le(&self) -> Color {
        self.le
    }

    pub fn is_emitter(&self) -> bool {
        self.le.max_element() > 0.0
    }

    pub fn g(&self) -> f32 {
        self.g
    }

    /// Beer-Lambert transmittance over `distance`.
    pub fn transmittance(&self, distance: f32) -> Color {
        if !distance.is_finite() {
            return Color::ZERO;
        }
        let tau = self.sigma_t() * distance;
        Color::new((-tau.x).exp(), (-tau.y).exp(), (-tau.z).exp())
    }

    /// Free-flight distance drawn against the majorant, or `None` when the
    /// medium does not interact.
    pub fn sample_distance(&self, u: f32) -> Option<f32> {
        let sigma_maj = self.sigma_maj();
        if sigma_maj <= 0.0 {
            return None;
        }
        Some(-(1.0 - u).ln() / sigma_maj)
    }

    /// Phase function value; both directions point away from the scattering point.
    pub fn phase(&self, wo: Vec3, wi: Vec3) -> f32 {
        henyey_greenstein(wo.dot(wi), self.g)
    }

    /// Samples `wi` for the phase function and returns it with its density.
    pub fn sample_phase(&self, wo: Vec3, u: Vec2) -> (Vec3, f32) {
        let wi = sample_henyey_greenstein(wo, self.g, u);
        (wi, self.phase(wo, wi))
    }
}
