//! Direction sampling strategies and their densities.
//!
//! A [`Pdf`] draws world-space directions and reports the solid-angle
//! density of any direction under that same strategy. Materials hand back
//! an owned [`ScatterPdf`] with each continuous scatter; integrators
//! combine it with light sampling through [`MixturePdf`].

mod clearcoat;
mod cosine;
mod dielectric;
mod fiber;
mod microfacet;
mod mixture;
mod phase;
mod phong;
mod shape;

pub use clearcoat::ClearcoatPdf;
pub use cosine::{CosinePdf, UniformSpherePdf};
pub use dielectric::MfDielectricPdf;
pub use fiber::FiberPdf;
pub use microfacet::MicrofacetPdf;
pub use mixture::MixturePdf;
pub use phase::HenyeyGreensteinPdf;
pub use phong::PhongLobePdf;
pub use shape::ShapePdf;

pub(crate) use microfacet::{sample_with_policy, Candidate};

use lux_math::{Vec2, Vec3};

pub trait Pdf {
    /// Draws a direction from one 1-D and one 2-D uniform sample. `None`
    /// means the draw produced no usable direction.
    fn get(&self, uc: f32, u: Vec2) -> Option<Vec3>;

    /// Solid-angle density of `direction` under `get`.
    fn at(&self, direction: Vec3) -> f32;
}

/// The owned sampling strategy attached to a continuous scatter.
#[derive(Clone, Debug)]
pub enum ScatterPdf {
    Cosine(CosinePdf),
    UniformSphere(UniformSpherePdf),
    PhongLobe(PhongLobePdf),
    Microfacet(MicrofacetPdf),
    MfDielectric(MfDielectricPdf),
    Clearcoat(ClearcoatPdf),
    Fiber(FiberPdf),
    HenyeyGreenstein(HenyeyGreensteinPdf),
    /// One-sample mixture of lobes with unnormalized weights.
    Weighted(Vec<(f32, ScatterPdf)>),
    /// A continuous lobe reached only with the given probability, the rest
    /// going to a delta branch. `get` draws from the inner strategy; `at`
    /// includes the selection probability.
    Scaled(f32, Box<ScatterPdf>),
}

impl ScatterPdf {
    fn as_dyn(&self) -> &dyn Pdf {
        match self {
            ScatterPdf::Cosine(p) => p,
            ScatterPdf::UniformSphere(p) => p,
            ScatterPdf::PhongLobe(p) => p,
            ScatterPdf::Microfacet(p) => p,
            ScatterPdf::MfDielectric(p) => p,
            ScatterPdf::Clearcoat(p) => p,
            ScatterPdf::Fiber(p) => p,
            ScatterPdf::HenyeyGreenstein(p) => p,
            ScatterPdf::Weighted(_) | ScatterPdf::Scaled(..) => self,
        }
    }

    /// Probability that the continuous branch was taken at all.
    pub fn selection_probability(&self) -> f32 {
        match self {
            ScatterPdf::Scaled(p, inner) => p * inner.selection_probability(),
            _ => 1.0,
        }
    }

    /// The normalized strategy underneath any selection probability.
    pub fn conditional(&self) -> &ScatterPdf {
        match self {
            ScatterPdf::Scaled(_, inner) => inner.conditional(),
            other => other,
        }
    }
}

impl Pdf for ScatterPdf {
    fn get(&self, uc: f32, u: Vec2) -> Option<Vec3> {
        match self {
            ScatterPdf::Weighted(lobes) => {
                let weights: Vec<f32> = lobes.iter().map(|(w, _)| *w).collect();
                mixture::mixture_get(&weights, |i| &lobes[i].1, uc, u)
            }
            ScatterPdf::Scaled(_, inner) => inner.get(uc, u),
            other => other.as_dyn().get(uc, u),
        }
    }

    fn at(&self, direction: Vec3) -> f32 {
        match self {
            ScatterPdf::Weighted(lobes) => {
                mixture::mixture_at(lobes.iter().map(|(w, p)| (*w, p as &dyn Pdf)), direction)
            }
            ScatterPdf::Scaled(p, inner) => p * inner.at(direction),
            other => other.as_dyn().at(direction),
        }
    }
}

macro_rules! scatter_pdf_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for ScatterPdf {
                fn from(pdf: $ty) -> Self {
                    ScatterPdf::$variant(pdf)
                }
            }
        )*
    };
}

scatter_pdf_from!(
    Cosine(CosinePdf),
    UniformSphere(UniformSpherePdf),
    PhongLobe(PhongLobePdf),
    Microfacet(MicrofacetPdf),
    MfDielectric(MfDielectricPdf),
    Clearcoat(ClearcoatPdf),
    Fiber(FiberPdf),
    HenyeyGreenstein(HenyeyGreensteinPdf),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_approx, estimate_pdf_integral};

    #[test]
    fn test_weighted_mixture_normalized() {
        let pdf = ScatterPdf::Weighted(vec![
            (3.0, CosinePdf::new(Vec3::Z).into()),
            (1.0, UniformSpherePdf.into()),
        ]);
        assert_approx!(estimate_pdf_integral(&pdf, 200_000, 42), 1.0, 0.02);
    }

    #[test]
    fn test_weighted_density_is_weighted_sum() {
        let cosine = CosinePdf::new(Vec3::Z);
        let pdf = ScatterPdf::Weighted(vec![(1.0, cosine.clone().into()), (1.0, UniformSpherePdf.into())]);
        let d = Vec3::new(0.2, 0.1, 0.9).normalize();
        let expected = 0.5 * cosine.at(d) + 0.5 * UniformSpherePdf.at(d);
        assert_approx!(pdf.at(d), expected, 1e-6);
    }

    #[test]
    fn test_scaled_reports_selection_probability() {
        let pdf = ScatterPdf::Scaled(0.25, Box::new(CosinePdf::new(Vec3::Z).into()));
        assert_approx!(estimate_pdf_integral(&pdf, 100_000, 42), 0.25, 0.01);
        assert_eq!(pdf.selection_probability(), 0.25);
        assert!(matches!(pdf.conditional(), ScatterPdf::Cosine(_)));
    }

    #[test]
    fn test_weighted_get_uses_remapped_sample() {
        let pdf = ScatterPdf::Weighted(vec![(0.0, UniformSpherePdf.into()), (1.0, CosinePdf::new(Vec3::Z).into())]);
        for i in 0..32 {
            let d = pdf.get(i as f32 / 32.0, Vec2::new(0.3, 0.7));
            assert!(d.is_some_and(|d| d.z > 0.0));
        }
    }
}
