use lux_math::sampling::sample_discrete;
use lux_math::{Vec2, Vec3};

use super::Pdf;

/// One-sample mixture of strategies: `get` picks a component by weight,
/// `at` is the weighted sum of every component's density.
pub struct MixturePdf<'a> {
    weights: Vec<f32>,
    pdfs: Vec<&'a dyn Pdf>,
}

impl<'a> MixturePdf<'a> {
    pub fn new(entries: impl IntoIterator<Item = (f32, &'a dyn Pdf)>) -> Self {
        let (weights, pdfs) = entries.into_iter().filter(|(w, _)| *w > 0.0).unzip();
        Self { weights, pdfs }
    }

    /// Equal weights.
    pub fn even(a: &'a dyn Pdf, b: &'a dyn Pdf) -> Self {
        Self::new([(0.5, a), (0.5, b)])
    }

    pub fn len(&self) -> usize {
        self.pdfs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pdfs.is_empty()
    }
}

impl Pdf for MixturePdf<'_> {
    fn get(&self, uc: f32, u: Vec2) -> Option<Vec3> {
        mixture_get(&self.weights, |i| self.pdfs[i], uc, u)
    }

    fn at(&self, direction: Vec3) -> f32 {
        mixture_at(self.weights.iter().copied().zip(self.pdfs.iter().copied()), direction)
    }
}

pub(super) fn mixture_get<'p, P: Pdf + ?Sized + 'p>(
    weights: &[f32],
    component: impl Fn(usize) -> &'p P,
    uc: f32,
    u: Vec2,
) -> Option<Vec3> {
    let (index, _, uc) = sample_discrete(weights, uc)?;
    component(index).get(uc, u)
}

pub(super) fn mixture_at<'p>(entries: impl Iterator<Item = (f32, &'p dyn Pdf)>, direction: Vec3) -> f32 {
    let mut total_weight = 0.0;
    let mut density = 0.0;
    for (w, pdf) in entries {
        if w <= 0.0 {
            continue;
        }
        total_weight += w;
        density += w * pdf.at(direction);
    }
    if total_weight > 0.0 {
        density / total_weight
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{CosinePdf, PhongLobePdf, UniformSpherePdf};
    use crate::test_utils::{assert_approx, estimate_pdf_integral};

    #[test]
    fn test_mixture_normalized() {
        let cosine = CosinePdf::new(Vec3::Y);
        let phong = PhongLobePdf::new(Vec3::new(1.0, 1.0, 0.0), 12.0);
        let mix = MixturePdf::new([(1.0, &cosine as &dyn Pdf), (2.0, &phong as &dyn Pdf)]);
        assert_eq!(mix.len(), 2);
        assert_approx!(estimate_pdf_integral(&mix, 200_000, 42), 1.0, 0.02);
    }

    #[test]
    fn test_zero_weight_components_are_dropped() {
        let sphere = UniformSpherePdf;
        let cosine = CosinePdf::new(Vec3::Z);
        let mix = MixturePdf::new([(0.0, &sphere as &dyn Pdf), (1.0, &cosine as &dyn Pdf)]);
        assert_eq!(mix.len(), 1);
        assert_eq!(mix.at(-Vec3::Z), 0.0);
    }

    #[test]
    fn test_empty_mixture_yields_nothing() {
        let mix = MixturePdf::new(std::iter::empty());
        assert!(mix.is_empty());
        assert!(mix.get(0.5, Vec2::splat(0.5)).is_none());
        assert_eq!(mix.at(Vec3::Z), 0.0);
    }
}
