use lux_math::shading::reflect;
use lux_math::{Onb, Vec2, Vec3};

use super::{sample_with_policy, Candidate, Pdf};
use crate::material::{ClearcoatDistribution, RejectionPolicy};

/// Half-vector sampling of the clearcoat lobe.
#[derive(Clone, Debug)]
pub struct ClearcoatPdf {
    frame: Onb,
    wo: Vec3,
    distribution: ClearcoatDistribution,
    policy: RejectionPolicy,
}

impl ClearcoatPdf {
    pub fn new(frame: Onb, wo: Vec3, distribution: ClearcoatDistribution, policy: RejectionPolicy) -> Self {
        Self {
            wo: frame.to_local(wo.normalize()),
            frame,
            distribution,
            policy,
        }
    }
}

impl Pdf for ClearcoatPdf {
    fn get(&self, _uc: f32, u: Vec2) -> Option<Vec3> {
        let wo = self.wo;
        if wo.z <= 0.0 {
            return None;
        }
        let wi = sample_with_policy(&self.policy, u, |u| {
            let wh = self.distribution.sample_wh(u);
            let wi = reflect(wo, wh);
            if wi.z > 0.0 {
                Candidate::Accepted(wi)
            } else {
                Candidate::WrongHemisphere(wi)
            }
        })?;
        Some(self.frame.to_world(wi))
    }

    fn at(&self, direction: Vec3) -> f32 {
        let wi = self.frame.to_local(direction.normalize_or_zero());
        if wi.z <= 0.0 || self.wo.z <= 0.0 {
            return 0.0;
        }
        let Some(wh) = (self.wo + wi).try_normalize() else {
            return 0.0;
        };
        let cos_ih = wi.dot(wh).abs();
        if cos_ih == 0.0 {
            return 0.0;
        }
        self.distribution.d(wh) * wh.z.abs() / (4.0 * cos_ih)
    }
}
