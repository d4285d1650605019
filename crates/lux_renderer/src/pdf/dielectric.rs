use lux_math::shading::{reflect, refract, sqr};
use lux_math::{Onb, Vec2, Vec3};

use super::{sample_with_policy, Candidate, Pdf};
use crate::material::{fresnel_dielectric, BxdfReflTransFlags, RejectionPolicy, TrowbridgeReitz};

/// Rough dielectric sampling: a Fresnel-weighted choice between reflecting
/// and refracting through a visible microfacet normal.
///
/// `eta` is the index on the far side of the interface over the index on
/// the side `wo` lies on.
#[derive(Clone, Debug)]
pub struct MfDielectricPdf {
    frame: Onb,
    wo: Vec3,
    eta: f32,
    distribution: TrowbridgeReitz,
    flags: BxdfReflTransFlags,
    policy: RejectionPolicy,
}

impl MfDielectricPdf {
    pub fn new(
        frame: Onb,
        wo: Vec3,
        eta: f32,
        distribution: TrowbridgeReitz,
        flags: BxdfReflTransFlags,
        policy: RejectionPolicy,
    ) -> Self {
        Self {
            wo: frame.to_local(wo.normalize()),
            frame,
            eta,
            distribution,
            flags,
            policy,
        }
    }

    fn branch_probabilities(&self, cos_om: f32) -> Option<(f32, f32)> {
        let r = fresnel_dielectric(cos_om, self.eta);
        let t = 1.0 - r;
        let pr = if self.flags.allows_reflection() { r } else { 0.0 };
        let pt = if self.flags.allows_transmission() { t } else { 0.0 };
        if pr + pt <= 0.0 {
            return None;
        }
        Some((pr / (pr + pt), pt / (pr + pt)))
    }
}

impl Pdf for MfDielectricPdf {
    fn get(&self, uc: f32, u: Vec2) -> Option<Vec3> {
        let wo = self.wo;
        if wo.z == 0.0 {
            return None;
        }
        let wi = sample_with_policy(&self.policy, u, |u| {
            let wm = self.distribution.sample_wm(wo, u);
            let Some((pr, _)) = self.branch_probabilities(wo.dot(wm)) else {
                return Candidate::Invalid;
            };
            if uc < pr {
                let wi = reflect(wo, wm);
                if wi.z * wo.z > 0.0 {
                    Candidate::Accepted(wi)
                } else {
                    Candidate::WrongHemisphere(wi)
                }
            } else {
                match refract(wo, wm, self.eta) {
                    Some((wi, _)) if wi.z * wo.z < 0.0 => Candidate::Accepted(wi),
                    Some((wi, _)) if wi.z != 0.0 => Candidate::WrongHemisphere(wi),
                    _ => Candidate::Invalid,
                }
            }
        })?;
        Some(self.frame.to_world(wi))
    }

    fn at(&self, direction: Vec3) -> f32 {
        let wi = self.frame.to_local(direction.normalize_or_zero());
        let wo = self.wo;
        let (cos_o, cos_i) = (wo.z, wi.z);
        if cos_o == 0.0 || cos_i == 0.0 {
            return 0.0;
        }

        let reflect = cos_o * cos_i > 0.0;
        let etap = match (reflect, cos_o > 0.0) {
            (true, _) => 1.0,
            (false, true) => self.eta,
            (false, false) => 1.0 / self.eta,
        };
        let Some(mut wm) = (wi * etap + wo).try_normalize() else {
            return 0.0;
        };
        if wm.z < 0.0 {
            wm = -wm;
        }
        if wm.dot(wi) * cos_i < 0.0 || wm.dot(wo) * cos_o < 0.0 {
            return 0.0;
        }

        let Some((pr, pt)) = self.branch_probabilities(wo.dot(wm)) else {
            return 0.0;
        };
        if reflect {
            self.distribution.pdf(wo, wm) / (4.0 * wo.dot(wm).abs()) * pr
        } else {
            let denom = sqr(wi.dot(wm) + wo.dot(wm) / etap);
            if denom == 0.0 {
                return 0.0;
            }
            let dwm_dwi = wi.dot(wm).abs() / denom;
            self.distribution.pdf(wo, wm) * dwm_dwi * pt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_approx, estimate_pdf_integral};

    fn pdf(eta: f32, flags: BxdfReflTransFlags) -> MfDielectricPdf {
        MfDielectricPdf::new(
            Onb::from_w(Vec3::Z),
            Vec3::new(0.2, -0.1, 1.0),
            eta,
            TrowbridgeReitz::new(0.3, 0.3),
            flags,
            RejectionPolicy::default(),
        )
    }

    #[test]
    fn test_entering_glass_normalized() {
        let p = pdf(1.5, BxdfReflTransFlags::ALL);
        assert_approx!(estimate_pdf_integral(&p, 200_000, 42), 1.0, 0.03);
    }

    #[test]
    fn test_leaving_glass_normalized() {
        let p = pdf(1.0 / 1.5, BxdfReflTransFlags::ALL);
        assert_approx!(estimate_pdf_integral(&p, 200_000, 7), 1.0, 0.03);
    }

    #[test]
    fn test_transmission_only_stays_below() {
        let p = pdf(1.5, BxdfReflTransFlags::TRANSMISSION);
        for i in 0..64 {
            let u = Vec2::new((i % 8) as f32 / 8.0 + 0.05, (i / 8) as f32 / 8.0 + 0.05);
            if let Some(wi) = p.get(0.1, u) {
                assert!(wi.z < 0.0);
                assert!(p.at(wi) > 0.0);
            }
        }
        assert_eq!(p.at(Vec3::new(-0.2, 0.1, 1.0)), 0.0);
    }

    #[test]
    fn test_branch_choice_follows_fresnel() {
        let p = pdf(1.5, BxdfReflTransFlags::ALL);
        let mut reflected = 0;
        let n = 2000;
        for i in 0..n {
            let uc = (i as f32 + 0.5) / n as f32;
            let u = Vec2::new(0.37, 0.61);
            if p.get(uc, u).is_some_and(|w| w.z > 0.0) {
                reflected += 1;
            }
        }
        // Near-normal incidence on glass reflects roughly 4%.
        let fraction = reflected as f32 / n as f32;
        assert!(fraction > 0.01 && fraction < 0.1, "{fraction}");
    }
}
