use lux_core::MfRejection;
use lux_math::shading::reflect;
use lux_math::{Onb, Vec2, Vec3};

use super::Pdf;
use crate::material::{RejectionPolicy, TrowbridgeReitz};
use crate::sampler::{hash_to_unit, mix_bits};

/// Outcome of one local-frame sampling attempt.
pub(crate) enum Candidate {
    Accepted(Vec3),
    WrongHemisphere(Vec3),
    Invalid,
}

/// Fresh 2-D sample for retry `attempt`, derived from the original one.
fn retry_sample(u: Vec2, attempt: u32) -> Vec2 {
    let bits = ((u.x.to_bits() as u64) << 32) | u.y.to_bits() as u64;
    let h0 = mix_bits(bits ^ (attempt as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
    let h1 = mix_bits(h0 ^ 0x2545_f491_4f6c_dd1d);
    Vec2::new(hash_to_unit(h0), hash_to_unit(h1))
}

/// Runs `attempt` under the configured wrong-hemisphere policy and returns
/// the accepted local direction. Loops that run out of retries are recorded
/// on the policy's tally.
pub(crate) fn sample_with_policy(
    policy: &RejectionPolicy,
    u: Vec2,
    mut attempt: impl FnMut(Vec2) -> Candidate,
) -> Option<Vec3> {
    match attempt(u) {
        Candidate::Accepted(w) => return Some(w),
        Candidate::Invalid => return None,
        Candidate::WrongHemisphere(w) => match policy.mode {
            MfRejection::Flip => return Some(Vec3::new(w.x, w.y, -w.z)),
            MfRejection::Discard => return None,
            MfRejection::Reject => {}
        },
    }

    for i in 1..=policy.max_retries {
        if let Candidate::Accepted(w) = attempt(retry_sample(u, i)) {
            return Some(w);
        }
    }
    policy.tally.record();
    None
}

/// Visible-normal sampling of a Trowbridge-Reitz lobe, reflecting `wo`
/// about the sampled microfacet normal.
#[derive(Clone, Debug)]
pub struct MicrofacetPdf {
    frame: Onb,
    wo: Vec3,
    distribution: TrowbridgeReitz,
    policy: RejectionPolicy,
}

impl MicrofacetPdf {
    pub fn new(frame: Onb, wo: Vec3, distribution: TrowbridgeReitz, policy: RejectionPolicy) -> Self {
        Self {
            wo: frame.to_local(wo.normalize()),
            frame,
            distribution,
            policy,
        }
    }
}

impl Pdf for MicrofacetPdf {
    fn get(&self, _uc: f32, u: Vec2) -> Option<Vec3> {
        let wo = self.wo;
        if wo.z <= 0.0 {
            return None;
        }
        let wi = sample_with_policy(&self.policy, u, |u| {
            let wm = self.distribution.sample_wm(wo, u);
            let wi = reflect(wo, wm);
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
        let wo = self.wo;
        if wi.z <= 0.0 || wo.z <= 0.0 {
            return 0.0;
        }
        let Some(wm) = (wo + wi).try_normalize() else {
            return 0.0;
        };
        let cos_om = wo.dot(wm).abs();
        if cos_om == 0.0 {
            return 0.0;
        }
        self.distribution.pdf(wo, wm) / (4.0 * cos_om)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_approx, estimate_pdf_integral};

    fn pdf(alpha: f32, wo: Vec3, mode: MfRejection) -> MicrofacetPdf {
        MicrofacetPdf::new(
            Onb::from_w(Vec3::Z),
            wo,
            TrowbridgeReitz::new(alpha, alpha),
            RejectionPolicy {
                mode,
                ..RejectionPolicy::default()
            },
        )
    }

    #[test]
    fn test_microfacet_normalized() {
        let p = pdf(0.3, Vec3::new(0.1, 0.0, 1.0).normalize(), MfRejection::Discard);
        assert_approx!(estimate_pdf_integral(&p, 200_000, 42), 1.0, 0.02);
    }

    #[test]
    fn test_samples_match_density_support() {
        let p = pdf(0.5, Vec3::new(0.5, 0.2, 0.6).normalize(), MfRejection::Discard);
        let mut accepted = 0;
        for i in 0..256 {
            let u = Vec2::new((i % 16) as f32 / 16.0 + 0.02, (i / 16) as f32 / 16.0 + 0.02);
            if let Some(wi) = p.get(0.5, u) {
                accepted += 1;
                assert!(wi.z > 0.0);
                assert!(p.at(wi) > 0.0);
            }
        }
        assert!(accepted > 200);
    }

    #[test]
    fn test_flip_policy_never_discards() {
        let wo = Vec3::new(0.97, 0.0, 0.05).normalize();
        let p = pdf(0.9, wo, MfRejection::Flip);
        for i in 0..256 {
            let u = Vec2::new((i % 16) as f32 / 16.0 + 0.01, (i / 16) as f32 / 16.0 + 0.01);
            let wi = p.get(0.0, u);
            assert!(wi.is_some_and(|w| w.z >= 0.0));
        }
    }

    #[test]
    fn test_reject_policy_finds_upper_hemisphere() {
        let wo = Vec3::new(0.97, 0.0, 0.05).normalize();
        let reject = pdf(0.9, wo, MfRejection::Reject);
        let discard = pdf(0.9, wo, MfRejection::Discard);
        let mut kept_reject = 0;
        let mut kept_discard = 0;
        for i in 0..256 {
            let u = Vec2::new((i % 16) as f32 / 16.0 + 0.01, (i / 16) as f32 / 16.0 + 0.01);
            if let Some(w) = reject.get(0.0, u) {
                assert!(w.z > 0.0);
                kept_reject += 1;
            }
            kept_discard += discard.get(0.0, u).is_some() as usize;
        }
        assert!(kept_reject >= kept_discard);
        assert!(kept_reject > 250);
    }

    #[test]
    fn test_exhausted_loops_are_counted() {
        let policy = RejectionPolicy {
            mode: MfRejection::Reject,
            max_retries: 3,
            ..RejectionPolicy::default()
        };
        let mut calls = 0;
        let result = sample_with_policy(&policy, Vec2::new(0.5, 0.5), |_| {
            calls += 1;
            Candidate::WrongHemisphere(-Vec3::Z)
        });
        assert!(result.is_none());
        assert_eq!(calls, 4);
        assert_eq!(policy.tally.count(), 1);
    }

    #[test]
    fn test_tallies_are_independent() {
        let first = RejectionPolicy {
            mode: MfRejection::Reject,
            max_retries: 1,
            ..RejectionPolicy::default()
        };
        let second = RejectionPolicy {
            mode: MfRejection::Reject,
            max_retries: 1,
            ..RejectionPolicy::default()
        };
        let shared = first.clone();
        for policy in [&first, &shared, &shared] {
            sample_with_policy(policy, Vec2::splat(0.5), |_| Candidate::WrongHemisphere(-Vec3::Z));
        }
        assert_eq!(first.tally.count(), 3);
        assert_eq!(second.tally.count(), 0);
        assert_ne!(first, second);
    }

    #[test]
    fn test_retry_samples_vary() {
        let u = Vec2::new(0.25, 0.75);
        let a = retry_sample(u, 1);
        let b = retry_sample(u, 2);
        assert_ne!(a, b);
        assert!((0.0..1.0).contains(&a.x) && (0.0..1.0).contains(&a.y));
    }
}
