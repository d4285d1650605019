//! Lobe classification bits and the record a successful scatter returns.

use std::ops::{BitAnd, BitOr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::pdf::ScatterPdf;
use lux_core::MfRejection;
use lux_math::{Color, Ray};

/// Reflection/transmission crossed with diffuse/glossy/specular.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BxdfFlags(u32);

impl BxdfFlags {
    pub const UNSET: Self = Self(0);
    pub const REFLECTION: Self = Self(1 << 0);
    pub const TRANSMISSION: Self = Self(1 << 1);
    pub const DIFFUSE: Self = Self(1 << 2);
    pub const GLOSSY: Self = Self(1 << 3);
    pub const SPECULAR: Self = Self(1 << 4);
    pub const DIFFUSE_REFLECTION: Self = Self(Self::DIFFUSE.0 | Self::REFLECTION.0);
    pub const DIFFUSE_TRANSMISSION: Self = Self(Self::DIFFUSE.0 | Self::TRANSMISSION.0);
    pub const GLOSSY_REFLECTION: Self = Self(Self::GLOSSY.0 | Self::REFLECTION.0);
    pub const GLOSSY_TRANSMISSION: Self = Self(Self::GLOSSY.0 | Self::TRANSMISSION.0);
    pub const SPECULAR_REFLECTION: Self = Self(Self::SPECULAR.0 | Self::REFLECTION.0);
    pub const SPECULAR_TRANSMISSION: Self = Self(Self::SPECULAR.0 | Self::TRANSMISSION.0);
    pub const ALL: Self = Self(!0);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_specular(self) -> bool {
        self.intersects(Self::SPECULAR)
    }

    pub fn is_specular_reflection(self) -> bool {
        self.contains(Self::SPECULAR_REFLECTION)
    }

    pub fn is_specular_transmission(self) -> bool {
        self.contains(Self::SPECULAR_TRANSMISSION)
    }
}

impl BitOr for BxdfFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for BxdfFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Which halves of the sphere a sampling request allows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BxdfReflTransFlags(u32);

impl BxdfReflTransFlags {
    pub const UNSET: Self = Self(0);
    pub const REFLECTION: Self = Self(1);
    pub const TRANSMISSION: Self = Self(2);
    pub const ALL: Self = Self(3);

    pub fn allows_reflection(self) -> bool {
        self.0 & Self::REFLECTION.0 != 0
    }

    pub fn allows_transmission(self) -> bool {
        self.0 & Self::TRANSMISSION.0 != 0
    }
}

impl BitOr for BxdfReflTransFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Default for BxdfReflTransFlags {
    fn default() -> Self {
        Self::ALL
    }
}

/// Whether the path carries radiance from lights or importance from the camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransportMode {
    #[default]
    Radiance,
    Importance,
}

/// Count of rejection loops that ran out of retries. Clones share one count.
#[derive(Clone, Debug, Default)]
pub struct RejectionTally(Arc<AtomicUsize>);

impl RejectionTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

impl PartialEq for RejectionTally {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RejectionTally {}

/// What microfacet sampling does with a wrong-hemisphere direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectionPolicy {
    pub mode: MfRejection,
    pub max_retries: u32,
    pub tally: RejectionTally,
}

impl Default for RejectionPolicy {
    fn default() -> Self {
        Self {
            mode: MfRejection::Discard,
            max_retries: 64,
            tally: RejectionTally::new(),
        }
    }
}

/// Per-call knobs shared by `scatter` and `scatter_pdf`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScatterOptions {
    pub mode: TransportMode,
    pub flags: BxdfReflTransFlags,
    pub rejection: RejectionPolicy,
}

impl ScatterOptions {
    pub fn with_flags(mut self, flags: BxdfReflTransFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Child rays for a scatter that splits into several weighted paths:
/// both delta branches of a thin dielectric, or one ray per colour channel
/// of a dispersive material.
#[derive(Clone, Copy, Debug)]
pub struct SplitRays {
    pub rays: [Ray; 3],
    pub weights: [Color; 3],
    pub valid: [bool; 3],
}

impl SplitRays {
    pub fn iter(&self) -> impl Iterator<Item = (Ray, Color)> + '_ {
        (0..3)
            .filter(|&i| self.valid[i])
            .map(|i| (self.rays[i], self.weights[i]))
    }
}

/// Result of a successful `scatter`.
///
/// For continuous lobes `attenuation` holds the BSDF value `f` and the
/// caller weights by `attenuation * |cos| / pdf_val`; `pdf` is then present
/// and evaluates to `pdf_val` at `ray.direction`. Delta lobes leave `pdf`
/// empty and put the complete path weight in `attenuation`.
#[derive(Clone, Debug)]
pub struct ScatterRecord {
    pub ray: Ray,
    pub flags: BxdfFlags,
    pub attenuation: Color,
    pub pdf_val: f32,
    pub pdf: Option<ScatterPdf>,
    pub split: Option<SplitRays>,
}

impl ScatterRecord {
    /// A continuous lobe sample.
    pub fn continuous(ray: Ray, flags: BxdfFlags, f: Color, pdf_val: f32, pdf: ScatterPdf) -> Self {
        Self {
            ray,
            flags,
            attenuation: f,
            pdf_val,
            pdf: Some(pdf),
            split: None,
        }
    }

    /// A delta lobe sample carrying its full weight.
    pub fn specular(ray: Ray, flags: BxdfFlags, weight: Color) -> Self {
        Self {
            ray,
            flags,
            attenuation: weight,
            pdf_val: 0.0,
            pdf: None,
            split: None,
        }
    }

    pub fn is_specular(&self) -> bool {
        self.pdf.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_combinations() {
        let flags = BxdfFlags::SPECULAR_REFLECTION | BxdfFlags::SPECULAR_TRANSMISSION;
        assert!(flags.is_specular_reflection());
        assert!(flags.is_specular_transmission());
        assert!(!BxdfFlags::GLOSSY_REFLECTION.is_specular());
        assert!(BxdfFlags::DIFFUSE_REFLECTION.contains(BxdfFlags::REFLECTION));
        assert!(!BxdfFlags::DIFFUSE_REFLECTION.intersects(BxdfFlags::TRANSMISSION));
    }

    #[test]
    fn test_refl_trans_flags() {
        assert!(BxdfReflTransFlags::ALL.allows_reflection());
        assert!(BxdfReflTransFlags::ALL.allows_transmission());
        assert!(!BxdfReflTransFlags::REFLECTION.allows_transmission());
        assert_eq!(
            BxdfReflTransFlags::REFLECTION | BxdfReflTransFlags::TRANSMISSION,
            BxdfReflTransFlags::ALL
        );
    }
}
