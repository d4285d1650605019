//! Render configuration.
//!
//! Every field has a default, so a JSON document only needs to name the
//! values it overrides:
//!
//! ```json
//! { "width": 400, "height": 400, "spp_x": 8, "spp_y": 8, "integrator": "mis" }
//! ```

use std::path::Path;

use lux_math::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Which estimator walks camera paths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    /// Next-event estimation with BSDF continuation
    #[default]
    Nee,
    /// Power-heuristic combination of light and BSDF sampling
    Mis,
    /// Weighted reservoir resampling of light candidates
    Reservoir,
    /// Mixture-pdf continuation with Russian roulette
    Roulette,
    /// Homogeneous participating media
    Volume,
    /// Colour-channel splitting for dispersive materials
    Dispersion,
}

/// Scrambling applied to the Halton sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerStrategy {
    None,
    PermuteDigits,
    #[default]
    Owen,
}

/// What a microfacet pdf does with a half-vector that reflects the
/// outgoing direction into the wrong hemisphere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MfRejection {
    /// Mirror the direction back into the right hemisphere (biased)
    Flip,
    /// Report no sample
    #[default]
    Discard,
    /// Draw again, up to `max_rejection_retries` times
    Reject,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Stratified samples per pixel along x
    pub spp_x: u32,
    /// Stratified samples per pixel along y
    pub spp_y: u32,
    pub gamma: f32,
    pub use_bvh: bool,
    pub max_depth: u32,
    pub background: [f32; 3],
    pub integrator: IntegratorKind,
    /// Light samples per shading point, as an x by y stratified grid
    pub light_samples_x: u32,
    pub light_samples_y: u32,
    pub sampler: SamplerStrategy,
    pub seed: u64,
    pub bucket_size: u32,
    pub mf_rejection: MfRejection,
    pub max_rejection_retries: u32,
    /// Fail instead of warning when an emissive shape cannot become a light
    pub strict_lights: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            spp_x: 2,
            spp_y: 2,
            gamma: 2.0,
            use_bvh: true,
            max_depth: 10,
            background: [0.0, 0.0, 0.0],
            integrator: IntegratorKind::default(),
            light_samples_x: 1,
            light_samples_y: 1,
            sampler: SamplerStrategy::default(),
            seed: 0,
            bucket_size: 32,
            mf_rejection: MfRejection::default(),
            max_rejection_retries: 64,
            strict_lights: false,
        }
    }
}

impl RenderSettings {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> SettingsResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json_str(&text)?;
        log::debug!("Loaded render settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn validate(&self) -> SettingsResult<()> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("spp_x", self.spp_x),
            ("spp_y", self.spp_y),
            ("light_samples_x", self.light_samples_x),
            ("light_samples_y", self.light_samples_y),
            ("bucket_size", self.bucket_size),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(SettingsError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(SettingsError::Invalid {
                field: "gamma",
                reason: format!("{} is not a positive number", self.gamma),
            });
        }
        if self.background.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(SettingsError::Invalid {
                field: "background",
                reason: "components must be finite and non-negative".to_string(),
            });
        }
        Ok(())
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.spp_x * self.spp_y
    }

    pub fn light_samples(&self) -> u32 {
        self.light_samples_x * self.light_samples_y
    }

    pub fn background_color(&self) -> Color {
        Color::from_array(self.background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = RenderSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.samples_per_pixel(), 4);
        assert_eq!(settings.sampler, SamplerStrategy::Owen);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = RenderSettings::from_json_str(
            r#"{ "width": 64, "integrator": "reservoir", "mf_rejection": "reject" }"#,
        )
        .unwrap();
        assert_eq!(settings.width, 64);
        assert_eq!(settings.height, 400);
        assert_eq!(settings.integrator, IntegratorKind::Reservoir);
        assert_eq!(settings.mf_rejection, MfRejection::Reject);
        assert_eq!(settings.max_rejection_retries, 64);
    }

    #[test]
    fn test_zero_samples_rejected() {
        let err = RenderSettings::from_json_str(r#"{ "spp_y": 0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "spp_y", .. }));
    }

    #[test]
    fn test_unknown_integrator_is_parse_error() {
        let err = RenderSettings::from_json_str(r#"{ "integrator": "photon" }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut settings = RenderSettings::default();
        settings.sampler = SamplerStrategy::PermuteDigits;
        settings.background = [0.1, 0.2, 0.3];
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(RenderSettings::from_json_str(&json).unwrap(), settings);
    }
}
