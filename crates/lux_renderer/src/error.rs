//! Errors surfaced before any pixel is produced.

use lux_core::{SettingsError, TextureError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Scene has no primitives to render")]
    EmptyScene,

    #[error("Invalid render settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    #[error("Emissive primitive {primitive} has a {shape} shape, which cannot be used as a light")]
    UnsupportedLightShape { primitive: usize, shape: &'static str },

    #[error("The {integrator} integrator does not support {light} lights")]
    UnsupportedIntegratorLight {
        integrator: &'static str,
        light: &'static str,
    },

    #[error("Primitive {primitive} is a curve; curves cannot be sampled as lights")]
    CurveLightQuery { primitive: usize },

    #[error("Invalid primitive {primitive}: {reason}")]
    InvalidPrimitive { primitive: usize, reason: String },

    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),
}

pub type RenderResult<T> = Result<T, RenderError>;
