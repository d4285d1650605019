//! lux core - data handed to the light-transport engine by scene assembly.
//!
//! This crate provides:
//!
//! - **Geometry data**: `Mesh` (indexed triangles with optional normals/uvs)
//! - **Textures**: `Texture`, bilinear RGB lookups for materials and lights
//! - **Settings**: `RenderSettings`, the serde-backed render configuration
//!
//! # Example
//!
//! ```
//! use lux_core::RenderSettings;
//!
//! let settings = RenderSettings::from_json_str(r#"{ "width": 64, "height": 48 }"#)?;
//! assert_eq!(settings.samples_per_pixel(), 4);
//! # Ok::<(), lux_core::SettingsError>(())
//! ```

pub mod mesh;
pub mod settings;
pub mod texture;

pub use mesh::Mesh;
pub use settings::{
    IntegratorKind, MfRejection, RenderSettings, SamplerStrategy, SettingsError, SettingsResult,
};
pub use texture::{Texture, TextureError, TextureResult};
