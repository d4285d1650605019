//! RGB textures sampled by materials and lights.
//!
//! Pixels are kept in linear float RGB. Decoding image files is left to the
//! `image` crate; [`Texture::from_image`] turns a decoded image into texels.

use std::path::Path;

use lux_math::{Color, Vec3};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Texture {path} has no pixels")]
    Empty { path: String },

    #[error("Texture data has {got} texels, expected {expected}")]
    SizeMismatch { expected: usize, got: usize },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A bilinearly filtered RGB texture. `(0, 0)` is the bottom-left corner.
#[derive(Clone, Debug)]
pub struct Texture {
    width: u32,
    height: u32,
    texels: Vec<Color>,
    /// Where the texels came from, for diagnostics
    pub name: String,
}

impl Texture {
    pub fn new(
        width: u32,
        height: u32,
        texels: Vec<Color>,
        name: impl Into<String>,
    ) -> TextureResult<Self> {
        let expected = width as usize * height as usize;
        if expected == 0 {
            return Err(TextureError::Empty { path: name.into() });
        }
        if texels.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                got: texels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            texels,
            name: name.into(),
        })
    }

    /// A 1x1 texture that returns `color` everywhere.
    pub fn solid_color(color: Color) -> Self {
        Self {
            width: 1,
            height: 1,
            texels: vec![color],
            name: "<solid>".to_string(),
        }
    }

    /// Convert a decoded image. 8-bit images are treated as sRGB encoded,
    /// float images as already linear.
    pub fn from_image(img: &image::DynamicImage, name: impl Into<String>) -> TextureResult<Self> {
        let (width, height) = (img.width(), img.height());
        let texels: Vec<Color> = match img {
            image::DynamicImage::ImageRgb32F(_) | image::DynamicImage::ImageRgba32F(_) => img
                .to_rgb32f()
                .pixels()
                .map(|p| Vec3::new(p[0], p[1], p[2]))
                .collect(),
            _ => img
                .to_rgb8()
                .pixels()
                .map(|p| {
                    Vec3::new(
                        srgb_to_linear(p[0]),
                        srgb_to_linear(p[1]),
                        srgb_to_linear(p[2]),
                    )
                })
                .collect(),
        };
        Self::new(width, height, texels, name)
    }

    /// Load and decode a texture from disk.
    pub fn load(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let img = image::open(path)?;
        let texture = Self::from_image(&img, path.display().to_string())?;
        log::debug!(
            "Loaded texture {} ({}x{})",
            texture.name,
            texture.width,
            texture.height
        );
        Ok(texture)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bilinear lookup with wrapping uv.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        if self.texels.len() == 1 {
            return self.texels[0];
        }

        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        let x = u * (self.width - 1) as f32;
        let y = (1.0 - v) * (self.height - 1) as f32;

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let (fx, fy) = (x - x0 as f32, y - y0 as f32);

        let top = self.texel(x0, y0).lerp(self.texel(x1, y0), fx);
        let bottom = self.texel(x0, y1).lerp(self.texel(x1, y1), fx);
        top.lerp(bottom, fy)
    }

    /// Average of all texels, used as a representative emission colour.
    pub fn average(&self) -> Color {
        self.texels.iter().copied().sum::<Vec3>() / self.texels.len() as f32
    }

    fn texel(&self, x: u32, y: u32) -> Color {
        let idx = (y.min(self.height - 1) * self.width + x.min(self.width - 1)) as usize;
        self.texels.get(idx).copied().unwrap_or(Vec3::ZERO)
    }
}

fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_everywhere() {
        let tex = Texture::solid_color(Vec3::new(1.0, 0.5, 0.0));
        for (u, v) in [(0.0, 0.0), (0.5, 0.5), (-3.2, 7.9)] {
            assert!((tex.sample(u, v) - Vec3::new(1.0, 0.5, 0.0)).length() < 1e-6);
        }
    }

    #[test]
    fn test_bilinear_midpoint() {
        let tex = Texture::new(2, 1, vec![Vec3::ZERO, Vec3::ONE], "ramp").unwrap();
        let mid = tex.sample(0.5, 0.5);
        assert!((mid - Vec3::splat(0.5)).length() < 1e-5);
        assert!((tex.average() - Vec3::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn test_rejects_bad_sizes() {
        assert!(matches!(
            Texture::new(2, 2, vec![Vec3::ONE; 3], "bad"),
            Err(TextureError::SizeMismatch { expected: 4, got: 3 })
        ));
        assert!(matches!(
            Texture::new(0, 4, vec![], "empty"),
            Err(TextureError::Empty { .. })
        ));
    }

    #[test]
    fn test_from_image_decodes_srgb() {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            2,
            2,
            image::Rgb([255, 128, 0]),
        ));
        let tex = Texture::from_image(&img, "mem").unwrap();
        let c = tex.sample(0.25, 0.75);
        assert!((c.x - 1.0).abs() < 1e-4);
        assert!(c.y > 0.1 && c.y < 0.5);
        assert_eq!(c.z, 0.0);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Texture::load("/definitely/not/here.png").is_err());
    }
}
