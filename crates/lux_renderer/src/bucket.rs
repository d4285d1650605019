//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that are rendered independently
//! and in parallel, each with its own sampler.

use lux_math::{Color, Vec2};

use crate::camera::RayGenerator;
use crate::integrator::{Integrator, RenderContext};
use crate::sampler::Sampler;
use lux_core::RenderSettings;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Generate buckets for an image, sorted in spiral order from center.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let bucket_size = bucket_size.max(1);
    let mut buckets = Vec::new();
    let mut index = 0;

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, index));
            index += 1;
            x += bucket_size;
        }
        y += bucket_size;
    }

    sort_spiral(&mut buckets, width, height);
    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Sort buckets by distance from image center.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let distance = |b: &Bucket| {
        let x = b.x as f32 + b.width as f32 / 2.0;
        let y = b.y as f32 + b.height as f32 / 2.0;
        (x - center_x).powi(2) + (y - center_y).powi(2)
    };
    buckets.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// Result of rendering a bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub bucket: Bucket,
    /// Pixel colors in row-major order within the bucket
    pub pixels: Vec<Color>,
}

/// Render every pixel of `bucket` with a sampler owned by this bucket.
///
/// Each pixel takes `spp_x * spp_y` samples, one per stratum of the pixel,
/// jittered by the sampler. Sample streams are keyed by the global pixel
/// index, so the image does not depend on bucket size or scheduling.
pub fn render_bucket(
    bucket: &Bucket,
    camera: &dyn RayGenerator,
    integrator: &dyn Integrator,
    ctx: &RenderContext<'_>,
    settings: &RenderSettings,
) -> BucketResult {
    let spp = settings.samples_per_pixel();
    let mut sampler = Sampler::new(settings.sampler, spp, settings.seed);
    let (width, height) = (settings.width as f32, settings.height as f32);
    let (spp_x, spp_y) = (settings.spp_x, settings.spp_y);
    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);

    for local_y in 0..bucket.height {
        for local_x in 0..bucket.width {
            let (px, py) = (bucket.x + local_x, bucket.y + local_y);
            let pixel_index = py as u64 * settings.width as u64 + px as u64;
            let mut sum = Color::ZERO;

            for sy in 0..spp_y {
                for sx in 0..spp_x {
                    let sample_index = (sy * spp_x + sx) as u64;
                    sampler.start_pixel_sample(pixel_index, sample_index);
                    let jitter = sampler.get_2d();
                    let lens = sampler.get_2d();
                    let offset = Vec2::new(
                        (sx as f32 + jitter.x) / spp_x as f32,
                        (sy as f32 + jitter.y) / spp_y as f32,
                    );
                    let s = (px as f32 + offset.x) / width;
                    let t = (py as f32 + offset.y) / height;
                    let ray = camera.generate_ray(s, t, lens);
                    let radiance = integrator.estimate(&ray, ctx, &mut sampler) * ray.intensity;
                    // A broken sample darkens one stratum instead of the pixel.
                    if radiance.is_finite() {
                        sum += radiance;
                    }
                }
            }
            pixels.push(sum / spp as f32);
        }
    }

    BucketResult {
        bucket: *bucket,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_buckets_exact_fit() {
        let buckets = generate_buckets(128, 128, 64);
        assert_eq!(buckets.len(), 4);
        let total_pixels: u32 = buckets.iter().map(|b| b.pixel_count()).sum();
        assert_eq!(total_pixels, 128 * 128);
    }

    #[test]
    fn test_generate_buckets_partial_fit() {
        let buckets = generate_buckets(100, 70, 64);
        assert_eq!(buckets.len(), 4);
        let total_pixels: u32 = buckets.iter().map(|b| b.pixel_count()).sum();
        assert_eq!(total_pixels, 100 * 70);
    }

    #[test]
    fn test_spiral_order() {
        let buckets = generate_buckets(192, 192, 64);
        assert_eq!(buckets.len(), 9);
        assert_eq!((buckets[0].x, buckets[0].y), (64, 64));
        assert!(buckets.iter().enumerate().all(|(i, b)| b.index == i));
    }
}
