//! Camera for ray generation.

use lux_math::sampling::sample_uniform_disk_concentric;
use lux_math::{Ray, Vec2, Vec3};

/// Anything that turns a normalized image position into a primary ray.
pub trait RayGenerator: Send + Sync {
    /// Ray through image position `(s, t)`, both in `[0, 1]` with `(0, 0)`
    /// the top-left corner. `u` picks the point on the lens.
    fn generate_ray(&self, s: f32, t: f32, u: Vec2) -> Ray;
}

/// Thin-lens camera. With a zero defocus angle it is a pinhole.
#[derive(Clone, Debug)]
pub struct Camera {
    aspect_ratio: f32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f32,          // Vertical field of view in degrees
    defocus_angle: f32, // Variation angle of rays through each pixel
    focus_dist: f32,    // Distance from camera to plane of perfect focus

    medium: Option<usize>,

    // Cached computed values (set by initialize())
    center: Vec3,
    upper_left: Vec3,
    viewport_u: Vec3,
    viewport_v: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    pub fn new() -> Self {
        let mut camera = Self {
            aspect_ratio: 1.0,
            look_from: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            vup: Vec3::Y,
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 1.0,
            medium: None,
            center: Vec3::ZERO,
            upper_left: Vec3::ZERO,
            viewport_u: Vec3::ZERO,
            viewport_v: Vec3::ZERO,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
        };
        camera.initialize();
        camera
    }

    /// Width over height of the image the camera renders.
    pub fn with_aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self.initialize();
        self
    }

    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self.initialize();
        self
    }

    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self.initialize();
        self
    }

    /// Medium the camera sits in. Without one, rays start in the scene's
    /// global medium.
    pub fn with_medium(mut self, medium: Option<usize>) -> Self {
        self.medium = medium;
        self
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    fn initialize(&mut self) {
        self.center = self.look_from;

        let h = (self.vfov.to_radians() / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width = viewport_height * self.aspect_ratio;

        let w = (self.look_from - self.look_at).normalize_or_zero();
        let u = self.vup.cross(w).normalize_or_zero();
        let v = w.cross(u);

        self.viewport_u = viewport_width * u;
        self.viewport_v = -viewport_height * v;
        self.upper_left = self.center - self.focus_dist * w - self.viewport_u / 2.0 - self.viewport_v / 2.0;

        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();
        self.defocus_disk_u = u * defocus_radius;
        self.defocus_disk_v = v * defocus_radius;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl RayGenerator for Camera {
    fn generate_ray(&self, s: f32, t: f32, u: Vec2) -> Ray {
        let target = self.upper_left + s * self.viewport_u + t * self.viewport_v;
        let origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            let p = sample_uniform_disk_concentric(u);
            self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
        };
        Ray::new(origin, target - origin).with_medium(self.medium)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_looks_at_target() {
        let camera = Camera::new().with_position(Vec3::new(0.0, 1.0, 5.0), Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        let ray = camera.generate_ray(0.5, 0.5, Vec2::splat(0.5));
        assert_eq!(ray.origin(), Vec3::new(0.0, 1.0, 5.0));
        assert!((ray.direction().normalize() - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_corners_span_field_of_view() {
        let camera = Camera::new().with_aspect_ratio(2.0).with_lens(90.0, 0.0, 1.0);
        let top_left = camera.generate_ray(0.0, 0.0, Vec2::ZERO).direction();
        let bottom_right = camera.generate_ray(1.0, 1.0, Vec2::ZERO).direction();
        assert!((top_left - Vec3::new(-2.0, 1.0, -1.0)).length() < 1e-5);
        assert!((bottom_right - Vec3::new(2.0, -1.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_defocus_moves_origin_not_focus() {
        let camera = Camera::new().with_lens(40.0, 10.0, 3.0);
        let a = camera.generate_ray(0.5, 0.5, Vec2::new(0.9, 0.5));
        let b = camera.generate_ray(0.5, 0.5, Vec2::new(0.1, 0.5));
        assert!(a.origin().distance(b.origin()) > 0.01);
        // Both rays pass through the same point on the focus plane.
        assert!(a.at(1.0).distance(b.at(1.0)) < 1e-4);
    }
}
