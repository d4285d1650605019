use crate::Vec3;

/// A ray with an origin, a direction and the transport state it carries.
///
/// `intensity` scales whatever the ray ends up gathering and defaults to one.
/// `medium` is an index into the scene's medium table for the volume the ray
/// currently travels through, `None` for vacuum.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub intensity: f32,
    pub medium: Option<usize>,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            intensity: 1.0,
            medium: None,
        }
    }

    pub fn with_medium(mut self, medium: Option<usize>) -> Self {
        self.medium = medium;
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Point at parameter `t`: `origin + t * direction`.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
