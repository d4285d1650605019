use crate::Vec3;

/// Orthonormal basis `(u, v, w)`.
///
/// Shading code works in the local frame where `w` is the surface normal, so
/// `to_local(d).z` is the cosine against the normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Onb {
    axis: [Vec3; 3],
}

impl Onb {
    /// Basis with `w` along `n`. The helper axis switches away from X when `n`
    /// is nearly parallel to it.
    pub fn from_w(n: Vec3) -> Self {
        let w = n.normalize();
        let a = if w.x.abs() > 0.9 { Vec3::Y } else { Vec3::X };
        let v = w.cross(a).normalize();
        let u = w.cross(v);
        Self { axis: [u, v, w] }
    }

    /// Basis with `u` along a fiber tangent and `w` along the component of
    /// `normal` orthogonal to it.
    pub fn from_tangent(tangent: Vec3, normal: Vec3) -> Self {
        let u = tangent.normalize();
        let mut w = normal - u * normal.dot(u);
        if w.length_squared() < 1e-12 {
            return Self::from_w(u).rotated_to_u();
        }
        w = w.normalize();
        let v = w.cross(u);
        Self { axis: [u, v, w] }
    }

    fn rotated_to_u(self) -> Self {
        let [u, v, w] = self.axis;
        Self { axis: [w, u, v] }
    }

    pub fn u(&self) -> Vec3 {
        self.axis[0]
    }

    pub fn v(&self) -> Vec3 {
        self.axis[1]
    }

    pub fn w(&self) -> Vec3 {
        self.axis[2]
    }

    /// Local coordinates to world space.
    #[inline]
    pub fn to_world(&self, a: Vec3) -> Vec3 {
        a.x * self.axis[0] + a.y * self.axis[1] + a.z * self.axis[2]
    }

    /// World-space direction to local coordinates.
    #[inline]
    pub fn to_local(&self, a: Vec3) -> Vec3 {
        Vec3::new(a.dot(self.axis[0]), a.dot(self.axis[1]), a.dot(self.axis[2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(onb: &Onb) {
        assert!((onb.u().length() - 1.0).abs() < 1e-5);
        assert!((onb.v().length() - 1.0).abs() < 1e-5);
        assert!((onb.w().length() - 1.0).abs() < 1e-5);
        assert!(onb.u().dot(onb.v()).abs() < 1e-5);
        assert!(onb.v().dot(onb.w()).abs() < 1e-5);
        assert!(onb.w().dot(onb.u()).abs() < 1e-5);
    }

    #[test]
    fn test_onb_from_w() {
        for n in [Vec3::X, Vec3::Y, -Vec3::Z, Vec3::new(1.0, 2.0, -3.0)] {
            let onb = Onb::from_w(n);
            assert_orthonormal(&onb);
            assert!((onb.w() - n.normalize()).length() < 1e-5);
        }
    }

    #[test]
    fn test_onb_round_trip() {
        let onb = Onb::from_w(Vec3::new(0.3, -0.4, 0.8));
        let d = Vec3::new(0.1, 0.7, -0.2);
        let back = onb.to_world(onb.to_local(d));
        assert!((back - d).length() < 1e-5);
        assert!((onb.to_local(onb.w()) - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_onb_from_tangent() {
        let onb = Onb::from_tangent(Vec3::Z, Vec3::new(0.0, 1.0, 0.5));
        assert_orthonormal(&onb);
        assert!((onb.u() - Vec3::Z).length() < 1e-5);
        assert!((onb.w() - Vec3::Y).length() < 1e-5);

        // Degenerate normal along the tangent still yields a basis
        let onb = Onb::from_tangent(Vec3::X, Vec3::X);
        assert_orthonormal(&onb);
        assert!((onb.u() - Vec3::X).length() < 1e-5);
    }
}
