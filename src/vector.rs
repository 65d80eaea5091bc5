//! Vector helpers on top of nalgebra

use nalgebra::Vector3;

/// Three-component vector used for positions, directions and rotations
pub type Vec3 = Vector3<f32>;

/// Geometric operations the tracer needs beyond what nalgebra provides
pub trait VecExt {
    /// Unit vector in the same direction, or the zero vector for zero length
    fn normalized_or_zero(&self) -> Vec3;

    /// Angle in radians between two vectors
    fn angle_between(&self, other: &Vec3) -> f32;
}

impl VecExt for Vec3 {
    fn normalized_or_zero(&self) -> Vec3 {
        let len = self.magnitude();
        if len > 0.0 {
            self / len
        } else {
            Vec3::zeros()
        }
    }

    fn angle_between(&self, other: &Vec3) -> f32 {
        // Clamp guards against rounding pushing the dot product past +-1
        let cos = self
            .normalized_or_zero()
            .dot(&other.normalized_or_zero())
            .clamp(-1.0, 1.0);
        cos.acos()
    }
}
