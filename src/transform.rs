//! Local-space bone transform and quaternion helpers

use glam::{Quat, Vec3, Vec4};

/// An affine bone transform: rotation, translation, and non-uniform scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: Quat,
    pub translation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform (no rotation, no translation, unit scale)
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn new(rotation: Quat, translation: Vec3, scale: Vec3) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// Compose with a parent transform: the result applies `self` first,
    /// then `parent`. Chaining local transforms root-first yields the
    /// object-space transform.
    #[inline]
    pub fn mul(&self, parent: &Self) -> Self {
        Self {
            rotation: parent.rotation * self.rotation,
            translation: parent.rotation * (self.translation * parent.scale) + parent.translation,
            scale: self.scale * parent.scale,
        }
    }

    /// Transform a point from local space
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (point * self.scale) + self.translation
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Normalized linear interpolation between two quaternions
///
/// Negates `end` when the inputs sit in opposite hemispheres so the
/// interpolation takes the short path.
#[inline]
pub fn quat_nlerp(start: Quat, end: Quat, alpha: f32) -> Quat {
    let start = Vec4::from(start);
    let mut end = Vec4::from(end);
    if start.dot(end) < 0.0 {
        end = -end;
    }
    Quat::from_vec4(start.lerp(end, alpha)).normalize()
}

/// Flip a quaternion into the w >= 0 hemisphere
///
/// Drop-w storage reconstructs a non-negative w, so rotations must be
/// brought into that hemisphere before packing.
#[inline]
pub fn quat_ensure_positive_w(quat: Quat) -> Quat {
    if quat.w < 0.0 {
        -quat
    } else {
        quat
    }
}

/// Rebuild a unit quaternion from its x, y, z components, taking w as
/// `sqrt(max(0, 1 - x² - y² - z²))`
#[inline]
pub fn quat_from_positive_w(xyz: Vec3) -> Quat {
    let w_squared = 1.0 - xyz.length_squared();
    // Quantization noise can push the length slightly past 1
    let w = if w_squared > 0.0 { w_squared.sqrt() } else { 0.0 };
    Quat::from_xyzw(xyz.x, xyz.y, xyz.z, w)
}
