//! Rotation quaternions.
//!
//! Conventions:
//! - Euler angles are `(pitch, yaw, roll)` about `(x, y, z)`, applied
//!   roll-after-yaw-after-pitch (`q = Rz(roll) * Ry(yaw) * Rx(pitch)`).
//! - [`Quaternion::lerp`] does not normalize; [`Quaternion::slerp`] does,
//!   and always takes the shorter arc.

use std::ops::{Mul, Neg};

use serde::{Deserialize, Serialize};

use crate::math::{lerp, within_epsilon, Vector3, DEGREES_TO_RADIANS, EPSILON, RADIANS_TO_DEGREES};

/// Below this distance from parallel, slerp falls back to normalized lerp.
const SLERP_PARALLEL_EPSILON: f32 = 1e-3;

/// Rotation quaternion (unit length when used as a rotation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    /// No rotation.
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Scales to unit length.
    ///
    /// A zero-length quaternion has no direction to preserve; the result then
    /// has non-finite components. Use [`Quaternion::try_normalized`] when the
    /// input may be degenerate.
    pub fn normalized(self) -> Self {
        let len = self.length();
        Self::new(self.x / len, self.y / len, self.z / len, self.w / len)
    }

    /// Like [`Quaternion::normalized`], but `None` when the length is below
    /// [`EPSILON`] or not finite.
    pub fn try_normalized(self) -> Option<Self> {
        let len = self.length();
        if len.is_finite() && len >= EPSILON {
            Some(self.normalized())
        } else {
            None
        }
    }

    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Normalized conjugate.
    pub fn inverse(self) -> Self {
        self.conjugate().normalized()
    }

    /// Rotation that takes `self` to `rhs`.
    pub fn difference(self, rhs: Self) -> Self {
        self.inverse() * rhs
    }

    /// Hamilton product `self * rhs` (apply `rhs`, then `self`).
    pub fn multiply(self, rhs: Self) -> Self {
        let (ax, ay, az, aw) = (self.x, self.y, self.z, self.w);
        let (bx, by, bz, bw) = (rhs.x, rhs.y, rhs.z, rhs.w);

        Self::new(
            aw * bx + ax * bw + ay * bz - az * by,
            aw * by - ax * bz + ay * bw + az * bx,
            aw * bz + ax * by - ay * bx + az * bw,
            aw * bw - ax * bx - ay * by - az * bz,
        )
    }

    /// Rotates `v` by `self`.
    pub fn rotate(self, v: Vector3) -> Vector3 {
        let imaginary = Vector3::new(self.x, self.y, self.z);
        let p = imaginary.cross(v);
        let pp = imaginary.cross(p);
        v + (p * self.w + pp) * 2.0
    }

    pub fn from_pitch_yaw_roll_radians(pitch: f32, yaw: f32, roll: f32) -> Self {
        let (sx, cx) = (pitch * 0.5).sin_cos();
        let (sy, cy) = (yaw * 0.5).sin_cos();
        let (sz, cz) = (roll * 0.5).sin_cos();

        Self::new(
            sx * cy * cz - cx * sy * sz,
            cx * sy * cz + sx * cy * sz,
            cx * cy * sz - sx * sy * cz,
            cx * cy * cz + sx * sy * sz,
        )
    }

    pub fn from_pitch_yaw_roll_degrees(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self::from_pitch_yaw_roll_radians(
            pitch * DEGREES_TO_RADIANS,
            yaw * DEGREES_TO_RADIANS,
            roll * DEGREES_TO_RADIANS,
        )
    }

    /// Rotation of `angle` radians about `axis` (expected unit length).
    pub fn from_axis_angle_radians(axis: Vector3, angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    pub fn from_axis_angle_degrees(axis: Vector3, angle: f32) -> Self {
        Self::from_axis_angle_radians(axis, angle * DEGREES_TO_RADIANS)
    }

    /// `(pitch, yaw, roll)` in radians.
    ///
    /// Near the singularity (`|xy + zw| > 0.5 - ε`) pitch and roll are
    /// reported as 0.
    pub fn to_euler_radians(self) -> Vector3 {
        let Self { x, y, z, w } = self;

        let singular = (x * y + z * w).abs() > 0.5 - EPSILON;

        let pitch = if singular {
            0.0
        } else {
            (2.0 * (y * z + w * x)).atan2(w * w - x * x - y * y + z * z)
        };
        let yaw = (-2.0 * (x * z - w * y)).clamp(-1.0, 1.0).asin();
        let roll = if singular {
            0.0
        } else {
            (2.0 * (x * y + w * z)).atan2(w * w + x * x - y * y - z * z)
        };

        Vector3::new(pitch, yaw, roll)
    }

    pub fn to_euler_degrees(self) -> Vector3 {
        self.to_euler_radians() * RADIANS_TO_DEGREES
    }

    /// Component-wise interpolation. *Not normalized.*
    pub fn lerp(self, to: Self, t: f32) -> Self {
        Self::new(
            lerp(self.x, to.x, t),
            lerp(self.y, to.y, t),
            lerp(self.z, to.z, t),
            lerp(self.w, to.w, t),
        )
    }

    /// Spherical interpolation for `t` in $[0,1]$. Normalized.
    ///
    /// `q` and `-q` are the same rotation, so `to` is flipped into `self`'s
    /// hemisphere first.
    pub fn slerp(self, to: Self, t: f32) -> Self {
        let (to, dot) = match self.dot(to) {
            d if d < 0.0 => (-to, -d),
            d => (to, d),
        };

        if dot > 1.0 - SLERP_PARALLEL_EPSILON {
            return self.lerp(to, t).normalized();
        }

        let theta = dot.clamp(-1.0, 1.0).acos() * t;
        let basis = Self::new(
            to.x - self.x * dot,
            to.y - self.y * dot,
            to.z - self.z * dot,
            to.w - self.w * dot,
        )
        .normalized();

        let (sin_t, cos_t) = theta.sin_cos();
        Self::new(
            self.x * cos_t + basis.x * sin_t,
            self.y * cos_t + basis.y * sin_t,
            self.z * cos_t + basis.z * sin_t,
            self.w * cos_t + basis.w * sin_t,
        )
    }

    pub fn within_epsilon(self, rhs: Self, epsilon: f32) -> bool {
        within_epsilon(self.x, rhs.x, epsilon)
            && within_epsilon(self.y, rhs.y, epsilon)
            && within_epsilon(self.z, rhs.z, epsilon)
            && within_epsilon(self.w, rhs.w, epsilon)
    }
}

impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.multiply(rhs)
    }
}

impl Neg for Quaternion {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}

impl Mul<Vector3> for Quaternion {
    type Output = Vector3;

    fn mul(self, rhs: Vector3) -> Vector3 {
        self.rotate(rhs)
    }
}

impl std::fmt::Display for Quaternion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Quaternion({}, {}, {}, {})", self.x, self.y, self.z, self.w)
    }
}
