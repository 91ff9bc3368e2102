//! Math types.
//!
//! This module intentionally stays small and deterministic.
//! It avoids SIMD/unsafe and focuses on stable semantics: every operation
//! returns a new value and never mutates its inputs.

use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

pub const DEGREES_TO_RADIANS: f32 = std::f32::consts::PI / 180.0;
pub const RADIANS_TO_DEGREES: f32 = 180.0 / std::f32::consts::PI;

/// Default tolerance for approximate comparisons.
pub const EPSILON: f32 = 1e-5;

pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + t * (to - from)
}

pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}

/// Rounds `value` to `digits` fractional decimal digits.
pub fn quantize(value: f32, digits: i32) -> f32 {
    let scale = 10f32.powi(digits);
    (value * scale).round() / scale
}

/// `true` if `a` and `b` differ by at most `epsilon`.
pub fn within_epsilon(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() <= epsilon
}

/// A human-readable span, converted by [`duration_millis`].
///
/// A month is 31 days and a year is 12 such months.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationParts {
    pub seconds: f64,
    pub minutes: f64,
    pub hours: f64,
    pub days: f64,
    pub weeks: f64,
    pub months: f64,
    pub years: f64,
}

pub fn duration_millis(d: DurationParts) -> f64 {
    const MS_PER_SEC: f64 = 1000.0;
    const MS_PER_MIN: f64 = MS_PER_SEC * 60.0;
    const MS_PER_HOUR: f64 = MS_PER_MIN * 60.0;
    const MS_PER_DAY: f64 = MS_PER_HOUR * 24.0;
    const MS_PER_WEEK: f64 = MS_PER_DAY * 7.0;
    const MS_PER_MONTH: f64 = MS_PER_DAY * 31.0;
    const MS_PER_YEAR: f64 = MS_PER_MONTH * 12.0;

    d.seconds * MS_PER_SEC
        + d.minutes * MS_PER_MIN
        + d.hours * MS_PER_HOUR
        + d.days * MS_PER_DAY
        + d.weeks * MS_PER_WEEK
        + d.months * MS_PER_MONTH
        + d.years * MS_PER_YEAR
}

/// Easing curves over `t` in $[0,1]$.
pub mod easing {
    /// Slow start, fast finish.
    #[inline]
    pub fn ease_in_cubic(t: f32) -> f32 {
        t * t * t
    }

    /// Fast start, slow finish.
    #[inline]
    pub fn ease_out_cubic(t: f32) -> f32 {
        1.0 - (1.0 - t).powi(3)
    }

    #[inline]
    pub fn ease_out_quad(t: f32) -> f32 {
        1.0 - (1.0 - t).powi(2)
    }
}

/// 3D vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);
    pub const DOWN: Self = Self::new(0.0, -1.0, 0.0);
    pub const RIGHT: Self = Self::new(1.0, 0.0, 0.0);
    pub const LEFT: Self = Self::new(-1.0, 0.0, 0.0);
    pub const FORWARD: Self = Self::new(0.0, 0.0, -1.0);
    pub const BACKWARD: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    pub fn scale(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    pub fn len_sq(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.len_sq().sqrt()
    }

    /// Unit-length copy, or [`Vector3::ZERO`] when the length is below
    /// [`EPSILON`].
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len >= EPSILON {
            self.scale(1.0 / len)
        } else {
            Self::ZERO
        }
    }

    pub fn distance(self, rhs: Self) -> f32 {
        (self - rhs).length()
    }

    /// `self` expressed as an offset from `origin`.
    pub fn relative_to(self, origin: Self) -> Self {
        self - origin
    }

    pub fn quantize(self, digits: i32) -> Self {
        Self::new(
            quantize(self.x, digits),
            quantize(self.y, digits),
            quantize(self.z, digits),
        )
    }

    pub fn round(self) -> Self {
        Self::new(self.x.round(), self.y.round(), self.z.round())
    }

    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Unclamped linear interpolation; `t` outside $[0,1]$ extrapolates.
    pub fn lerp(self, to: Self, t: f32) -> Self {
        Self::new(
            lerp(self.x, to.x, t),
            lerp(self.y, to.y, t),
            lerp(self.z, to.z, t),
        )
    }

    pub fn within_epsilon(self, rhs: Self, epsilon: f32) -> bool {
        within_epsilon(self.x, rhs.x, epsilon)
            && within_epsilon(self.y, rhs.y, epsilon)
            && within_epsilon(self.z, rhs.z, epsilon)
    }

    pub fn approx_eq(self, rhs: Self) -> bool {
        self.within_epsilon(rhs, EPSILON)
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vector3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        self.scale(rhs)
    }
}

/// Component-wise product.
impl Mul for Vector3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }
}

impl Div<f32> for Vector3 {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Component-wise quotient.
impl Div for Vector3 {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::new(self.x / rhs.x, self.y / rhs.y, self.z / rhs.z)
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl std::fmt::Display for Vector3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Vector3({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector3_lerp_midpoint() {
        let a = Vector3::new(0.0, 0.0, 0.0);
        let b = Vector3::new(2.0, 4.0, 6.0);
        let mid = a.lerp(b, 0.5);
        assert_eq!(mid, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn normalized_has_unit_length() {
        for v in [
            Vector3::new(3.0, 4.0, 0.0),
            Vector3::new(-0.2, 0.001, 9.0),
            Vector3::new(1e-3, 0.0, 0.0),
        ] {
            assert!((v.normalized().length() - 1.0).abs() < 1e-4, "{v}");
        }
    }

    #[test]
    fn normalizing_tiny_vector_yields_zero() {
        let v = Vector3::new(1e-6, -1e-6, 0.0);
        assert_eq!(v.normalized(), Vector3::ZERO);
        assert_eq!(Vector3::ZERO.normalized(), Vector3::ZERO);
    }

    #[test]
    fn dot_uses_matching_components() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(4.0, 5.0, 6.0);
        assert_eq!(a.dot(b), 32.0);
    }

    #[test]
    fn cross_of_axes() {
        assert!(Vector3::RIGHT.cross(Vector3::UP).approx_eq(Vector3::BACKWARD));
        assert!(Vector3::UP.cross(Vector3::RIGHT).approx_eq(Vector3::FORWARD));
    }

    #[test]
    fn quantize_and_round() {
        let v = Vector3::new(1.23456, -2.5001, 0.049);
        assert!(v.quantize(2).approx_eq(Vector3::new(1.23, -2.5, 0.05)));
        assert_eq!(Vector3::new(1.4, -1.6, 2.5).round(), Vector3::new(1.0, -2.0, 3.0));
        assert_eq!(Vector3::new(-1.0, 2.0, -3.0).abs(), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn relative_to_is_offset_from_origin() {
        let origin = Vector3::new(1.0, 2.0, -3.0);
        let p = Vector3::new(1.5, 0.0, -1.0);
        assert_eq!(p.relative_to(origin), Vector3::new(0.5, -2.0, 2.0));
        assert_eq!(origin + p.relative_to(origin), p);
        assert_eq!(p.relative_to(Vector3::ZERO), p);
    }

    #[test]
    fn duration_millis_sums_units() {
        assert_eq!(duration_millis(DurationParts::default()), 0.0);
        assert_eq!(
            duration_millis(DurationParts {
                seconds: 1.5,
                minutes: 2.0,
                ..DurationParts::default()
            }),
            121_500.0
        );
        assert_eq!(
            duration_millis(DurationParts {
                weeks: 1.0,
                ..DurationParts::default()
            }),
            604_800_000.0
        );
        let year = duration_millis(DurationParts {
            years: 1.0,
            ..DurationParts::default()
        });
        let months = duration_millis(DurationParts {
            months: 12.0,
            ..DurationParts::default()
        });
        assert_eq!(year, months);
        assert_eq!(year, 372.0 * 86_400_000.0);
    }

    #[test]
    fn duration_parts_from_partial_json() {
        let d: DurationParts = serde_json::from_str(r#"{"hours": 1, "seconds": 30}"#).unwrap();
        assert_eq!(duration_millis(d), 3_630_000.0);
    }

    #[test]
    fn distance_between_points() {
        let a = Vector3::new(1.0, 1.0, 1.0);
        let b = Vector3::new(4.0, 5.0, 1.0);
        assert!(within_epsilon(a.distance(b), 5.0, EPSILON));
    }

    #[test]
    fn epsilon_equality() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        assert!(a.approx_eq(a + Vector3::splat(5e-6)));
        assert!(!a.approx_eq(a + Vector3::splat(1e-3)));
        assert!(a.within_epsilon(a + Vector3::splat(1e-3), 1e-2));
    }

    #[test]
    fn easing_endpoints() {
        for f in [easing::ease_in_cubic, easing::ease_out_cubic, easing::ease_out_quad] {
            assert!(within_epsilon(f(0.0), 0.0, 1e-6));
            assert!(within_epsilon(f(1.0), 1.0, 1e-6));
        }
        assert!(easing::ease_in_cubic(0.5) < 0.5);
        assert!(easing::ease_out_cubic(0.5) > 0.5);
    }
}
