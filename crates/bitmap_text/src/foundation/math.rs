//! Math utilities and types
//!
//! Provides the 2D math types used by text layout, plus the affine
//! transform that maps local glyph space into world space.

use serde::{Deserialize, Serialize};

pub use nalgebra::{Matrix3, Vector2};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 2D point type
pub type Point2 = nalgebra::Point2<f32>;

/// 3x3 matrix type (homogeneous 2D)
pub type Mat3 = Matrix3<f32>;

/// 2D affine transform
///
/// Maps a local point `(x, y)` to `(a·x + b·y + c, d·x + e·y + f)`.
/// This is the same six-coefficient layout a 2D display list hands to its
/// batched renderer, so a text object's world transform can be passed
/// through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    /// X contribution to world X
    pub a: f32,
    /// Y contribution to world X
    pub b: f32,
    /// World X translation
    pub c: f32,
    /// X contribution to world Y
    pub d: f32,
    /// Y contribution to world Y
    pub e: f32,
    /// World Y translation
    pub f: f32,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineTransform {
    /// The identity transform
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0);

    /// Create a transform from its six coefficients
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Pure translation
    pub const fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, tx, 0.0, 1.0, ty)
    }

    /// Pure axis-aligned scale
    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, 0.0, sy, 0.0)
    }

    /// Counter-clockwise rotation about the origin
    pub fn rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(cos, -sin, 0.0, sin, cos, 0.0)
    }

    /// Compose: apply `self` first, then `outer`
    #[must_use]
    pub fn then(&self, outer: &Self) -> Self {
        Self::from_matrix(&(outer.to_matrix() * self.to_matrix()))
    }

    /// Transform a point
    pub fn apply(&self, point: Point2) -> Point2 {
        Point2::new(
            self.a * point.x + self.b * point.y + self.c,
            self.d * point.x + self.e * point.y + self.f,
        )
    }

    /// Whether this is exactly the identity
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Convert to a homogeneous 3x3 matrix
    #[rustfmt::skip]
    pub fn to_matrix(&self) -> Mat3 {
        Mat3::new(
            self.a, self.b, self.c,
            self.d, self.e, self.f,
            0.0, 0.0, 1.0,
        )
    }

    /// Take the affine part of a homogeneous 3x3 matrix
    ///
    /// The projective bottom row is ignored.
    #[rustfmt::skip]
    pub fn from_matrix(matrix: &Mat3) -> Self {
        Self::new(
            matrix.m11, matrix.m12, matrix.m13,
            matrix.m21, matrix.m22, matrix.m23,
        )
    }
}
