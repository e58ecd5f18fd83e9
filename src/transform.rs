//! Affine transform utilities for projecting shape-local coordinates
//! into the shared canvas space.
//!
//! Every shape on the canvas owns an affine transform (translation,
//! rotation, scale). Constraints always compare coordinates in the shared
//! space, so a point that lives in a shape's local system is pushed through
//! the shape's matrix on read and pulled back through the inverse on write.
//!
//! ## Coordinate convention
//!
//! The canvas uses screen coordinates: Y axis pointing down, rotation
//! angles in radians with clockwise positive. With Y down, clockwise
//! rotation uses the standard rotation matrix:
//!
//! ```text
//! x' = x * cos(θ) - y * sin(θ)
//! y' = x * sin(θ) + y * cos(θ)
//! ```

use serde::{Deserialize, Serialize};

/// A 2D affine transform.
///
/// Maps a local point `(x, y)` to the shared space as:
///
/// ```text
/// x' = xx * x + xy * y + x0
/// y' = yx * x + yy * y + y0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub xx: f64,
    pub xy: f64,
    pub yx: f64,
    pub yy: f64,
    pub x0: f64,
    pub y0: f64,
}

impl Matrix {
    /// The identity transform.
    pub const IDENTITY: Matrix = Matrix {
        xx: 1.0,
        xy: 0.0,
        yx: 0.0,
        yy: 1.0,
        x0: 0.0,
        y0: 0.0,
    };

    pub fn new(xx: f64, xy: f64, yx: f64, yy: f64, x0: f64, y0: f64) -> Self {
        Self {
            xx,
            xy,
            yx,
            yy,
            x0,
            y0,
        }
    }

    /// A pure translation by `(tx, ty)`.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// A pure scale around the origin.
    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// A pure rotation around the origin.
    ///
    /// `radians` is clockwise positive (Y axis pointing down).
    pub fn rotation(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(cos, -sin, sin, cos, 0.0, 0.0)
    }

    /// Compose two transforms: the result applies `self` first, then `after`.
    pub fn then(&self, after: &Matrix) -> Matrix {
        Matrix {
            xx: after.xx * self.xx + after.xy * self.yx,
            xy: after.xx * self.xy + after.xy * self.yy,
            yx: after.yx * self.xx + after.yy * self.yx,
            yy: after.yx * self.xy + after.yy * self.yy,
            x0: after.xx * self.x0 + after.xy * self.y0 + after.x0,
            y0: after.yx * self.x0 + after.yy * self.y0 + after.y0,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.xx * self.yy - self.xy * self.yx
    }

    /// Whether the transform can be inverted (non-zero determinant).
    pub fn is_invertible(&self) -> bool {
        self.determinant().abs() > f64::EPSILON
    }

    /// Compute the inverse transform, or `None` if the matrix is singular
    /// (e.g. a zero scale collapsed an axis).
    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det.abs() <= f64::EPSILON {
            return None;
        }
        Some(Matrix {
            xx: self.yy / det,
            xy: -self.xy / det,
            yx: -self.yx / det,
            yy: self.xx / det,
            x0: (self.xy * self.y0 - self.yy * self.x0) / det,
            y0: (self.yx * self.x0 - self.xx * self.y0) / det,
        })
    }

    /// Map a point through this transform.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.xx * x + self.xy * y + self.x0,
            self.yx * x + self.yy * y + self.y0,
        )
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}
