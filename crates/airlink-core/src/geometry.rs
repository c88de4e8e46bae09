//! Pointer coordinate transforms
//!
//! Screen-space pointer coordinates are mapped into a visualization
//! element's local space through the element's current screen transform.
//! The matrix uses the SVG current-transformation-matrix layout:
//!
//! ```text
//! | a c e |   | x |
//! | b d f | * | y |
//! | 0 0 1 |   | 1 |
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A point in screen or local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A 2D affine transform from local space to screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl ScreenTransform {
    /// The identity transform
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// A pure translation
    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// A pure scale about the origin
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Apply the transform to a point
    pub fn apply(&self, p: Point2D) -> Point2D {
        Point2D {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    /// Compute the inverse transform
    ///
    /// Returns `None` when the matrix is singular (zero determinant), e.g.
    /// an element collapsed to zero size.
    pub fn invert(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }

        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

impl Default for ScreenTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A visualization element exposing its live screen transform
///
/// Implementors return the transform as currently rendered, or `None` when
/// the element is detached. Callers must not cache the result across events:
/// pan, zoom, and resize all change it.
pub trait TransformTarget {
    fn screen_transform(&self) -> Option<ScreenTransform>;
}

impl TransformTarget for ScreenTransform {
    fn screen_transform(&self) -> Option<ScreenTransform> {
        Some(*self)
    }
}

/// Map screen-space pointer coordinates into the target's local space
///
/// Reads the target's transform at call time. A detached target surfaces
/// [`Error::MissingTarget`]; a non-invertible transform surfaces
/// [`Error::SingularTransform`].
pub fn to_local(screen: Point2D, target: &dyn TransformTarget) -> Result<Point2D> {
    let ctm = target.screen_transform().ok_or(Error::MissingTarget)?;
    let inverse = ctm.invert().ok_or(Error::SingularTransform)?;
    Ok(inverse.apply(screen))
}
