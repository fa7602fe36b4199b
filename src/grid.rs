//! Borrowed grid data and coordinate materialisation
//!
//! The engines never copy the input grid: they hold a [`GridView`] over the
//! caller's coordinate and value slices and resolve abstract
//! [`GridPoint`](crate::point::GridPoint)s to physical coordinates on demand.

use std::ops::{Add, Div, Mul, Sub};

use crate::error::ContourError;
use crate::point::{GridPoint, PointKind};

/// Scalar sample type a contour grid can hold
///
/// Implemented for `f32` and `f64`, the two precisions the public entry
/// points support.
pub trait Scalar:
    Copy
    + PartialOrd
    + std::fmt::Debug
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + 'static
{
    const ZERO: Self;
    const FOUR: Self;

    fn is_finite(self) -> bool;

    /// Lossless-enough widening for export layers that only speak `f64`
    fn to_f64(self) -> f64;
}

impl Scalar for f64 {
    const ZERO: Self = 0.0;
    const FOUR: Self = 4.0;

    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }

    fn to_f64(self) -> f64 {
        self
    }
}

impl Scalar for f32 {
    const ZERO: Self = 0.0;
    const FOUR: Self = 4.0;

    fn is_finite(self) -> bool {
        f32::is_finite(self)
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

/// Linear interpolation of a level crossing along one cell edge
///
/// Callers only request a crossing for edges that actually straddle `value`,
/// so `z0 != z1` and the division is well defined.
fn interpolate<T: Scalar>(x0: T, x1: T, z0: T, z1: T, value: T) -> T {
    let d = (value - z0) / (z1 - z0);
    x0 + d * (x1 - x0)
}

/// A borrowed view of a regular rectangular grid of scalar samples
///
/// `xs` has one entry per column, `ys` one per row, and `z` is column-major:
/// the value at row `r`, column `c` is `z[r + c * nrow]`. Coordinates are
/// assumed strictly increasing; this is not checked (non-monotone inputs
/// produce geometrically nonsensical but well-defined output).
#[derive(Debug, Clone, Copy)]
pub struct GridView<'a, T> {
    xs: &'a [T],
    ys: &'a [T],
    z: &'a [T],
    nrow: usize,
    ncol: usize,
}

impl<'a, T: Scalar> GridView<'a, T> {
    /// Create a view, validating the slice lengths against the dimensions
    pub fn new(
        xs: &'a [T],
        ys: &'a [T],
        z: &'a [T],
        nrow: usize,
        ncol: usize,
    ) -> Result<Self, ContourError> {
        if xs.len() != ncol {
            return Err(ContourError::XLengthMismatch {
                expected: ncol,
                actual: xs.len(),
            });
        }
        if ys.len() != nrow {
            return Err(ContourError::YLengthMismatch {
                expected: nrow,
                actual: ys.len(),
            });
        }
        if z.len() != nrow * ncol {
            return Err(ContourError::ZLengthMismatch {
                expected: nrow * ncol,
                actual: z.len(),
            });
        }
        Ok(Self {
            xs,
            ys,
            z,
            nrow,
            ncol,
        })
    }

    pub fn nrow(&self) -> usize {
        self.nrow
    }

    pub fn ncol(&self) -> usize {
        self.ncol
    }

    /// Value at row `r`, column `c`
    pub fn z(&self, r: usize, c: usize) -> T {
        self.z[r + c * self.nrow]
    }

    /// Mean of the four corner values of the cell whose top-left node is `(r, c)`
    ///
    /// This is the saddle disambiguator: ambiguous cell configurations pick
    /// their topology from where this mean falls relative to the levels.
    pub fn central_value(&self, r: usize, c: usize) -> T {
        (self.z(r, c) + self.z(r, c + 1) + self.z(r + 1, c) + self.z(r + 1, c + 1)) / T::FOUR
    }

    /// Whether all four corners of the cell at `(r, c)` are finite
    ///
    /// A cell with any non-finite corner emits no contour geometry.
    pub fn cell_is_finite(&self, r: usize, c: usize) -> bool {
        self.z(r, c).is_finite()
            && self.z(r, c + 1).is_finite()
            && self.z(r + 1, c).is_finite()
            && self.z(r + 1, c + 1).is_finite()
    }

    /// Materialise a grid point into physical coordinates
    ///
    /// Corners resolve directly to grid node coordinates; edge crossings are
    /// linearly interpolated against `vlo` or `vhi` depending on their kind.
    pub fn point_coords(&self, p: GridPoint, vlo: T, vhi: T) -> (T, T) {
        match p.kind {
            PointKind::Corner => (self.xs[p.c], self.ys[p.r]),
            PointKind::HorizLo => (
                interpolate(
                    self.xs[p.c],
                    self.xs[p.c + 1],
                    self.z(p.r, p.c),
                    self.z(p.r, p.c + 1),
                    vlo,
                ),
                self.ys[p.r],
            ),
            PointKind::HorizHi => (
                interpolate(
                    self.xs[p.c],
                    self.xs[p.c + 1],
                    self.z(p.r, p.c),
                    self.z(p.r, p.c + 1),
                    vhi,
                ),
                self.ys[p.r],
            ),
            PointKind::VertLo => (
                self.xs[p.c],
                interpolate(
                    self.ys[p.r],
                    self.ys[p.r + 1],
                    self.z(p.r, p.c),
                    self.z(p.r + 1, p.c),
                    vlo,
                ),
            ),
            PointKind::VertHi => (
                self.xs[p.c],
                interpolate(
                    self.ys[p.r],
                    self.ys[p.r + 1],
                    self.z(p.r, p.c),
                    self.z(p.r + 1, p.c),
                    vhi,
                ),
            ),
        }
    }
}
