//! Isoband engine
//!
//! Ternary marching squares: every 2×2 cell is classified into one of 81
//! cases by thresholding its corners against the two band levels, and each
//! non-trivial case emits one or two small clockwise polygons whose vertices
//! live in the abstract grid-point namespace. Polygons are merged into
//! maximal rings on the fly by [`Isobander::merge_poly`]; a final collector
//! walks the assembled connectivity and emits one path per ring.

use std::collections::HashMap;
use std::time::Instant;

use arrayvec::ArrayVec;
use log::debug;

use crate::error::ContourError;
use crate::grid::{GridView, Scalar};
use crate::paths::ContourPaths;
use crate::point::{GridPoint, PointKind};

/// Secondary connectivity at a vertex shared by two distinct rings
#[derive(Debug, Clone, Copy)]
struct AltLinks {
    prev: GridPoint,
    next: GridPoint,
    done: bool,
}

/// Double-linked ring connectivity at one grid point
///
/// `prev`/`next` are map keys, not references: mutation is by map update and
/// there is no pointer graph to tear down. At most one additional ring may
/// pass through a point; it lives in `alt`.
#[derive(Debug, Clone, Copy)]
struct BandLinks {
    prev: GridPoint,
    next: GridPoint,
    alt: Option<AltLinks>,
    done: bool,
}

/// Isoband extraction engine for one grid
///
/// The engine owns a single grid-point-keyed connectivity map which is
/// cleared and repopulated by every [`compute`](Isobander::compute) call, so
/// one engine can be reused across levels:
///
/// ```rust,ignore
/// let mut engine = Isobander::new(&xs, &ys, &z, nrow, ncol)?;
/// for (&lo, &hi) in lower.iter().zip(&upper) {
///     engine.set_levels(lo, hi);
///     engine.compute()?;
///     let paths = engine.collect()?;
/// }
/// ```
pub struct Isobander<'a, T: Scalar> {
    grid: GridView<'a, T>,
    vlo: T,
    vhi: T,
    links: HashMap<GridPoint, BandLinks>,
}

impl<'a, T: Scalar> Isobander<'a, T> {
    /// Create an engine over a column-major value matrix
    ///
    /// Fails if the coordinate or value slice lengths do not match the
    /// dimensions. Both levels start at the first `x` value and are expected
    /// to be set via [`set_levels`](Isobander::set_levels) before computing.
    pub fn new(
        xs: &'a [T],
        ys: &'a [T],
        z: &'a [T],
        nrow: usize,
        ncol: usize,
    ) -> Result<Self, ContourError> {
        let grid = GridView::new(xs, ys, z, nrow, ncol)?;
        Ok(Self {
            grid,
            vlo: T::ZERO,
            vhi: T::ZERO,
            links: HashMap::new(),
        })
    }

    /// Set the band `[vlo, vhi)` for the next computation
    pub fn set_levels(&mut self, vlo: T, vhi: T) {
        self.vlo = vlo;
        self.vhi = vhi;
    }

    /// Classify all cells and stitch their elementary polygons
    ///
    /// Clears all previous state first, so calling this again after an error
    /// is a full reset. Degenerate grids (fewer than two rows or columns)
    /// produce no geometry.
    pub fn compute(&mut self) -> Result<(), ContourError> {
        let started = Instant::now();
        self.links.clear();

        let nrow = self.grid.nrow();
        let ncol = self.grid.ncol();
        if nrow < 2 || ncol < 2 {
            return Ok(());
        }

        // ternary corner classification: 0 below the band, 1 within, 2 above
        let mut ternary = vec![0u8; nrow * ncol];
        for c in 0..ncol {
            for r in 0..nrow {
                let z = self.grid.z(r, c);
                ternary[r + c * nrow] =
                    u8::from(z >= self.vlo && z < self.vhi) + 2 * u8::from(z >= self.vhi);
            }
        }

        let mut cells = vec![0u8; (nrow - 1) * (ncol - 1)];
        for r in 0..nrow - 1 {
            for c in 0..ncol - 1 {
                // cells with a non-finite corner draw nothing
                cells[r + c * (nrow - 1)] = if self.grid.cell_is_finite(r, c) {
                    27 * ternary[r + c * nrow]
                        + 9 * ternary[r + (c + 1) * nrow]
                        + 3 * ternary[r + 1 + (c + 1) * nrow]
                        + ternary[r + 1 + c * nrow]
                } else {
                    0
                };
            }
        }

        for r in 0..nrow - 1 {
            for c in 0..ncol - 1 {
                self.emit_cell(r, c, cells[r + c * (nrow - 1)])?;
            }
        }

        debug!(
            "isoband [{:?}, {:?}): {} grid points stitched in {:?}",
            self.vlo,
            self.vhi,
            self.links.len(),
            started.elapsed()
        );
        Ok(())
    }

    /// Emit the elementary polygon(s) for one cell
    ///
    /// All polygons walk the cell border clockwise; that shared orientation
    /// is what makes edges of adjacent cells cancel during merging.
    fn emit_cell(&mut self, r: usize, c: usize, case: u8) -> Result<(), ContourError> {
        use PointKind::{Corner, HorizHi, HorizLo, VertHi, VertLo};
        let gp = GridPoint::new;

        match case {
            // no contour
            0 | 80 => {}

            // single triangle
            1 => {
                // 0001
                self.merge_poly(&[
                    gp(r, c, VertLo),
                    gp(r + 1, c, HorizLo),
                    gp(r + 1, c, Corner),
                ])?;
            }
            3 => {
                // 0010
                self.merge_poly(&[
                    gp(r, c + 1, VertLo),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, HorizLo),
                ])?;
            }
            9 => {
                // 0100
                self.merge_poly(&[
                    gp(r, c, HorizLo),
                    gp(r, c + 1, Corner),
                    gp(r, c + 1, VertLo),
                ])?;
            }
            27 => {
                // 1000
                self.merge_poly(&[gp(r, c, VertLo), gp(r, c, Corner), gp(r, c, HorizLo)])?;
            }
            79 => {
                // 2221
                self.merge_poly(&[
                    gp(r, c, VertHi),
                    gp(r + 1, c, HorizHi),
                    gp(r + 1, c, Corner),
                ])?;
            }
            77 => {
                // 2212
                self.merge_poly(&[
                    gp(r, c + 1, VertHi),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, HorizHi),
                ])?;
            }
            71 => {
                // 2122
                self.merge_poly(&[
                    gp(r, c, HorizHi),
                    gp(r, c + 1, Corner),
                    gp(r, c + 1, VertHi),
                ])?;
            }
            53 => {
                // 1222
                self.merge_poly(&[gp(r, c, VertHi), gp(r, c, Corner), gp(r, c, HorizHi)])?;
            }

            // single trapezoid
            78 => {
                // 2220
                self.merge_poly(&[
                    gp(r, c, VertHi),
                    gp(r + 1, c, HorizHi),
                    gp(r + 1, c, HorizLo),
                    gp(r, c, VertLo),
                ])?;
            }
            74 => {
                // 2202
                self.merge_poly(&[
                    gp(r + 1, c, HorizHi),
                    gp(r, c + 1, VertHi),
                    gp(r, c + 1, VertLo),
                    gp(r + 1, c, HorizLo),
                ])?;
            }
            62 => {
                // 2022
                self.merge_poly(&[
                    gp(r, c + 1, VertHi),
                    gp(r, c, HorizHi),
                    gp(r, c, HorizLo),
                    gp(r, c + 1, VertLo),
                ])?;
            }
            26 => {
                // 0222
                self.merge_poly(&[
                    gp(r, c, HorizHi),
                    gp(r, c, VertHi),
                    gp(r, c, VertLo),
                    gp(r, c, HorizLo),
                ])?;
            }
            2 => {
                // 0002
                self.merge_poly(&[
                    gp(r, c, VertLo),
                    gp(r + 1, c, HorizLo),
                    gp(r + 1, c, HorizHi),
                    gp(r, c, VertHi),
                ])?;
            }
            6 => {
                // 0020
                self.merge_poly(&[
                    gp(r + 1, c, HorizLo),
                    gp(r, c + 1, VertLo),
                    gp(r, c + 1, VertHi),
                    gp(r + 1, c, HorizHi),
                ])?;
            }
            18 => {
                // 0200
                self.merge_poly(&[
                    gp(r, c + 1, VertLo),
                    gp(r, c, HorizLo),
                    gp(r, c, HorizHi),
                    gp(r, c + 1, VertHi),
                ])?;
            }
            54 => {
                // 2000
                self.merge_poly(&[
                    gp(r, c, HorizLo),
                    gp(r, c, VertLo),
                    gp(r, c, VertHi),
                    gp(r, c, HorizHi),
                ])?;
            }

            // single rectangle
            4 => {
                // 0011
                self.merge_poly(&[
                    gp(r, c, VertLo),
                    gp(r, c + 1, VertLo),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, Corner),
                ])?;
            }
            12 => {
                // 0110
                self.merge_poly(&[
                    gp(r, c, HorizLo),
                    gp(r, c + 1, Corner),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, HorizLo),
                ])?;
            }
            36 => {
                // 1100
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c + 1, Corner),
                    gp(r, c + 1, VertLo),
                    gp(r, c, VertLo),
                ])?;
            }
            28 => {
                // 1001
                self.merge_poly(&[
                    gp(r, c, HorizLo),
                    gp(r + 1, c, HorizLo),
                    gp(r + 1, c, Corner),
                    gp(r, c, Corner),
                ])?;
            }
            76 => {
                // 2211
                self.merge_poly(&[
                    gp(r, c, VertHi),
                    gp(r, c + 1, VertHi),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, Corner),
                ])?;
            }
            68 => {
                // 2112
                self.merge_poly(&[
                    gp(r, c, HorizHi),
                    gp(r, c + 1, Corner),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, HorizHi),
                ])?;
            }
            44 => {
                // 1122
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c + 1, Corner),
                    gp(r, c + 1, VertHi),
                    gp(r, c, VertHi),
                ])?;
            }
            52 => {
                // 1221
                self.merge_poly(&[
                    gp(r, c, HorizHi),
                    gp(r + 1, c, HorizHi),
                    gp(r + 1, c, Corner),
                    gp(r, c, Corner),
                ])?;
            }
            72 => {
                // 2200
                self.merge_poly(&[
                    gp(r, c, VertHi),
                    gp(r, c + 1, VertHi),
                    gp(r, c + 1, VertLo),
                    gp(r, c, VertLo),
                ])?;
            }
            56 => {
                // 2002
                self.merge_poly(&[
                    gp(r, c, HorizHi),
                    gp(r, c, HorizLo),
                    gp(r + 1, c, HorizLo),
                    gp(r + 1, c, HorizHi),
                ])?;
            }
            8 => {
                // 0022
                self.merge_poly(&[
                    gp(r, c, VertLo),
                    gp(r, c + 1, VertLo),
                    gp(r, c + 1, VertHi),
                    gp(r, c, VertHi),
                ])?;
            }
            24 => {
                // 0220
                self.merge_poly(&[
                    gp(r, c, HorizLo),
                    gp(r, c, HorizHi),
                    gp(r + 1, c, HorizHi),
                    gp(r + 1, c, HorizLo),
                ])?;
            }

            // single square
            40 => {
                // 1111
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c + 1, Corner),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, Corner),
                ])?;
            }

            // single pentagon
            49 => {
                // 1211
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c, HorizHi),
                    gp(r, c + 1, VertHi),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, Corner),
                ])?;
            }
            67 => {
                // 2111
                self.merge_poly(&[
                    gp(r + 1, c, Corner),
                    gp(r, c, VertHi),
                    gp(r, c, HorizHi),
                    gp(r, c + 1, Corner),
                    gp(r + 1, c + 1, Corner),
                ])?;
            }
            41 => {
                // 1112
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c + 1, Corner),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, HorizHi),
                    gp(r, c, VertHi),
                ])?;
            }
            43 => {
                // 1121
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c + 1, Corner),
                    gp(r, c + 1, VertHi),
                    gp(r + 1, c, HorizHi),
                    gp(r + 1, c, Corner),
                ])?;
            }
            31 => {
                // 1011
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c, HorizLo),
                    gp(r, c + 1, VertLo),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, Corner),
                ])?;
            }
            13 => {
                // 0111
                self.merge_poly(&[
                    gp(r + 1, c, Corner),
                    gp(r, c, VertLo),
                    gp(r, c, HorizLo),
                    gp(r, c + 1, Corner),
                    gp(r + 1, c + 1, Corner),
                ])?;
            }
            39 => {
                // 1110
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c + 1, Corner),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, HorizLo),
                    gp(r, c, VertLo),
                ])?;
            }
            37 => {
                // 1101
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c + 1, Corner),
                    gp(r, c + 1, VertLo),
                    gp(r + 1, c, HorizLo),
                    gp(r + 1, c, Corner),
                ])?;
            }
            45 => {
                // 1200
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c, HorizHi),
                    gp(r, c + 1, VertHi),
                    gp(r, c + 1, VertLo),
                    gp(r, c, VertLo),
                ])?;
            }
            15 => {
                // 0120
                self.merge_poly(&[
                    gp(r, c + 1, Corner),
                    gp(r, c + 1, VertHi),
                    gp(r + 1, c, HorizHi),
                    gp(r + 1, c, HorizLo),
                    gp(r, c, HorizLo),
                ])?;
            }
            5 => {
                // 0012
                self.merge_poly(&[
                    gp(r, c, VertLo),
                    gp(r, c + 1, VertLo),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, HorizHi),
                    gp(r, c, VertHi),
                ])?;
            }
            55 => {
                // 2001
                self.merge_poly(&[
                    gp(r + 1, c, Corner),
                    gp(r, c, VertHi),
                    gp(r, c, HorizHi),
                    gp(r, c, HorizLo),
                    gp(r + 1, c, HorizLo),
                ])?;
            }
            35 => {
                // 1022
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c, HorizLo),
                    gp(r, c + 1, VertLo),
                    gp(r, c + 1, VertHi),
                    gp(r, c, VertHi),
                ])?;
            }
            65 => {
                // 2102
                self.merge_poly(&[
                    gp(r, c + 1, Corner),
                    gp(r, c + 1, VertLo),
                    gp(r + 1, c, HorizLo),
                    gp(r + 1, c, HorizHi),
                    gp(r, c, HorizHi),
                ])?;
            }
            75 => {
                // 2210
                self.merge_poly(&[
                    gp(r, c, VertHi),
                    gp(r, c + 1, VertHi),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, HorizLo),
                    gp(r, c, VertLo),
                ])?;
            }
            25 => {
                // 0221
                self.merge_poly(&[
                    gp(r + 1, c, Corner),
                    gp(r, c, VertLo),
                    gp(r, c, HorizLo),
                    gp(r, c, HorizHi),
                    gp(r + 1, c, HorizHi),
                ])?;
            }
            29 => {
                // 1002
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c, HorizLo),
                    gp(r + 1, c, HorizLo),
                    gp(r + 1, c, HorizHi),
                    gp(r, c, VertHi),
                ])?;
            }
            63 => {
                // 2100
                self.merge_poly(&[
                    gp(r, c + 1, Corner),
                    gp(r, c + 1, VertLo),
                    gp(r, c, VertLo),
                    gp(r, c, VertHi),
                    gp(r, c, HorizHi),
                ])?;
            }
            21 => {
                // 0210
                self.merge_poly(&[
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, HorizLo),
                    gp(r, c, HorizLo),
                    gp(r, c, HorizHi),
                    gp(r, c + 1, VertHi),
                ])?;
            }
            7 => {
                // 0021
                self.merge_poly(&[
                    gp(r + 1, c, Corner),
                    gp(r, c, VertLo),
                    gp(r, c + 1, VertLo),
                    gp(r, c + 1, VertHi),
                    gp(r + 1, c, HorizHi),
                ])?;
            }
            51 => {
                // 1220
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c, HorizHi),
                    gp(r + 1, c, HorizHi),
                    gp(r + 1, c, HorizLo),
                    gp(r, c, VertLo),
                ])?;
            }
            17 => {
                // 0122
                self.merge_poly(&[
                    gp(r, c + 1, Corner),
                    gp(r, c + 1, VertHi),
                    gp(r, c, VertHi),
                    gp(r, c, VertLo),
                    gp(r, c, HorizLo),
                ])?;
            }
            59 => {
                // 2012
                self.merge_poly(&[
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, HorizHi),
                    gp(r, c, HorizHi),
                    gp(r, c, HorizLo),
                    gp(r, c + 1, VertLo),
                ])?;
            }
            73 => {
                // 2201
                self.merge_poly(&[
                    gp(r + 1, c, Corner),
                    gp(r, c, VertHi),
                    gp(r, c + 1, VertHi),
                    gp(r, c + 1, VertLo),
                    gp(r + 1, c, HorizLo),
                ])?;
            }

            // single hexagon
            22 => {
                // 0211
                self.merge_poly(&[
                    gp(r + 1, c, Corner),
                    gp(r, c, VertLo),
                    gp(r, c, HorizLo),
                    gp(r, c, HorizHi),
                    gp(r, c + 1, VertHi),
                    gp(r + 1, c + 1, Corner),
                ])?;
            }
            66 => {
                // 2110
                self.merge_poly(&[
                    gp(r, c + 1, Corner),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, HorizLo),
                    gp(r, c, VertLo),
                    gp(r, c, VertHi),
                    gp(r, c, HorizHi),
                ])?;
            }
            38 => {
                // 1102
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c + 1, Corner),
                    gp(r, c + 1, VertLo),
                    gp(r + 1, c, HorizLo),
                    gp(r + 1, c, HorizHi),
                    gp(r, c, VertHi),
                ])?;
            }
            34 => {
                // 1021
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c, HorizLo),
                    gp(r, c + 1, VertLo),
                    gp(r, c + 1, VertHi),
                    gp(r + 1, c, HorizHi),
                    gp(r + 1, c, Corner),
                ])?;
            }
            58 => {
                // 2011
                self.merge_poly(&[
                    gp(r + 1, c, Corner),
                    gp(r, c, VertHi),
                    gp(r, c, HorizHi),
                    gp(r, c, HorizLo),
                    gp(r, c + 1, VertLo),
                    gp(r + 1, c + 1, Corner),
                ])?;
            }
            14 => {
                // 0112
                self.merge_poly(&[
                    gp(r, c + 1, Corner),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, HorizHi),
                    gp(r, c, VertHi),
                    gp(r, c, VertLo),
                    gp(r, c, HorizLo),
                ])?;
            }
            42 => {
                // 1120
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c + 1, Corner),
                    gp(r, c + 1, VertHi),
                    gp(r + 1, c, HorizHi),
                    gp(r + 1, c, HorizLo),
                    gp(r, c, VertLo),
                ])?;
            }
            46 => {
                // 1201
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c, HorizHi),
                    gp(r, c + 1, VertHi),
                    gp(r, c + 1, VertLo),
                    gp(r + 1, c, HorizLo),
                    gp(r + 1, c, Corner),
                ])?;
            }
            64 => {
                // 2101
                self.merge_poly(&[
                    gp(r + 1, c, Corner),
                    gp(r, c, VertHi),
                    gp(r, c, HorizHi),
                    gp(r, c + 1, Corner),
                    gp(r, c + 1, VertLo),
                    gp(r + 1, c, HorizLo),
                ])?;
            }
            16 => {
                // 0121
                self.merge_poly(&[
                    gp(r, c + 1, Corner),
                    gp(r, c + 1, VertHi),
                    gp(r + 1, c, HorizHi),
                    gp(r + 1, c, Corner),
                    gp(r, c, VertLo),
                    gp(r, c, HorizLo),
                ])?;
            }
            32 => {
                // 1012
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c, HorizLo),
                    gp(r, c + 1, VertLo),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, HorizHi),
                    gp(r, c, VertHi),
                ])?;
            }
            48 => {
                // 1210
                self.merge_poly(&[
                    gp(r, c, Corner),
                    gp(r, c, HorizHi),
                    gp(r, c + 1, VertHi),
                    gp(r + 1, c + 1, Corner),
                    gp(r + 1, c, HorizLo),
                    gp(r, c, VertLo),
                ])?;
            }

            // 6-sided saddle
            10 => {
                // 0101
                let vc = self.grid.central_value(r, c);
                if vc < self.vlo {
                    self.merge_poly(&[
                        gp(r + 1, c, Corner),
                        gp(r, c, VertLo),
                        gp(r + 1, c, HorizLo),
                    ])?;
                    self.merge_poly(&[
                        gp(r, c + 1, Corner),
                        gp(r, c + 1, VertLo),
                        gp(r, c, HorizLo),
                    ])?;
                } else {
                    self.merge_poly(&[
                        gp(r + 1, c, Corner),
                        gp(r, c, VertLo),
                        gp(r, c, HorizLo),
                        gp(r, c + 1, Corner),
                        gp(r, c + 1, VertLo),
                        gp(r + 1, c, HorizLo),
                    ])?;
                }
            }
            30 => {
                // 1010
                let vc = self.grid.central_value(r, c);
                if vc < self.vlo {
                    self.merge_poly(&[gp(r, c, Corner), gp(r, c, HorizLo), gp(r, c, VertLo)])?;
                    self.merge_poly(&[
                        gp(r + 1, c + 1, Corner),
                        gp(r + 1, c, HorizLo),
                        gp(r, c + 1, VertLo),
                    ])?;
                } else {
                    self.merge_poly(&[
                        gp(r, c, Corner),
                        gp(r, c, HorizLo),
                        gp(r, c + 1, VertLo),
                        gp(r + 1, c + 1, Corner),
                        gp(r + 1, c, HorizLo),
                        gp(r, c, VertLo),
                    ])?;
                }
            }
            70 => {
                // 2121
                let vc = self.grid.central_value(r, c);
                if vc >= self.vhi {
                    self.merge_poly(&[
                        gp(r + 1, c, Corner),
                        gp(r, c, VertHi),
                        gp(r + 1, c, HorizHi),
                    ])?;
                    self.merge_poly(&[
                        gp(r, c + 1, Corner),
                        gp(r, c + 1, VertHi),
                        gp(r, c, HorizHi),
                    ])?;
                } else {
                    self.merge_poly(&[
                        gp(r + 1, c, Corner),
                        gp(r, c, VertHi),
                        gp(r, c, HorizHi),
                        gp(r, c + 1, Corner),
                        gp(r, c + 1, VertHi),
                        gp(r + 1, c, HorizHi),
                    ])?;
                }
            }
            50 => {
                // 1212
                let vc = self.grid.central_value(r, c);
                if vc >= self.vhi {
                    self.merge_poly(&[gp(r, c, Corner), gp(r, c, HorizHi), gp(r, c, VertHi)])?;
                    self.merge_poly(&[
                        gp(r + 1, c + 1, Corner),
                        gp(r + 1, c, HorizHi),
                        gp(r, c + 1, VertHi),
                    ])?;
                } else {
                    self.merge_poly(&[
                        gp(r, c, Corner),
                        gp(r, c, HorizHi),
                        gp(r, c + 1, VertHi),
                        gp(r + 1, c + 1, Corner),
                        gp(r + 1, c, HorizHi),
                        gp(r, c, VertHi),
                    ])?;
                }
            }

            // 7-sided saddle
            69 => {
                // 2120
                let vc = self.grid.central_value(r, c);
                if vc >= self.vhi {
                    self.merge_poly(&[
                        gp(r, c + 1, Corner),
                        gp(r, c + 1, VertHi),
                        gp(r, c, HorizHi),
                    ])?;
                    self.merge_poly(&[
                        gp(r, c, VertHi),
                        gp(r + 1, c, HorizHi),
                        gp(r + 1, c, HorizLo),
                        gp(r, c, VertLo),
                    ])?;
                } else {
                    self.merge_poly(&[
                        gp(r, c + 1, Corner),
                        gp(r, c + 1, VertHi),
                        gp(r + 1, c, HorizHi),
                        gp(r + 1, c, HorizLo),
                        gp(r, c, VertLo),
                        gp(r, c, VertHi),
                        gp(r, c, HorizHi),
                    ])?;
                }
            }
            61 => {
                // 2021
                let vc = self.grid.central_value(r, c);
                if vc >= self.vhi {
                    self.merge_poly(&[
                        gp(r + 1, c, Corner),
                        gp(r, c, VertHi),
                        gp(r + 1, c, HorizHi),
                    ])?;
                    self.merge_poly(&[
                        gp(r, c + 1, VertHi),
                        gp(r, c, HorizHi),
                        gp(r, c, HorizLo),
                        gp(r, c + 1, VertLo),
                    ])?;
                } else {
                    self.merge_poly(&[
                        gp(r + 1, c, Corner),
                        gp(r, c, VertHi),
                        gp(r, c, HorizHi),
                        gp(r, c, HorizLo),
                        gp(r, c + 1, VertLo),
                        gp(r, c + 1, VertHi),
                        gp(r + 1, c, HorizHi),
                    ])?;
                }
            }
            47 => {
                // 1202
                let vc = self.grid.central_value(r, c);
                if vc >= self.vhi {
                    self.merge_poly(&[gp(r, c, Corner), gp(r, c, HorizHi), gp(r, c, VertHi)])?;
                    self.merge_poly(&[
                        gp(r + 1, c, HorizHi),
                        gp(r, c + 1, VertHi),
                        gp(r, c + 1, VertLo),
                        gp(r + 1, c, HorizLo),
                    ])?;
                } else {
                    self.merge_poly(&[
                        gp(r, c, Corner),
                        gp(r, c, HorizHi),
                        gp(r, c + 1, VertHi),
                        gp(r, c + 1, VertLo),
                        gp(r + 1, c, HorizLo),
                        gp(r + 1, c, HorizHi),
                        gp(r, c, VertHi),
                    ])?;
                }
            }
            23 => {
                // 0212
                let vc = self.grid.central_value(r, c);
                if vc >= self.vhi {
                    self.merge_poly(&[
                        gp(r + 1, c + 1, Corner),
                        gp(r + 1, c, HorizHi),
                        gp(r, c + 1, VertHi),
                    ])?;
                    self.merge_poly(&[
                        gp(r, c, HorizHi),
                        gp(r, c, VertHi),
                        gp(r, c, VertLo),
                        gp(r, c, HorizLo),
                    ])?;
                } else {
                    self.merge_poly(&[
                        gp(r + 1, c + 1, Corner),
                        gp(r + 1, c, HorizHi),
                        gp(r, c, VertHi),
                        gp(r, c, VertLo),
                        gp(r, c, HorizLo),
                        gp(r, c, HorizHi),
                        gp(r, c + 1, VertHi),
                    ])?;
                }
            }
            11 => {
                // 0102
                let vc = self.grid.central_value(r, c);
                if vc < self.vlo {
                    self.merge_poly(&[
                        gp(r, c + 1, Corner),
                        gp(r, c + 1, VertLo),
                        gp(r, c, HorizLo),
                    ])?;
                    self.merge_poly(&[
                        gp(r, c, VertLo),
                        gp(r + 1, c, HorizLo),
                        gp(r + 1, c, HorizHi),
                        gp(r, c, VertHi),
                    ])?;
                } else {
                    self.merge_poly(&[
                        gp(r, c + 1, Corner),
                        gp(r, c + 1, VertLo),
                        gp(r + 1, c, HorizLo),
                        gp(r + 1, c, HorizHi),
                        gp(r, c, VertHi),
                        gp(r, c, VertLo),
                        gp(r, c, HorizLo),
                    ])?;
                }
            }
            19 => {
                // 0201
                let vc = self.grid.central_value(r, c);
                if vc < self.vlo {
                    self.merge_poly(&[
                        gp(r + 1, c, Corner),
                        gp(r, c, VertLo),
                        gp(r + 1, c, HorizLo),
                    ])?;
                    self.merge_poly(&[
                        gp(r, c + 1, VertLo),
                        gp(r, c, HorizLo),
                        gp(r, c, HorizHi),
                        gp(r, c + 1, VertHi),
                    ])?;
                } else {
                    self.merge_poly(&[
                        gp(r + 1, c, Corner),
                        gp(r, c, VertLo),
                        gp(r, c, HorizLo),
                        gp(r, c, HorizHi),
                        gp(r, c + 1, VertHi),
                        gp(r, c + 1, VertLo),
                        gp(r + 1, c, HorizLo),
                    ])?;
                }
            }
            33 => {
                // 1020
                let vc = self.grid.central_value(r, c);
                if vc < self.vlo {
                    self.merge_poly(&[gp(r, c, Corner), gp(r, c, HorizLo), gp(r, c, VertLo)])?;
                    self.merge_poly(&[
                        gp(r + 1, c, HorizLo),
                        gp(r, c + 1, VertLo),
                        gp(r, c + 1, VertHi),
                        gp(r + 1, c, HorizHi),
                    ])?;
                } else {
                    self.merge_poly(&[
                        gp(r, c, Corner),
                        gp(r, c, HorizLo),
                        gp(r, c + 1, VertLo),
                        gp(r, c + 1, VertHi),
                        gp(r + 1, c, HorizHi),
                        gp(r + 1, c, HorizLo),
                        gp(r, c, VertLo),
                    ])?;
                }
            }
            57 => {
                // 2010
                let vc = self.grid.central_value(r, c);
                if vc < self.vlo {
                    self.merge_poly(&[
                        gp(r + 1, c + 1, Corner),
                        gp(r + 1, c, HorizLo),
                        gp(r, c + 1, VertLo),
                    ])?;
                    self.merge_poly(&[
                        gp(r, c, HorizLo),
                        gp(r, c, VertLo),
                        gp(r, c, VertHi),
                        gp(r, c, HorizHi),
                    ])?;
                } else {
                    self.merge_poly(&[
                        gp(r + 1, c + 1, Corner),
                        gp(r + 1, c, HorizLo),
                        gp(r, c, VertLo),
                        gp(r, c, VertHi),
                        gp(r, c, HorizHi),
                        gp(r, c, HorizLo),
                        gp(r, c + 1, VertLo),
                    ])?;
                }
            }

            // 8-sided saddle
            60 => {
                // 2020
                let vc = self.grid.central_value(r, c);
                if vc < self.vlo {
                    self.merge_poly(&[
                        gp(r, c, VertHi),
                        gp(r, c, HorizHi),
                        gp(r, c, HorizLo),
                        gp(r, c, VertLo),
                    ])?;
                    self.merge_poly(&[
                        gp(r, c + 1, VertHi),
                        gp(r + 1, c, HorizHi),
                        gp(r + 1, c, HorizLo),
                        gp(r, c + 1, VertLo),
                    ])?;
                } else if vc >= self.vhi {
                    self.merge_poly(&[
                        gp(r, c, VertHi),
                        gp(r + 1, c, HorizHi),
                        gp(r + 1, c, HorizLo),
                        gp(r, c, VertLo),
                    ])?;
                    self.merge_poly(&[
                        gp(r, c + 1, VertHi),
                        gp(r, c, HorizHi),
                        gp(r, c, HorizLo),
                        gp(r, c + 1, VertLo),
                    ])?;
                } else {
                    self.merge_poly(&[
                        gp(r, c, VertHi),
                        gp(r, c, HorizHi),
                        gp(r, c, HorizLo),
                        gp(r, c + 1, VertLo),
                        gp(r, c + 1, VertHi),
                        gp(r + 1, c, HorizHi),
                        gp(r + 1, c, HorizLo),
                        gp(r, c, VertLo),
                    ])?;
                }
            }
            20 => {
                // 0202
                let vc = self.grid.central_value(r, c);
                if vc < self.vlo {
                    self.merge_poly(&[
                        gp(r, c, VertLo),
                        gp(r + 1, c, HorizLo),
                        gp(r + 1, c, HorizHi),
                        gp(r, c, VertHi),
                    ])?;
                    self.merge_poly(&[
                        gp(r, c + 1, VertLo),
                        gp(r, c, HorizLo),
                        gp(r, c, HorizHi),
                        gp(r, c + 1, VertHi),
                    ])?;
                } else if vc >= self.vhi {
                    self.merge_poly(&[
                        gp(r, c, VertLo),
                        gp(r, c, HorizLo),
                        gp(r, c, HorizHi),
                        gp(r, c, VertHi),
                    ])?;
                    self.merge_poly(&[
                        gp(r, c + 1, VertLo),
                        gp(r + 1, c, HorizLo),
                        gp(r + 1, c, HorizHi),
                        gp(r, c + 1, VertHi),
                    ])?;
                } else {
                    self.merge_poly(&[
                        gp(r, c, VertLo),
                        gp(r, c, HorizLo),
                        gp(r, c, HorizHi),
                        gp(r, c + 1, VertHi),
                        gp(r, c + 1, VertLo),
                        gp(r + 1, c, HorizLo),
                        gp(r + 1, c, HorizHi),
                        gp(r, c, VertHi),
                    ])?;
                }
            }

            _ => {}
        }

        Ok(())
    }

    /// Merge one elementary clockwise polygon into the connectivity map
    ///
    /// For each vertex, the locally implied `prev`/`next` neighbours are
    /// reconciled with any existing record at the same grid point. An edge of
    /// the new polygon that retraces an existing edge in the opposite
    /// direction cancels it; a vertex whose both edges cancel drops out of
    /// the merged ring entirely. When nothing cancels, the vertex carries two
    /// genuinely distinct rings and the new connectivity is stored as the
    /// alternative record.
    ///
    /// Scoring decisions are made against the pre-merge state of the map for
    /// the whole polygon, then all updates are applied at once.
    fn merge_poly(&mut self, poly: &[GridPoint]) -> Result<(), ContourError> {
        let n = poly.len();
        let mut merged: ArrayVec<BandLinks, 8> = ArrayVec::new();
        let mut to_delete = [false; 8];

        for i in 0..n {
            let lprev = poly[if i > 0 { i - 1 } else { n - 1 }];
            let lnext = poly[if i + 1 < n { i + 1 } else { 0 }];
            let mut rec = BandLinks {
                prev: lprev,
                next: lnext,
                alt: None,
                done: false,
            };

            if let Some(existing) = self.links.get(&poly[i]) {
                match existing.alt {
                    None => {
                        // basic scenario, no alternative record here
                        let score =
                            2 * u8::from(lnext == existing.prev) + u8::from(lprev == existing.next);
                        match score {
                            3 => {
                                // both edges cancel, the vertex drops out
                                to_delete[i] = true;
                            }
                            2 => {
                                // merge in "next" direction
                                rec.next = existing.next;
                            }
                            1 => {
                                // merge in "prev" direction
                                rec.prev = existing.prev;
                            }
                            _ => {
                                // two unmergeable rings share this grid
                                // point; keep both connectivities
                                rec.alt = Some(AltLinks {
                                    prev: existing.prev,
                                    next: existing.next,
                                    done: false,
                                });
                            }
                        }
                    }
                    Some(alt) => {
                        let score = 8 * u8::from(lnext == alt.prev)
                            + 4 * u8::from(lprev == alt.next)
                            + 2 * u8::from(lnext == existing.prev)
                            + u8::from(lprev == existing.next);
                        match score {
                            9 => {
                                // 1001: three-way merge
                                rec.prev = existing.prev;
                                rec.next = alt.next;
                            }
                            6 => {
                                // 0110: three-way merge
                                rec.prev = alt.prev;
                                rec.next = existing.next;
                            }
                            8 => {
                                // 1000: two-way merge on the alternative only
                                rec = BandLinks {
                                    prev: existing.prev,
                                    next: existing.next,
                                    alt: Some(AltLinks {
                                        prev: lprev,
                                        next: alt.next,
                                        done: false,
                                    }),
                                    done: false,
                                };
                            }
                            4 => {
                                // 0100: two-way merge on the alternative only
                                rec = BandLinks {
                                    prev: existing.prev,
                                    next: existing.next,
                                    alt: Some(AltLinks {
                                        prev: alt.prev,
                                        next: lnext,
                                        done: false,
                                    }),
                                    done: false,
                                };
                            }
                            2 => {
                                // 0010: two-way merge on the primary only
                                rec.next = existing.next;
                                rec.alt = Some(alt);
                            }
                            1 => {
                                // 0001: two-way merge on the primary only
                                rec.prev = existing.prev;
                                rec.alt = Some(alt);
                            }
                            _ => return Err(ContourError::UnmergeableVertex),
                        }
                    }
                }
            }

            merged.push(rec);
        }

        for (i, p) in poly.iter().enumerate() {
            if to_delete[i] {
                self.links.remove(p);
            } else {
                self.links.insert(*p, merged[i]);
            }
        }

        Ok(())
    }

    /// Walk the assembled connectivity and emit one path per ring
    ///
    /// Rings are emitted with monotonically increasing 1-based ids. A vertex
    /// with an uncollected alternative record is entered on the alternative
    /// slot first; during the walk the slot whose `prev` matches the vertex
    /// we just came from is the one consumed.
    pub fn collect(&mut self) -> Result<ContourPaths<T>, ContourError> {
        let mut out = ContourPaths::default();
        let mut cur_id = 0i32;
        // each record has at most two collectable slots
        let max_steps = 2 * self.links.len() + 1;

        let entries: Vec<GridPoint> = self.links.keys().copied().collect();
        for start in entries {
            let rec = self.links.get(&start).ok_or(ContourError::BrokenWalk)?;
            let fully_done = rec.done && rec.alt.map_or(true, |a| a.done);
            if fully_done {
                continue;
            }

            cur_id += 1;
            let mut prev = match rec.alt {
                Some(alt) if !alt.done => alt.prev,
                _ => rec.prev,
            };
            let mut cur = start;
            let mut steps = 0usize;

            loop {
                let (px, py) = self.grid.point_coords(cur, self.vlo, self.vhi);
                out.push(px, py, cur_id);

                let rec = self.links.get_mut(&cur).ok_or(ContourError::BrokenWalk)?;
                let next = match rec.alt.as_mut() {
                    Some(alt) if alt.prev == prev => {
                        alt.done = true;
                        alt.next
                    }
                    _ => {
                        rec.done = true;
                        rec.next
                    }
                };

                prev = cur;
                cur = next;
                if cur == start {
                    break;
                }

                steps += 1;
                if steps > max_steps {
                    return Err(ContourError::BrokenWalk);
                }
            }
        }

        debug!(
            "isoband [{:?}, {:?}): collected {} rings, {} vertices",
            self.vlo,
            self.vhi,
            out.path_count(),
            out.len()
        );
        Ok(out)
    }
}
