//! # grid-contours
//!
//! Isoline and isoband extraction from regular rectangular grids of scalar
//! samples using the marching squares algorithm.
//!
//! This library computes **isolines** (contour lines at a level) and
//! **isobands** (oriented closed boundaries of the region between two levels)
//! from a column-major value matrix over sorted x/y coordinates. Per-cell
//! elementary shapes are merged into maximal polylines and rings *as cells
//! are processed*, by indexing every vertex in a single hash map keyed by its
//! discrete grid-point identity — no coordinate snapping, no post-hoc
//! deduplication.
//!
//! ## Examples
//!
//! ### Isolines
//!
//! ```rust
//! use grid_contours::isolines;
//!
//! let xs = [0.0, 1.0, 2.0];
//! let ys = [0.0, 1.0, 2.0];
//! // column-major: a single spike of height 1 in the centre
//! let z = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
//!
//! let results = isolines(&xs, &ys, &z, 3, 3, &[0.5]).unwrap();
//! // one closed diamond around the spike, explicitly closed
//! assert_eq!(results[0].path_count(), 1);
//! assert_eq!(results[0].len(), 5);
//! ```
//!
//! ### Isobands
//!
//! ```rust
//! use grid_contours::isobands;
//!
//! let xs = [0.0, 1.0];
//! let ys = [0.0, 1.0];
//! let z = [0.0, 2.0, 1.0, 3.0];
//!
//! let results = isobands(&xs, &ys, &z, 2, 2, &[0.5], &[2.5]).unwrap();
//! // the middle strip of the cell, one six-sided ring
//! assert_eq!(results[0].path_count(), 1);
//! assert_eq!(results[0].len(), 6);
//! ```
//!
//! ### Isolines vs isobands
//!
//! | | Isolines | Isobands |
//! |---------|----------|----------|
//! | **Classification** | Binary (below/above) | Ternary (below/within/above) |
//! | **Configurations** | 16 | 81 |
//! | **Output paths** | Open or closed polylines | Closed clockwise rings |
//! | **Holes** | n/a | Opposite winding, separate ring |
//!
//! ## Reuse and parallelism
//!
//! A single computation is strictly single-threaded and synchronous; the
//! engines ([`Isoliner`], [`Isobander`]) own one connectivity map that is
//! cleared and repopulated per level, so the sequential drivers reuse one
//! engine across all requested levels. [`isolines_par`] and [`isobands_par`]
//! instead give every level its own engine and fan the levels out over
//! rayon's work-stealing pool.
//!
//! ## GeoJSON
//!
//! The [`geojson`](crate::geojson) module converts path sets into GeoJSON features
//! (`MultiLineString` for isolines, `MultiPolygon` with exterior/hole
//! nesting resolution for isobands).

mod error;
mod grid;
mod isobander;
mod isoliner;
mod paths;
mod point;

pub mod geojson;

pub use error::ContourError;
pub use grid::{GridView, Scalar};
pub use isobander::Isobander;
pub use isoliner::Isoliner;
pub use paths::{ContourPaths, Paths};
pub use point::{GridPoint, PointKind};

use rayon::prelude::*;

/// Compute isolines at each of the given levels
///
/// The value matrix `z` is column-major (`z[r + c * nrow]`) over the
/// coordinates `xs` (one per column) and `ys` (one per row), both assumed
/// strictly increasing. One engine is reused across all levels.
///
/// # Arguments
///
/// * `xs`, `ys` - grid coordinates; `xs.len() == ncol`, `ys.len() == nrow`
/// * `z` - column-major value matrix of `nrow * ncol` entries
/// * `levels` - contour levels, one output path set per level
///
/// # Errors
///
/// Length mismatches between the slices and the dimensions fail with the
/// corresponding [`ContourError`] variant; an unmergeable stitching state
/// (grid pathology) is fatal and yields no partial results.
pub fn isolines<T: Scalar>(
    xs: &[T],
    ys: &[T],
    z: &[T],
    nrow: usize,
    ncol: usize,
    levels: &[T],
) -> Result<Vec<ContourPaths<T>>, ContourError> {
    let mut engine = Isoliner::new(xs, ys, z, nrow, ncol)?;
    let mut results = Vec::with_capacity(levels.len());
    for &level in levels {
        engine.set_level(level);
        engine.compute()?;
        results.push(engine.collect()?);
    }
    Ok(results)
}

/// Compute isobands `[lower[i], upper[i])` for each level pair
///
/// See [`isolines`] for the grid layout. `lower` and `upper` must have the
/// same length; band `i` covers values `v` with `lower[i] <= v < upper[i]`.
pub fn isobands<T: Scalar>(
    xs: &[T],
    ys: &[T],
    z: &[T],
    nrow: usize,
    ncol: usize,
    lower: &[T],
    upper: &[T],
) -> Result<Vec<ContourPaths<T>>, ContourError> {
    if lower.len() != upper.len() {
        return Err(ContourError::LevelCountMismatch {
            lower: lower.len(),
            upper: upper.len(),
        });
    }

    let mut engine = Isobander::new(xs, ys, z, nrow, ncol)?;
    let mut results = Vec::with_capacity(lower.len());
    for (&lo, &hi) in lower.iter().zip(upper) {
        engine.set_levels(lo, hi);
        engine.compute()?;
        results.push(engine.collect()?);
    }
    Ok(results)
}

/// Compute isolines for many levels in parallel
///
/// Levels are distributed over rayon's work-stealing thread pool; each level
/// gets its own independent engine over the shared read-only grid. Results
/// come back in level order.
pub fn isolines_par<T: Scalar>(
    xs: &[T],
    ys: &[T],
    z: &[T],
    nrow: usize,
    ncol: usize,
    levels: &[T],
) -> Result<Vec<ContourPaths<T>>, ContourError> {
    levels
        .par_iter()
        .map(|&level| {
            let mut engine = Isoliner::new(xs, ys, z, nrow, ncol)?;
            engine.set_level(level);
            engine.compute()?;
            engine.collect()
        })
        .collect()
}

/// Compute isobands for many level pairs in parallel
///
/// The parallel counterpart of [`isobands`]; one independent engine per
/// band, results in level order.
pub fn isobands_par<T: Scalar>(
    xs: &[T],
    ys: &[T],
    z: &[T],
    nrow: usize,
    ncol: usize,
    lower: &[T],
    upper: &[T],
) -> Result<Vec<ContourPaths<T>>, ContourError> {
    if lower.len() != upper.len() {
        return Err(ContourError::LevelCountMismatch {
            lower: lower.len(),
            upper: upper.len(),
        });
    }

    lower
        .par_iter()
        .zip(upper.par_iter())
        .map(|(&lo, &hi)| {
            let mut engine = Isobander::new(xs, ys, z, nrow, ncol)?;
            engine.set_levels(lo, hi);
            engine.compute()?;
            engine.collect()
        })
        .collect()
}
