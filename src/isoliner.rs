//! Isoline engine
//!
//! Binary marching squares: each 2×2 cell is classified into one of 16 cases
//! by thresholding its corners against the level, and the emitting cases
//! contribute one or two two-point segments. Segments are merged into
//! maximal polylines as they arrive by attaching at free chain ends,
//! reversing one side when two chains meet head-to-head.

use std::collections::HashMap;
use std::time::Instant;

use log::debug;

use crate::error::ContourError;
use crate::grid::{GridView, Scalar};
use crate::paths::ContourPaths;
use crate::point::{GridPoint, PointKind};

/// Polyline connectivity at one grid point
///
/// `None` marks a free chain end; both links are populated everywhere except
/// at the two endpoints of an open polyline.
#[derive(Debug, Clone, Copy, Default)]
struct LineLinks {
    prev: Option<GridPoint>,
    next: Option<GridPoint>,
    done: bool,
}

/// Isoline extraction engine for one grid
///
/// Reusable across levels the same way as [`Isobander`](crate::Isobander):
/// `set_level` then `compute` clears and repopulates the connectivity map in
/// place.
pub struct Isoliner<'a, T: Scalar> {
    grid: GridView<'a, T>,
    level: T,
    links: HashMap<GridPoint, LineLinks>,
}

impl<'a, T: Scalar> Isoliner<'a, T> {
    /// Create an engine over a column-major value matrix
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
            level: T::ZERO,
            links: HashMap::new(),
        })
    }

    /// Set the contour level for the next computation
    pub fn set_level(&mut self, level: T) {
        self.level = level;
    }

    /// Classify all cells and stitch their segments
    pub fn compute(&mut self) -> Result<(), ContourError> {
        let started = Instant::now();
        self.links.clear();

        let nrow = self.grid.nrow();
        let ncol = self.grid.ncol();
        if nrow < 2 || ncol < 2 {
            return Ok(());
        }

        // binary corner classification: 1 at or above the level, else 0
        let mut binary = vec![0u8; nrow * ncol];
        for c in 0..ncol {
            for r in 0..nrow {
                binary[r + c * nrow] = u8::from(self.grid.z(r, c) >= self.level);
            }
        }

        let mut cells = vec![0u8; (nrow - 1) * (ncol - 1)];
        for r in 0..nrow - 1 {
            for c in 0..ncol - 1 {
                let mut index = if self.grid.cell_is_finite(r, c) {
                    8 * binary[r + c * nrow]
                        + 4 * binary[r + (c + 1) * nrow]
                        + 2 * binary[r + 1 + (c + 1) * nrow]
                        + binary[r + 1 + c * nrow]
                } else {
                    0
                };

                // two-segment saddles: the corner pattern alone is ambiguous,
                // the cell centre mean picks which diagonal the lines hug
                if index == 5 && self.grid.central_value(r, c) < self.level {
                    index = 10;
                } else if index == 10 && self.grid.central_value(r, c) < self.level {
                    index = 5;
                }

                cells[r + c * (nrow - 1)] = index;
            }
        }

        for r in 0..nrow - 1 {
            for c in 0..ncol - 1 {
                self.emit_cell(r, c, cells[r + c * (nrow - 1)])?;
            }
        }

        debug!(
            "isoline {:?}: {} grid points stitched in {:?}",
            self.level,
            self.links.len(),
            started.elapsed()
        );
        Ok(())
    }

    /// Emit the segment(s) for one cell
    fn emit_cell(&mut self, r: usize, c: usize, case: u8) -> Result<(), ContourError> {
        use PointKind::{HorizLo, VertLo};
        let gp = GridPoint::new;

        match case {
            0 | 15 => {}
            1 => self.merge_segment(gp(r, c, VertLo), gp(r + 1, c, HorizLo))?,
            2 => self.merge_segment(gp(r, c + 1, VertLo), gp(r + 1, c, HorizLo))?,
            3 => self.merge_segment(gp(r, c, VertLo), gp(r, c + 1, VertLo))?,
            4 => self.merge_segment(gp(r, c, HorizLo), gp(r, c + 1, VertLo))?,
            5 => {
                self.merge_segment(gp(r, c + 1, VertLo), gp(r + 1, c, HorizLo))?;
                self.merge_segment(gp(r, c, HorizLo), gp(r, c, VertLo))?;
            }
            6 => self.merge_segment(gp(r, c, HorizLo), gp(r + 1, c, HorizLo))?,
            7 => self.merge_segment(gp(r, c, HorizLo), gp(r, c, VertLo))?,
            8 => self.merge_segment(gp(r, c, HorizLo), gp(r, c, VertLo))?,
            9 => self.merge_segment(gp(r, c, HorizLo), gp(r + 1, c, HorizLo))?,
            10 => {
                self.merge_segment(gp(r, c, VertLo), gp(r + 1, c, HorizLo))?;
                self.merge_segment(gp(r, c, HorizLo), gp(r, c + 1, VertLo))?;
            }
            11 => self.merge_segment(gp(r, c, HorizLo), gp(r, c + 1, VertLo))?,
            12 => self.merge_segment(gp(r, c, VertLo), gp(r, c + 1, VertLo))?,
            13 => self.merge_segment(gp(r, c + 1, VertLo), gp(r + 1, c, HorizLo))?,
            14 => self.merge_segment(gp(r, c, VertLo), gp(r + 1, c, HorizLo))?,
            _ => {}
        }

        Ok(())
    }

    /// Merge one directed segment `a -> b` into the connectivity map
    ///
    /// A segment endpoint may only attach to a free chain end; landing in
    /// the interior of an existing polyline violates the structural
    /// invariants and is fatal. When both endpoints already exist the two
    /// chains are joined, reversing one side if their directions conflict.
    fn merge_segment(&mut self, a: GridPoint, b: GridPoint) -> Result<(), ContourError> {
        let has_a = self.links.contains_key(&a);
        let has_b = self.links.contains_key(&b);

        match (has_a, has_b) {
            (false, false) => {
                // completely unconnected segment
                self.links.entry(a).or_default().next = Some(b);
                self.links.entry(b).or_default().prev = Some(a);
            }
            (true, false) => {
                let ra = self.links.get_mut(&a).ok_or(ContourError::BrokenWalk)?;
                if ra.next.is_none() {
                    ra.next = Some(b);
                    self.links.entry(b).or_default().prev = Some(a);
                } else if ra.prev.is_none() {
                    ra.prev = Some(b);
                    self.links.entry(b).or_default().next = Some(a);
                } else {
                    return Err(ContourError::InteriorSegmentMerge);
                }
            }
            (false, true) => {
                let rb = self.links.get_mut(&b).ok_or(ContourError::BrokenWalk)?;
                if rb.next.is_none() {
                    rb.next = Some(a);
                    self.links.entry(a).or_default().prev = Some(b);
                } else if rb.prev.is_none() {
                    rb.prev = Some(a);
                    self.links.entry(a).or_default().next = Some(b);
                } else {
                    return Err(ContourError::InteriorSegmentMerge);
                }
            }
            (true, true) => {
                let ra = self.links[&a];
                let rb = self.links[&b];
                let score = 8 * u8::from(ra.next.is_none())
                    + 4 * u8::from(ra.prev.is_none())
                    + 2 * u8::from(rb.next.is_none())
                    + u8::from(rb.prev.is_none());

                match score {
                    9 => {
                        // 1001: tail of a meets head of b
                        self.links.get_mut(&a).ok_or(ContourError::BrokenWalk)?.next = Some(b);
                        self.links.get_mut(&b).ok_or(ContourError::BrokenWalk)?.prev = Some(a);
                    }
                    6 => {
                        // 0110: head of a meets tail of b
                        self.links.get_mut(&a).ok_or(ContourError::BrokenWalk)?.prev = Some(b);
                        self.links.get_mut(&b).ok_or(ContourError::BrokenWalk)?.next = Some(a);
                    }
                    10 => {
                        // 1010: two tails meet; reverse the b-side chain so
                        // directions line up
                        self.links.get_mut(&a).ok_or(ContourError::BrokenWalk)?.next = Some(b);
                        self.links.get_mut(&b).ok_or(ContourError::BrokenWalk)?.next = Some(a);

                        let mut cur = Some(b);
                        while let Some(p) = cur {
                            let rec = self.links.get_mut(&p).ok_or(ContourError::BrokenWalk)?;
                            let tmp = rec.prev;
                            rec.prev = rec.next;
                            rec.next = tmp;
                            cur = tmp;
                        }
                    }
                    5 => {
                        // 0101: two heads meet; reverse the a-side chain
                        self.links.get_mut(&a).ok_or(ContourError::BrokenWalk)?.prev = Some(b);
                        self.links.get_mut(&b).ok_or(ContourError::BrokenWalk)?.prev = Some(a);

                        let mut cur = Some(a);
                        while let Some(p) = cur {
                            let rec = self.links.get_mut(&p).ok_or(ContourError::BrokenWalk)?;
                            let tmp = rec.next;
                            rec.next = rec.prev;
                            rec.prev = tmp;
                            cur = tmp;
                        }
                    }
                    _ => return Err(ContourError::InteriorSegmentMerge),
                }
            }
        }

        Ok(())
    }

    /// Walk the assembled connectivity and emit one path per polyline
    ///
    /// Every polyline is emitted from its true start: the walk first
    /// back-tracks along `prev` until it finds a free end (or comes full
    /// circle). Closed loops emit their starting vertex a second time so the
    /// output is explicitly closed.
    pub fn collect(&mut self) -> Result<ContourPaths<T>, ContourError> {
        let mut out = ContourPaths::default();
        let mut cur_id = 0i32;
        let max_steps = self.links.len() + 1;

        let entries: Vec<GridPoint> = self.links.keys().copied().collect();
        for key in entries {
            let rec = self.links.get(&key).ok_or(ContourError::BrokenWalk)?;
            if rec.done {
                continue;
            }
            cur_id += 1;

            // back-track to the beginning of the line, or circle around once
            let mut start = key;
            if rec.prev.is_some() {
                let mut cur = key;
                let mut steps = 0usize;
                loop {
                    match self.links.get(&cur).ok_or(ContourError::BrokenWalk)?.prev {
                        None => break,
                        Some(p) => {
                            cur = p;
                            if cur == key {
                                break;
                            }
                        }
                    }
                    steps += 1;
                    if steps > max_steps {
                        return Err(ContourError::BrokenWalk);
                    }
                }
                start = cur;
            }

            let mut cur = start;
            let mut steps = 0usize;
            loop {
                let (px, py) = self.grid.point_coords(cur, self.level, self.level);
                out.push(px, py, cur_id);

                let rec = self.links.get_mut(&cur).ok_or(ContourError::BrokenWalk)?;
                rec.done = true;
                match rec.next {
                    None => break,
                    Some(next) => {
                        if next == start {
                            // closed loop: emit the start once more
                            let (px, py) = self.grid.point_coords(next, self.level, self.level);
                            out.push(px, py, cur_id);
                            break;
                        }
                        cur = next;
                    }
                }

                steps += 1;
                if steps > max_steps {
                    return Err(ContourError::BrokenWalk);
                }
            }
        }

        debug!(
            "isoline {:?}: collected {} polylines, {} vertices",
            self.level,
            out.path_count(),
            out.len()
        );
        Ok(out)
    }
}
