/// Role of a point in the abstract grid-point namespace
///
/// Contour vertices never live at arbitrary coordinates: they are either data
/// grid nodes or crossings of a contour level with a cell edge. Keying
/// vertices by this discrete identity (instead of by floating-point
/// coordinates) is what makes exact merging across neighbouring cells
/// possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointKind {
    /// The data-grid node at `(xs[c], ys[r])`
    Corner,
    /// Crossing of the lower level with the horizontal edge `(r,c)–(r,c+1)`
    HorizLo,
    /// Crossing of the upper level with the horizontal edge `(r,c)–(r,c+1)`
    HorizHi,
    /// Crossing of the lower level with the vertical edge `(r,c)–(r+1,c)`
    VertLo,
    /// Crossing of the upper level with the vertical edge `(r,c)–(r+1,c)`
    VertHi,
}

/// A vertex in abstract grid space
///
/// Equality and hashing are structural over the `(r, c, kind)` triple, so two
/// cells that touch the same physical location produce the same key. Physical
/// coordinates are only materialised at output time (see
/// [`GridView::point_coords`](crate::grid::GridView::point_coords)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPoint {
    /// Row index into `ys`
    pub r: usize,
    /// Column index into `xs`
    pub c: usize,
    /// Which point on the cell this is
    pub kind: PointKind,
}

impl GridPoint {
    pub fn new(r: usize, c: usize, kind: PointKind) -> Self {
        Self { r, c, kind }
    }
}
