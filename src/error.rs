use thiserror::Error;

/// Errors produced by contour computation
///
/// The length-mismatch variants are argument errors raised at engine
/// construction. The remaining variants report a stitching state the
/// structural invariants rule out; they indicate grid pathology or a case
/// table defect, and the engine gives up rather than emit corrupt topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContourError {
    #[error("number of x coordinates ({actual}) must match number of columns in the value matrix ({expected})")]
    XLengthMismatch { expected: usize, actual: usize },

    #[error("number of y coordinates ({actual}) must match number of rows in the value matrix ({expected})")]
    YLengthMismatch { expected: usize, actual: usize },

    #[error("value matrix length ({actual}) must equal nrow * ncol ({expected})")]
    ZLengthMismatch { expected: usize, actual: usize },

    #[error("lower levels ({lower}) and upper levels ({upper}) differ in length")]
    LevelCountMismatch { lower: usize, upper: usize },

    #[error("cannot merge line segment at interior of existing polyline")]
    InteriorSegmentMerge,

    #[error("unmergeable polygon connectivity at a shared vertex")]
    UnmergeableVertex,

    #[error("path walk reached a grid point with no connectivity record")]
    BrokenWalk,
}
