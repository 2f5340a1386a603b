//! Error types for the spline solver.

use std::fmt;

use crate::types::Scalar;

/// Errors returned by solver operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SplineError {
    /// The Euler-spiral secant iteration failed to reach its residual
    /// threshold within the iteration budget. Fatal for the segment;
    /// retrying with the same inputs will not help.
    EulerFitDivergence {
        /// Tangent angle at the segment start, relative to the chord.
        th0: Scalar,
        /// Tangent angle at the segment end, relative to the chord.
        th1: Scalar,
    },
    /// A linear solve (tridiagonal or 4x4 Newton step) hit a near-zero
    /// pivot.
    SingularSystem,
    /// A serialized curve grid had the wrong number of masters.
    InvalidGrid {
        /// Master count implied by the grid's `n`.
        expected: usize,
        /// Master count actually present.
        actual: usize,
    },
}

impl fmt::Display for SplineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EulerFitDivergence { th0, th1 } => {
                write!(f, "euler spiral fit diverges at th0={th0}, th1={th1}")
            }
            Self::SingularSystem => write!(f, "singular linear system"),
            Self::InvalidGrid { expected, actual } => {
                write!(f, "invalid curve grid: expected {expected} masters, got {actual}")
            }
        }
    }
}

impl std::error::Error for SplineError {}
