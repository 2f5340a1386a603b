//! Core types shared across the solver.

pub use kurbo::{Point, Vec2};

/// All solver math is done in f64.
pub type Scalar = f64;

/// Tolerance for floating-point comparisons in tests and guards.
pub const EPSILON: Scalar = 1e-9;

/// Fixed iteration budget for the per-run joint solver. The solver never
/// decides convergence on its own; callers drive exactly this many sweeps.
pub const SOLVER_ITERATIONS: usize = 10;

/// Arctan-curvature magnitude beyond which a knot is treated as a
/// direction reversal and excluded from curvature blending.
pub const REVERSAL_THRESHOLD: Scalar = std::f64::consts::FRAC_PI_2 - 1e-6;

// ---------------------------------------------------------------------------
// PointType
// ---------------------------------------------------------------------------

/// Continuity class of a knot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointType {
    /// Incoming and outgoing tangents are independent; terminates a
    /// smooth run.
    Corner,
    /// Curvature continuity is enforced with both neighboring segments.
    #[default]
    Smooth,
}

impl PointType {
    /// True for [`PointType::Corner`].
    #[must_use]
    pub const fn is_corner(self) -> bool {
        matches!(self, Self::Corner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_type_default_is_smooth() {
        assert_eq!(PointType::default(), PointType::Smooth);
        assert!(!PointType::Smooth.is_corner());
        assert!(PointType::Corner.is_corner());
    }
}
