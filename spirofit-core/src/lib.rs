//! Curvature-continuous spline solver.
//!
//! Fits smooth parametric curves (cubic Bezier chains, Euler-spiral
//! segments) through sequences of 2D points, solving for tangent angles
//! that make curvature continuous across interior joints. Rendering,
//! editing and persistence live in other crates; this one is the
//! numerical core.

pub mod types;

pub mod bezier;
pub mod error;
pub mod euler;
pub mod family;
pub mod grid;
pub mod math;
pub mod spline;

pub use bezier::{BezPath, CubicBez, PathEl};
pub use error::SplineError;
pub use euler::{EulerParams, EulerSegment, SpiroCurve};
pub use family::{BiParabola, Curvature, CurvatureDerivs, MyCurve, TwoParamCurve};
pub use grid::{CurveGrid, GridData, TwoCubics};
pub use spline::{ControlPoint, KnotState, Spline, TwoParamSpline};
pub use types::{Point, PointType, Scalar, Vec2};
