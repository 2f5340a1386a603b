//! Tunable curve family: a grid of hand-edited two-cubic masters,
//! interpolated over the tangent-angle plane.
//!
//! The grid stores masters only for the right quadrant of the (th0, th1)
//! plane and recovers the rest by symmetry; tangent angles are sampled
//! every pi/(2n) radians.

use serde::{Deserialize, Serialize};

use crate::bezier::CubicBez;
use crate::error::SplineError;
use crate::family::{chord_frame_atan_curvature, my_cubic, Curvature, TwoParamCurve};
use crate::types::{Point, Scalar, Vec2};

// ---------------------------------------------------------------------------
// TwoCubics
// ---------------------------------------------------------------------------

/// A pair of cubic segments over the unit chord, described by 6 shape
/// coefficients: the two endpoint arm lengths (`a[0]`, `a[5]`) and the
/// coordinates of the two interior control points (`a[1..5]`). The
/// endpoint tangent angles are implicit and provided at render time;
/// the join point is the midpoint of the interior control points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoCubics {
    pub a: [Scalar; 6],
}

impl TwoCubics {
    #[must_use]
    pub const fn new(a: [Scalar; 6]) -> Self {
        Self { a }
    }

    /// The join point between the two cubics.
    #[must_use]
    pub fn center_pt(&self) -> Vec2 {
        Vec2::new(
            0.5 * (self.a[1] + self.a[3]),
            0.5 * (self.a[2] + self.a[4]),
        )
    }

    /// Interior control points for the given endpoint tangents.
    #[must_use]
    pub fn control_points(&self, th0: Scalar, th1: Scalar) -> [Vec2; 5] {
        let p1 = Vec2::new(self.a[0] * th0.cos(), self.a[0] * th0.sin());
        let p2 = Vec2::new(self.a[1], self.a[2]);
        let p4 = Vec2::new(self.a[3], self.a[4]);
        let p5 = Vec2::new(self.a[5].mul_add(-th1.cos(), 1.0), self.a[5] * th1.sin());
        [p1, p2, self.center_pt(), p4, p5]
    }

    /// Raise a single cubic over the unit chord to the two-cubic form
    /// by de Casteljau subdivision at the midpoint.
    #[must_use]
    pub fn raise(cb: &CubicBez) -> Self {
        let l = cb.left_half();
        let r = cb.right_half();
        Self {
            a: [
                l.p1.x.hypot(l.p1.y),
                l.p2.x,
                l.p2.y,
                r.p1.x,
                r.p1.y,
                (1.0 - r.p2.x).hypot(r.p2.y),
            ],
        }
    }

    /// 180 degree rotation about the chord center.
    #[must_use]
    pub fn turn(&self) -> Self {
        Self {
            a: [
                self.a[5],
                1.0 - self.a[3],
                -self.a[4],
                1.0 - self.a[1],
                -self.a[2],
                self.a[0],
            ],
        }
    }

    /// Left-right mirror symmetry.
    #[must_use]
    pub fn flip_horiz(&self) -> Self {
        Self {
            a: [
                self.a[5],
                1.0 - self.a[3],
                self.a[4],
                1.0 - self.a[1],
                self.a[2],
                self.a[0],
            ],
        }
    }

    /// Up-down mirror symmetry.
    #[must_use]
    pub fn flip_vert(&self) -> Self {
        let mut a = self.a;
        a[2] = -a[2];
        a[4] = -a[4];
        Self { a }
    }

    /// The two rendered cubic segments for the given tangents.
    fn cubics(&self, th0: Scalar, th1: Scalar) -> [CubicBez; 2] {
        let [p1, p2, p3, p4, p5] = self.control_points(th0, th1);
        [
            CubicBez::new(Point::ORIGIN, p1.to_point(), p2.to_point(), p3.to_point()),
            CubicBez::new(p3.to_point(), p4.to_point(), p5.to_point(), Point::new(1.0, 0.0)),
        ]
    }
}

impl Default for TwoCubics {
    /// The exact straight line; the correct master for (0, 0) and a
    /// bootstrap value for the rest of a grid.
    fn default() -> Self {
        Self {
            a: [1.0 / 6.0, 1.0 / 3.0, 0.0, 2.0 / 3.0, 0.0, 1.0 / 6.0],
        }
    }
}

impl TwoParamCurve for TwoCubics {
    fn render(&self, th0: Scalar, th1: Scalar) -> Result<Vec<Vec2>, SplineError> {
        Ok(self.control_points(th0, th1).to_vec())
    }

    fn compute_curvature(&self, th0: Scalar, th1: Scalar) -> Result<Curvature, SplineError> {
        let [left, right] = self.cubics(th0, th1);
        Ok(Curvature {
            ak0: chord_frame_atan_curvature(&left, 0.0, th0),
            ak1: chord_frame_atan_curvature(&right, 1.0, -th1),
        })
    }
}

// ---------------------------------------------------------------------------
// CurveGrid
// ---------------------------------------------------------------------------

/// Actual modulo, not remainder.
fn mymod(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r < 0 {
        r + b
    } else {
        r
    }
}

/// A grid of `(n + 1)^2` master curves covering the right quadrant
/// `0 <= i <= n`, `-i <= j <= i` of the tangent-angle lattice, laid out
/// in triangular order:
///
/// ```text
/// . . . . 8
/// . . . 3 7
/// . . 0 2 6
/// . . . 1 5
/// . . . . 4
/// ```
///
/// The other quadrants are recovered by the 4-fold symmetry of the
/// tangent-angle plane, and the whole plane wraps with period pi.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveGrid {
    n: usize,
    masters: Vec<TwoCubics>,
}

/// Serialized form of a [`CurveGrid`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridData {
    pub n: usize,
    pub masters: Vec<[Scalar; 6]>,
}

impl CurveGrid {
    /// Build from explicit masters. The count must be `(n + 1)^2`.
    pub fn new(n: usize, masters: Vec<TwoCubics>) -> Result<Self, SplineError> {
        let expected = (n + 1) * (n + 1);
        if masters.len() != expected {
            return Err(SplineError::InvalidGrid {
                expected,
                actual: masters.len(),
            });
        }
        Ok(Self { n, masters })
    }

    /// Seed every master by raising the closed-form cubic at its grid
    /// angles; the usual starting point for hand tuning.
    #[must_use]
    pub fn bootstrap(n: usize) -> Self {
        use std::f64::consts::FRAC_PI_2;
        let mut masters = Vec::with_capacity((n + 1) * (n + 1));
        for i in 0..=n {
            let th0 = FRAC_PI_2 * i as Scalar / n as Scalar;
            for j in -(i as i64)..=(i as i64) {
                let th1 = FRAC_PI_2 * j as Scalar / n as Scalar;
                masters.push(TwoCubics::raise(&my_cubic(th0, th1)));
            }
        }
        Self { n, masters }
    }

    /// Master for a right-quadrant grid point `0 <= i <= n`, `-i <= j <= i`.
    fn get_master_core(&self, i: i64, j: i64) -> TwoCubics {
        let ix = i * i + i + j;
        self.masters[ix as usize]
    }

    /// Master for any grid point, applying wrap and symmetry.
    #[must_use]
    pub fn get_master(&self, i: i64, j: i64) -> TwoCubics {
        let n = self.n as i64;
        let i = mymod(i + n - 1, n * 2) - n + 1;
        let j = mymod(j + n - 1, n * 2) - n + 1;
        if i >= 0 && -i <= j && j <= i {
            self.get_master_core(i, j)
        } else if j >= 0 && -j <= i && i <= j {
            self.get_master_core(j, i).flip_horiz()
        } else if i <= 0 && i <= j && j <= -i {
            self.get_master_core(-i, -j).flip_vert()
        } else {
            self.get_master_core(-j, -i).turn()
        }
    }

    /// Bilinear interpolation of the four surrounding masters.
    #[must_use]
    pub fn get_interp(&self, th0: Scalar, th1: Scalar) -> TwoCubics {
        use std::f64::consts::PI;
        let i = th0 * 2.0 * self.n as Scalar / PI;
        let j = th1 * 2.0 * self.n as Scalar / PI;
        let i_int = i.floor();
        let j_int = j.floor();
        let i_frac = i - i_int;
        let j_frac = j - j_int;
        let m00 = self.get_master(i_int as i64, j_int as i64);
        let m01 = self.get_master(i_int as i64 + 1, j_int as i64);
        let m10 = self.get_master(i_int as i64, j_int as i64 + 1);
        let m11 = self.get_master(i_int as i64 + 1, j_int as i64 + 1);
        let mut a = [0.0; 6];
        for k in 0..6 {
            let a0 = i_frac.mul_add(m01.a[k] - m00.a[k], m00.a[k]);
            let a1 = i_frac.mul_add(m11.a[k] - m10.a[k], m10.a[k]);
            a[k] = j_frac.mul_add(a1 - a0, a0);
        }
        TwoCubics::new(a)
    }

    /// Serializable snapshot of the grid.
    #[must_use]
    pub fn to_structured(&self) -> GridData {
        GridData {
            n: self.n,
            masters: self.masters.iter().map(|m| m.a).collect(),
        }
    }

    /// Rebuild from a snapshot, validating the master count.
    pub fn from_structured(data: GridData) -> Result<Self, SplineError> {
        Self::new(data.n, data.masters.into_iter().map(TwoCubics::new).collect())
    }
}

impl TwoParamCurve for CurveGrid {
    fn render(&self, th0: Scalar, th1: Scalar) -> Result<Vec<Vec2>, SplineError> {
        self.get_interp(th0, th1).render(th0, th1)
    }

    fn compute_curvature(&self, th0: Scalar, th1: Scalar) -> Result<Curvature, SplineError> {
        self.get_interp(th0, th1).compute_curvature(th0, th1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::types::EPSILON;

    #[test]
    fn default_master_is_straight_line() {
        let tc = TwoCubics::default();
        let pts = tc.render(0.0, 0.0).unwrap();
        assert_eq!(pts.len(), 5);
        for (k, p) in pts.iter().enumerate() {
            assert_abs_diff_eq!(p.y, 0.0, epsilon = EPSILON);
            assert_abs_diff_eq!(p.x, (k + 1) as Scalar / 6.0, epsilon = EPSILON);
        }
        let k = tc.compute_curvature(0.0, 0.0).unwrap();
        assert_abs_diff_eq!(k.ak0, 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(k.ak1, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn raise_preserves_geometry() {
        let cb = my_cubic(0.4, 0.3);
        let tc = TwoCubics::raise(&cb);
        let pts = tc.render(0.4, 0.3).unwrap();
        let l = cb.left_half();
        let r = cb.right_half();
        // Arm lengths reconstruct the subdivided control points.
        assert_abs_diff_eq!(pts[0].x, l.p1.x, epsilon = EPSILON);
        assert_abs_diff_eq!(pts[0].y, l.p1.y, epsilon = EPSILON);
        assert_abs_diff_eq!(pts[1].x, l.p2.x, epsilon = EPSILON);
        assert_abs_diff_eq!(pts[2].x, l.p3.x, epsilon = EPSILON);
        assert_abs_diff_eq!(pts[2].y, l.p3.y, epsilon = EPSILON);
        assert_abs_diff_eq!(pts[4].x, r.p2.x, epsilon = EPSILON);
        assert_abs_diff_eq!(pts[4].y, r.p2.y, epsilon = EPSILON);
    }

    #[test]
    fn symmetry_transforms_are_involutions() {
        let tc = TwoCubics::raise(&my_cubic(0.7, 0.2));
        for (name, m) in [
            ("turn", tc.turn().turn()),
            ("flip_horiz", tc.flip_horiz().flip_horiz()),
            ("flip_vert", tc.flip_vert().flip_vert()),
        ] {
            for k in 0..6 {
                assert_abs_diff_eq!(m.a[k], tc.a[k], epsilon = EPSILON);
                assert!(m.a[k].is_finite(), "{name} coefficient {k}");
            }
        }
    }

    #[test]
    fn grid_validates_master_count() {
        let err = CurveGrid::new(2, vec![TwoCubics::default(); 4]).unwrap_err();
        assert_eq!(
            err,
            SplineError::InvalidGrid {
                expected: 9,
                actual: 4
            }
        );
        assert!(CurveGrid::new(2, vec![TwoCubics::default(); 9]).is_ok());
    }

    #[test]
    fn bootstrap_has_full_master_count() {
        let grid = CurveGrid::bootstrap(4);
        assert_eq!(grid.to_structured().masters.len(), 25);
    }

    #[test]
    fn symmetry_round_trip_on_grid_lookup() {
        let grid = CurveGrid::bootstrap(4);
        // Swapping (i, j) across the diagonal is a horizontal flip.
        let a = grid.get_master(3, 1);
        let b = grid.get_master(1, 3).flip_horiz();
        for k in 0..6 {
            assert_abs_diff_eq!(a.a[k], b.a[k], epsilon = EPSILON);
        }
        // Negating both indices is a vertical flip.
        let c = grid.get_master(-3, -1);
        let d = grid.get_master(3, 1).flip_vert();
        for k in 0..6 {
            assert_abs_diff_eq!(c.a[k], d.a[k], epsilon = EPSILON);
        }
    }

    #[test]
    fn interp_at_lattice_point_matches_master() {
        use std::f64::consts::FRAC_PI_2;
        let grid = CurveGrid::bootstrap(4);
        let th0 = FRAC_PI_2 * 2.0 / 4.0;
        let th1 = FRAC_PI_2 * 1.0 / 4.0;
        let interp = grid.get_interp(th0, th1);
        let master = grid.get_master(2, 1);
        for k in 0..6 {
            assert_abs_diff_eq!(interp.a[k], master.a[k], epsilon = EPSILON);
        }
    }

    #[test]
    fn structured_round_trip_is_exact() {
        let grid = CurveGrid::bootstrap(3);
        let json = serde_json::to_string(&grid.to_structured()).unwrap();
        let data: GridData = serde_json::from_str(&json).unwrap();
        let back = CurveGrid::from_structured(data).unwrap();
        assert_eq!(grid, back);
    }

    #[test]
    fn from_structured_rejects_bad_count() {
        let data = GridData {
            n: 3,
            masters: vec![[0.0; 6]; 7],
        };
        assert!(matches!(
            CurveGrid::from_structured(data),
            Err(SplineError::InvalidGrid {
                expected: 16,
                actual: 7
            })
        ));
    }
}
