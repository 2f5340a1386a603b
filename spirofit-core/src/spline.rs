//! Global spline solver.
//!
//! Two layers: [`TwoParamSpline`] solves tangent angles along one smooth
//! run of points, and [`Spline`] handles the general case with corners,
//! explicit tangents, closed paths, and curvature blending across
//! joints.

use crate::bezier::BezPath;
use crate::error::SplineError;
use crate::family::{Curvature, TwoParamCurve};
use crate::math::mod2pi;
use crate::types::{Point, PointType, Scalar, Vec2, REVERSAL_THRESHOLD, SOLVER_ITERATIONS};

// ---------------------------------------------------------------------------
// TwoParamSpline
// ---------------------------------------------------------------------------

/// Chord-relative tangent angles and length for one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ths {
    pub th0: Scalar,
    pub th1: Scalar,
    pub chord: Scalar,
}

/// Tangent-angle solver for a single smooth run of control points.
///
/// Owns one absolute tangent angle per point; the solver mutates those
/// in place. Endpoint angles can be pinned; free endpoints relax to the
/// family's endpoint condition.
pub struct TwoParamSpline<'a, C> {
    curve: &'a C,
    pts: Vec<Point>,
    pub ths: Vec<Scalar>,
    pub start_th: Option<Scalar>,
    pub end_th: Option<Scalar>,
}

impl<'a, C: TwoParamCurve> TwoParamSpline<'a, C> {
    #[must_use]
    pub fn new(curve: &'a C, pts: Vec<Point>) -> Self {
        let ths = vec![0.0; pts.len()];
        Self {
            curve,
            pts,
            ths,
            start_th: None,
            end_th: None,
        }
    }

    /// Seed the tangent angles: interior points get the chord directions
    /// blended by chord length, endpoints copy their neighbor chord.
    pub fn initial_ths(&mut self) {
        let n = self.pts.len();
        if n == 0 {
            return;
        }
        for i in 1..n - 1 {
            let d0 = self.pts[i] - self.pts[i - 1];
            let l0 = d0.hypot();
            let d1 = self.pts[i + 1] - self.pts[i];
            let l1 = d1.hypot();
            let th0 = d0.y.atan2(d0.x);
            let th1 = d1.y.atan2(d1.x);
            let bend = mod2pi(th1 - th0);
            let th = mod2pi(th0 + bend * l0 / (l0 + l1));
            self.ths[i] = th;
            if i == 1 {
                self.ths[0] = th0;
            }
            if i == n - 2 {
                self.ths[i + 1] = th1;
            }
        }
        if let Some(th) = self.start_th {
            self.ths[0] = th;
        }
        if let Some(th) = self.end_th {
            self.ths[n - 1] = th;
        }
    }

    /// Tangent angles relative to segment `i`'s chord, plus its length.
    #[must_use]
    pub fn get_ths(&self, i: usize) -> Ths {
        let d = self.pts[i + 1] - self.pts[i];
        let th = d.y.atan2(d.x);
        Ths {
            th0: mod2pi(self.ths[i] - th),
            th1: mod2pi(th - self.ths[i + 1]),
            chord: d.hypot(),
        }
    }

    /// One damped sweep toward a curvature continuous solution; returns
    /// the summed absolute joint error. `iter` drives the damping ramp.
    pub fn iter_dumb(&mut self, iter: usize) -> Result<Scalar, SplineError> {
        // Rescale the curvature mismatch by the geometric mean of the
        // adjoining chord lengths.
        fn compute_err(ths0: Ths, ak0: Curvature, ths1: Ths, ak1: Curvature) -> Scalar {
            let ch0 = ths0.chord.sqrt();
            let ch1 = ths1.chord.sqrt();
            let a0 = (ak0.ak1.sin() * ch1).atan2(ak0.ak1.cos() * ch0);
            let a1 = (ak1.ak0.sin() * ch0).atan2(ak1.ak0.cos() * ch1);
            a0 - a1
        }

        let n = self.pts.len();
        // Fix endpoint tangents; we rely on iteration for this to converge.
        if self.start_th.is_none() {
            let ths0 = self.get_ths(0);
            self.ths[0] += self.curve.endpoint_tangent(ths0.th1) - ths0.th0;
        }
        if self.end_th.is_none() {
            let ths0 = self.get_ths(n - 2);
            self.ths[n - 1] -= self.curve.endpoint_tangent(ths0.th0) - ths0.th1;
        }
        if n < 3 {
            return Ok(0.0);
        }

        let mut abs_err = 0.0;
        let mut x = vec![0.0; n - 2];
        let mut ths0 = self.get_ths(0);
        let mut ak0 = self.curve.compute_curvature(ths0.th0, ths0.th1)?;
        for i in 0..n - 2 {
            let ths1 = self.get_ths(i + 1);
            let ak1 = self.curve.compute_curvature(ths1.th0, ths1.th1)?;
            let err = compute_err(ths0, ak0, ths1, ak1);
            abs_err += err.abs();

            let epsilon = 1e-3;
            let ak0p = self.curve.compute_curvature(ths0.th0, ths0.th1 + epsilon)?;
            let ak1p = self.curve.compute_curvature(ths1.th0 - epsilon, ths1.th1)?;
            let errp = compute_err(ths0, ak0p, ths1, ak1p);
            let derr = (errp - err) * (1.0 / epsilon);
            let step = err / derr;
            // A flat derivative would poison the angle with NaN.
            x[i] = if step.is_finite() { step } else { 0.0 };

            ths0 = ths1;
            ak0 = ak1;
        }

        let scale = (0.25 * (iter as Scalar + 1.0)).tanh();
        for (i, step) in x.iter().enumerate() {
            self.ths[i + 1] += scale * step;
        }
        log::trace!("iter {iter}: residual {abs_err}");
        Ok(abs_err)
    }

    /// Render the solved run as a path, mapping each segment's unit-frame
    /// control points through the chord's rotation and scale.
    pub fn render(&self) -> Result<BezPath, SplineError> {
        let mut path = BezPath::new();
        let Some(&first) = self.pts.first() else {
            return Ok(path);
        };
        path.moveto(first);
        for i in 0..self.pts.len() - 1 {
            let ths = self.get_ths(i);
            let rendered = self.curve.render(ths.th0, ths.th1)?;
            let p0 = self.pts[i];
            let d = self.pts[i + 1] - p0;
            let mut c: Vec<Point> = Vec::with_capacity(rendered.len() + 1);
            for pt in &rendered {
                c.push(chord_to_absolute(p0, d, *pt));
            }
            c.push(self.pts[i + 1]);
            for chunk in c.chunks(3) {
                path.curveto(chunk[0], chunk[1], chunk[2]);
            }
        }
        Ok(path)
    }

    /// SVG path data for the solved run.
    pub fn render_svg(&self, precision: usize) -> Result<String, SplineError> {
        Ok(self.render()?.to_svg_path(precision))
    }
}

/// Map a unit-chord point into the absolute frame of the chord from
/// `p0` along `d` (rotation and scale, no normalization needed).
fn chord_to_absolute(p0: Point, d: Vec2, pt: Vec2) -> Point {
    Point::new(
        d.x.mul_add(pt.x, d.y.mul_add(-pt.y, p0.x)),
        d.y.mul_add(pt.x, d.x.mul_add(pt.y, p0.y)),
    )
}

// ---------------------------------------------------------------------------
// Spline
// ---------------------------------------------------------------------------

/// One input knot of a [`Spline`]: position, continuity class, and
/// optional explicit tangents on either side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub point: Point,
    pub ty: PointType,
    pub left_th: Option<Scalar>,
    pub right_th: Option<Scalar>,
}

impl ControlPoint {
    #[must_use]
    pub const fn new(
        point: Point,
        ty: PointType,
        left_th: Option<Scalar>,
        right_th: Option<Scalar>,
    ) -> Self {
        Self {
            point,
            ty,
            left_th,
            right_th,
        }
    }

    #[must_use]
    pub const fn smooth(point: Point) -> Self {
        Self::new(point, PointType::Smooth, None, None)
    }

    #[must_use]
    pub const fn corner(point: Point) -> Self {
        Self::new(point, PointType::Corner, None, None)
    }
}

/// Solver output for one knot. Input control points are never mutated;
/// everything derived lives here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KnotState {
    /// Solved absolute tangent angle on the incoming side.
    pub l_th: Scalar,
    /// Solved absolute tangent angle on the outgoing side.
    pub r_th: Scalar,
    /// Arctan curvature arriving at the knot, when a curve family
    /// produced the incoming segment.
    pub l_ak: Option<Scalar>,
    /// Arctan curvature leaving the knot.
    pub r_ak: Option<Scalar>,
    /// Blended curvature target, set by curvature blending.
    pub k_blend: Option<Scalar>,
}

/// The general spline: corners, explicit tangents, open or closed.
pub struct Spline<'a, C> {
    curve: &'a C,
    pts: Vec<ControlPoint>,
    is_closed: bool,
    states: Vec<KnotState>,
}

impl<'a, C: TwoParamCurve> Spline<'a, C> {
    #[must_use]
    pub fn new(curve: &'a C, pts: Vec<ControlPoint>, is_closed: bool) -> Self {
        let states = vec![KnotState::default(); pts.len()];
        Self {
            curve,
            pts,
            is_closed,
            states,
        }
    }

    #[must_use]
    pub fn control_points(&self) -> &[ControlPoint] {
        &self.pts
    }

    /// Solver output, indexed like the control points. Meaningful after
    /// [`Spline::solve`].
    #[must_use]
    pub fn states(&self) -> &[KnotState] {
        &self.states
    }

    /// Number of rendered segments.
    #[must_use]
    fn num_segments(&self) -> usize {
        if self.is_closed {
            self.pts.len()
        } else {
            self.pts.len().saturating_sub(1)
        }
    }

    /// Canonical start knot: for closed paths, the first corner or
    /// explicitly-tangent knot so smooth runs never straddle the seam;
    /// index 0 when the path is open or all-smooth.
    #[must_use]
    pub fn start_ix(&self) -> usize {
        if !self.is_closed {
            return 0;
        }
        for (i, pt) in self.pts.iter().enumerate() {
            if pt.ty.is_corner() || pt.left_th.is_some() {
                return i;
            }
        }
        0
    }

    fn wrap(&self, i: usize) -> usize {
        i % self.pts.len()
    }

    /// Chord length of segment `i` (wrapping; `i` may be "-1" passed as
    /// `len - 1`).
    fn chord_len(&self, i: usize) -> Scalar {
        let a = self.pts[self.wrap(i)].point;
        let b = self.pts[self.wrap(i + 1)].point;
        (b - a).hypot()
    }

    /// Solve tangent angles for every knot. Partitions the path into
    /// smooth runs at corners and explicit tangents, runs the per-run
    /// solver with a fixed iteration budget on each, and records the
    /// resulting tangents and endpoint curvatures.
    pub fn solve(&mut self) -> Result<(), SplineError> {
        for s in &mut self.states {
            *s = KnotState::default();
        }
        let len = self.pts.len();
        if len < 2 {
            return Ok(());
        }
        let start = self.start_ix();
        let length = self.num_segments();
        let mut i = 0;
        while i < length {
            let ix_i = self.wrap(i + start);
            let ix_i1 = self.wrap(i + 1 + start);
            let ends_run = i + 1 == length || self.pts[ix_i1].ty.is_corner();
            if ends_run && self.pts[ix_i].right_th.is_none() && self.pts[ix_i1].left_th.is_none() {
                // Straight line.
                let d = self.pts[ix_i1].point - self.pts[ix_i].point;
                let th = d.y.atan2(d.x);
                self.states[ix_i].r_th = th;
                self.states[ix_i1].l_th = th;
                i += 1;
            } else {
                // A smooth run of at least one curved segment.
                let mut inner_pts = vec![self.pts[ix_i].point];
                let mut j = i + 1;
                while j < length + 1 {
                    let ix_j = self.wrap(j + start);
                    inner_pts.push(self.pts[ix_j].point);
                    j += 1;
                    if self.pts[ix_j].ty.is_corner() || self.pts[ix_j].left_th.is_some() {
                        break;
                    }
                }
                let mut inner = TwoParamSpline::new(self.curve, inner_pts);
                inner.start_th = self.pts[ix_i].right_th;
                inner.end_th = self.pts[self.wrap(j - 1 + start)].left_th;
                inner.initial_ths();
                for k in 0..SOLVER_ITERATIONS {
                    inner.iter_dumb(k)?;
                }
                for k in i..j - 1 {
                    let ix_k = self.wrap(k + start);
                    let ix_k1 = self.wrap(k + 1 + start);
                    self.states[ix_k].r_th = inner.ths[k - i];
                    self.states[ix_k1].l_th = inner.ths[k + 1 - i];
                    // Record curvatures for blending; not all get used.
                    let ths = inner.get_ths(k - i);
                    let aks = self.curve.compute_curvature(ths.th0, ths.th1)?;
                    self.states[ix_k].r_ak = Some(aks.ak0);
                    self.states[ix_k1].l_ak = Some(aks.ak1);
                }
                i = j - 1;
            }
        }
        Ok(())
    }

    /// Decide which knots get curvature blending and compute the blended
    /// target for each. To be invoked after solving.
    pub fn compute_curvature_blending(&mut self) {
        for s in &mut self.states {
            s.k_blend = None;
        }
        let len = self.pts.len();
        if len == 0 {
            return;
        }
        let length = self.num_segments();
        for i in 0..length {
            if self.pts[i].ty.is_corner() {
                continue;
            }
            let (Some(l_ak), Some(r_ak)) = (self.states[i].l_ak, self.states[i].r_ak) else {
                continue;
            };
            if r_ak.abs() > REVERSAL_THRESHOLD || l_ak.abs() > REVERSAL_THRESHOLD {
                // Don't blend reversals.
                continue;
            }
            if r_ak.signum() == l_ak.signum() {
                let r_k = r_ak.tan() / self.chord_len(i + len - 1);
                let l_k = l_ak.tan() / self.chord_len(i);
                self.states[i].k_blend = Some(2.0 / (1.0 / r_k + 1.0 / l_k));
            } else {
                self.states[i].k_blend = Some(0.0);
            }
        }
    }

    /// Render the solved spline, applying blended curvature targets where
    /// curvature blending produced them.
    pub fn render(&self) -> Result<BezPath, SplineError> {
        let mut path = BezPath::new();
        if self.pts.len() < 2 {
            return Ok(path);
        }
        path.moveto(self.pts[0].point);
        for i in 0..self.num_segments() {
            path.mark(i);
            let i1 = self.wrap(i + 1);
            let p0 = self.pts[i].point;
            let p1 = self.pts[i1].point;
            let d = p1 - p0;
            let chth = d.y.atan2(d.x);
            let chord = d.hypot();
            let th0 = mod2pi(self.states[i].r_th - chth);
            let th1 = mod2pi(chth - self.states[i1].l_th);
            // Blended curvatures are absolute; the family works in the
            // unit chord frame.
            let k0 = self.states[i].k_blend.map(|k| k * chord);
            let k1 = self.states[i1].k_blend.map(|k| k * chord);
            let rendered = self.curve.render4(th0, th1, k0, k1)?;
            let mut c: Vec<Point> = Vec::with_capacity(rendered.len() + 1);
            for pt in &rendered {
                c.push(chord_to_absolute(p0, d, *pt));
            }
            c.push(p1);
            for chunk in c.chunks(3) {
                path.curveto(chunk[0], chunk[1], chunk[2]);
            }
        }
        if self.is_closed {
            path.closepath();
        }
        Ok(path)
    }

    /// SVG path data for the solved spline.
    pub fn render_svg(&self, precision: usize) -> Result<String, SplineError> {
        Ok(self.render()?.to_svg_path(precision))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::bezier::PathEl;
    use crate::family::MyCurve;

    fn max_abs_y(path: &BezPath) -> Scalar {
        let mut max = 0.0;
        for el in path.elements() {
            match el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) => max = p.y.abs().max(max),
                PathEl::CurveTo(p1, p2, p3) => {
                    max = p1.y.abs().max(p2.y.abs()).max(p3.y.abs()).max(max);
                }
                PathEl::ClosePath | PathEl::Mark(_) => {}
            }
        }
        max
    }

    #[test]
    fn collinear_run_has_zero_error() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.5, 0.0),
        ];
        let mut spline = TwoParamSpline::new(&MyCurve, pts);
        spline.initial_ths();
        let err = spline.iter_dumb(0).unwrap();
        assert_abs_diff_eq!(err, 0.0, epsilon = 1e-12);
        let path = spline.render().unwrap();
        assert_abs_diff_eq!(max_abs_y(&path), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn solver_converges_on_gentle_arc() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.3),
            Point::new(2.0, 0.0),
        ];
        let mut spline = TwoParamSpline::new(&MyCurve, pts);
        spline.initial_ths();
        let mut err = Scalar::INFINITY;
        for k in 0..SOLVER_ITERATIONS {
            err = spline.iter_dumb(k).unwrap();
        }
        assert!(err < 1e-3, "residual error {err}");
    }

    #[test]
    fn pinned_endpoint_tangent_is_respected() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.4),
            Point::new(2.0, 0.0),
        ];
        let mut spline = TwoParamSpline::new(&MyCurve, pts);
        spline.start_th = Some(1.0);
        spline.initial_ths();
        assert_abs_diff_eq!(spline.ths[0], 1.0);
        for k in 0..SOLVER_ITERATIONS {
            spline.iter_dumb(k).unwrap();
        }
        assert_abs_diff_eq!(spline.ths[0], 1.0);
    }

    #[test]
    fn two_point_run_uses_endpoint_condition() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        let mut spline = TwoParamSpline::new(&MyCurve, pts);
        spline.initial_ths();
        let err = spline.iter_dumb(0).unwrap();
        assert_abs_diff_eq!(err, 0.0);
        assert_abs_diff_eq!(spline.ths[0], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(spline.ths[1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn corner_chain_renders_straight_segments() {
        let mut spline = Spline::new(
            &MyCurve,
            vec![
                ControlPoint::corner(Point::new(0.0, 0.0)),
                ControlPoint::corner(Point::new(1.0, 0.0)),
                ControlPoint::corner(Point::new(2.0, 0.0)),
            ],
            false,
        );
        spline.solve().unwrap();
        assert_abs_diff_eq!(spline.states()[0].r_th, 0.0);
        assert_abs_diff_eq!(spline.states()[1].l_th, 0.0);
        assert_abs_diff_eq!(spline.states()[1].r_th, 0.0);
        let path = spline.render().unwrap();
        assert_abs_diff_eq!(max_abs_y(&path), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn collinear_smooth_chain_stays_straight() {
        let mut spline = Spline::new(
            &MyCurve,
            vec![
                ControlPoint::smooth(Point::new(0.0, 1.0)),
                ControlPoint::smooth(Point::new(1.0, 1.0)),
                ControlPoint::smooth(Point::new(3.0, 1.0)),
                ControlPoint::smooth(Point::new(4.0, 1.0)),
            ],
            false,
        );
        spline.solve().unwrap();
        spline.compute_curvature_blending();
        let path = spline.render().unwrap();
        for el in path.elements() {
            if let PathEl::CurveTo(p1, p2, p3) = el {
                assert_abs_diff_eq!(p1.y, 1.0, epsilon = 1e-6);
                assert_abs_diff_eq!(p2.y, 1.0, epsilon = 1e-6);
                assert_abs_diff_eq!(p3.y, 1.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn solve_is_idempotent() {
        let pts = vec![
            ControlPoint::smooth(Point::new(0.0, 0.0)),
            ControlPoint::smooth(Point::new(1.0, 0.8)),
            ControlPoint::corner(Point::new(2.0, 0.0)),
            ControlPoint::smooth(Point::new(3.0, -0.5)),
            ControlPoint::smooth(Point::new(4.0, 0.0)),
        ];
        let mut spline = Spline::new(&MyCurve, pts, false);
        spline.solve().unwrap();
        spline.compute_curvature_blending();
        let first = spline.render().unwrap();
        spline.solve().unwrap();
        spline.compute_curvature_blending();
        let second = spline.render().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn explicit_tangent_is_honored() {
        let pts = vec![
            ControlPoint::new(Point::new(0.0, 0.0), PointType::Corner, None, Some(0.9)),
            ControlPoint::smooth(Point::new(1.0, 0.5)),
            ControlPoint::corner(Point::new(2.0, 0.0)),
        ];
        let mut spline = Spline::new(&MyCurve, pts, false);
        spline.solve().unwrap();
        assert_abs_diff_eq!(spline.states()[0].r_th, 0.9);
    }

    #[test]
    fn blending_at_inflection_targets_zero() {
        let pts = vec![
            ControlPoint::smooth(Point::new(0.0, 0.0)),
            ControlPoint::smooth(Point::new(1.0, 0.5)),
            ControlPoint::smooth(Point::new(2.0, 0.0)),
            ControlPoint::smooth(Point::new(3.0, -0.5)),
            ControlPoint::smooth(Point::new(4.0, 0.0)),
        ];
        let mut spline = Spline::new(&MyCurve, pts, false);
        spline.solve().unwrap();
        spline.compute_curvature_blending();
        // Top of the bump: both sides curve the same way.
        let bump = spline.states()[1].k_blend.unwrap();
        assert!(bump != 0.0);
        // Center point is an inflection: opposite signs blend to zero.
        assert_abs_diff_eq!(spline.states()[2].k_blend.unwrap(), 0.0);
        // Open endpoints never blend.
        assert_eq!(spline.states()[0].k_blend, None);
    }

    #[test]
    fn closed_triangle_blends_and_closes() {
        let pts = vec![
            ControlPoint::smooth(Point::new(0.0, 0.0)),
            ControlPoint::smooth(Point::new(2.0, 0.0)),
            ControlPoint::smooth(Point::new(1.0, 1.7)),
        ];
        let mut spline = Spline::new(&MyCurve, pts, true);
        spline.solve().unwrap();
        spline.compute_curvature_blending();
        let path = spline.render().unwrap();
        assert!(matches!(path.elements().last(), Some(PathEl::ClosePath)));
        for i in 1..3 {
            let k = spline.states()[i].k_blend;
            assert!(k.is_some(), "knot {i} should blend");
        }
    }

    #[test]
    fn degenerate_splines_render_empty() {
        let spline = Spline::new(&MyCurve, vec![], false);
        assert!(spline.render().unwrap().is_empty());
        let single = Spline::new(
            &MyCurve,
            vec![ControlPoint::smooth(Point::new(1.0, 2.0))],
            false,
        );
        assert!(single.render().unwrap().is_empty());
    }

    #[test]
    fn closed_start_index_prefers_corner() {
        let pts = vec![
            ControlPoint::smooth(Point::new(0.0, 0.0)),
            ControlPoint::corner(Point::new(1.0, 0.0)),
            ControlPoint::smooth(Point::new(1.0, 1.0)),
        ];
        let spline = Spline::new(&MyCurve, pts, true);
        assert_eq!(spline.start_ix(), 1);
    }
}
