//! Two-parameter curve families.
//!
//! Every family describes a curve over the unit chord from (0, 0) to
//! (1, 0), parametrized by the tangent angles `th0` and `th1` at the two
//! endpoints, measured from the chord (positive bending left at the
//! start, positive bending left toward the chord at the end). The global
//! solver only ever talks to a family through [`TwoParamCurve`].

use crate::bezier::CubicBez;
use crate::error::SplineError;
use crate::math::{hermite5, solve_bisect};
use crate::types::{Point, Scalar, Vec2};

/// Arctan of curvature at the two endpoints of a rendered curve.
///
/// Quadrant is significant: a value outside (-pi/2, pi/2) means the
/// curve leaves the endpoint heading away from the chord, a reversal of
/// direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curvature {
    pub ak0: Scalar,
    pub ak1: Scalar,
}

/// Partial derivatives of the endpoint arctan-curvatures with respect to
/// the endpoint tangent angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvatureDerivs {
    pub dak0_dth0: Scalar,
    pub dak1_dth0: Scalar,
    pub dak0_dth1: Scalar,
    pub dak1_dth1: Scalar,
}

/// A two-parameter family of curves over the unit chord.
pub trait TwoParamCurve {
    /// Render the curve as a chain of cubic segments, returning the
    /// _interior_ control points only (3n - 1 points for n cubics); the
    /// chord endpoints (0, 0) and (1, 0) are implied.
    fn render(&self, th0: Scalar, th1: Scalar) -> Result<Vec<Vec2>, SplineError>;

    /// Arctan of curvature at both endpoints.
    fn compute_curvature(&self, th0: Scalar, th1: Scalar) -> Result<Curvature, SplineError>;

    /// Tangent at an open endpoint, given the solved tangent at the
    /// other end of its segment.
    #[must_use]
    fn endpoint_tangent(&self, th: Scalar) -> Scalar {
        th
    }

    /// Derivatives of the endpoint curvatures, by central differencing.
    /// The difference is scaled by `2 / epsilon` rather than
    /// `1 / (2 epsilon)`, so the values are 4x the analytic derivative;
    /// consumers only ever use them in ratios. Families with closed
    /// forms can override.
    fn compute_curvature_derivs(
        &self,
        th0: Scalar,
        th1: Scalar,
    ) -> Result<CurvatureDerivs, SplineError> {
        let epsilon = 1e-6;
        let scale = 2.0 / epsilon;
        let k0plus = self.compute_curvature(th0 + epsilon, th1)?;
        let k0minus = self.compute_curvature(th0 - epsilon, th1)?;
        let k1plus = self.compute_curvature(th0, th1 + epsilon)?;
        let k1minus = self.compute_curvature(th0, th1 - epsilon)?;
        Ok(CurvatureDerivs {
            dak0_dth0: scale * (k0plus.ak0 - k0minus.ak0),
            dak1_dth0: scale * (k0plus.ak1 - k0minus.ak1),
            dak0_dth1: scale * (k1plus.ak0 - k1minus.ak0),
            dak1_dth1: scale * (k1plus.ak1 - k1minus.ak1),
        })
    }

    /// Render with prescribed endpoint curvatures, when the family can
    /// honor them. The default ignores the targets.
    fn render4(
        &self,
        th0: Scalar,
        th1: Scalar,
        k0: Option<Scalar>,
        k1: Option<Scalar>,
    ) -> Result<Vec<Vec2>, SplineError> {
        let _ = (k0, k1);
        self.render(th0, th1)
    }
}

/// Arctan curvature of `cb` at `t`, measured in the frame rotated so the
/// tangent angle `th` lies along the positive x axis. The atan2 form
/// keeps the quadrant and stays finite at cusps.
pub(crate) fn chord_frame_atan_curvature(cb: &CubicBez, t: Scalar, th: Scalar) -> Scalar {
    let (s, c) = th.sin_cos();
    let d2 = cb.deriv2(t);
    let d2cross = d2.y.mul_add(c, -(d2.x * s));
    let d = cb.deriv(t);
    let ddot = d.x.mul_add(c, d.y * s);
    d2cross.atan2(ddot * ddot.abs())
}

// ---------------------------------------------------------------------------
// MyCurve
// ---------------------------------------------------------------------------

fn arm_len(th0: Scalar, th1: Scalar) -> Scalar {
    let offset = 0.3 * (2.0 * th1 - 0.4 * (2.0 * th1).sin()).sin();
    let scale = 1.0 / (3.0 * 0.8);
    let th = th0 - offset;
    scale * (th.cos() - 0.2 * (3.0 * th).cos())
}

/// The smooth single cubic with angle-dependent arm lengths.
pub(crate) fn my_cubic(th0: Scalar, th1: Scalar) -> CubicBez {
    let len0 = arm_len(th0, th1);
    let len1 = arm_len(th1, th0);
    CubicBez::from_coords([
        0.0,
        0.0,
        th0.cos() * len0,
        th0.sin() * len0,
        th1.cos().mul_add(-len1, 1.0),
        th1.sin() * len1,
        1.0,
        0.0,
    ])
}

/// Hand-tuned single-cubic family. Fast, visually pleasing, and the
/// family the blending heuristics were calibrated against.
#[derive(Debug, Clone, Copy, Default)]
pub struct MyCurve;

impl MyCurve {
    /// Curvature-matching via a quintic Hermite displacement field,
    /// sampled onto four de Casteljau quarters (11 interior points).
    ///
    /// More accurate at the endpoints than the plain cubic adjustment,
    /// at the cost of a 4x segment count.
    #[must_use]
    pub fn render4_quintic(
        &self,
        th0: Scalar,
        th1: Scalar,
        k0: Option<Scalar>,
        k1: Option<Scalar>,
    ) -> Vec<Vec2> {
        let cb = my_cubic(th0, th1);
        // Second-derivative tweak matching the endpoint curvature target.
        let curv_adjust = |t: Scalar, th: Scalar, k: Option<Scalar>| -> Vec2 {
            let Some(k) = k else { return Vec2::ZERO };
            let (s, c) = th.sin_cos();
            let d = cb.deriv(t);
            let ddot = d.x.mul_add(c, d.y * s);
            if ddot.abs() < 1e-12 {
                // Cusp, no adjustment possible.
                return Vec2::ZERO;
            }
            let d2 = cb.deriv2(t);
            let d2cross = d2.y.mul_add(c, -(d2.x * s));
            let old_k = d2cross / (ddot * ddot);
            let a_adjust = (k - old_k) * (ddot * ddot);
            Vec2::new(-s * a_adjust, c * a_adjust)
        };
        let a0 = curv_adjust(0.0, th0, k0);
        let a1 = curv_adjust(1.0, -th1, k1);
        let hx = hermite5(0.0, 0.0, 0.0, 0.0, a0.x, a1.x);
        let hy = hermite5(0.0, 0.0, 0.0, 0.0, a0.y, a1.y);
        let hxd = hx.deriv();
        let hyd = hy.deriv();
        let c0 = cb.left_half();
        let c1 = cb.right_half();
        let quarters = [
            c0.left_half(),
            c0.right_half(),
            c1.left_half(),
            c1.right_half(),
        ];
        let mut result = Vec::with_capacity(11);
        let scale = 1.0 / 12.0;
        for (i, q) in quarters.iter().enumerate() {
            let t = 0.25 * i as Scalar;
            let t1 = t + 0.25;
            let d0 = Vec2::new(hx.eval(t), hy.eval(t));
            let d1 = d0 + scale * Vec2::new(hxd.eval(t), hyd.eval(t));
            let d3 = Vec2::new(hx.eval(t1), hy.eval(t1));
            let d2 = d3 - scale * Vec2::new(hxd.eval(t1), hyd.eval(t1));
            if i != 0 {
                result.push((q.p0 + d0).to_vec2());
            }
            result.push((q.p1 + d1).to_vec2());
            result.push((q.p2 + d2).to_vec2());
        }
        result
    }

    /// Single-cubic approximation of curvature matching: rescale the
    /// tangent arms so the endpoint curvature moves toward the target.
    fn render4_cubic(
        &self,
        th0: Scalar,
        th1: Scalar,
        k0: Option<Scalar>,
        k1: Option<Scalar>,
    ) -> Vec<Vec2> {
        let cb = my_cubic(th0, th1);
        let deriv_scale = |t: Scalar, th: Scalar, k: Option<Scalar>| -> Scalar {
            let Some(k) = k else { return 1.0 / 3.0 };
            let (s, c) = th.sin_cos();
            let d = cb.deriv(t);
            let d2 = cb.deriv2(t);
            let d2cross = d2.y.mul_add(c, -(d2.x * s));
            let ddot = d.x.mul_add(c, d.y * s);
            let mut old_k = d2cross / (ddot * ddot);
            // Fudge to avoid divide-by-zero.
            if old_k.abs() < 1e-6 {
                old_k = 1e-6;
            }
            let ratio = k / old_k;
            1.0 / (2.0 + ratio)
        };
        let scale0 = deriv_scale(0.0, th0, k0);
        let d0 = cb.deriv(0.0);
        let scale1 = deriv_scale(1.0, -th1, k1);
        let d1 = cb.deriv(1.0);
        vec![
            d0 * scale0,
            Vec2::new(d1.x.mul_add(-scale1, 1.0), -d1.y * scale1),
        ]
    }
}

impl TwoParamCurve for MyCurve {
    fn render(&self, th0: Scalar, th1: Scalar) -> Result<Vec<Vec2>, SplineError> {
        let cb = my_cubic(th0, th1);
        Ok(vec![cb.p1.to_vec2(), cb.p2.to_vec2()])
    }

    fn compute_curvature(&self, th0: Scalar, th1: Scalar) -> Result<Curvature, SplineError> {
        let cb = my_cubic(th0, th1);
        Ok(Curvature {
            ak0: chord_frame_atan_curvature(&cb, 0.0, th0),
            ak1: chord_frame_atan_curvature(&cb, 1.0, -th1),
        })
    }

    fn endpoint_tangent(&self, th: Scalar) -> Scalar {
        0.5 * (2.0 * th).sin()
    }

    fn render4(
        &self,
        th0: Scalar,
        th1: Scalar,
        k0: Option<Scalar>,
        k1: Option<Scalar>,
    ) -> Result<Vec<Vec2>, SplineError> {
        if k0.is_none() && k1.is_none() {
            return self.render(th0, th1);
        }
        Ok(self.render4_cubic(th0, th1, k0, k1))
    }
}

// ---------------------------------------------------------------------------
// BiParabola
// ---------------------------------------------------------------------------

/// Two parabola arcs, one rooted at each chord endpoint, joined where
/// their tangents agree and their curvature magnitudes match.
#[derive(Debug, Clone, Copy, Default)]
pub struct BiParabola;

/// Curvature of the parabola with vertex frame `th` at the point (x, y),
/// reparametrized so the parabola is `v = a u^2`.
fn calc_para_k(th: Scalar, x: Scalar, y: Scalar) -> Scalar {
    let (s, c) = th.sin_cos();
    let u = c.mul_add(x, s * y);
    let v = c.mul_add(y, -(s * x));
    2.0 * u * v * (4.0 * v).mul_add(v, u * u).powf(-1.5)
}

/// Tangent-direction functional at (x, y) for the parabola frame `th`.
fn calc_para_v(th: Scalar, x: Scalar, y: Scalar) -> Vec2 {
    let (s, c) = th.sin_cos();
    let dot = c.mul_add(y, -(s * x));
    Vec2::new(s.mul_add(-dot, x), c.mul_add(dot, y))
}

/// Vertex curvature coefficient `a` of the parabola through (x, y).
fn calc_para_a(th: Scalar, x: Scalar, y: Scalar) -> Scalar {
    let (s, c) = th.sin_cos();
    let u = c.mul_add(x, s * y);
    let v = c.mul_add(y, -(s * x));
    -v / (u * u)
}

/// Join ordinate where the two arcs share a tangent, for a given
/// abscissa.
fn calc_y_for_x_join(th0: Scalar, th1: Scalar, x: Scalar) -> Option<Scalar> {
    solve_bisect(
        |y| {
            let v0 = calc_para_v(th0, x, y);
            let v1 = calc_para_v(th1, 1.0 - x, y);
            v0.x.mul_add(v1.y, v0.y * v1.x)
        },
        -0.5,
        0.5,
    )
}

/// Find the join point equalizing curvature magnitudes. Falls back to
/// interval midpoints when a bisection interval fails to straddle a
/// root (rare; extreme tangent angles).
fn solve_join(th0: Scalar, th1: Scalar) -> (Scalar, Scalar) {
    let x = solve_bisect(
        |x| {
            let y = calc_y_for_x_join(th0, th1, x).unwrap_or(0.0);
            calc_para_k(th0, x, y).abs() - calc_para_k(th1, 1.0 - x, y).abs()
        },
        1e-6,
        1.0 - 1e-6,
    )
    .unwrap_or_else(|| {
        log::warn!("biparabola join does not bracket at th0={th0}, th1={th1}");
        0.5
    });
    let y = calc_y_for_x_join(th0, th1, x).unwrap_or(0.0);
    (x, y)
}

/// Degree-elevate a quadratic to a cubic.
fn elevate(p0: Point, q: Point, p2: Point) -> CubicBez {
    let frac = 2.0 / 3.0;
    CubicBez::new(p0, p0.lerp(q, frac), p2.lerp(q, frac), p2)
}

impl BiParabola {
    /// Vertex curvature coefficients (a0, a1) of the two arcs.
    #[must_use]
    pub fn solve_coefficients(&self, th0: Scalar, th1: Scalar) -> (Scalar, Scalar) {
        let (x, y) = solve_join(th0, th1);
        (calc_para_a(th0, x, y), calc_para_a(th1, 1.0 - x, y))
    }

    /// The two exact cubic segments (each an elevated parabola arc).
    fn render_cubics(&self, th0: Scalar, th1: Scalar) -> [CubicBez; 2] {
        let (x, y) = solve_join(th0, th1);
        let join = Point::new(x, y);
        // Each arc runs from a parabola vertex to the join; the
        // quadratic control point is the tangent intersection, at half
        // the join's abscissa in the vertex frame.
        let (s0, c0) = th0.sin_cos();
        let u0 = c0.mul_add(x, s0 * y);
        let q0 = Point::new(0.5 * u0 * c0, 0.5 * u0 * s0);
        let (s1, c1) = th1.sin_cos();
        let u1 = c1.mul_add(1.0 - x, s1 * y);
        let q1 = Point::new((0.5 * u1).mul_add(-c1, 1.0), 0.5 * u1 * s1);
        [
            elevate(Point::ORIGIN, q0, join),
            elevate(join, q1, Point::new(1.0, 0.0)),
        ]
    }
}

impl TwoParamCurve for BiParabola {
    fn render(&self, th0: Scalar, th1: Scalar) -> Result<Vec<Vec2>, SplineError> {
        let [left, right] = self.render_cubics(th0, th1);
        Ok(vec![
            left.p1.to_vec2(),
            left.p2.to_vec2(),
            left.p3.to_vec2(),
            right.p1.to_vec2(),
            right.p2.to_vec2(),
        ])
    }

    fn compute_curvature(&self, th0: Scalar, th1: Scalar) -> Result<Curvature, SplineError> {
        let [left, right] = self.render_cubics(th0, th1);
        Ok(Curvature {
            ak0: chord_frame_atan_curvature(&left, 0.0, th0),
            ak1: chord_frame_atan_curvature(&right, 1.0, -th1),
        })
    }

    fn endpoint_tangent(&self, th: Scalar) -> Scalar {
        (2.0 * th.tan()).atan() - th
    }
}

// ---------------------------------------------------------------------------
// Curvature map sampling
// ---------------------------------------------------------------------------

/// Sample a family's start-point curvature over the (th0, th1) square
/// (-pi/2, pi/2)^2 on an `n` by `n` grid, as (th0, th1, k) triples in
/// row-major th1 order. Suitable for gnuplot-style contour dumps.
pub fn curvature_map<C: TwoParamCurve>(
    curve: &C,
    n: usize,
) -> Result<Vec<(Scalar, Scalar, Scalar)>, SplineError> {
    use std::f64::consts::{FRAC_PI_2, PI};
    let mut samples = Vec::with_capacity(n * n);
    for j in 0..n {
        let th1 = (PI * j as Scalar / (n - 1) as Scalar) - FRAC_PI_2;
        for i in 0..n {
            let th0 = (PI * i as Scalar / (n - 1) as Scalar) - FRAC_PI_2;
            let ak0 = curve.compute_curvature(th0, th1)?.ak0;
            samples.push((th0, th1, ak0.tan()));
        }
    }
    Ok(samples)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
