//! Euler spiral math: the polynomial-spiral integrator, the two-angle
//! fit, and the spiral curve family.
//!
//! A polynomial spiral is parametrized by arc length s in [-1/2, 1/2]
//! with tangent angle theta(s) = k0 s + k1 s^2/2 + k2 s^3/6 + k3 s^4/24
//! relative to its chord. The integrator computes the chord vector of
//! that parametrization; everything else is built on top of it.

use crate::error::SplineError;
use crate::family::{Curvature, TwoParamCurve};
use crate::math::solve_4x4;
use crate::types::{Scalar, Vec2};

// ---------------------------------------------------------------------------
// Integrator
// ---------------------------------------------------------------------------

/// Integrate the polynomial spiral chord by an order-10 truncated
/// Taylor series. Accurate when the total bending is small; see
/// [`integ_spiro`] for the adaptive entry point.
#[expect(
    clippy::similar_names,
    reason = "series terms are named t{order}_{degree} after the expansion"
)]
#[must_use]
pub fn integ_spiro_12(k0: Scalar, k1: Scalar, k2: Scalar, k3: Scalar) -> (Scalar, Scalar) {
    let t1_1 = k0;
    let t1_2 = 0.5 * k1;
    let t1_3 = (1.0 / 6.0) * k2;
    let t1_4 = (1.0 / 24.0) * k3;
    let t2_2 = t1_1 * t1_1;
    let t2_3 = 2.0 * (t1_1 * t1_2);
    let t2_4 = 2.0 * (t1_1 * t1_3) + t1_2 * t1_2;
    let t2_5 = 2.0 * (t1_1 * t1_4 + t1_2 * t1_3);
    let t2_6 = 2.0 * (t1_2 * t1_4) + t1_3 * t1_3;
    let t2_7 = 2.0 * (t1_3 * t1_4);
    let t2_8 = t1_4 * t1_4;
    let t3_4 = t2_2 * t1_2 + t2_3 * t1_1;
    let t3_6 = t2_2 * t1_4 + t2_3 * t1_3 + t2_4 * t1_2 + t2_5 * t1_1;
    let t3_8 = t2_4 * t1_4 + t2_5 * t1_3 + t2_6 * t1_2 + t2_7 * t1_1;
    let t3_10 = t2_6 * t1_4 + t2_7 * t1_3 + t2_8 * t1_2;
    let t4_4 = t2_2 * t2_2;
    let t4_5 = 2.0 * (t2_2 * t2_3);
    let t4_6 = 2.0 * (t2_2 * t2_4) + t2_3 * t2_3;
    let t4_7 = 2.0 * (t2_2 * t2_5 + t2_3 * t2_4);
    let t4_8 = 2.0 * (t2_2 * t2_6 + t2_3 * t2_5) + t2_4 * t2_4;
    let t4_9 = 2.0 * (t2_2 * t2_7 + t2_3 * t2_6 + t2_4 * t2_5);
    let t4_10 = 2.0 * (t2_2 * t2_8 + t2_3 * t2_7 + t2_4 * t2_6) + t2_5 * t2_5;
    let t5_6 = t4_4 * t1_2 + t4_5 * t1_1;
    let t5_8 = t4_4 * t1_4 + t4_5 * t1_3 + t4_6 * t1_2 + t4_7 * t1_1;
    let t5_10 = t4_6 * t1_4 + t4_7 * t1_3 + t4_8 * t1_2 + t4_9 * t1_1;
    let t6_6 = t4_4 * t2_2;
    let t6_7 = t4_4 * t2_3 + t4_5 * t2_2;
    let t6_8 = t4_4 * t2_4 + t4_5 * t2_3 + t4_6 * t2_2;
    let t6_9 = t4_4 * t2_5 + t4_5 * t2_4 + t4_6 * t2_3 + t4_7 * t2_2;
    let t6_10 = t4_4 * t2_6 + t4_5 * t2_5 + t4_6 * t2_4 + t4_7 * t2_3 + t4_8 * t2_2;
    let t7_8 = t6_6 * t1_2 + t6_7 * t1_1;
    let t7_10 = t6_6 * t1_4 + t6_7 * t1_3 + t6_8 * t1_2 + t6_9 * t1_1;
    let t8_8 = t6_6 * t2_2;
    let t8_9 = t6_6 * t2_3 + t6_7 * t2_2;
    let t8_10 = t6_6 * t2_4 + t6_7 * t2_3 + t6_8 * t2_2;
    let t9_10 = t8_8 * t1_2 + t8_9 * t1_1;
    let t10_10 = t8_8 * t2_2;
    let mut u = 1.0;
    u -= (1.0 / 24.0) * t2_2 + (1.0 / 160.0) * t2_4 + (1.0 / 896.0) * t2_6 + (1.0 / 4608.0) * t2_8;
    u += (1.0 / 1920.0) * t4_4
        + (1.0 / 10752.0) * t4_6
        + (1.0 / 55296.0) * t4_8
        + (1.0 / 270336.0) * t4_10;
    u -= (1.0 / 322560.0) * t6_6 + (1.0 / 1658880.0) * t6_8 + (1.0 / 8110080.0) * t6_10;
    u += (1.0 / 92897280.0) * t8_8 + (1.0 / 454164480.0) * t8_10;
    u -= 2.446_494_959_515_793e-11 * t10_10;
    let mut v = (1.0 / 12.0) * t1_2 + (1.0 / 80.0) * t1_4;
    v -= (1.0 / 480.0) * t3_4
        + (1.0 / 2688.0) * t3_6
        + (1.0 / 13824.0) * t3_8
        + (1.0 / 67584.0) * t3_10;
    v += (1.0 / 53760.0) * t5_6 + (1.0 / 276480.0) * t5_8 + (1.0 / 1351680.0) * t5_10;
    v -= (1.0 / 11612160.0) * t7_8 + (1.0 / 56770560.0) * t7_10;
    v += 2.446_494_959_515_793e-10 * t9_10;
    (u, v)
}

/// Integrate by compositing `n` sub-ranges, each handled by the series.
#[must_use]
pub fn integ_spiro_12n(
    mut k0: Scalar,
    mut k1: Scalar,
    mut k2: Scalar,
    mut k3: Scalar,
    n: usize,
) -> (Scalar, Scalar) {
    let th1 = k0;
    let th2 = 0.5 * k1;
    let th3 = (1.0 / 6.0) * k2;
    let th4 = (1.0 / 24.0) * k3;
    let ds = 1.0 / n as Scalar;
    let ds2 = ds * ds;
    let ds3 = ds2 * ds;

    k0 *= ds;
    k1 *= ds;
    k2 *= ds;
    k3 *= ds;

    let mut x = 0.0;
    let mut y = 0.0;
    let mut s = 0.5 * ds - 0.5;

    for _ in 0..n {
        let km0 = (((1.0 / 6.0) * k3 * s + 0.5 * k2) * s + k1) * s + k0;
        let km1 = ((0.5 * k3 * s + k2) * s + k1) * ds;
        let km2 = (k3 * s + k2) * ds2;
        let km3 = k3 * ds3;

        let (u, v) = integ_spiro_12(km0, km1, km2, km3);

        let th = (((th4 * s + th3) * s + th2) * s + th1) * s;
        let (sth, cth) = th.sin_cos();

        x += cth * u - sth * v;
        y += cth * v + sth * u;
        s += ds;
    }
    (x * ds, y * ds)
}

/// Integrate the polynomial spiral chord; accuracy within 1e-9.
#[must_use]
pub fn integ_spiro(k0: Scalar, k1: Scalar, k2: Scalar, k3: Scalar) -> (Scalar, Scalar) {
    if k2 == 0.0 && k3 == 0.0 {
        // Euler spiral
        let est_err_raw = 0.2 * k0 * k0 + k1.abs();
        if est_err_raw < 1.0 {
            return integ_spiro_12(k0, k1, k2, k3);
        }
    }
    integ_spiro_12n(k0, k1, k2, k3, 4)
}

// ---------------------------------------------------------------------------
// Euler spiral fitting
// ---------------------------------------------------------------------------

/// Result of fitting an Euler spiral to two tangent angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerParams {
    /// Curvature at the arc-length midpoint.
    pub k0: Scalar,
    /// Curvature derivative with respect to arc length.
    pub k1: Scalar,
    /// Chord length of the unit-arc-length parametrization.
    pub chord: Scalar,
    /// Angle of the chord in the spiral's own frame.
    pub chth: Scalar,
}

/// Fit an Euler spiral segment to the chord-relative tangent angles.
///
/// `k0` has a closed form; `k1` is found by secant iteration against
/// the integrated chord angle, residual below 1e-9 within 10 steps.
pub fn fit_euler(th0: Scalar, th1: Scalar) -> Result<EulerParams, SplineError> {
    use std::f64::consts::PI;
    let mut k1_old = 0.0;
    let mut error_old = th1 - th0;
    let mut k0 = th0 + th1;
    while k0 > 2.0 * PI {
        k0 -= 4.0 * PI;
    }
    while k0 < -2.0 * PI {
        k0 += 4.0 * PI;
    }
    let mut k1 = 6.0 * (1.0 - ((0.5 / PI) * k0).powi(3)) * error_old;
    let mut uv = (1.0, 0.0);
    let mut converged = false;
    for _ in 0..10 {
        uv = integ_spiro(k0, k1, 0.0, 0.0);
        let error = (th1 - th0) - 2.0f64.mul_add(-uv.1.atan2(uv.0), 0.25 * k1);
        log::trace!("fit_euler: k1={k1}, residual={error}");
        if error.abs() < 1e-9 {
            converged = true;
            break;
        }
        let new_k1 = k1 + (k1_old - k1) * error / (error - error_old);
        k1_old = k1;
        error_old = error;
        k1 = new_k1;
    }
    if !converged {
        return Err(SplineError::EulerFitDivergence { th0, th1 });
    }
    Ok(EulerParams {
        k0,
        k1,
        chord: uv.0.hypot(uv.1),
        chth: uv.1.atan2(uv.0),
    })
}

/// A fitted Euler spiral segment over the unit chord (0, 0) - (1, 0).
#[derive(Debug, Clone, Copy)]
pub struct EulerSegment {
    pub params: EulerParams,
    thmid: Scalar,
}

impl EulerSegment {
    pub fn new(th0: Scalar, th1: Scalar) -> Result<Self, SplineError> {
        let params = fit_euler(th0, th1)?;
        let thmid = 0.5f64.mul_add(params.k0, (-0.125f64).mul_add(params.k1, -th0));
        Ok(Self { params, thmid })
    }

    /// Tangent angle at parameter `t`, in the spiral's internal y-down
    /// frame (the start tangent comes out as `-th0`).
    #[must_use]
    pub fn th(&self, t: Scalar) -> Scalar {
        let u = t - 0.5;
        self.thmid + (0.5 * self.params.k1 * u + self.params.k0) * u
    }

    /// Point at parameter `t` in [0, 1], in the unit chord frame.
    #[must_use]
    pub fn xy(&self, t: Scalar) -> Vec2 {
        let thm = self.th(t * 0.5);
        let k0 = self.params.k0;
        let k1 = self.params.k1;
        let (u, v) = integ_spiro((k0 + k1 * 0.5 * (t - 1.0)) * t, k1 * t * t, 0.0, 0.0);
        let s = t / self.params.chord * thm.sin();
        let c = t / self.params.chord * thm.cos();
        // Internal frame is y-down; emit y-up.
        Vec2::new(u.mul_add(c, -(v * s)), (-v).mul_add(c, -(u * s)))
    }

    /// Signed curvatures at the two endpoints, scaled to the unit chord.
    #[must_use]
    pub fn k_endpoints(&self) -> (Scalar, Scalar) {
        let k0 = (self.params.k0 - 0.5 * self.params.k1) * self.params.chord;
        let k1 = 0.5f64.mul_add(self.params.k1, self.params.k0) * self.params.chord;
        (k0, k1)
    }
}

// ---------------------------------------------------------------------------
// Polynomial spiral endpoint conditions
// ---------------------------------------------------------------------------

/// Endpoint conditions `[th0, th1, k0, k1]` realized by a polynomial
/// spiral `ks` over the unit chord (curvatures chord-scaled, angles in
/// the y-up chord frame).
#[must_use]
pub fn compute_spiro_ends(ks: &[Scalar; 4]) -> [Scalar; 4] {
    let (u, v) = integ_spiro(ks[0], ks[1], ks[2], ks[3]);
    let chth = v.atan2(u);
    let chord = u.hypot(v);
    let theta = |s: Scalar| ((ks[3] * s / 4.0 + ks[2]) * s / 3.0 + ks[1]) * s * s / 2.0 + ks[0] * s;
    let th0 = chth - theta(-0.5);
    let th1 = theta(0.5) - chth;
    let k_at = |s: Scalar| ((ks[3] * s / 3.0 + ks[2]) * s / 2.0 + ks[1]) * s + ks[0];
    [th0, th1, k_at(-0.5) * chord, k_at(0.5) * chord]
}

/// Solve for the polynomial spiral meeting prescribed tangent angles
/// and endpoint curvatures: Newton iteration (three steps, enough for
/// the solver's targets, which sit near the Euler-spiral seed) with a
/// central-difference Jacobian.
pub fn solve_spiro_ends(
    th0: Scalar,
    th1: Scalar,
    k0: Scalar,
    k1: Scalar,
) -> Result<[Scalar; 4], SplineError> {
    let seed = fit_euler(th0, th1)?;
    let mut ks = [seed.k0, seed.k1, 0.0, 0.0];
    let target = [th0, th1, k0, k1];
    let epsilon = 1e-6;
    for _ in 0..3 {
        let cur = compute_spiro_ends(&ks);
        let mut err = [0.0; 4];
        for i in 0..4 {
            err[i] = target[i] - cur[i];
        }
        let mut jac = [[0.0; 4]; 4];
        for j in 0..4 {
            let mut kp = ks;
            kp[j] += epsilon;
            let mut km = ks;
            km[j] -= epsilon;
            let fp = compute_spiro_ends(&kp);
            let fm = compute_spiro_ends(&km);
            for i in 0..4 {
                jac[i][j] = (fp[i] - fm[i]) / (2.0 * epsilon);
            }
        }
        let dk = solve_4x4(jac, err)?;
        for i in 0..4 {
            ks[i] += dk[i];
        }
    }
    Ok(ks)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_spiro_rec(ks: &[Scalar; 4], p0: Vec2, p1: Vec2, depth: usize, out: &mut Vec<Vec2>) {
    let bend =
        ks[0].abs() + (0.5 * ks[1]).abs() + (0.125 * ks[2]).abs() + ((1.0 / 48.0) * ks[3]).abs();
    let seg_ch = (p1 - p0).hypot();
    let seg_th = (p1.y - p0.y).atan2(p1.x - p0.x);
    let (u, v) = integ_spiro(ks[0], ks[1], ks[2], ks[3]);
    let ch = u.hypot(v);
    let th = v.atan2(u);
    let scale = seg_ch / ch;
    let rot = seg_th - th;
    if depth > 5 || bend < 1.0 {
        let th_even = rot + (1.0 / 8.0) * ks[1] + (1.0 / 384.0) * ks[3];
        let th_odd = 0.5 * ks[0] + (1.0 / 48.0) * ks[2];
        let arm = scale * (1.0 / 3.0);
        let ul = arm * (th_even - th_odd).cos();
        let vl = arm * (th_even - th_odd).sin();
        let ur = arm * (th_even + th_odd).cos();
        let vr = arm * (th_even + th_odd).sin();
        out.push(p0 + Vec2::new(ul, vl));
        out.push(p1 - Vec2::new(ur, vr));
        out.push(p1);
    } else {
        let ksub = [
            0.5 * ks[0] - 0.125 * ks[1] + (1.0 / 64.0) * ks[2] - (1.0 / 768.0) * ks[3],
            0.25 * ks[1] - (1.0 / 16.0) * ks[2] + (1.0 / 128.0) * ks[3],
            0.125 * ks[2] - (1.0 / 32.0) * ks[3],
            (1.0 / 16.0) * ks[3],
        ];
        let thsub = rot - 0.25 * ks[0] + (1.0 / 32.0) * ks[1] - (1.0 / 384.0) * ks[2]
            + (1.0 / 6144.0) * ks[3];
        let cth = 0.5 * scale * thsub.cos();
        let sth = 0.5 * scale * thsub.sin();
        let (usub, vsub) = integ_spiro(ksub[0], ksub[1], ksub[2], ksub[3]);
        let mid = p0 + Vec2::new(cth * usub - sth * vsub, cth * vsub + sth * usub);
        render_spiro_rec(&ksub, p0, mid, depth + 1, out);
        let ksub2 = [
            ksub[0] + 0.25 * ks[1] + (1.0 / 384.0) * ks[3],
            ksub[1],
            ksub[2],
            ksub[3],
        ];
        render_spiro_rec(&ksub2, mid, p1, depth + 1, out);
    }
}

/// Render a polynomial spiral over the unit chord as adaptive cubic
/// segments, returning interior control points (3n - 1 for n cubics).
#[must_use]
pub fn render_spiro(ks: &[Scalar; 4]) -> Vec<Vec2> {
    let mut pts = Vec::new();
    render_spiro_rec(ks, Vec2::ZERO, Vec2::new(1.0, 0.0), 0, &mut pts);
    // Drop the final on-curve point (the chord endpoint) and flip the
    // internal y-down frame to y-up.
    pts.pop();
    for p in &mut pts {
        p.y = -p.y;
    }
    pts
}

// ---------------------------------------------------------------------------
// SpiroCurve
// ---------------------------------------------------------------------------

/// The Euler-spiral two-parameter family, extended to a four-parameter
/// polynomial spiral when endpoint curvatures are prescribed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpiroCurve;

impl TwoParamCurve for SpiroCurve {
    fn render(&self, th0: Scalar, th1: Scalar) -> Result<Vec<Vec2>, SplineError> {
        let params = fit_euler(th0, th1)?;
        Ok(render_spiro(&[params.k0, params.k1, 0.0, 0.0]))
    }

    fn compute_curvature(&self, th0: Scalar, th1: Scalar) -> Result<Curvature, SplineError> {
        let seg = EulerSegment::new(th0, th1)?;
        let (k0, k1) = seg.k_endpoints();
        Ok(Curvature {
            ak0: k0.atan(),
            ak1: k1.atan(),
        })
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
        let seed = fit_euler(th0, th1)?;
        let natural = compute_spiro_ends(&[seed.k0, seed.k1, 0.0, 0.0]);
        let k0 = k0.unwrap_or(natural[2]);
        let k1 = k1.unwrap_or(natural[3]);
        match solve_spiro_ends(th0, th1, k0, k1) {
            Ok(ks) => Ok(render_spiro(&ks)),
            Err(err) => {
                log::warn!("spiro endpoint-curvature solve failed ({err}), using euler fit");
                self.render(th0, th1)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
