//! Numerical primitives: angle wrapping, polynomials, and the small
//! linear/scalar solvers used by the curve families.

use crate::error::SplineError;
use crate::types::Scalar;

/// Normalize an angle to within pi of zero.
#[must_use]
pub fn mod2pi(th: Scalar) -> Scalar {
    let twopi = 2.0 * std::f64::consts::PI;
    let frac = th * (1.0 / twopi);
    twopi * (frac - frac.round())
}

// ---------------------------------------------------------------------------
// Polynomial
// ---------------------------------------------------------------------------

/// Dense polynomial with coefficients in ascending degree order.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coeffs: Vec<Scalar>,
}

impl Polynomial {
    /// Create a polynomial `c[0] + c[1] x + c[2] x^2 + ...`.
    #[must_use]
    pub fn new(coeffs: Vec<Scalar>) -> Self {
        Self { coeffs }
    }

    /// Evaluate at `x`.
    #[must_use]
    pub fn eval(&self, x: Scalar) -> Scalar {
        let mut xi = 1.0;
        let mut s = 0.0;
        for &a in &self.coeffs {
            s = a.mul_add(xi, s);
            xi *= x;
        }
        s
    }

    /// Exact derivative polynomial.
    #[must_use]
    pub fn deriv(&self) -> Self {
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, &a)| (i as Scalar) * a)
            .collect();
        Self { coeffs }
    }
}

/// Quintic Hermite interpolant matching endpoint values, velocities and
/// accelerations at x = 0 and x = 1.
#[must_use]
pub fn hermite5(
    x0: Scalar,
    x1: Scalar,
    v0: Scalar,
    v1: Scalar,
    a0: Scalar,
    a1: Scalar,
) -> Polynomial {
    Polynomial::new(vec![
        x0,
        v0,
        0.5 * a0,
        -10.0 * x0 + 10.0 * x1 - 6.0 * v0 - 4.0 * v1 - 1.5 * a0 + 0.5 * a1,
        15.0 * x0 - 15.0 * x1 + 8.0 * v0 + 7.0 * v1 + 1.5 * a0 - a1,
        -6.0 * x0 + 6.0 * x1 - 3.0 * v0 - 3.0 * v1 - 0.5 * a0 + 0.5 * a1,
    ])
}

// ---------------------------------------------------------------------------
// Scalar root finding
// ---------------------------------------------------------------------------

/// Solve `f(x) = 0` on `[xmin, xmax]` by sign bisection (30 iterations).
///
/// Not fast, but very stable. Returns `None` when the interval does not
/// straddle a sign change.
pub fn solve_bisect<F: Fn(Scalar) -> Scalar>(f: F, xmin: Scalar, xmax: Scalar) -> Option<Scalar> {
    let mut lo = xmin;
    let mut hi = xmax;
    let smin = f(lo).signum();
    if f(lo) == 0.0 {
        return Some(lo);
    }
    if f(hi) == 0.0 {
        return Some(hi);
    }
    if smin == f(hi).signum() {
        log::debug!("solve_bisect: [{xmin}, {xmax}] does not straddle a solution");
        return None;
    }
    let mut x = lo;
    for _ in 0..30 {
        x = 0.5 * (lo + hi);
        let s = f(x).signum();
        if s == 0.0 {
            return Some(x);
        }
        if s == smin {
            lo = x;
        } else {
            hi = x;
        }
    }
    Some(x)
}

// ---------------------------------------------------------------------------
// Linear solvers
// ---------------------------------------------------------------------------

/// Solve the tridiagonal system `a[i] x[i-1] + b[i] x[i] + c[i] x[i+1] = d[i]`
/// by the Thomas algorithm, leaving the solution in `x`.
///
/// Destroys `b` and `d` in place; callers needing the originals must copy
/// first. A near-zero pivot reports [`SplineError::SingularSystem`] instead
/// of silently propagating infinities.
pub fn tridiag(
    a: &[Scalar],
    b: &mut [Scalar],
    c: &[Scalar],
    d: &mut [Scalar],
    x: &mut [Scalar],
) -> Result<(), SplineError> {
    let n = x.len();
    for i in 1..n {
        if b[i - 1].abs() < 1e-12 {
            return Err(SplineError::SingularSystem);
        }
        let m = a[i] / b[i - 1];
        b[i] -= m * c[i - 1];
        d[i] -= m * d[i - 1];
    }
    if b[n - 1].abs() < 1e-12 {
        return Err(SplineError::SingularSystem);
    }
    x[n - 1] = d[n - 1] / b[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = (d[i] - c[i] * x[i + 1]) / b[i];
    }
    Ok(())
}

/// Solve a 4x4 linear system by Gaussian elimination with partial pivoting.
///
/// Used for the Newton step of the prescribed-curvature spiral solve.
pub fn solve_4x4(m: [[Scalar; 4]; 4], rhs: [Scalar; 4]) -> Result<[Scalar; 4], SplineError> {
    let mut aug = [[0.0; 5]; 4];
    for i in 0..4 {
        aug[i][..4].copy_from_slice(&m[i]);
        aug[i][4] = rhs[i];
    }

    for col in 0..4 {
        let pivot_row = (col..4)
            .max_by(|&r0, &r1| {
                aug[r0][col]
                    .abs()
                    .partial_cmp(&aug[r1][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if aug[pivot_row][col].abs() < 1e-12 {
            return Err(SplineError::SingularSystem);
        }
        aug.swap(col, pivot_row);
        for row in (col + 1)..4 {
            let factor = aug[row][col] / aug[col][col];
            for k in col..5 {
                aug[row][k] -= factor * aug[col][k];
            }
        }
    }

    let mut x = [0.0; 4];
    for row in (0..4).rev() {
        let mut s = aug[row][4];
        for k in (row + 1)..4 {
            s -= aug[row][k] * x[k];
        }
        x[row] = s / aug[row][row];
    }
    Ok(x)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn mod2pi_wraps() {
        assert_abs_diff_eq!(mod2pi(0.0), 0.0);
        assert_abs_diff_eq!(mod2pi(2.0 * PI + 0.5), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(mod2pi(-2.0 * PI - 0.5), -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(mod2pi(3.0 * PI), -PI, epsilon = 1e-12);
        assert!(mod2pi(7.0).abs() <= PI);
    }

    #[test]
    fn polynomial_eval_and_deriv() {
        // 1 + 2x + 3x^2
        let p = Polynomial::new(vec![1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(p.eval(0.0), 1.0);
        assert_abs_diff_eq!(p.eval(2.0), 17.0);
        let d = p.deriv();
        assert_abs_diff_eq!(d.eval(2.0), 14.0);
    }

    #[test]
    fn hermite5_matches_boundary_conditions() {
        let p = hermite5(1.0, 2.0, -0.5, 0.25, 3.0, -1.0);
        let d = p.deriv();
        let d2 = d.deriv();
        assert_abs_diff_eq!(p.eval(0.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.eval(1.0), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d.eval(0.0), -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(d.eval(1.0), 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(d2.eval(0.0), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d2.eval(1.0), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn bisect_finds_root() {
        let x = solve_bisect(|x| x * x - 2.0, 0.0, 2.0).unwrap();
        assert_abs_diff_eq!(x, std::f64::consts::SQRT_2, epsilon = 1e-6);
    }

    #[test]
    fn bisect_rejects_non_bracketing_interval() {
        assert_eq!(solve_bisect(|x| x * x + 1.0, -1.0, 1.0), None);
    }

    #[test]
    fn tridiag_solves_diagonally_dominant_system() {
        // Deterministic pseudo-random diagonally dominant system.
        let n = 10;
        let mut seed = 0x1234_5678_u64;
        let mut rand = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed as Scalar) / (u64::MAX as Scalar)
        };
        let a: Vec<Scalar> = (0..n).map(|_| rand()).collect();
        let b0: Vec<Scalar> = (0..n).map(|_| 2.0 + rand()).collect();
        let c: Vec<Scalar> = (0..n).map(|_| rand()).collect();
        let d0: Vec<Scalar> = (0..n).map(|_| rand()).collect();

        let mut b = b0.clone();
        let mut d = d0.clone();
        let mut x = vec![0.0; n];
        tridiag(&a, &mut b, &c, &mut d, &mut x).unwrap();

        let mut resid = b0[0] * x[0] + c[0] * x[1] - d0[0];
        assert!(resid.abs() < 1e-9, "row 0 residual {resid}");
        for i in 1..n - 1 {
            resid = a[i] * x[i - 1] + b0[i] * x[i] + c[i] * x[i + 1] - d0[i];
            assert!(resid.abs() < 1e-9, "row {i} residual {resid}");
        }
        resid = a[n - 1] * x[n - 2] + b0[n - 1] * x[n - 1] - d0[n - 1];
        assert!(resid.abs() < 1e-9, "last row residual {resid}");
    }

    #[test]
    fn tridiag_reports_singular_pivot() {
        let a = [0.0, 1.0];
        let mut b = [0.0, 1.0];
        let c = [1.0, 0.0];
        let mut d = [1.0, 1.0];
        let mut x = [0.0, 0.0];
        assert_eq!(
            tridiag(&a, &mut b, &c, &mut d, &mut x),
            Err(SplineError::SingularSystem)
        );
    }

    #[test]
    fn solve_4x4_identity_and_permuted() {
        let m = [
            [0.0, 1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 3.0],
            [0.0, 0.0, 4.0, 0.0],
        ];
        let x = solve_4x4(m, [1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[2], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[3], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn solve_4x4_singular_is_reported() {
        let m = [
            [1.0, 2.0, 3.0, 4.0],
            [2.0, 4.0, 6.0, 8.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        assert_eq!(solve_4x4(m, [0.0; 4]), Err(SplineError::SingularSystem));
    }
}
