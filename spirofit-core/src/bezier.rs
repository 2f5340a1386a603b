//! Cubic Bezier segments and multi-segment paths.
//!
//! The solver renders every curve family into chains of cubics, so this
//! module carries the shared evaluation, differentiation and subdivision
//! machinery plus a small path container with SVG output.

use crate::types::{Point, Scalar, Vec2};

// ---------------------------------------------------------------------------
// CubicBez
// ---------------------------------------------------------------------------

/// Four control points of a cubic Bezier segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBez {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
}

impl CubicBez {
    /// Create a new cubic segment from four control points.
    #[must_use]
    pub const fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Create a segment from flat coordinates `[x0, y0, x1, y1, x2, y2, x3, y3]`.
    #[must_use]
    pub const fn from_coords(c: [Scalar; 8]) -> Self {
        Self {
            p0: Point::new(c[0], c[1]),
            p1: Point::new(c[2], c[3]),
            p2: Point::new(c[4], c[5]),
            p3: Point::new(c[6], c[7]),
        }
    }

    /// Weighted sum of the four control points.
    #[must_use]
    fn weight_sum(&self, c0: Scalar, c1: Scalar, c2: Scalar, c3: Scalar) -> Vec2 {
        Vec2::new(
            c3.mul_add(
                self.p3.x,
                c0.mul_add(self.p0.x, c1.mul_add(self.p1.x, c2 * self.p2.x)),
            ),
            c3.mul_add(
                self.p3.y,
                c0.mul_add(self.p0.y, c1.mul_add(self.p1.y, c2 * self.p2.y)),
            ),
        )
    }

    /// Evaluate the point at parameter `t` in [0, 1].
    #[must_use]
    pub fn eval(&self, t: Scalar) -> Point {
        let mt = 1.0 - t;
        let c0 = mt * mt * mt;
        let c1 = 3.0 * mt * mt * t;
        let c2 = 3.0 * mt * t * t;
        let c3 = t * t * t;
        self.weight_sum(c0, c1, c2, c3).to_point()
    }

    /// First derivative with respect to `t`.
    #[must_use]
    pub fn deriv(&self, t: Scalar) -> Vec2 {
        let mt = 1.0 - t;
        let c0 = -3.0 * mt * mt;
        let c3 = 3.0 * t * t;
        let c1 = (-6.0 * t).mul_add(mt, -c0);
        let c2 = (6.0 * t).mul_add(mt, -c3);
        self.weight_sum(c0, c1, c2, c3)
    }

    /// Second derivative with respect to `t`.
    #[must_use]
    pub fn deriv2(&self, t: Scalar) -> Vec2 {
        let mt = 1.0 - t;
        let c0 = 6.0 * mt;
        let c3 = 6.0 * t;
        let c1 = 18.0f64.mul_add(-mt, 6.0);
        let c2 = 18.0f64.mul_add(-t, 6.0);
        self.weight_sum(c0, c1, c2, c3)
    }

    /// Signed curvature at `t`. NaN at a cusp (zero derivative).
    #[must_use]
    pub fn curvature(&self, t: Scalar) -> Scalar {
        let d = self.deriv(t);
        let d2 = self.deriv2(t);
        d.cross(d2) / d.hypot().powi(3)
    }

    /// Arctangent of curvature at `t`.
    ///
    /// Robust at cusps where [`CubicBez::curvature`] overflows: the atan2
    /// form degrades gracefully to +-pi/2 instead of infinity, and keeps
    /// the quadrant of the cross product.
    #[must_use]
    pub fn atan_curvature(&self, t: Scalar) -> Scalar {
        let d = self.deriv(t);
        let d2 = self.deriv2(t);
        d.cross(d2).atan2(d.hypot().powi(3))
    }

    /// First half of the segment, by de Casteljau subdivision at t = 1/2.
    #[must_use]
    pub fn left_half(&self) -> Self {
        Self {
            p0: self.p0,
            p1: self.p0.midpoint(self.p1),
            p2: Point::new(
                0.25 * (self.p0.x + 2.0 * self.p1.x + self.p2.x),
                0.25 * (self.p0.y + 2.0 * self.p1.y + self.p2.y),
            ),
            p3: Point::new(
                0.125 * (self.p0.x + 3.0 * (self.p1.x + self.p2.x) + self.p3.x),
                0.125 * (self.p0.y + 3.0 * (self.p1.y + self.p2.y) + self.p3.y),
            ),
        }
    }

    /// Second half of the segment, by de Casteljau subdivision at t = 1/2.
    #[must_use]
    pub fn right_half(&self) -> Self {
        Self {
            p0: Point::new(
                0.125 * (self.p0.x + 3.0 * (self.p1.x + self.p2.x) + self.p3.x),
                0.125 * (self.p0.y + 3.0 * (self.p1.y + self.p2.y) + self.p3.y),
            ),
            p1: Point::new(
                0.25 * (self.p1.x + 2.0 * self.p2.x + self.p3.x),
                0.25 * (self.p1.y + 2.0 * self.p2.y + self.p3.y),
            ),
            p2: self.p2.midpoint(self.p3),
            p3: self.p3,
        }
    }
}

// ---------------------------------------------------------------------------
// BezPath
// ---------------------------------------------------------------------------

/// One element of a [`BezPath`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathEl {
    MoveTo(Point),
    LineTo(Point),
    CurveTo(Point, Point, Point),
    ClosePath,
    /// Tags the following elements with the index of the control point
    /// that generated them. Does not affect geometry.
    Mark(usize),
}

/// A multi-segment piecewise-cubic path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BezPath {
    els: Vec<PathEl>,
}

impl BezPath {
    #[must_use]
    pub const fn new() -> Self {
        Self { els: Vec::new() }
    }

    pub fn moveto(&mut self, p: Point) {
        self.els.push(PathEl::MoveTo(p));
    }

    pub fn lineto(&mut self, p: Point) {
        self.els.push(PathEl::LineTo(p));
    }

    pub fn curveto(&mut self, p1: Point, p2: Point, p3: Point) {
        self.els.push(PathEl::CurveTo(p1, p2, p3));
    }

    pub fn closepath(&mut self) {
        self.els.push(PathEl::ClosePath);
    }

    pub fn mark(&mut self, i: usize) {
        self.els.push(PathEl::Mark(i));
    }

    /// Elements in order.
    #[must_use]
    pub fn elements(&self) -> &[PathEl] {
        &self.els
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.els.is_empty()
    }

    /// Serialize to an SVG path `d` attribute, rounding coordinates to
    /// `precision` decimal places.
    #[must_use]
    pub fn to_svg_path(&self, precision: usize) -> String {
        use std::fmt::Write;
        let fmt = |x: Scalar| {
            let mut s = format!("{x:.precision$}");
            if s.contains('.') {
                while s.ends_with('0') {
                    s.pop();
                }
                if s.ends_with('.') {
                    s.pop();
                }
            }
            if s == "-0" {
                s = "0".to_string();
            }
            s
        };
        let mut d = String::new();
        for el in &self.els {
            // Mark elements carry no geometry.
            match el {
                PathEl::MoveTo(p) => {
                    let _ = write!(d, "M{} {}", fmt(p.x), fmt(p.y));
                }
                PathEl::LineTo(p) => {
                    let _ = write!(d, "L{} {}", fmt(p.x), fmt(p.y));
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    let _ = write!(
                        d,
                        "C{} {} {} {} {} {}",
                        fmt(p1.x),
                        fmt(p1.y),
                        fmt(p2.x),
                        fmt(p2.y),
                        fmt(p3.x),
                        fmt(p3.y)
                    );
                }
                PathEl::ClosePath => d.push('Z'),
                PathEl::Mark(_) => {}
            }
        }
        d
    }

    /// Control-point-hull bounding box: `(min, max)`. `None` for a path
    /// with no geometry.
    #[must_use]
    pub fn bbox(&self) -> Option<(Point, Point)> {
        let mut min = Point::new(Scalar::INFINITY, Scalar::INFINITY);
        let mut max = Point::new(Scalar::NEG_INFINITY, Scalar::NEG_INFINITY);
        let mut any = false;
        let mut accum = |p: &Point| {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            any = true;
        };
        for el in &self.els {
            match el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) => accum(p),
                PathEl::CurveTo(p1, p2, p3) => {
                    accum(p1);
                    accum(p2);
                    accum(p3);
                }
                PathEl::ClosePath | PathEl::Mark(_) => {}
            }
        }
        any.then_some((min, max))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
