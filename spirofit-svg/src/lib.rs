//! SVG renderer for solved spline paths.
//!
//! Converts a [`BezPath`] into an SVG [`Document`] using the `svg` crate.
//! The `viewBox` is derived from the path's control-point bounding box with
//! a small margin, so the output is self-framing. Path data is built from
//! [`BezPath::to_svg_path`], which preserves `f64` precision (the `svg`
//! crate's `Data` builder uses `f32`).

use spirofit_core::{BezPath, PathEl, Point, Scalar};
use svg::Document;
use svg::node::element::Circle;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render a [`BezPath`] to an SVG [`Document`] with default options.
#[must_use]
pub fn render(path: &BezPath) -> Document {
    render_with_options(path, &RenderOptions::default())
}

/// Render a [`BezPath`] to an SVG string.
#[must_use]
pub fn render_to_string(path: &BezPath) -> String {
    render(path).to_string()
}

/// Options controlling SVG output.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Extra margin around the bounding box. Default: 5.0.
    pub margin: Scalar,
    /// Number of decimal places for coordinates. Default: 4.
    pub precision: usize,
    /// Stroke width of the curve. Default: 1.0.
    pub stroke_width: Scalar,
    /// Draw a circle marker at each on-curve knot. Default: false.
    pub show_points: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            margin: 5.0,
            precision: 4,
            stroke_width: 1.0,
            show_points: false,
        }
    }
}

/// Render a [`BezPath`] to an SVG [`Document`] with custom options.
#[must_use]
pub fn render_with_options(path: &BezPath, opts: &RenderOptions) -> Document {
    let d = path.to_svg_path(opts.precision);
    let stroke = svg::node::element::Path::new()
        .set("d", d)
        .set("fill", "none")
        .set("stroke", "black")
        .set("stroke-width", fmt_scalar(opts.stroke_width, opts.precision));

    let mut doc = build_document(path, opts).add(stroke);

    if opts.show_points {
        let r = 2.0 * opts.stroke_width;
        for p in on_curve_points(path) {
            doc = doc.add(
                Circle::new()
                    .set("cx", fmt_scalar(p.x, opts.precision))
                    .set("cy", fmt_scalar(p.y, opts.precision))
                    .set("r", fmt_scalar(r, opts.precision))
                    .set("fill", "#c00"),
            );
        }
    }

    doc
}

// ---------------------------------------------------------------------------
// Document assembly
// ---------------------------------------------------------------------------

/// Build the document shell with a `viewBox` from the path's bounding box.
///
/// A path without coordinates (empty, or `ClosePath`/marks only) gets a
/// fallback `0 0 100 100` box.
fn build_document(path: &BezPath, opts: &RenderOptions) -> Document {
    let m = opts.margin;

    let (vb_x, vb_y, vb_w, vb_h) = if let Some((min, max)) = path.bbox() {
        (
            min.x - m,
            min.y - m,
            2.0f64.mul_add(m, max.x - min.x),
            2.0f64.mul_add(m, max.y - min.y),
        )
    } else {
        (0.0, 0.0, 100.0, 100.0)
    };

    Document::new()
        .set("xmlns", "http://www.w3.org/2000/svg")
        .set(
            "viewBox",
            format!(
                "{} {} {} {}",
                fmt_scalar(vb_x, opts.precision),
                fmt_scalar(vb_y, opts.precision),
                fmt_scalar(vb_w, opts.precision),
                fmt_scalar(vb_h, opts.precision),
            ),
        )
        .set("width", format!("{}pt", fmt_scalar(vb_w, opts.precision)))
        .set("height", format!("{}pt", fmt_scalar(vb_h, opts.precision)))
}

/// On-curve points of a path: subpath starts plus segment endpoints.
fn on_curve_points(path: &BezPath) -> Vec<Point> {
    path.elements()
        .iter()
        .filter_map(|el| match el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) | PathEl::CurveTo(_, _, p) => Some(*p),
            PathEl::ClosePath | PathEl::Mark(_) => None,
        })
        .collect()
}

/// Format a scalar to the given precision, stripping trailing zeros.
fn fmt_scalar(v: Scalar, precision: usize) -> String {
    let s = format!("{v:.precision$}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        trimmed.to_owned()
    } else {
        s
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_curve() -> BezPath {
        let mut path = BezPath::default();
        path.moveto(Point::new(0.0, 0.0));
        path.curveto(
            Point::new(10.0, 0.0),
            Point::new(20.0, 10.0),
            Point::new(30.0, 10.0),
        );
        path
    }

    #[test]
    fn test_document_framing() {
        let doc = render(&make_curve()).to_string();
        // bbox (0,0)..(30,10) plus the default margin of 5 on each side
        assert!(doc.contains(r#"viewBox="-5 -5 40 20""#), "{doc}");
        assert!(doc.contains(r#"width="40pt""#), "{doc}");
        assert!(doc.contains(r#"height="20pt""#), "{doc}");
    }

    #[test]
    fn test_path_element() {
        let doc = render(&make_curve()).to_string();
        assert!(doc.contains(r#"d="M0 0C10 0 20 10 30 10""#), "{doc}");
        assert!(doc.contains(r#"fill="none""#), "{doc}");
        assert!(doc.contains(r#"stroke="black""#), "{doc}");
    }

    #[test]
    fn test_empty_path_fallback_viewbox() {
        let doc = render(&BezPath::default()).to_string();
        assert!(doc.contains(r#"viewBox="0 0 100 100""#), "{doc}");
    }

    #[test]
    fn test_show_points_markers() {
        let opts = RenderOptions {
            show_points: true,
            ..RenderOptions::default()
        };
        let doc = render_with_options(&make_curve(), &opts).to_string();
        assert!(doc.contains("<circle"), "{doc}");
        assert!(doc.contains(r#"cx="30""#), "{doc}");
        assert!(doc.contains(r#"cy="10""#), "{doc}");
    }

    #[test]
    fn test_no_markers_by_default() {
        let doc = render(&make_curve()).to_string();
        assert!(!doc.contains("<circle"), "{doc}");
    }

    #[test]
    fn test_custom_margin_and_width() {
        let opts = RenderOptions {
            margin: 0.0,
            stroke_width: 0.5,
            ..RenderOptions::default()
        };
        let doc = render_with_options(&make_curve(), &opts).to_string();
        assert!(doc.contains(r#"viewBox="0 0 30 10""#), "{doc}");
        assert!(doc.contains(r#"stroke-width="0.5""#), "{doc}");
    }

    #[test]
    fn test_fmt_scalar_strips_zeros() {
        assert_eq!(fmt_scalar(1.5, 4), "1.5");
        assert_eq!(fmt_scalar(2.0, 4), "2");
        assert_eq!(fmt_scalar(-0.125, 4), "-0.125");
        assert_eq!(fmt_scalar(3.0, 0), "3");
    }
}
