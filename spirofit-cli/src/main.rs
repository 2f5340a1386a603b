//! Spline solver CLI: read a JSON control-point list, solve, write SVG.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde::Deserialize;

use spirofit_core::family::curvature_map;
use spirofit_core::{
    BiParabola, ControlPoint, MyCurve, Point, PointType, Scalar, Spline, SplineError, SpiroCurve,
    TwoParamCurve,
};
use spirofit_svg::RenderOptions;

#[derive(Parser)]
#[command(version, about = "Curvature-continuous spline solver")]
struct Cli {
    /// Input JSON file describing the spline
    file: Option<String>,

    /// Output SVG file (default: input file with .svg extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Curve family: "mycurve", "spiro" or "biparabola"
    #[arg(long, default_value = "mycurve", value_parser = parse_family)]
    family: Family,

    /// Draw a marker at each on-curve point
    #[arg(long)]
    show_points: bool,

    /// Number of decimal places for SVG coordinates
    #[arg(long, default_value_t = 4)]
    precision: usize,

    /// Print an N x N curvature sample grid for the selected family
    /// to stdout instead of solving
    #[arg(long, value_name = "N")]
    curvature_map: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
enum Family {
    MyCurve,
    Spiro,
    BiParabola,
}

fn parse_family(s: &str) -> Result<Family, String> {
    match s.to_lowercase().as_str() {
        "mycurve" => Ok(Family::MyCurve),
        "spiro" => Ok(Family::Spiro),
        "biparabola" => Ok(Family::BiParabola),
        _ => Err(format!(
            "unknown family \"{s}\": expected \"mycurve\", \"spiro\" or \"biparabola\""
        )),
    }
}

// ---------------------------------------------------------------------------
// Input format
// ---------------------------------------------------------------------------

/// Top-level input document: a point list plus a closed flag.
#[derive(Deserialize)]
struct InputSpline {
    #[serde(default)]
    closed: bool,
    points: Vec<InputPoint>,
}

/// One control point. `lth`/`rth` are optional explicit tangent angles
/// (radians) on the incoming and outgoing side.
#[derive(Deserialize)]
struct InputPoint {
    x: Scalar,
    y: Scalar,
    #[serde(default)]
    ty: InputPointType,
    #[serde(default)]
    lth: Option<Scalar>,
    #[serde(default)]
    rth: Option<Scalar>,
}

#[derive(Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
enum InputPointType {
    #[default]
    Smooth,
    Corner,
}

fn control_points(input: &InputSpline) -> Vec<ControlPoint> {
    input
        .points
        .iter()
        .map(|p| {
            let ty = match p.ty {
                InputPointType::Smooth => PointType::Smooth,
                InputPointType::Corner => PointType::Corner,
            };
            ControlPoint::new(Point::new(p.x, p.y), ty, p.lth, p.rth)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(n) = cli.curvature_map {
        print_curvature_map(cli.family, n);
        return;
    }

    let Some(ref file) = cli.file else {
        eprintln!("No input file specified");
        process::exit(1);
    };

    let source = match fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {file}: {e}");
            process::exit(1);
        }
    };

    let input: InputSpline = match serde_json::from_str(&source) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error parsing {file}: {e}");
            process::exit(1);
        }
    };

    if input.closed && input.points.len() < 3 {
        eprintln!("Error: a closed spline needs at least 3 points");
        process::exit(1);
    }

    let opts = RenderOptions {
        precision: cli.precision,
        show_points: cli.show_points,
        ..RenderOptions::default()
    };

    let pts = control_points(&input);
    let result = match cli.family {
        Family::MyCurve => solve_and_render(&MyCurve, pts, input.closed, &opts),
        Family::Spiro => solve_and_render(&SpiroCurve, pts, input.closed, &opts),
        Family::BiParabola => solve_and_render(&BiParabola, pts, input.closed, &opts),
    };

    let svg = match result {
        Ok(svg) => svg,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let out_path = cli
        .output
        .unwrap_or_else(|| Path::new(file).with_extension("svg"));
    match fs::write(&out_path, svg) {
        Ok(()) => {
            eprintln!("Wrote {}", out_path.display());
        }
        Err(e) => {
            eprintln!("Error writing {}: {e}", out_path.display());
            process::exit(1);
        }
    }
}

/// Solve the spline with the given curve family and render it to an SVG
/// document string.
fn solve_and_render<C: TwoParamCurve>(
    curve: &C,
    pts: Vec<ControlPoint>,
    closed: bool,
    opts: &RenderOptions,
) -> Result<String, SplineError> {
    let mut spline = Spline::new(curve, pts, closed);
    spline.solve()?;
    spline.compute_curvature_blending();
    let path = spline.render()?;
    Ok(spirofit_svg::render_with_options(&path, opts).to_string())
}

/// Dump a gnuplot-style `th0 th1 k` sample grid for the family.
fn print_curvature_map(family: Family, n: usize) {
    let samples = match family {
        Family::MyCurve => curvature_map(&MyCurve, n),
        Family::Spiro => curvature_map(&SpiroCurve, n),
        Family::BiParabola => curvature_map(&BiParabola, n),
    };
    match samples {
        Ok(samples) => {
            for (th0, th1, k) in samples {
                println!("{th0} {th1} {k}");
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
