use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TestDir {
    path: PathBuf,
}

impl TestDir {
    fn new(tag: &str) -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let path =
            std::env::temp_dir().join(format!("spirofit_cli_{tag}_{}_{}", std::process::id(), ts));
        fs::create_dir_all(&path).expect("create temp test dir");
        Self { path }
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_spirofit(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_spirofit"))
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("run spirofit")
}

const ARC_INPUT: &str = r#"{
    "points": [
        { "x": 0, "y": 0 },
        { "x": 50, "y": 30 },
        { "x": 100, "y": 0 }
    ]
}"#;

#[test]
fn solves_and_writes_svg_next_to_input() {
    let dir = TestDir::new("default_out");
    fs::write(dir.path.join("arc.json"), ARC_INPUT).expect("write input");

    let output = run_spirofit(&["arc.json"], &dir.path);
    assert!(output.status.success(), "process failed: {output:?}");

    let svg_path = dir.path.join("arc.svg");
    assert!(svg_path.is_file(), "expected output file at {svg_path:?}");
    let svg = fs::read_to_string(svg_path).expect("read svg output");
    assert!(svg.contains("<svg"), "expected svg root element");
    assert!(svg.contains("<path"), "expected rendered path element");
    assert!(svg.contains('C'), "expected curve segments in path data");
}

#[test]
fn output_flag_and_show_points() {
    let dir = TestDir::new("out_flag");
    fs::write(dir.path.join("arc.json"), ARC_INPUT).expect("write input");

    let output = run_spirofit(
        &["arc.json", "-o", "custom.svg", "--show-points"],
        &dir.path,
    );
    assert!(output.status.success(), "process failed: {output:?}");

    let svg = fs::read_to_string(dir.path.join("custom.svg")).expect("read svg output");
    assert!(svg.contains("<circle"), "expected knot markers");
}

#[test]
fn all_families_solve_the_same_input() {
    let dir = TestDir::new("families");
    fs::write(dir.path.join("arc.json"), ARC_INPUT).expect("write input");

    for family in ["mycurve", "spiro", "biparabola"] {
        let out = format!("{family}.svg");
        let output = run_spirofit(&["arc.json", "--family", family, "-o", &out], &dir.path);
        assert!(output.status.success(), "family {family} failed: {output:?}");
        let svg = fs::read_to_string(dir.path.join(&out)).expect("read svg output");
        assert!(svg.contains("<path"), "family {family}: no path element");
    }
}

#[test]
fn corner_and_closed_input() {
    let dir = TestDir::new("closed");
    let input = r#"{
        "closed": true,
        "points": [
            { "x": 0, "y": 0, "ty": "corner" },
            { "x": 100, "y": 0 },
            { "x": 50, "y": 80 }
        ]
    }"#;
    fs::write(dir.path.join("tri.json"), input).expect("write input");

    let output = run_spirofit(&["tri.json"], &dir.path);
    assert!(output.status.success(), "process failed: {output:?}");

    let svg = fs::read_to_string(dir.path.join("tri.svg")).expect("read svg output");
    assert!(svg.contains('Z'), "expected closed path data");
}

#[test]
fn rejects_closed_two_point_input() {
    let dir = TestDir::new("closed_two");
    let input = r#"{
        "closed": true,
        "points": [ { "x": 0, "y": 0 }, { "x": 10, "y": 0 } ]
    }"#;
    fs::write(dir.path.join("bad.json"), input).expect("write input");

    let output = run_spirofit(&["bad.json"], &dir.path);
    assert!(!output.status.success(), "expected failure");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("at least 3 points"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn rejects_malformed_json() {
    let dir = TestDir::new("bad_json");
    fs::write(dir.path.join("bad.json"), "{ not json").expect("write input");

    let output = run_spirofit(&["bad.json"], &dir.path);
    assert!(!output.status.success(), "expected failure");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Error parsing"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn curvature_map_prints_sample_grid() {
    let dir = TestDir::new("kmap");
    let output = run_spirofit(&["--curvature-map", "4"], &dir.path);
    assert!(output.status.success(), "process failed: {output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 16, "expected a 4 x 4 sample grid, got: {stdout}");
    for line in lines {
        assert_eq!(
            line.split_whitespace().count(),
            3,
            "expected th0 th1 k triples, got: {line}"
        );
    }
}
