//! End-to-end slicing of cross-sections into G-code.

use step_slicer::{BoundaryLoop, CrossSection, CurveSegment, LayerPipeline, PrintConfig};

fn square(x: f64, y: f64, size: f64) -> BoundaryLoop {
    BoundaryLoop::polygon(&[(x, y), (x + size, y), (x + size, y + size), (x, y + size)])
}

fn circle(cx: f64, cy: f64, r: f64) -> BoundaryLoop {
    BoundaryLoop::new(vec![CurveSegment::arc(
        (cx + r, cy),
        (cx, cy),
        2.0 * std::f64::consts::PI,
    )])
}

fn word(line: &str, axis: char) -> Option<f64> {
    line.split_whitespace()
        .skip(1)
        .find(|w| w.starts_with(axis))
        .and_then(|w| w[1..].parse().ok())
}

/// Lines between a `;TYPE:` label and the next label or layer change.
fn feature_lines<'a>(gcode: &'a str, label: &str) -> Vec<&'a str> {
    let mut lines = Vec::new();
    let mut inside = false;
    for line in gcode.lines() {
        if line.starts_with(";TYPE:") || line.starts_with(";LAYER:") {
            inside = line == label;
            continue;
        }
        if inside {
            lines.push(line);
        }
    }
    lines
}

/// XY moves, excluding the postamble's move to the front of the bed.
fn toolpath_lines(gcode: &str) -> Vec<&str> {
    gcode
        .lines()
        .filter(|l| (l.starts_with("G1 X") || l.starts_with("G0 X")) && !l.contains(" Y300."))
        .collect()
}

#[test]
fn test_square_with_hole() {
    let config = PrintConfig::default();
    let section = CrossSection::new(0.2, 0.2, square(20.0, 20.0, 40.0))
        .with_island(BoundaryLoop::polygon(&[
            (35.0, 35.0),
            (35.0, 45.0),
            (45.0, 45.0),
            (45.0, 35.0),
        ]));
    let gcode = LayerPipeline::new(config).process(&[section]).unwrap();

    assert!(gcode.contains(";TYPE:WALL-OUTER"));
    assert!(gcode.contains(";TYPE:WALL-INNER"));
    assert!(gcode.contains(";TYPE:FILL"));

    // Every toolpath stays on the part.
    for line in toolpath_lines(&gcode) {
        let x = word(line, 'X').unwrap();
        let y = word(line, 'Y').unwrap();
        assert!(x > 20.0 && x < 60.0, "x out of part: {}", line);
        assert!(y > 20.0 && y < 60.0, "y out of part: {}", line);
    }

    // Infill never crosses the hole.
    let mut position = (0.0, 0.0);
    for line in feature_lines(&gcode, ";TYPE:FILL") {
        let (Some(x), Some(y)) = (word(line, 'X'), word(line, 'Y')) else {
            continue;
        };
        if line.starts_with("G1") {
            let mid = ((position.0 + x) * 0.5, (position.1 + y) * 0.5);
            let in_hole = mid.0 > 35.0 && mid.0 < 45.0 && mid.1 > 35.0 && mid.1 < 45.0;
            assert!(!in_hole, "infill crosses the hole at {:?}", mid);
        }
        position = (x, y);
    }
}

#[test]
fn test_extrusion_resets_per_polyline() {
    let config = PrintConfig::default();
    let section = CrossSection::new(0.2, 0.2, square(10.0, 10.0, 30.0));
    let gcode = LayerPipeline::new(config).process(&[section]).unwrap();

    let travels = gcode.lines().filter(|l| l.starts_with("G0 X")).count();
    // the preamble's reset carries a trailing comment
    let resets = gcode.lines().filter(|l| l.starts_with("G92 E0")).count();
    assert_eq!(resets, travels + 1);

    let mut last_e: Option<f64> = None;
    for line in gcode.lines() {
        if line.starts_with("G92 E0") {
            last_e = Some(0.0);
        } else if let Some(e) = word(line, 'E') {
            let previous = last_e.expect("extrusion before reset");
            assert!(e >= previous, "extrusion went backwards: {}", line);
            last_e = Some(e);
        }
    }
}

#[test]
fn test_circle_section() {
    let config = PrintConfig::default().num_shells(2);
    let section = CrossSection::new(0.2, 0.2, circle(100.0, 100.0, 15.0));
    let pipeline = LayerPipeline::new(config);

    let slices = pipeline.slice_sections(std::slice::from_ref(&section)).unwrap();
    assert_eq!(slices[0].shells().len(), 2);
    assert_eq!(slices[0].innermost().len(), 1);

    for line in toolpath_lines(&pipeline.process(&[section]).unwrap()) {
        let x = word(line, 'X').unwrap();
        let y = word(line, 'Y').unwrap();
        let r = (x - 100.0).hypot(y - 100.0);
        assert!(r < 15.0 + 1e-3, "point outside circle: {}", line);
    }
}

#[test]
fn test_same_height_faces_share_a_layer() {
    let config = PrintConfig::default();
    let sections = vec![
        CrossSection::new(0.4, 0.2, square(100.0, 10.0, 20.0)),
        CrossSection::new(0.2, 0.2, square(10.0, 10.0, 20.0)),
        CrossSection::new(0.2, 0.2, square(50.0, 10.0, 20.0)),
    ];
    let gcode = LayerPipeline::new(config).process(&sections).unwrap();

    assert_eq!(gcode.matches(";LAYER:").count(), 2);
    assert!(gcode.contains(";LAYER_COUNT:2"));
    let z_moves: Vec<&str> = gcode.lines().filter(|l| l.starts_with("G0 Z")).collect();
    assert_eq!(z_moves, vec!["G0 Z0.200000 F5000", "G0 Z0.400000 F5000"]);
    assert_eq!(gcode.matches(";TYPE:WALL-OUTER").count(), 3);
}

#[test]
fn test_empty_job() {
    let gcode = LayerPipeline::new(PrintConfig::default()).process(&[]).unwrap();
    assert!(gcode.is_empty());
}

#[test]
fn test_output_cap() {
    let config = PrintConfig::default().max_gcode_bytes(2_000);
    let sections = vec![CrossSection::new(0.2, 0.2, square(10.0, 10.0, 50.0))];
    let err = LayerPipeline::new(config).process(&sections).unwrap_err();
    assert!(matches!(err, step_slicer::Error::ResourceExceeded(_)));
}

#[test]
fn test_sections_from_json() {
    let json = r#"[
        {
            "z": 0.2,
            "thickness": 0.2,
            "outer": { "segments": [
                { "curve": { "type": "line" }, "start": [0, 0], "end": [20, 0] },
                { "curve": { "type": "line" }, "start": [20, 0], "end": [20, 20] },
                { "curve": { "type": "arc", "center": [10, 20], "sweep": 3.141592653589793 },
                  "start": [20, 20], "end": [0, 20] },
                { "curve": { "type": "line" }, "start": [0, 20], "end": [0, 0] }
            ] }
        }
    ]"#;
    let sections: Vec<CrossSection> = serde_json::from_str(json).unwrap();
    let gcode = LayerPipeline::new(PrintConfig::default()).process(&sections).unwrap();
    assert!(gcode.contains(";LAYER:0\nG0 Z0.200000 F5000\n"));
    assert!(gcode.contains(";TYPE:WALL-OUTER"));
}
