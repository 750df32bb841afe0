//! Toolpath serialization.
//!
//! Each polyline is printed as one continuous extrusion: a travel move to its
//! start, an extruder reset, then one G1/G2/G3 move per edge. The extrusion
//! value is absolute within the polyline and restarts at zero for the next.
//!
//! With retraction enabled, a travel longer than `retract_before_travel`
//! pulls the filament back before moving and primes it again on arrival.

use super::GCodeCommand;
use crate::config::PrintConfig;
use crate::geometry::{Polyline, Segment};
use crate::slice::Slice;
use crate::CoordF;
use std::fmt;

/// Feature label emitted before a group of toolpaths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureType {
    OuterWall,
    InnerWall,
    Fill,
}

impl FeatureType {
    pub fn for_depth(depth: usize) -> Self {
        if depth == 0 {
            FeatureType::OuterWall
        } else {
            FeatureType::InnerWall
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::OuterWall => "WALL-OUTER",
            FeatureType::InnerWall => "WALL-INNER",
            FeatureType::Fill => "FILL",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulates G-code text for toolpaths.
#[derive(Debug, Clone)]
pub struct ToolpathWriter {
    output: String,
    /// Filament fed since the start of the current polyline.
    extrusion: CoordF,
    extrusion_ratio: CoordF,
    print_feedrate: CoordF,
    travel_feedrate: CoordF,
    retract_length: CoordF,
    /// mm/min
    retract_feedrate: CoordF,
    retract_before_travel: CoordF,
    /// Nozzle position after the last move, if any.
    position: Option<(CoordF, CoordF)>,
}

impl ToolpathWriter {
    pub fn new(config: &PrintConfig) -> Self {
        Self {
            output: String::new(),
            extrusion: 0.0,
            extrusion_ratio: config.extrusion_ratio(),
            print_feedrate: config.print_feedrate,
            travel_feedrate: config.travel_feedrate,
            retract_length: config.retract_length,
            retract_feedrate: config.retract_speed * 60.0,
            retract_before_travel: config.retract_before_travel,
            position: None,
        }
    }

    /// Builder method: override the extrusion ratio.
    pub fn with_extrusion_ratio(mut self, ratio: CoordF) -> Self {
        self.extrusion_ratio = ratio;
        self
    }

    /// Filament length fed per millimetre of path.
    pub fn extrusion_ratio(&self) -> CoordF {
        self.extrusion_ratio
    }

    /// Extrusion value of the last emitted move.
    pub fn extrusion(&self) -> CoordF {
        self.extrusion
    }

    pub fn write(&mut self, command: &GCodeCommand) {
        self.output.push_str(&command.to_gcode());
        self.output.push('\n');
    }

    pub fn write_feature(&mut self, feature: FeatureType) {
        self.write(&GCodeCommand::Marker(format!("TYPE:{}", feature)));
    }

    /// Print a polyline as one continuous extrusion.
    ///
    /// A closed polyline starts and ends at its last vertex
    /// (last → first → … → last); an open one runs first → last.
    pub fn add_polyline(&mut self, polyline: &Polyline) {
        let Some(start) = (if polyline.is_closed() {
            polyline.last()
        } else {
            polyline.first()
        }) else {
            return;
        };

        let retracted = self.needs_retract(start.point());
        if retracted {
            self.retract(-self.retract_length);
        }
        self.write(&GCodeCommand::RapidMove {
            x: Some(start.x),
            y: Some(start.y),
            z: None,
            f: Some(self.travel_feedrate),
        });
        if retracted {
            self.write(&self.filament_move(self.retract_length));
        }
        self.position = Some(start.point());
        self.extrusion = 0.0;
        self.write(&GCodeCommand::SetExtruderPosition { e: 0.0 });

        let count = polyline.segment_count();
        let segments: Vec<Segment> = polyline.segments().collect();
        if polyline.is_closed() && count > 0 {
            // The closing edge (last → first) goes first.
            self.add_segment(&segments[count - 1]);
            for segment in &segments[..count - 1] {
                self.add_segment(segment);
            }
        } else {
            for segment in &segments {
                self.add_segment(segment);
            }
        }
    }

    fn needs_retract(&self, target: (CoordF, CoordF)) -> bool {
        if !(self.retract_length > 0.0) {
            return false;
        }
        match self.position {
            Some((x, y)) => (target.0 - x).hypot(target.1 - y) >= self.retract_before_travel,
            None => false,
        }
    }

    fn filament_move(&self, e: CoordF) -> GCodeCommand {
        GCodeCommand::LinearMove {
            x: None,
            y: None,
            e: Some(e),
            f: Some(self.retract_feedrate),
        }
    }

    /// Move the filament by `distance` between two extruder resets.
    pub fn retract(&mut self, distance: CoordF) {
        self.write(&GCodeCommand::SetExtruderPosition { e: 0.0 });
        self.write(&self.filament_move(distance));
        self.write(&GCodeCommand::SetExtruderPosition { e: 0.0 });
        self.extrusion = 0.0;
    }

    fn add_segment(&mut self, segment: &Segment) {
        let (x, y) = segment.end;
        self.position = Some(segment.end);
        match segment.arc() {
            Some(arc) => {
                self.extrusion += arc.length() * self.extrusion_ratio;
                let i = arc.center.0 - segment.start.0;
                let j = arc.center.1 - segment.start.1;
                let e = Some(self.extrusion);
                let f = Some(self.print_feedrate);
                let command = if segment.bulge > 0.0 {
                    GCodeCommand::ArcCCW { x, y, i, j, e, f }
                } else {
                    GCodeCommand::ArcCW { x, y, i, j, e, f }
                };
                self.write(&command);
            }
            None => {
                let (sx, sy) = segment.start;
                self.extrusion += (x - sx).hypot(y - sy) * self.extrusion_ratio;
                self.write(&GCodeCommand::LinearMove {
                    x: Some(x),
                    y: Some(y),
                    e: Some(self.extrusion),
                    f: Some(self.print_feedrate),
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.output
    }

    pub fn finish(self) -> String {
        self.output
    }
}

/// Serialize one slice: shells outer to inner, then infill.
///
/// Extrusion is metered for the slice's own thickness.
pub fn serialize_slice(slice: &Slice, config: &PrintConfig) -> String {
    let mut writer = ToolpathWriter::new(config)
        .with_extrusion_ratio(config.extrusion_ratio_for(slice.thickness()));

    let mut current = None;
    for shell in slice.shells() {
        let feature = FeatureType::for_depth(shell.depth);
        if current != Some(feature) {
            writer.write_feature(feature);
            current = Some(feature);
        }
        for polyline in shell.loops() {
            writer.add_polyline(polyline);
        }
    }

    if !slice.infill().is_empty() {
        writer.write_feature(FeatureType::Fill);
        for polyline in slice.infill() {
            writer.add_polyline(polyline);
        }
    }

    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vertex2D;
    use crate::perimeter::{generate_shells, ShellSet};

    fn e_values(gcode: &str) -> Vec<Vec<f64>> {
        // One list of E values per polyline, split at each extruder reset.
        let mut result: Vec<Vec<f64>> = Vec::new();
        for line in gcode.lines() {
            if line.starts_with("G92 E0") {
                result.push(Vec::new());
            } else if let Some(pos) = line.find(" E") {
                let value: f64 = line[pos + 2..]
                    .split_whitespace()
                    .next()
                    .unwrap()
                    .parse()
                    .unwrap();
                result.last_mut().unwrap().push(value);
            }
        }
        result
    }

    fn square(size: f64) -> Polyline {
        Polyline::from_points(
            &[(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)],
            true,
        )
    }

    #[test]
    fn test_closed_polyline_starts_at_last_vertex() {
        let config = PrintConfig::default();
        let mut writer = ToolpathWriter::new(&config);
        writer.add_polyline(&square(10.0));
        let gcode = writer.finish();
        let lines: Vec<&str> = gcode.lines().collect();

        assert_eq!(lines[0], "G0 X0.000000 Y10.000000 F5000");
        assert_eq!(lines[1], "G92 E0");
        assert!(lines[2].starts_with("G1 X0.000000 Y0.000000 E"));
        assert!(lines[3].starts_with("G1 X10.000000 Y0.000000 E"));
        assert!(lines[5].starts_with("G1 X0.000000 Y10.000000 E"));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_open_polyline_runs_first_to_last() {
        let config = PrintConfig::default();
        let mut writer = ToolpathWriter::new(&config);
        writer.add_polyline(&Polyline::from_points(&[(1.0, 1.0), (4.0, 5.0)], false));
        let gcode = writer.finish();
        let lines: Vec<&str> = gcode.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("G0 X1.000000 Y1.000000"));

        let ratio = config.extrusion_ratio();
        let expected = format!("G1 X4.000000 Y5.000000 E{:.6} F1800", 5.0 * ratio);
        assert_eq!(lines[2], expected);
    }

    #[test]
    fn test_empty_polyline_writes_nothing() {
        let mut writer = ToolpathWriter::new(&PrintConfig::default());
        writer.add_polyline(&Polyline::new(true));
        assert!(writer.is_empty());
    }

    #[test]
    fn test_arc_commands() {
        let config = PrintConfig::default();
        let mut writer = ToolpathWriter::new(&config);
        let circle = Polyline::from_vertices(
            vec![Vertex2D::new(1.0, 0.0, 1.0), Vertex2D::new(-1.0, 0.0, 1.0)],
            true,
        );
        writer.add_polyline(&circle);
        let total = writer.extrusion();
        let gcode = writer.finish();
        let lines: Vec<&str> = gcode.lines().collect();

        // Starts at (-1, 0); first half turn ends at (1, 0) with center offset (1, 0).
        assert_eq!(lines[0], "G0 X-1.000000 Y0.000000 F5000");
        assert!(lines[2].starts_with("G3 X1.000000 Y0.000000 I1.000000 J0.000000 E"));
        assert!(lines[3].starts_with("G3 X-1.000000 Y0.000000 I-1.000000 J0.000000 E"));

        let expected = 2.0 * std::f64::consts::PI * config.extrusion_ratio();
        assert!((total - expected).abs() < 1e-9);
    }

    #[test]
    fn test_clockwise_arc() {
        let mut writer = ToolpathWriter::new(&PrintConfig::default());
        let arc = Polyline::from_vertices(
            vec![Vertex2D::new(1.0, 0.0, -1.0), Vertex2D::straight(-1.0, 0.0)],
            false,
        );
        writer.add_polyline(&arc);
        assert!(writer.as_str().lines().nth(2).unwrap().starts_with("G2 "));
    }

    #[test]
    fn test_extrusion_monotonic_and_resets() {
        let config = PrintConfig::default();
        let mut writer = ToolpathWriter::new(&config);
        writer.add_polyline(&square(10.0));
        writer.add_polyline(&square(5.0));
        let runs = e_values(writer.as_str());
        assert_eq!(runs.len(), 2);

        let ratio = config.extrusion_ratio();
        for (run, size) in runs.iter().zip([10.0, 5.0]) {
            // First move starts from zero.
            assert!((run[0] - size * ratio).abs() < 1e-6);
            for pair in run.windows(2) {
                assert!(pair[1] >= pair[0]);
            }
            assert!((run[run.len() - 1] - 4.0 * size * ratio).abs() < 1e-6);
        }
    }

    #[test]
    fn test_serialize_slice_labels() {
        let config = PrintConfig::default();
        let shells = generate_shells(&square(20.0), &[], 3, 1.0, 0.0).unwrap();
        let infill = vec![Polyline::from_points(&[(5.0, 5.0), (5.0, 15.0)], false)];
        let slice = Slice::new(0.2, 0.2, shells, infill);
        let gcode = serialize_slice(&slice, &config);

        let labels: Vec<&str> = gcode.lines().filter(|l| l.starts_with(";TYPE:")).collect();
        assert_eq!(labels, vec![";TYPE:WALL-OUTER", ";TYPE:WALL-INNER", ";TYPE:FILL"]);

        let outer = gcode.find(";TYPE:WALL-OUTER").unwrap();
        let inner = gcode.find(";TYPE:WALL-INNER").unwrap();
        let fill = gcode.find(";TYPE:FILL").unwrap();
        assert!(outer < inner && inner < fill);
    }

    #[test]
    fn test_retraction_wraps_long_travels() {
        let config = PrintConfig::default().retract_length(0.8);
        let mut writer = ToolpathWriter::new(&config);
        writer.add_polyline(&square(10.0));
        writer.add_polyline(&Polyline::from_points(&[(50.0, 50.0), (60.0, 50.0)], false));
        let gcode = writer.finish();
        let lines: Vec<&str> = gcode.lines().collect();

        // No retraction before the first travel.
        assert_eq!(lines[0], "G0 X0.000000 Y10.000000 F5000");
        assert_eq!(lines[1], "G92 E0");

        let travel = lines.iter().position(|l| l.starts_with("G0 X50")).unwrap();
        assert_eq!(lines[travel - 3], "G92 E0");
        assert_eq!(lines[travel - 2], "G1 E-0.800000 F1800");
        assert_eq!(lines[travel - 1], "G92 E0");
        assert_eq!(lines[travel + 1], "G1 E0.800000 F1800");
        assert_eq!(lines[travel + 2], "G92 E0");
        assert!(lines[travel + 3].starts_with("G1 X60.000000 Y50.000000 E"));
    }

    #[test]
    fn test_short_travel_not_retracted() {
        let config = PrintConfig::default().retract_length(0.8);
        let mut writer = ToolpathWriter::new(&config);
        writer.add_polyline(&Polyline::from_points(&[(0.0, 0.0), (10.0, 0.0)], false));
        writer.add_polyline(&Polyline::from_points(&[(11.0, 0.0), (20.0, 0.0)], false));
        assert!(!writer.as_str().contains("E-"));
    }

    #[test]
    fn test_no_retraction_by_default() {
        let mut writer = ToolpathWriter::new(&PrintConfig::default());
        writer.add_polyline(&square(10.0));
        writer.add_polyline(&Polyline::from_points(&[(50.0, 50.0), (60.0, 50.0)], false));
        assert!(!writer.as_str().contains("E-"));
    }

    #[test]
    fn test_slice_thickness_sets_extrusion() {
        let config = PrintConfig::default();
        let path = vec![Polyline::from_points(&[(0.0, 0.0), (10.0, 0.0)], false)];
        let thin = Slice::new(0.2, 0.2, ShellSet::default(), path.clone());
        let thick = Slice::new(0.4, 0.4, ShellSet::default(), path);

        let last_e = |gcode: String| *e_values(&gcode).last().unwrap().last().unwrap();
        let thin_e = last_e(serialize_slice(&thin, &config));
        let thick_e = last_e(serialize_slice(&thick, &config));
        assert!((thin_e - 10.0 * config.extrusion_ratio()).abs() < 1e-5);
        assert!((thick_e - 2.0 * thin_e).abs() < 1e-5);
    }

    #[test]
    fn test_serialize_slice_without_infill() {
        let config = PrintConfig::default();
        let shells = generate_shells(&square(20.0), &[], 1, 1.0, 0.0).unwrap();
        let gcode = serialize_slice(&Slice::new(0.2, 0.2, shells, vec![]), &config);
        assert!(gcode.contains(";TYPE:WALL-OUTER"));
        assert!(!gcode.contains(";TYPE:WALL-INNER"));
        assert!(!gcode.contains(";TYPE:FILL"));
    }
}
