//! Job collation.
//!
//! Orders serialized slices by height and wraps them with the machine
//! preamble and postamble. A layer change is emitted only when Z strictly
//! increases, so several faces at the same height share one layer.

use super::{serialize_slice, GCodeCommand};
use crate::config::PrintConfig;
use crate::slice::Slice;
use crate::{CoordF, Error, Result, VERSION};

/// G-code text of one slice, tagged with its height.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedSlice {
    pub z: CoordF,
    pub thickness: CoordF,
    pub gcode: String,
}

impl SerializedSlice {
    pub fn new(slice: &Slice, config: &PrintConfig) -> Self {
        Self {
            z: slice.z(),
            thickness: slice.thickness(),
            gcode: serialize_slice(slice, config),
        }
    }
}

/// Serialize and collate slices into a complete program.
pub fn collate(slices: &[Slice], config: &PrintConfig) -> Result<String> {
    let serialized = slices
        .iter()
        .map(|s| SerializedSlice::new(s, config))
        .collect();
    collate_serialized(serialized, config)
}

/// Collate already-serialized slices into a complete program.
///
/// Fails with [`Error::ResourceExceeded`] once the program would grow past
/// `config.max_gcode_bytes`.
pub fn collate_serialized(
    mut slices: Vec<SerializedSlice>,
    config: &PrintConfig,
) -> Result<String> {
    if slices.is_empty() {
        log::warn!("Collate: no slices provided");
        return Ok(String::new());
    }

    log::debug!("Collate: sorting {} slices", slices.len());
    slices.sort_by(|a, b| a.z.total_cmp(&b.z));

    let mut program = Program::new(config.max_gcode_bytes);

    let layer_count = count_layers(&slices);
    let layer_height = slices[0].thickness;
    program.push_str(&preamble(config, layer_height, layer_count))?;

    let mut current_z: Option<CoordF> = None;
    let mut layer_number = 0usize;
    for slice in &slices {
        if current_z.map_or(true, |z| slice.z > z) {
            let mut change = GCodeCommand::Marker(format!("LAYER:{}", layer_number)).to_gcode();
            change.push('\n');
            change.push_str(
                &GCodeCommand::RapidMove {
                    x: None,
                    y: None,
                    z: Some(slice.z),
                    f: Some(config.layer_change_feedrate),
                }
                .to_gcode(),
            );
            change.push('\n');
            program.push_str(&change)?;

            current_z = Some(slice.z);
            layer_number += 1;
        }
        program.push_str(&slice.gcode)?;
    }

    program.push_str(&postamble(config))?;

    log::info!(
        "Collate: {} layers, {} bytes of G-code",
        layer_number,
        program.len()
    );
    Ok(program.finish())
}

/// Number of distinct heights in a Z-sorted slice list.
fn count_layers(sorted: &[SerializedSlice]) -> usize {
    let mut count = 0;
    let mut last: Option<CoordF> = None;
    for s in sorted {
        if last.map_or(true, |z| s.z > z) {
            count += 1;
            last = Some(s.z);
        }
    }
    count
}

fn lines(commands: &[(GCodeCommand, &str)]) -> String {
    let mut out = String::new();
    for (command, comment) in commands {
        out.push_str(&command.to_gcode());
        if !comment.is_empty() {
            out.push_str(" ; ");
            out.push_str(comment);
        }
        out.push('\n');
    }
    out
}

fn preamble(config: &PrintConfig, layer_height: CoordF, layer_count: usize) -> String {
    lines(&[
        (
            GCodeCommand::Comment(format!("Sliced by step-slicer v{}", VERSION)),
            "",
        ),
        (GCodeCommand::Marker("FLAVOR:Marlin".into()), ""),
        (
            GCodeCommand::Marker(format!("Layer height:{}", layer_height)),
            "",
        ),
        (
            GCodeCommand::SetExtruderTemp {
                s: config.hotend_temperature,
            },
            "Set hotend temp",
        ),
        (
            GCodeCommand::SetBedTempWait {
                s: config.bed_temperature,
            },
            "Set bed temp and wait",
        ),
        (GCodeCommand::ReportTemperature, ""),
        (
            GCodeCommand::SetExtruderTempWait {
                s: config.hotend_temperature,
            },
            "Wait for hotend temp",
        ),
        (GCodeCommand::ReportTemperature, ""),
        (GCodeCommand::AbsolutePositioning, "Absolute positioning"),
        (GCodeCommand::AbsoluteExtrusion, "Absolute extrusion"),
        (
            GCodeCommand::SetExtruderPosition { e: 0.0 },
            "Reset extruder position",
        ),
        (GCodeCommand::Home, "Home all axes"),
        (
            GCodeCommand::SetFanSpeed {
                s: config.fan_speed,
            },
            "Set fan speed",
        ),
        (GCodeCommand::Marker(format!("LAYER_COUNT:{}", layer_count)), ""),
    ])
}

fn postamble(config: &PrintConfig) -> String {
    lines(&[
        (
            GCodeCommand::LinearMove {
                x: Some(0.0),
                y: Some(config.bed_length),
                e: None,
                f: Some(config.travel_feedrate),
            },
            "Present print",
        ),
        (GCodeCommand::SetExtruderTemp { s: 0 }, "Turn off hotend"),
        (GCodeCommand::SetBedTemp { s: 0 }, "Turn off bed"),
        (GCodeCommand::FanOff, "Turn off fan"),
        (GCodeCommand::DisableSteppers, "Disable all steppers except Z"),
    ])
}

/// Output buffer with a hard size cap.
struct Program {
    text: String,
    max_bytes: usize,
}

impl Program {
    fn new(max_bytes: usize) -> Self {
        // reserve up to 10MiB up front
        Self {
            text: String::with_capacity(max_bytes.min(10 << 20)),
            max_bytes,
        }
    }

    fn push_str(&mut self, s: &str) -> Result<()> {
        let size = self.text.len() + s.len();
        if size > self.max_bytes {
            log::error!(
                "GCode size {} bytes exceeds maximum {} bytes",
                size,
                self.max_bytes
            );
            return Err(Error::ResourceExceeded(format!(
                "G-code size {} bytes exceeds maximum {} bytes",
                size, self.max_bytes
            )));
        }
        self.text.push_str(s);
        Ok(())
    }

    fn len(&self) -> usize {
        self.text.len()
    }

    fn finish(self) -> String {
        self.text
    }
}
