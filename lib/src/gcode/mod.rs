//! G-code generation module.
//!
//! This module turns finished slices into Marlin-flavoured G-code text:
//! - [`GCodeCommand`] - Individual commands and their text form
//! - [`ToolpathWriter`] - Per-polyline moves with extrusion accounting
//! - [`serialize_slice`] - One slice's shells and infill with feature labels
//! - [`collate`] - Z-ordered job assembly with preamble, layer changes and postamble

mod collate;
mod writer;

pub use collate::{collate, collate_serialized, SerializedSlice};
pub use writer::{serialize_slice, FeatureType, ToolpathWriter};

/// G-code command types.
#[derive(Clone, Debug, PartialEq)]
pub enum GCodeCommand {
    /// G0 - Rapid move (travel)
    RapidMove {
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
        f: Option<f64>,
    },
    /// G1 - Linear move (extrusion)
    LinearMove {
        x: Option<f64>,
        y: Option<f64>,
        e: Option<f64>,
        f: Option<f64>,
    },
    /// G2 - Clockwise arc
    ArcCW {
        x: f64,
        y: f64,
        i: f64,
        j: f64,
        e: Option<f64>,
        f: Option<f64>,
    },
    /// G3 - Counter-clockwise arc
    ArcCCW {
        x: f64,
        y: f64,
        i: f64,
        j: f64,
        e: Option<f64>,
        f: Option<f64>,
    },
    /// G28 - Home all axes
    Home,
    /// G90 - Absolute positioning
    AbsolutePositioning,
    /// G92 - Set extruder position
    SetExtruderPosition { e: f64 },
    /// M82 - Absolute extrusion
    AbsoluteExtrusion,
    /// M104 - Set extruder temperature (no wait)
    SetExtruderTemp { s: u32 },
    /// M109 - Set extruder temperature and wait
    SetExtruderTempWait { s: u32 },
    /// M140 - Set bed temperature (no wait)
    SetBedTemp { s: u32 },
    /// M190 - Set bed temperature and wait
    SetBedTempWait { s: u32 },
    /// M105 - Report temperatures
    ReportTemperature,
    /// M106 - Set fan speed
    SetFanSpeed { s: u32 },
    /// M107 - Fan off
    FanOff,
    /// M84 - Disable steppers except Z
    DisableSteppers,
    /// Free-form comment
    Comment(String),
    /// Machine-readable `;KEY:VALUE` marker
    Marker(String),
}

fn push_axis(cmd: &mut String, axis: char, value: Option<f64>) {
    if let Some(v) = value {
        cmd.push_str(&format!(" {}{:.6}", axis, v));
    }
}

fn push_feedrate(cmd: &mut String, value: Option<f64>) {
    if let Some(v) = value {
        cmd.push_str(&format!(" F{:.0}", v));
    }
}

impl GCodeCommand {
    /// Convert the command to a G-code string.
    pub fn to_gcode(&self) -> String {
        match self {
            GCodeCommand::RapidMove { x, y, z, f } => {
                let mut cmd = String::from("G0");
                push_axis(&mut cmd, 'X', *x);
                push_axis(&mut cmd, 'Y', *y);
                push_axis(&mut cmd, 'Z', *z);
                push_feedrate(&mut cmd, *f);
                cmd
            }
            GCodeCommand::LinearMove { x, y, e, f } => {
                let mut cmd = String::from("G1");
                push_axis(&mut cmd, 'X', *x);
                push_axis(&mut cmd, 'Y', *y);
                push_axis(&mut cmd, 'E', *e);
                push_feedrate(&mut cmd, *f);
                cmd
            }
            GCodeCommand::ArcCW { x, y, i, j, e, f } => {
                let mut cmd = format!("G2 X{:.6} Y{:.6} I{:.6} J{:.6}", x, y, i, j);
                push_axis(&mut cmd, 'E', *e);
                push_feedrate(&mut cmd, *f);
                cmd
            }
            GCodeCommand::ArcCCW { x, y, i, j, e, f } => {
                let mut cmd = format!("G3 X{:.6} Y{:.6} I{:.6} J{:.6}", x, y, i, j);
                push_axis(&mut cmd, 'E', *e);
                push_feedrate(&mut cmd, *f);
                cmd
            }
            GCodeCommand::Home => "G28".to_string(),
            GCodeCommand::AbsolutePositioning => "G90".to_string(),
            GCodeCommand::SetExtruderPosition { e } => format!("G92 E{}", e),
            GCodeCommand::AbsoluteExtrusion => "M82".to_string(),
            GCodeCommand::SetExtruderTemp { s } => format!("M104 S{}", s),
            GCodeCommand::SetExtruderTempWait { s } => format!("M109 S{}", s),
            GCodeCommand::SetBedTemp { s } => format!("M140 S{}", s),
            GCodeCommand::SetBedTempWait { s } => format!("M190 S{}", s),
            GCodeCommand::ReportTemperature => "M105".to_string(),
            GCodeCommand::SetFanSpeed { s } => format!("M106 S{}", s),
            GCodeCommand::FanOff => "M107".to_string(),
            GCodeCommand::DisableSteppers => "M84 X Y E".to_string(),
            GCodeCommand::Comment(text) => format!("; {}", text),
            GCodeCommand::Marker(text) => format!(";{}", text),
        }
    }
}
