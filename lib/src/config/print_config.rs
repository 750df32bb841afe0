//! Print configuration.
//!
//! Every field has a fallback default, so a configuration file only needs to
//! name the keys it overrides.

use crate::{CoordF, Error, Result, MAXIMUM_OBJECTS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Main print configuration containing global print settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    // === Bed Configuration ===
    /// Bed size X (mm).
    pub bed_width: CoordF,
    /// Bed size Y (mm).
    pub bed_length: CoordF,

    // === Layers ===
    /// Layer height (mm).
    pub layer_height: CoordF,

    // === Shells ===
    /// Extrusion (bead) width (mm).
    pub line_width: CoordF,
    /// Number of wall offsets per layer. Signed so that bad input can be rejected.
    pub num_shells: i32,
    /// Extra inset of the infill boundary, in line widths.
    pub shell_overlap: CoordF,

    // === Infill ===
    /// Infill density (0.0 - 1.0).
    pub infill_density: CoordF,

    // === Extrusion ===
    /// Filament diameter (mm).
    pub filament_diameter: CoordF,
    /// Extrusion multiplier (flow rate adjustment).
    pub extrusion_multiplier: CoordF,

    // === Temperatures ===
    /// Hotend temperature (°C).
    pub hotend_temperature: u32,
    /// Bed temperature (°C).
    pub bed_temperature: u32,
    /// Part cooling fan speed (0-255).
    pub fan_speed: u32,

    // === Feedrates (mm/min) ===
    /// Extruding moves.
    pub print_feedrate: CoordF,
    /// Travel moves.
    pub travel_feedrate: CoordF,
    /// Z move on layer change.
    pub layer_change_feedrate: CoordF,

    // === Retraction ===
    /// Retraction length (mm). Zero disables retraction.
    pub retract_length: CoordF,
    /// Retraction speed (mm/s).
    pub retract_speed: CoordF,
    /// Minimum travel distance before retraction (mm).
    pub retract_before_travel: CoordF,

    // === Limits ===
    /// Maximum size of the generated program (bytes).
    pub max_gcode_bytes: usize,
    /// Maximum number of objects accepted for arrangement.
    pub max_objects: usize,

    // === Geometry ===
    /// Maximum deviation when arcs are flattened to chords for offsetting (mm).
    pub arc_tolerance: CoordF,
}

impl PrintConfig {
    /// Create a new PrintConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Reading config file: {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Builder method: set retraction length (0 disables it).
    pub fn retract_length(mut self, length: CoordF) -> Self {
        self.retract_length = length;
        self
    }

    /// Builder method: set layer height.
    pub fn layer_height(mut self, height: CoordF) -> Self {
        self.layer_height = height;
        self
    }

    /// Builder method: set line width.
    pub fn line_width(mut self, width: CoordF) -> Self {
        self.line_width = width;
        self
    }

    /// Builder method: set number of shells.
    pub fn num_shells(mut self, count: i32) -> Self {
        self.num_shells = count;
        self
    }

    /// Builder method: set infill density.
    pub fn infill_density(mut self, density: CoordF) -> Self {
        self.infill_density = density;
        self
    }

    /// Builder method: set bed size.
    pub fn bed_size(mut self, width: CoordF, length: CoordF) -> Self {
        self.bed_width = width;
        self.bed_length = length;
        self
    }

    /// Builder method: set the output size cap.
    pub fn max_gcode_bytes(mut self, bytes: usize) -> Self {
        self.max_gcode_bytes = bytes;
        self
    }

    /// Filament length fed per millimetre of path.
    ///
    /// `extrusion_multiplier × layer_height × 4 / (π × filament_diameter²)`
    pub fn extrusion_ratio(&self) -> CoordF {
        self.extrusion_ratio_for(self.layer_height)
    }

    /// Extrusion ratio for a layer of the given thickness.
    pub fn extrusion_ratio_for(&self, layer_height: CoordF) -> CoordF {
        self.extrusion_multiplier * layer_height * 4.0
            / (std::f64::consts::PI * self.filament_diameter * self.filament_diameter)
    }

    /// Whether travel moves are wrapped in a retraction.
    pub fn uses_retraction(&self) -> bool {
        self.retract_length > 0.0
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("bed_width", self.bed_width),
            ("bed_length", self.bed_length),
            ("layer_height", self.layer_height),
            ("line_width", self.line_width),
            ("filament_diameter", self.filament_diameter),
            ("extrusion_multiplier", self.extrusion_multiplier),
            ("arc_tolerance", self.arc_tolerance),
            ("retract_speed", self.retract_speed),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(Error::Config(format!("{} must be positive", name)));
            }
        }
        if !(self.retract_length >= 0.0) || !(self.retract_before_travel >= 0.0) {
            return Err(Error::Config(
                "retract_length and retract_before_travel must not be negative".into(),
            ));
        }
        if self.num_shells < 0 {
            return Err(Error::Config("num_shells must not be negative".into()));
        }
        if !(0.0..=1.0).contains(&self.infill_density) {
            return Err(Error::Config("infill_density must be within 0.0 - 1.0".into()));
        }
        if self.fan_speed > 255 {
            return Err(Error::Config("fan_speed must be within 0 - 255".into()));
        }
        Ok(())
    }
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            // Bed
            bed_width: 300.0,
            bed_length: 300.0,

            // Layers
            layer_height: 0.2,

            // Shells
            line_width: 0.6,
            num_shells: 3,
            shell_overlap: 0.0,

            // Infill
            infill_density: 0.2,

            // Extrusion
            filament_diameter: 1.75,
            extrusion_multiplier: 1.0,

            // Temperatures
            hotend_temperature: 225,
            bed_temperature: 65,
            fan_speed: 255,

            // Feedrates
            print_feedrate: 1800.0,
            travel_feedrate: 5000.0,
            layer_change_feedrate: 5000.0,

            // Retraction
            retract_length: 0.0,
            retract_speed: 30.0,
            retract_before_travel: 2.0,

            // Limits
            max_gcode_bytes: 1 << 30,
            max_objects: MAXIMUM_OBJECTS,

            // Geometry
            arc_tolerance: 0.01,
        }
    }
}

impl fmt::Display for PrintConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PrintConfig(layer={:.2}mm, line={:.2}mm, shells={}, infill={:.0}%, bed={:.0}x{:.0}mm)",
            self.layer_height,
            self.line_width,
            self.num_shells,
            self.infill_density * 100.0,
            self.bed_width,
            self.bed_length
        )
    }
}
