//! # Step Slicer
//!
//! Build-plate arrangement and layer toolpath generation for a 3D-printing
//! slicer working on solid (B-rep) models.
//!
//! The library covers the parts of the slicer that are not delegated to a
//! CAD kernel:
//! - Footprint packing: a growing binary-tree rectangle packer that places
//!   object footprints on the bed without overlap
//! - Boundary extraction: closed cross-section loops to bulge polylines
//! - Shell (wall) offsets and the infill clip boundary
//! - Zig-zag infill clipped to the innermost shell
//! - G-code serialization with extrusion accounting and job collation
//!
//! ## Example
//!
//! ```rust,ignore
//! use step_slicer::{CrossSection, LayerPipeline, PrintConfig};
//!
//! let config = PrintConfig::default();
//! let sections: Vec<CrossSection> = load_sections()?;
//! let gcode = LayerPipeline::new(config).process(&sections)?;
//! std::fs::write("output.gcode", gcode)?;
//! ```

pub mod clipper;
pub mod config;
pub mod gcode;
pub mod geometry;
pub mod infill;
pub mod packer;
pub mod perimeter;
pub mod pipeline;
pub mod slice;

pub use config::PrintConfig;
pub use gcode::{collate, serialize_slice, GCodeCommand, ToolpathWriter};
pub use geometry::{BoundingBox3, Polyline, Vertex2D};
pub use infill::{clip_infill, generate_infill_pattern};
pub use packer::{rearrange, rearrange_with_config, Footprint, Packer, Placeable};
pub use perimeter::{generate_shells, Shell, ShellSet};
pub use pipeline::LayerPipeline;
pub use slice::{
    extract_polyline, layer_heights, BoundaryLoop, CrossSection, Curve, CurveSegment, Slice,
};

/// Coordinate type used throughout the slicer (millimetres).
pub type CoordF = f64;

/// Maximum number of objects the packer accepts in one job.
pub const MAXIMUM_OBJECTS: usize = 1000;

/// Result type used throughout the slicer.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for slicer operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad input data, detected before anything is mutated.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An offset or intersection failed for a single loop.
    #[error("Geometry operation failed: {0}")]
    GeometryOperation(String),

    /// A job-level limit was exceeded (bed area, output size).
    #[error("Resource exceeded: {0}")]
    ResourceExceeded(String),

    #[error("Can't determine correct growth direction of bin")]
    GrowthDirectionUndetermined,

    #[error("Infill requested before any shell exists")]
    InfillBeforeShells,

    #[error("Objects must be packed before they can be arranged")]
    ArrangeBeforePack,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error reports a caller contract violation rather than bad data.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::GrowthDirectionUndetermined
                | Error::InfillBeforeShells
                | Error::ArrangeBeforePack
        )
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_classification() {
        assert!(Error::ArrangeBeforePack.is_precondition());
        assert!(Error::InfillBeforeShells.is_precondition());
        assert!(Error::GrowthDirectionUndetermined.is_precondition());
        assert!(!Error::Validation("bad".into()).is_precondition());
        assert!(!Error::ResourceExceeded("big".into()).is_precondition());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::Validation("too many objects".into());
        assert_eq!(err.to_string(), "Validation error: too many objects");
    }
}
