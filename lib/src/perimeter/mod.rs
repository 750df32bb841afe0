//! Shell (wall) generation module.
//!
//! This module generates the nested wall offsets for each cross-section and
//! the boundary that infill is later clipped to.
//!
//! # Overview
//!
//! Shells are the outlines that define the shape of each layer. They are
//! generated from the cross-section boundary by offsetting inward:
//!
//! - Depth 0 is the outer wall, its centerline half a line width inside the boundary
//! - Each deeper shell sits one further line width inward
//! - One more offset past the last shell gives the infill clip boundary
//!
//! # Algorithm
//!
//! 1. Flatten the outer loop and island loops to straight chords
//! 2. Validate each loop; a failing loop is logged and left out
//! 3. For each depth `i`, offset the loop set inward by `(i + 0.5) × line_width`
//! 4. Offset once more by `(num_shells + 1 + overlap) × line_width` for the infill boundary
//!
//! One offset pass may split a region into several pieces, so a depth can hold
//! more than one [`Shell`].

use crate::clipper::{offset_regions, validate_ring, Region};
use crate::config::PrintConfig;
use crate::geometry::Polyline;
use crate::{CoordF, Error, Result};

/// Default chord tolerance when flattening arcs for offsetting (mm).
pub const DEFAULT_ARC_TOLERANCE: CoordF = 0.01;

/// One connected region produced by one offset pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    /// 0 for the outer wall, increasing inward.
    pub depth: usize,
    pub outer: Polyline,
    pub islands: Vec<Polyline>,
}

impl Shell {
    fn from_region(depth: usize, region: &Region) -> Self {
        let (outer, islands) = region.to_polylines();
        Self {
            depth,
            outer,
            islands,
        }
    }

    /// The area enclosed by this shell.
    pub fn region(&self, tolerance: CoordF) -> Region {
        Region::from_polylines(&self.outer, &self.islands, tolerance)
    }

    /// Every loop of this shell, outer first.
    pub fn loops(&self) -> impl Iterator<Item = &Polyline> {
        std::iter::once(&self.outer).chain(self.islands.iter())
    }
}

/// All shells of one cross-section plus the infill clip boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShellSet {
    /// Ordered outer to inner by depth.
    pub shells: Vec<Shell>,
    /// Regions infill is clipped to.
    pub innermost: Vec<Shell>,
}

impl ShellSet {
    pub fn is_empty(&self) -> bool {
        self.shells.is_empty() && self.innermost.is_empty()
    }

    /// Number of depths that produced at least one shell.
    pub fn depth_count(&self) -> usize {
        self.shells.last().map_or(0, |s| s.depth + 1)
    }
}

/// Configuration for shell generation.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Number of wall offsets. Negative values are rejected.
    pub num_shells: i32,
    /// Extrusion width (mm).
    pub line_width: CoordF,
    /// Extra inset of the infill boundary, in line widths.
    pub overlap: CoordF,
    /// Chord tolerance for arc flattening (mm).
    pub arc_tolerance: CoordF,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            num_shells: 3,
            line_width: 0.6,
            overlap: 0.0,
            arc_tolerance: DEFAULT_ARC_TOLERANCE,
        }
    }
}

impl ShellConfig {
    pub fn new(num_shells: i32, line_width: CoordF) -> Self {
        Self {
            num_shells,
            line_width,
            ..Default::default()
        }
    }

    pub fn from_print_config(config: &PrintConfig) -> Self {
        Self {
            num_shells: config.num_shells,
            line_width: config.line_width,
            overlap: config.shell_overlap,
            arc_tolerance: config.arc_tolerance,
        }
    }

    /// Builder method: set infill boundary overlap.
    pub fn with_overlap(mut self, overlap: CoordF) -> Self {
        self.overlap = overlap;
        self
    }

    /// Builder method: set arc flattening tolerance.
    pub fn with_arc_tolerance(mut self, tolerance: CoordF) -> Self {
        self.arc_tolerance = tolerance;
        self
    }
}

/// Generate shells for one cross-section.
///
/// `num_shells == 0` yields an empty set without error.
pub fn generate_shells(
    outer: &Polyline,
    islands: &[Polyline],
    num_shells: i32,
    line_width: CoordF,
    overlap: CoordF,
) -> Result<ShellSet> {
    let config = ShellConfig::new(num_shells, line_width).with_overlap(overlap);
    ShellGenerator::new(config).generate(outer, islands)
}

/// Shell generator.
pub struct ShellGenerator {
    config: ShellConfig,
}

impl ShellGenerator {
    pub fn new(config: ShellConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn generate(&self, outer: &Polyline, islands: &[Polyline]) -> Result<ShellSet> {
        let ShellConfig {
            num_shells,
            line_width,
            overlap,
            arc_tolerance,
        } = self.config;

        if num_shells < 0 {
            return Err(Error::Validation(format!(
                "shell count must not be negative, got {}",
                num_shells
            )));
        }
        if !(line_width > 0.0) {
            return Err(Error::Validation(format!(
                "line width must be > 0, got {}",
                line_width
            )));
        }
        if num_shells == 0 {
            log::debug!("Shells: zero shells requested");
            return Ok(ShellSet::default());
        }

        let Some(base) = self.validated_region(outer, islands, arc_tolerance) else {
            return Ok(ShellSet::default());
        };

        let mut shells = Vec::new();
        for depth in 0..num_shells as usize {
            let delta = (depth as CoordF + 0.5) * line_width;
            let regions = offset_regions(std::slice::from_ref(&base), -delta);
            if regions.is_empty() {
                log::debug!("Shells: region vanished at depth {}", depth);
                break;
            }
            log::trace!("Shells: depth {} produced {} regions", depth, regions.len());
            shells.extend(regions.iter().map(|r| Shell::from_region(depth, r)));
        }

        let inset = (num_shells as CoordF + 1.0 + overlap) * line_width;
        let innermost: Vec<Shell> = offset_regions(std::slice::from_ref(&base), -inset)
            .iter()
            .map(|r| Shell::from_region(num_shells as usize, r))
            .collect();

        log::debug!(
            "Shells: generated {} shells, {} infill regions",
            shells.len(),
            innermost.len()
        );
        Ok(ShellSet { shells, innermost })
    }

    /// Flatten and validate the loops. Invalid islands are dropped; an invalid
    /// outer loop leaves nothing to offset.
    fn validated_region(
        &self,
        outer: &Polyline,
        islands: &[Polyline],
        tolerance: CoordF,
    ) -> Option<Region> {
        let outer_ring = outer.flatten(tolerance);
        if let Err(e) = validate_ring(&outer_ring) {
            log::error!("Shells: outer loop rejected: {}", e);
            return None;
        }

        let holes = islands
            .iter()
            .enumerate()
            .filter_map(|(i, island)| {
                let ring = island.flatten(tolerance);
                match validate_ring(&ring) {
                    Ok(()) => Some(ring),
                    Err(e) => {
                        log::error!("Shells: island {} rejected: {}", i, e);
                        None
                    }
                }
            })
            .collect();

        Some(Region::new(outer_ring, holes))
    }
}
