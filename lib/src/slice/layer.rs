//! Cross-sections and finished slices.

use super::BoundaryLoop;
use crate::geometry::{Polyline, Polylines};
use crate::perimeter::{Shell, ShellSet};
use crate::CoordF;
use serde::{Deserialize, Serialize};

/// One planar face of a solid, as produced by splitting it at a given Z.
///
/// The outer loop bounds the face counter-clockwise; islands are holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    /// Height of the layer this face is printed at (mm).
    pub z: CoordF,
    /// Layer thickness (mm).
    pub thickness: CoordF,
    pub outer: BoundaryLoop,
    #[serde(default)]
    pub islands: Vec<BoundaryLoop>,
}

impl CrossSection {
    pub fn new(z: CoordF, thickness: CoordF, outer: BoundaryLoop) -> Self {
        Self {
            z,
            thickness,
            outer,
            islands: Vec::new(),
        }
    }

    /// Builder method: add an island (hole) loop.
    pub fn with_island(mut self, island: BoundaryLoop) -> Self {
        self.islands.push(island);
        self
    }
}

/// Toolpaths generated for one cross-section. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    z: CoordF,
    thickness: CoordF,
    shells: Vec<Shell>,
    innermost: Vec<Shell>,
    infill: Polylines,
}

impl Slice {
    pub fn new(z: CoordF, thickness: CoordF, shells: ShellSet, infill: Polylines) -> Self {
        Self {
            z,
            thickness,
            shells: shells.shells,
            innermost: shells.innermost,
            infill,
        }
    }

    /// A slice with no toolpaths.
    pub fn empty(z: CoordF, thickness: CoordF) -> Self {
        Self::new(z, thickness, ShellSet::default(), Vec::new())
    }

    #[inline]
    pub fn z(&self) -> CoordF {
        self.z
    }

    #[inline]
    pub fn thickness(&self) -> CoordF {
        self.thickness
    }

    /// Shells ordered outer to inner by depth.
    #[inline]
    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    /// The infill clip boundary.
    #[inline]
    pub fn innermost(&self) -> &[Shell] {
        &self.innermost
    }

    #[inline]
    pub fn infill(&self) -> &[Polyline] {
        &self.infill
    }

    /// Whether the slice has nothing to print.
    pub fn is_empty(&self) -> bool {
        self.shells.is_empty() && self.infill.is_empty()
    }
}
