//! Axis-aligned bounding box of a solid.

use crate::CoordF;
use serde::{Deserialize, Serialize};

/// A 3D axis-aligned bounding box.
///
/// A freshly created box is inverted (min = +∞, max = -∞) until a point is
/// merged in; such a box is void.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3 {
    pub min: [CoordF; 3],
    pub max: [CoordF; 3],
}

impl BoundingBox3 {
    /// Create an empty (inverted) bounding box.
    pub fn new() -> Self {
        Self {
            min: [CoordF::INFINITY; 3],
            max: [CoordF::NEG_INFINITY; 3],
        }
    }

    #[inline]
    pub fn from_corners(min: [CoordF; 3], max: [CoordF; 3]) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[[CoordF; 3]]) -> Self {
        let mut bb = Self::new();
        for p in points {
            bb.merge_point(*p);
        }
        bb
    }

    pub fn merge_point(&mut self, p: [CoordF; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    /// X extent.
    #[inline]
    pub fn width(&self) -> CoordF {
        self.max[0] - self.min[0]
    }

    /// Y extent.
    #[inline]
    pub fn length(&self) -> CoordF {
        self.max[1] - self.min[1]
    }

    /// Z extent.
    #[inline]
    pub fn height(&self) -> CoordF {
        self.max[2] - self.min[2]
    }

    /// Whether any coordinate is infinite or NaN.
    pub fn is_open(&self) -> bool {
        self.min.iter().chain(self.max.iter()).any(|c| !c.is_finite())
    }

    /// Whether the box has no usable footprint: never populated, inverted on
    /// some axis, or zero XY area.
    pub fn is_void(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
            || !(self.width() > 0.0)
            || !(self.length() > 0.0)
    }

    pub fn translate(&mut self, dx: CoordF, dy: CoordF, dz: CoordF) {
        let d = [dx, dy, dz];
        for axis in 0..3 {
            self.min[axis] += d[axis];
            self.max[axis] += d[axis];
        }
    }

    /// Area of the XY overlap with another box.
    pub fn overlap_area_xy(&self, other: &BoundingBox3) -> CoordF {
        let w = self.max[0].min(other.max[0]) - self.min[0].max(other.min[0]);
        let l = self.max[1].min(other.max[1]) - self.min[1].max(other.min[1]);
        if w > 0.0 && l > 0.0 {
            w * l
        } else {
            0.0
        }
    }
}

impl Default for BoundingBox3 {
    fn default() -> Self {
        Self::new()
    }
}
