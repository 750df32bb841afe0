//! Geometry primitives for the slicer.
//!
//! This module provides the fundamental geometric types used throughout the slicing pipeline:
//! - [`Vertex2D`] - 2D vertex carrying the bulge of the arc that leaves it
//! - [`Polyline`] - Open or closed path of bulge vertices
//! - [`BoundingBox3`] - Axis-aligned 3D bounding box of a solid
//! - [`ArcGeometry`] - Center, radius and sweep recovered from a bulge segment
//!
//! ## Bulge Convention
//!
//! A vertex bulge is `tan(θ/4)` where `θ` is the signed sweep of the arc from
//! that vertex to the next one. Zero means a straight segment, a positive
//! value a counter-clockwise arc. A single bulge segment never sweeps more
//! than a half turn.
//!
//! All coordinates are floating-point millimetres.

mod bounding_box;
mod polyline;
mod vertex;

pub use bounding_box::BoundingBox3;
pub use polyline::{Polyline, Polylines, Segment};
pub use vertex::Vertex2D;

use crate::CoordF;

/// Bulges smaller than this are treated as straight segments.
pub const BULGE_EPSILON: CoordF = 1e-9;

/// Coincidence tolerance for points (mm).
pub const POINT_EPSILON: CoordF = 1e-9;

/// Calculate the cross product of two 2D vectors (returns a scalar).
#[inline]
pub fn cross2f(v1: (CoordF, CoordF), v2: (CoordF, CoordF)) -> CoordF {
    v1.0 * v2.1 - v1.1 * v2.0
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: (CoordF, CoordF), b: (CoordF, CoordF)) -> CoordF {
    (b.0 - a.0).hypot(b.1 - a.1)
}

/// Check if a value is approximately equal to another within epsilon.
#[inline]
pub fn approx_eq(a: CoordF, b: CoordF, epsilon: CoordF) -> bool {
    (a - b).abs() < epsilon
}

/// Rotate `p` about `center` by `angle` radians (counter-clockwise positive).
#[inline]
pub fn rotate_about(
    p: (CoordF, CoordF),
    center: (CoordF, CoordF),
    angle: CoordF,
) -> (CoordF, CoordF) {
    let (sin, cos) = angle.sin_cos();
    let dx = p.0 - center.0;
    let dy = p.1 - center.1;
    (
        center.0 + dx * cos - dy * sin,
        center.1 + dx * sin + dy * cos,
    )
}

/// Circular arc recovered from two endpoints and a bulge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGeometry {
    pub center: (CoordF, CoordF),
    pub radius: CoordF,
    /// Signed sweep in radians, `4·atan(bulge)`.
    pub sweep: CoordF,
}

impl ArcGeometry {
    /// Reconstruct the arc between `start` and `end` with the given bulge.
    ///
    /// Returns `None` for straight segments and for coincident endpoints,
    /// which carry no recoverable arc.
    ///
    /// With chord length `c`, the radius is `c(1+b²)/(4|b|)` and the center
    /// sits `c(1-b²)/(4b)` along the chord's left normal from its midpoint.
    pub fn from_bulge(
        start: (CoordF, CoordF),
        end: (CoordF, CoordF),
        bulge: CoordF,
    ) -> Option<Self> {
        if bulge.abs() < BULGE_EPSILON {
            return None;
        }
        let dx = end.0 - start.0;
        let dy = end.1 - start.1;
        let chord = dx.hypot(dy);
        if chord < POINT_EPSILON {
            return None;
        }

        let b2 = bulge * bulge;
        let radius = chord * (1.0 + b2) / (4.0 * bulge.abs());
        let offset = chord * (1.0 - b2) / (4.0 * bulge);
        let mid = ((start.0 + end.0) * 0.5, (start.1 + end.1) * 0.5);
        let center = (mid.0 - dy / chord * offset, mid.1 + dx / chord * offset);

        Some(Self {
            center,
            radius,
            sweep: 4.0 * bulge.atan(),
        })
    }

    /// Length along the arc.
    #[inline]
    pub fn length(&self) -> CoordF {
        self.radius * self.sweep.abs()
    }

    /// Number of chords needed so that no chord deviates from the arc by more
    /// than `tolerance`.
    pub fn chord_count(&self, tolerance: CoordF) -> usize {
        const MAX_CHORDS: usize = 1024;
        if tolerance >= self.radius {
            return 1;
        }
        let step = 2.0 * (1.0 - tolerance / self.radius).acos();
        if !(step > 0.0) {
            return MAX_CHORDS;
        }
        ((self.sweep.abs() / step).ceil() as usize).clamp(1, MAX_CHORDS)
    }
}
