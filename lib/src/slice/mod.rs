//! Slicing module - cross-section boundaries and finished layers.
//!
//! This module contains the per-layer data model:
//! - [`BoundaryLoop`] - Closed chain of boundary curves from a planar cross-section
//! - [`extract_polyline`] - Converts a boundary loop into a bulge [`Polyline`](crate::Polyline)
//! - [`CrossSection`] - One planar face of a solid at a given Z
//! - [`Slice`] - Shells and infill generated for one cross-section
//! - [`layer_heights`] - Z heights of the cutting planes for an object

mod boundary;
mod layer;
mod planes;

pub use boundary::{extract_polyline, BoundaryLoop, Curve, CurveSegment};
pub use layer::{CrossSection, Slice};
pub use planes::{layer_heights, MAXIMUM_LAYERS};
