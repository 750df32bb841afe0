//! Infill pattern generation module.
//!
//! # Overview
//!
//! Infill fills the interior of a layer after shells have been generated. A
//! single zig-zag pattern spanning the whole bed is generated once and then
//! clipped to each cross-section's infill boundary.
//!
//! # Algorithm
//!
//! 1. Lay out `floor(density × bed_width / line_width)` vertical lines evenly
//!    across the bed, joined alternately at the top and bottom edges
//! 2. Finish with a return leg below the bed back to the origin
//! 3. Clip the pattern to the innermost shell regions, keeping the parts
//!    inside their outer boundaries and outside their islands

use crate::clipper::{clip_open_path, Region};
use crate::geometry::{Polyline, Polylines};
use crate::perimeter::{Shell, DEFAULT_ARC_TOLERANCE};
use crate::{CoordF, Error, Result};

/// How far below the bed the return leg dips (mm).
const RETURN_LEG_DROP: CoordF = 10.0;

/// Upper bound on infill lines across the bed.
pub const MAXIMUM_INFILL_LINES: usize = 100_000;

/// Generate a vertical zig-zag infill pattern covering the bed.
///
/// A non-positive density, or one too sparse for a single line, gives an
/// empty pattern.
pub fn generate_infill_pattern(
    density: CoordF,
    line_width: CoordF,
    bed_width: CoordF,
    bed_length: CoordF,
) -> Result<Polyline> {
    if !(line_width > 0.0) {
        return Err(Error::Validation(format!(
            "line width must be > 0, got {}",
            line_width
        )));
    }
    if !(bed_width > 0.0) || !(bed_length > 0.0) {
        return Err(Error::Validation(format!(
            "invalid bed dimensions {}x{}",
            bed_width, bed_length
        )));
    }

    // for rectilinear infill, density = line count × line width / bed width
    let lines = if density > 0.0 {
        (density * bed_width / line_width).floor()
    } else {
        0.0
    };
    if lines > MAXIMUM_INFILL_LINES as CoordF {
        return Err(Error::Validation(format!(
            "{} infill lines exceeds maximum {}",
            lines, MAXIMUM_INFILL_LINES
        )));
    }
    let line_count = lines as usize;
    if line_count == 0 {
        log::debug!("Infill: density {} gives no lines", density);
        return Ok(Polyline::new(false));
    }

    let spacing = bed_width / line_count as CoordF;
    let mut pattern = Polyline::with_capacity(2 * line_count + 2, false);
    for k in 0..line_count {
        let x = (k as CoordF + 0.5) * spacing;
        let (from, to) = if k % 2 == 0 {
            (0.0, bed_length)
        } else {
            (bed_length, 0.0)
        };
        pattern.push((x, from).into());
        pattern.push((x, to).into());
    }

    // end with a line segment back to the origin, passing below the bed
    let last_x = (line_count as CoordF - 0.5) * spacing;
    pattern.push((last_x, -RETURN_LEG_DROP).into());
    pattern.push((0.0, 0.0).into());

    log::trace!(
        "Infill: {} lines at {:.3}mm spacing over {:.1}x{:.1}",
        line_count,
        spacing,
        bed_width,
        bed_length
    );
    Ok(pattern)
}

/// Clip an infill pattern to the infill boundary of a cross-section.
///
/// Fails with [`Error::InfillBeforeShells`] when there is no boundary to clip
/// to. Arcs in the pattern are flattened.
pub fn clip_infill(pattern: &Polyline, innermost: &[Shell]) -> Result<Polylines> {
    if innermost.is_empty() {
        return Err(Error::InfillBeforeShells);
    }
    if pattern.len() < 2 {
        return Ok(vec![]);
    }

    let regions: Vec<Region> = innermost
        .iter()
        .map(|s| s.region(DEFAULT_ARC_TOLERANCE))
        .collect();
    let path = pattern.flatten(DEFAULT_ARC_TOLERANCE);

    let clipped: Polylines = clip_open_path(&path, &regions)
        .iter()
        .map(|points| Polyline::from_points(points, false))
        .collect();

    log::trace!("Infill: clipped into {} paths", clipped.len());
    Ok(clipped)
}
