//! Build-plate arrangement.
//!
//! Packs all objects into the smallest near-square bin, checks that the bin
//! fits on the bed, and centers it there.

use super::{Packer, Placeable};
use crate::config::PrintConfig;
use crate::{CoordF, Error, Result, MAXIMUM_OBJECTS};

/// Rearrange objects to minimize the aggregate footprint and center them on
/// the bed. Returns the offset of the packed bin from the bed origin.
///
/// An empty list is a no-op with a warning. Invalid bed dimensions, too many
/// objects, void or open bounding boxes, and objects larger than the bed are
/// rejected before anything moves.
pub fn rearrange<T: Placeable>(
    objects: &mut [T],
    bed_width: CoordF,
    bed_length: CoordF,
) -> Result<(CoordF, CoordF)> {
    rearrange_with_limit(objects, bed_width, bed_length, MAXIMUM_OBJECTS)
}

/// [`rearrange`] using the bed size and object limit from a configuration.
pub fn rearrange_with_config<T: Placeable>(
    objects: &mut [T],
    config: &PrintConfig,
) -> Result<(CoordF, CoordF)> {
    rearrange_with_limit(
        objects,
        config.bed_width,
        config.bed_length,
        config.max_objects.min(MAXIMUM_OBJECTS),
    )
}

fn rearrange_with_limit<T: Placeable>(
    objects: &mut [T],
    bed_width: CoordF,
    bed_length: CoordF,
    max_objects: usize,
) -> Result<(CoordF, CoordF)> {
    log::info!("Rearranging objects");

    if objects.is_empty() {
        log::warn!("Rearrange: attempting to rearrange zero objects");
        return Ok((0.0, 0.0));
    }

    if !(bed_width > 0.0) || !(bed_length > 0.0) {
        log::error!(
            "Rearrange: invalid bed dimensions {:.3}x{:.3}",
            bed_width,
            bed_length
        );
        return Err(Error::Validation(format!(
            "invalid bed dimensions {}x{}",
            bed_width, bed_length
        )));
    }

    for (i, o) in objects.iter().enumerate() {
        let bb = o.bounding_box();
        if bb.is_open() || bb.is_void() {
            // Reported with detail by the packer below.
            continue;
        }
        if o.width() > bed_width || o.length() > bed_length {
            log::error!(
                "Rearrange: Error: object {} ({:.3}x{:.3}) too large for bed ({:.3}x{:.3})",
                i,
                o.width(),
                o.length(),
                bed_width,
                bed_length
            );
            return Err(Error::Validation(format!(
                "object {} ({:.3}x{:.3}) too large for bed ({:.3}x{:.3})",
                i,
                o.width(),
                o.length(),
                bed_width,
                bed_length
            )));
        }
    }

    let mut packer = Packer::with_limit(objects, max_objects)?;
    let (bin_width, bin_length) = packer.pack()?;

    if bin_width > bed_width || bin_length > bed_length {
        log::error!(
            "Rearrange: objects {:.3}x{:.3} exceed bed area {:.3}x{:.3}",
            bin_width,
            bin_length,
            bed_width,
            bed_length
        );
        return Err(Error::ResourceExceeded(format!(
            "objects {:.3}x{:.3} exceed bed area {:.3}x{:.3}",
            bin_width, bin_length, bed_width, bed_length
        )));
    }

    let offset_x = (bed_width - bin_width) / 2.0;
    let offset_y = (bed_length - bin_length) / 2.0;
    packer.arrange(offset_x, offset_y)?;

    log::info!(
        "Rearrange: placed {} objects in {:.3}x{:.3}, offset ({:.3},{:.3})",
        packer.objects().len(),
        bin_width,
        bin_length,
        offset_x,
        offset_y
    );
    Ok((offset_x, offset_y))
}
