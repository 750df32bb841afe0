//! Cutting-plane planning.
//!
//! Each layer is cut at its top: layer `i` (1-based) sits at `i × layer_height`,
//! so the last plane may rise above the object when its height is not a whole
//! number of layers.

use crate::{CoordF, Error, Result};

/// Upper bound on planes generated for one object.
pub const MAXIMUM_LAYERS: usize = 100_000;

/// Slack for heights that are a whole number of layers up to float noise.
const LAYER_EPSILON: CoordF = 1e-9;

/// Ascending Z heights at which an object of `object_height` is cut.
///
/// A zero-height object yields no planes.
pub fn layer_heights(object_height: CoordF, layer_height: CoordF) -> Result<Vec<CoordF>> {
    if !(layer_height > 0.0) || !layer_height.is_finite() {
        return Err(Error::Validation(format!(
            "layer height must be > 0, got {}",
            layer_height
        )));
    }
    if !(object_height >= 0.0) || !object_height.is_finite() {
        return Err(Error::Validation(format!(
            "invalid object height {}",
            object_height
        )));
    }

    let layers = (object_height / layer_height - LAYER_EPSILON).ceil().max(0.0);
    if layers > MAXIMUM_LAYERS as CoordF {
        return Err(Error::Validation(format!(
            "{} layers exceeds maximum {}",
            layers, MAXIMUM_LAYERS
        )));
    }

    let count = layers as usize;
    log::debug!(
        "Planes: {} layers of {}mm for a {}mm object",
        count,
        layer_height,
        object_height
    );
    Ok((1..=count).map(|i| i as CoordF * layer_height).collect())
}
