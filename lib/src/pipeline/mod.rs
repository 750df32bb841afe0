//! Pipeline module - orchestrates slicing of cross-sections into G-code.
//!
//! cross-sections → polylines → shells → infill → per-slice G-code → job
//!
//! Cross-sections are independent until collation, so each one runs through
//! its own chain on the rayon pool. Collation then orders the results by Z.
//!
//! # Example
//!
//! ```rust,ignore
//! use step_slicer::{CrossSection, LayerPipeline, PrintConfig};
//!
//! let sections: Vec<CrossSection> = serde_json::from_str(&json)?;
//! let pipeline = LayerPipeline::new(PrintConfig::default());
//! let gcode = pipeline.process(&sections)?;
//! ```

use crate::config::PrintConfig;
use crate::gcode::{collate_serialized, SerializedSlice};
use crate::geometry::Polyline;
use crate::infill::{clip_infill, generate_infill_pattern};
use crate::perimeter::{ShellConfig, ShellGenerator};
use crate::slice::{extract_polyline, CrossSection, Slice};
use crate::{Error, Result};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Slicing pipeline for a set of cross-sections sharing one configuration.
pub struct LayerPipeline {
    config: PrintConfig,
    shells: ShellGenerator,
}

impl LayerPipeline {
    pub fn new(config: PrintConfig) -> Self {
        let shells = ShellGenerator::new(ShellConfig::from_print_config(&config));
        Self { config, shells }
    }

    /// Create a pipeline with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PrintConfig::default())
    }

    pub fn config(&self) -> &PrintConfig {
        &self.config
    }

    /// Slice every cross-section and collate the result into one program.
    pub fn process(&self, sections: &[CrossSection]) -> Result<String> {
        self.process_with_callback(sections, |_, _| {})
    }

    /// Like [`process`](Self::process), reporting `(finished, total)` after
    /// each cross-section. The callback may run on any pool thread.
    pub fn process_with_callback<F>(&self, sections: &[CrossSection], callback: F) -> Result<String>
    where
        F: Fn(usize, usize) + Sync,
    {
        let pattern = self.prepare()?;
        let total = sections.len();
        let finished = AtomicUsize::new(0);

        log::info!("Pipeline: slicing {} cross-sections", total);
        let serialized = sections
            .par_iter()
            .map(|section| {
                let slice = self.slice_section(section, &pattern)?;
                let serialized = SerializedSlice::new(&slice, &self.config);
                callback(finished.fetch_add(1, Ordering::Relaxed) + 1, total);
                Ok(serialized)
            })
            .collect::<Result<Vec<_>>>()?;

        collate_serialized(serialized, &self.config)
    }

    /// Build the slices without serializing them, in input order.
    pub fn slice_sections(&self, sections: &[CrossSection]) -> Result<Vec<Slice>> {
        let pattern = self.prepare()?;
        sections
            .par_iter()
            .map(|section| self.slice_section(section, &pattern))
            .collect()
    }

    /// Validate the configuration and lay out the shared infill pattern.
    fn prepare(&self) -> Result<Polyline> {
        self.config.validate()?;
        log::debug!("Pipeline: {}", self.config);
        generate_infill_pattern(
            self.config.infill_density,
            self.config.line_width,
            self.config.bed_width,
            self.config.bed_length,
        )
    }

    fn slice_section(&self, section: &CrossSection, pattern: &Polyline) -> Result<Slice> {
        let Some(outer) = extract_polyline(&section.outer) else {
            log::warn!(
                "Pipeline: cross-section at z={} has no usable outer loop",
                section.z
            );
            return Ok(Slice::empty(section.z, section.thickness));
        };
        let islands: Vec<Polyline> = section.islands.iter().filter_map(extract_polyline).collect();

        let shells = self.shells.generate(&outer, &islands)?;

        let infill = if pattern.is_empty() {
            Vec::new()
        } else {
            match clip_infill(pattern, &shells.innermost) {
                Ok(paths) => paths,
                Err(Error::InfillBeforeShells) => {
                    log::debug!("Pipeline: no infill region at z={}", section.z);
                    Vec::new()
                }
                Err(e) => return Err(e),
            }
        };

        log::trace!(
            "Pipeline: z={} -> {} shells, {} infill paths",
            section.z,
            shells.shells.len(),
            infill.len()
        );
        Ok(Slice::new(section.z, section.thickness, shells, infill))
    }
}

impl Default for LayerPipeline {
    fn default() -> Self {
        Self::with_defaults()
    }
}
