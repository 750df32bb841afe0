//! step-slicer CLI
//!
//! Usage:
//!   step-slicer arrange <footprints.json> [--config cfg.json] [--bed-width W --bed-length L]
//!   step-slicer slice <sections.json> -o <output.gcode> [--config cfg.json]
//!   step-slicer layers <height> [--config cfg.json]
//!   step-slicer config

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, LevelFilter};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use step_slicer::{
    layer_heights, rearrange_with_config, CrossSection, Footprint, LayerPipeline, PrintConfig,
};

/// Build-plate packing and layer toolpath generation
#[derive(Parser, Debug)]
#[command(name = "step-slicer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Arrange object footprints on the bed
    Arrange {
        /// Footprint list (JSON: [{"name", "width", "length"}])
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Print configuration file (JSON format)
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Bed width in mm (overrides the configuration)
        #[arg(long)]
        bed_width: Option<f64>,

        /// Bed length in mm (overrides the configuration)
        #[arg(long)]
        bed_length: Option<f64>,
    },

    /// Slice cross-sections and generate G-code
    Slice {
        /// Cross-section list (JSON)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output G-code file
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Print configuration file (JSON format)
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },

    /// List the cutting-plane heights for an object
    Layers {
        /// Object height in mm
        #[arg(value_name = "HEIGHT")]
        height: f64,

        /// Print configuration file (JSON format)
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print the default configuration as JSON
    Config,
}

/// One entry of the `arrange` input file.
#[derive(Debug, Deserialize)]
struct FootprintEntry {
    name: String,
    width: f64,
    length: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Arrange {
            input,
            config,
            bed_width,
            bed_length,
        } => cmd_arrange(input, config, bed_width, bed_length),
        Commands::Slice {
            input,
            output,
            config,
        } => cmd_slice(input, output, config),
        Commands::Layers { height, config } => cmd_layers(height, config),
        Commands::Config => cmd_config(),
    }
}

fn load_config(path: Option<&Path>) -> Result<PrintConfig> {
    match path {
        Some(path) => {
            info!("Loading print config from: {}", path.display());
            PrintConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))
        }
        None => Ok(PrintConfig::default()),
    }
}

fn cmd_arrange(
    input: PathBuf,
    config_file: Option<PathBuf>,
    bed_width: Option<f64>,
    bed_length: Option<f64>,
) -> Result<()> {
    let mut config = load_config(config_file.as_deref())?;
    if let Some(width) = bed_width {
        config.bed_width = width;
    }
    if let Some(length) = bed_length {
        config.bed_length = length;
    }

    info!("Loading footprints: {}", input.display());
    let text = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let entries: Vec<FootprintEntry> =
        serde_json::from_str(&text).context("Failed to parse footprint list")?;

    let mut objects: Vec<Footprint> = entries
        .into_iter()
        .map(|e| Footprint::new(e.name, e.width, e.length))
        .collect();

    let (offset_x, offset_y) =
        rearrange_with_config(&mut objects, &config).context("Failed to arrange objects")?;

    println!(
        "Arranged {} objects on a {}x{} mm bed (bin offset {:.3}, {:.3})",
        objects.len(),
        config.bed_width,
        config.bed_length,
        offset_x,
        offset_y
    );
    for object in &objects {
        let (x, y) = object.origin();
        println!(
            "  {:<20} x={:>9.3} y={:>9.3} ({} x {} mm)",
            object.name,
            x,
            y,
            object.bbox.width(),
            object.bbox.length()
        );
    }

    Ok(())
}

fn cmd_slice(input: PathBuf, output: Option<PathBuf>, config_file: Option<PathBuf>) -> Result<()> {
    let output_path = output.unwrap_or_else(|| input.with_extension("gcode"));
    let config = load_config(config_file.as_deref())?;
    info!("Using {}", config);

    info!("Loading cross-sections: {}", input.display());
    let text = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let sections: Vec<CrossSection> =
        serde_json::from_str(&text).context("Failed to parse cross-section list")?;

    let progress = ProgressBar::new(sections.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    progress.set_message("Generating toolpaths...");

    let pipeline = LayerPipeline::new(config);
    let gcode = pipeline
        .process_with_callback(&sections, |done, _| progress.set_position(done as u64))
        .context("Failed to slice cross-sections")?;

    progress.set_message("Writing output...");
    fs::write(&output_path, &gcode)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    progress.finish_with_message("Done!");

    println!();
    println!("Slicing complete!");
    println!("  Output: {}", output_path.display());
    println!("  Cross-sections: {}", sections.len());
    println!(
        "  Layers: {}",
        gcode.lines().filter(|l| l.starts_with(";LAYER:")).count()
    );
    println!("  G-code lines: {}", gcode.lines().count());

    Ok(())
}

fn cmd_layers(height: f64, config_file: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_file.as_deref())?;
    let heights =
        layer_heights(height, config.layer_height).context("Failed to plan layer heights")?;

    println!(
        "{} layers of {} mm for a {} mm object",
        heights.len(),
        config.layer_height,
        height
    );
    for (i, z) in heights.iter().enumerate() {
        println!("  {:>5}  Z{:.6}", i, z);
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let json = PrintConfig::default()
        .to_json()
        .context("Failed to serialize default config")?;
    println!("{}", json);
    Ok(())
}
