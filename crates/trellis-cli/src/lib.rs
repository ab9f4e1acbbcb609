//! CLI logic for the Trellis layout tool.
//!
//! Reads a diagram serialized as JSON, lays it out, and writes the
//! positioned result as JSON.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::{info, warn};

use trellis::{LayoutBuilder, TrellisError, load_diagram, options::LayoutOptions};

/// Run the Trellis CLI application
///
/// This function processes the input file through the Trellis pipeline
/// and writes the resulting layout to the output file. Diagnostics raised
/// during layout are logged as warnings and kept in the output.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `TrellisError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Empty or malformed input
/// - Layout errors
/// - Serialization errors
pub fn run(args: &Args) -> Result<(), TrellisError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing diagram"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;
    let diagram = load_diagram(&source)?;

    let builder = LayoutBuilder::new(app_config);
    let layout = builder.layout(&diagram, &layout_options(args))?;

    for diagnostic in layout.diagnostics() {
        warn!(severity:% = diagnostic.severity(); "{}", diagnostic.message());
    }

    let json = serde_json::to_string_pretty(&layout).map_err(TrellisError::Serialize)?;
    fs::write(&args.output, json)?;

    info!(output_file = args.output; "Layout exported successfully");

    Ok(())
}

fn layout_options(args: &Args) -> LayoutOptions {
    let mut options = LayoutOptions::new();
    if let Some(direction) = &args.direction {
        options = options.with_direction(direction);
    }
    if let Some(algorithm) = &args.algorithm {
        options = options.with_algorithm(algorithm);
    }
    if let Some(spacing) = args.spacing {
        options = options.with_spacing(spacing);
    }
    options
}
